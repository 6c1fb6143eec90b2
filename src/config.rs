use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

/// Top-level configuration, loaded from `~/.config/sandpilot/config.toml`
/// when present. Every field has a working default so the tool runs with no
/// config file at all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub computer: ComputerConfig,
    pub sandbox: SandboxConfig,
}

/// Tunables of the action dispatcher.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComputerConfig {
    /// Settle delay before a post-action screenshot, in milliseconds. The
    /// UI needs time to finish rendering; set to 0 in tests with a fake
    /// sandbox.
    pub screenshot_delay_ms: u64,
    /// Rescale coordinates and captured images between the device
    /// resolution and the standard target resolutions.
    pub scaling_enabled: bool,
    /// Directory inside the sandbox where screenshots are written. No
    /// retention policy: files accumulate until the container goes away.
    pub output_dir: String,
    /// Inter-keystroke delay for `xdotool type`, in milliseconds.
    pub typing_delay_ms: u64,
    /// Characters per `xdotool type` invocation; longer text is chunked.
    pub typing_group_size: usize,
}

impl Default for ComputerConfig {
    fn default() -> Self {
        Self {
            screenshot_delay_ms: 2000,
            scaling_enabled: true,
            output_dir: "/tmp/outputs".into(),
            typing_delay_ms: 12,
            typing_group_size: 50,
        }
    }
}

impl ComputerConfig {
    pub fn screenshot_delay(&self) -> Duration {
        Duration::from_millis(self.screenshot_delay_ms)
    }
}

/// Tunables of the sandbox collaborators.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Timeout for each `docker exec` / `docker cp`, in seconds.
    pub command_timeout_secs: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: 20,
        }
    }
}

impl SandboxConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl Config {
    /// Load the user config file, falling back to defaults when it does not
    /// exist. A file that exists but does not parse is an error — silently
    /// ignoring a typo'd config hides real misconfiguration.
    pub fn load() -> anyhow::Result<Self> {
        let Some(dirs) = directories::ProjectDirs::from("", "", "sandpilot") else {
            return Ok(Self::default());
        };
        let path = dirs.config_dir().join("config.toml");
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
