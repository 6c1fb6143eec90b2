//! Display geometry bootstrap.
//!
//! The sandbox image exports its display setup through `$WIDTH`, `$HEIGHT`,
//! and `$DISPLAY_NUM`. One `echo` inside the container yields all three;
//! the parsed result becomes an immutable [`Session`] that every later
//! action reuses instead of re-querying.

use crate::error::ComputerError;
use crate::sandbox::Sandbox;

/// Command that prints the sandbox display variables, comma-separated.
/// Unset variables print as empty fields.
const SCREEN_INFO_COMMAND: &str = "echo $WIDTH,$HEIGHT,$DISPLAY_NUM";

/// Fallback size when the sandbox image does not export `$WIDTH`/`$HEIGHT`.
/// Portrait, matching the upstream sandbox image's phone-profile bootstrap.
const DEFAULT_WIDTH: u32 = 1080;
const DEFAULT_HEIGHT: u32 = 1920;

/// Native resolution and display number of the sandbox display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    pub width: u32,
    pub height: u32,
    pub display_num: Option<u32>,
}

/// An established connection to one sandbox display.
///
/// Holds the geometry plus the `DISPLAY=:<n> ` prefix every X command needs.
/// Construction is the only mutation point; a session never changes after
/// [`Session::establish`] returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    geometry: DisplayGeometry,
    display_prefix: String,
}

impl Session {
    /// Query the sandbox environment and build a session from the report.
    ///
    /// Unlike ordinary actions, the bootstrap treats stderr as fatal: without
    /// trustworthy geometry every later coordinate would be wrong.
    pub async fn establish(sandbox: &dyn Sandbox) -> Result<Self, ComputerError> {
        let out = sandbox
            .execute(SCREEN_INFO_COMMAND)
            .await
            .map_err(ComputerError::Sandbox)?;

        if !out.stderr.trim().is_empty() {
            return Err(ComputerError::GeometryUnavailable(out.stderr));
        }
        let report = out.stdout.trim();
        if report.is_empty() {
            return Err(ComputerError::GeometryUnavailable(
                "empty screen info report".into(),
            ));
        }
        let session = Self::from_report(report)?;
        tracing::debug!(
            width = session.geometry.width,
            height = session.geometry.height,
            display_num = ?session.geometry.display_num,
            "established sandbox display session"
        );
        Ok(session)
    }

    /// Parse a `width,height,display_num` report. Empty fields fall back to
    /// defaults (size) or absent (display number).
    pub fn from_report(report: &str) -> Result<Self, ComputerError> {
        let mut fields = report.split(',').map(str::trim);
        let width = parse_field(fields.next(), report)?.unwrap_or(DEFAULT_WIDTH);
        let height = parse_field(fields.next(), report)?.unwrap_or(DEFAULT_HEIGHT);
        let display_num = parse_field(fields.next(), report)?;

        let display_prefix = match display_num {
            Some(n) => format!("DISPLAY=:{n} "),
            None => String::new(),
        };

        Ok(Self {
            geometry: DisplayGeometry {
                width,
                height,
                display_num,
            },
            display_prefix,
        })
    }

    pub fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }

    /// `DISPLAY=:<n> ` when the sandbox reported a display number, else empty.
    pub fn display_prefix(&self) -> &str {
        &self.display_prefix
    }

    /// The `xdotool` invocation targeting this session's display.
    pub fn xdotool(&self) -> String {
        format!("{}xdotool", self.display_prefix)
    }
}

fn parse_field(field: Option<&str>, report: &str) -> Result<Option<u32>, ComputerError> {
    match field {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            ComputerError::GeometryUnavailable(format!("unparsable screen info report: {report}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::ExecOutput;
    use async_trait::async_trait;
    use std::path::PathBuf;

    struct FixedSandbox {
        stdout: &'static str,
        stderr: &'static str,
    }

    #[async_trait]
    impl Sandbox for FixedSandbox {
        fn id(&self) -> &str {
            "fixed"
        }

        async fn execute(&self, _command: &str) -> anyhow::Result<ExecOutput> {
            Ok(ExecOutput {
                exit_code: 0,
                stdout: self.stdout.into(),
                stderr: self.stderr.into(),
            })
        }

        async fn copy_out(&self, _path: &str) -> anyhow::Result<(PathBuf, String)> {
            anyhow::bail!("not used")
        }
    }

    #[test]
    fn parses_full_report() {
        let s = Session::from_report("1920,1080,1").unwrap();
        assert_eq!(
            *s.geometry(),
            DisplayGeometry {
                width: 1920,
                height: 1080,
                display_num: Some(1),
            }
        );
        assert_eq!(s.display_prefix(), "DISPLAY=:1 ");
        assert_eq!(s.xdotool(), "DISPLAY=:1 xdotool");
    }

    #[test]
    fn empty_fields_fall_back_to_defaults() {
        let s = Session::from_report(",,").unwrap();
        assert_eq!(s.geometry().width, 1080);
        assert_eq!(s.geometry().height, 1920);
        assert_eq!(s.geometry().display_num, None);
        assert_eq!(s.display_prefix(), "");
        assert_eq!(s.xdotool(), "xdotool");
    }

    #[test]
    fn missing_display_field_is_absent() {
        let s = Session::from_report("800,600").unwrap();
        assert_eq!(s.geometry().width, 800);
        assert_eq!(s.geometry().height, 600);
        assert_eq!(s.geometry().display_num, None);
    }

    #[test]
    fn garbage_fields_are_rejected() {
        assert!(matches!(
            Session::from_report("abc,600,1"),
            Err(ComputerError::GeometryUnavailable(_))
        ));
        assert!(matches!(
            Session::from_report("800,600,x"),
            Err(ComputerError::GeometryUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn establish_reads_the_sandbox_report() {
        let sandbox = FixedSandbox {
            stdout: "2560,1600,1\n",
            stderr: "",
        };
        let s = Session::establish(&sandbox).await.unwrap();
        assert_eq!(s.geometry().width, 2560);
        assert_eq!(s.display_prefix(), "DISPLAY=:1 ");
    }

    #[tokio::test]
    async fn establish_fails_on_stderr() {
        let sandbox = FixedSandbox {
            stdout: "2560,1600,1",
            stderr: "sh: not found",
        };
        assert!(matches!(
            Session::establish(&sandbox).await,
            Err(ComputerError::GeometryUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn establish_fails_on_empty_report() {
        let sandbox = FixedSandbox {
            stdout: "  \n",
            stderr: "",
        };
        assert!(matches!(
            Session::establish(&sandbox).await,
            Err(ComputerError::GeometryUnavailable(_))
        ));
    }
}
