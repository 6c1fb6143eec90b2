use super::traits::Tool;
use crate::action::Action;
use crate::config::ComputerConfig;
use crate::error::ComputerError;
use crate::result::ToolResult;
use crate::sandbox::Sandbox;
use crate::scaling::{scale_coordinates, ScalingSource};
use crate::session::Session;
use async_trait::async_trait;
use base64::Engine;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Screen, keyboard, and mouse control for one sandbox display.
///
/// Bound to a single [`Sandbox`] at construction. `get_screen_info` must run
/// once before any coordinate- or text-bearing action; the resulting
/// [`Session`] is cached for the tool's lifetime and reused by every later
/// dispatch. Actions are strictly sequential per instance — callers
/// serialize their dispatches.
pub struct ComputerTool {
    sandbox: Arc<dyn Sandbox>,
    settings: ComputerConfig,
    session: Mutex<Option<Session>>,
}

impl ComputerTool {
    pub fn new(sandbox: Arc<dyn Sandbox>, settings: ComputerConfig) -> Self {
        Self {
            sandbox,
            settings,
            session: Mutex::new(None),
        }
    }

    /// The session currently cached by this tool, if any.
    pub async fn session(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }

    // ── Dispatch ────────────────────────────────────────────────────────

    /// Validate and execute one action against the cached session.
    ///
    /// `get_screen_info` (re)establishes the session; everything else fails
    /// with [`ComputerError::GeometryRequired`] until one exists.
    pub async fn dispatch(
        &self,
        action: Action,
        text: Option<&str>,
        coordinate: Option<(u32, u32)>,
    ) -> Result<ToolResult, ComputerError> {
        tracing::debug!(%action, "dispatching computer action");

        if action == Action::GetScreenInfo {
            return self.refresh_screen_info().await;
        }

        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or(ComputerError::GeometryRequired)?;
        self.dispatch_in(session, action, text, coordinate).await
    }

    /// Execute one action against an explicit session, for callers that
    /// manage sessions themselves. `get_screen_info` here bootstraps a fresh
    /// session and leaves the cached one alone.
    pub async fn dispatch_in(
        &self,
        session: &Session,
        action: Action,
        text: Option<&str>,
        coordinate: Option<(u32, u32)>,
    ) -> Result<ToolResult, ComputerError> {
        match action {
            Action::GetScreenInfo => {
                let fresh = Session::establish(self.sandbox.as_ref()).await?;
                self.screen_info_result(&fresh).await
            }

            Action::MouseMove | Action::LeftClickDrag => {
                let (x, y) = coordinate.ok_or_else(|| {
                    ComputerError::InvalidArgument(format!("coordinate is required for {action}"))
                })?;
                reject_text(action, text)?;

                let (x, y) = self.scale(session, ScalingSource::Api, x, y)?;
                let xdotool = session.xdotool();
                let command = match action {
                    Action::MouseMove => format!("{xdotool} mousemove --sync {x} {y}"),
                    _ => format!("{xdotool} mousedown 1 mousemove --sync {x} {y} mouseup 1"),
                };
                self.shell(session, &command, true).await
            }

            Action::Key | Action::Type => {
                let text = text.ok_or_else(|| {
                    ComputerError::InvalidArgument(format!("text is required for {action}"))
                })?;
                reject_coordinate(action, coordinate)?;

                match action {
                    Action::Key => {
                        let command = format!("{} key -- {text}", session.xdotool());
                        self.shell(session, &command, true).await
                    }
                    _ => self.type_text(session, text).await,
                }
            }

            Action::LeftClick
            | Action::RightClick
            | Action::MiddleClick
            | Action::DoubleClick
            | Action::Screenshot
            | Action::CursorPosition
            | Action::ScrollUp
            | Action::ScrollDown => {
                reject_text(action, text)?;
                reject_coordinate(action, coordinate)?;

                match action {
                    Action::Screenshot => self.capture(session).await,
                    Action::CursorPosition => self.cursor_position(session).await,
                    Action::ScrollUp | Action::ScrollDown => {
                        let button = if action == Action::ScrollUp { 4 } else { 5 };
                        let command = format!("{} click --repeat 1 {button}", session.xdotool());
                        self.shell(session, &command, true).await
                    }
                    _ => {
                        let click_arg = match action {
                            Action::LeftClick => "1",
                            Action::MiddleClick => "2",
                            Action::RightClick => "3",
                            _ => "--repeat 2 --delay 500 1",
                        };
                        let command = format!("{} click {click_arg}", session.xdotool());
                        self.shell(session, &command, true).await
                    }
                }
            }
        }
    }

    // ── Screen info ─────────────────────────────────────────────────────

    async fn refresh_screen_info(&self) -> Result<ToolResult, ComputerError> {
        let session = Session::establish(self.sandbox.as_ref()).await?;
        let result = self.screen_info_result(&session).await?;
        *self.session.lock().await = Some(session);
        Ok(result)
    }

    async fn screen_info_result(&self, session: &Session) -> Result<ToolResult, ComputerError> {
        let shot = self.capture(session).await?;
        let geometry = session.geometry();
        let display_num = geometry
            .display_num
            .map_or_else(|| "none".to_string(), |n| n.to_string());
        Ok(ToolResult {
            output: Some(format!(
                "width: {}, height: {}, display_num: {display_num}",
                geometry.width, geometry.height
            )),
            error: shot.error,
            image_base64: shot.image_base64,
            system: None,
        })
    }

    // ── Typing ──────────────────────────────────────────────────────────

    async fn type_text(&self, session: &Session, text: &str) -> Result<ToolResult, ComputerError> {
        let xdotool = session.xdotool();
        let mut combined = ToolResult::default();
        for chunk in chunk_text(text, self.settings.typing_group_size) {
            let command = format!(
                "{xdotool} type --delay {} -- {}",
                self.settings.typing_delay_ms,
                sh_quote(&chunk)
            );
            let result = self.shell(session, &command, false).await?;
            combined = combined.merge(result)?;
        }

        // One capture for the whole burst; per-chunk screenshots stay off.
        let shot = self.capture(session).await?;
        combined.image_base64 = shot.image_base64;
        Ok(combined)
    }

    // ── Cursor position ─────────────────────────────────────────────────

    async fn cursor_position(&self, session: &Session) -> Result<ToolResult, ComputerError> {
        let command = format!("{} getmouselocation --shell", session.xdotool());
        let result = self.shell(session, &command, false).await?;

        let report = result.output.as_deref().unwrap_or("");
        let Some((device_x, device_y)) = parse_mouse_location(report) else {
            return Ok(ToolResult::with_error(format!(
                "could not parse mouse location report: {report}"
            )));
        };

        let (x, y) = self.scale(session, ScalingSource::Device, device_x, device_y)?;
        Ok(ToolResult {
            output: Some(format!("X={x},Y={y}")),
            error: result.error,
            ..ToolResult::default()
        })
    }

    // ── Sandbox plumbing ────────────────────────────────────────────────

    /// Run a command in the sandbox and wrap its streams into a result.
    /// With `take_screenshot`, sleeps the settle delay first so the UI
    /// finishes rendering, then attaches a capture.
    async fn shell(
        &self,
        session: &Session,
        command: &str,
        take_screenshot: bool,
    ) -> Result<ToolResult, ComputerError> {
        let out = self
            .sandbox
            .execute(command)
            .await
            .map_err(ComputerError::Sandbox)?;

        let mut result = ToolResult {
            output: non_empty(out.stdout),
            error: non_empty(out.stderr),
            ..ToolResult::default()
        };

        if take_screenshot {
            tokio::time::sleep(self.settings.screenshot_delay()).await;
            let shot = self.capture(session).await?;
            result.image_base64 = shot.image_base64;
        }

        Ok(result)
    }

    /// Capture the sandbox screen and return it base64-encoded.
    pub async fn capture(&self, session: &Session) -> Result<ToolResult, ComputerError> {
        let dir = &self.settings.output_dir;
        self.sandbox
            .execute(&format!("mkdir -p {dir}"))
            .await
            .map_err(ComputerError::Sandbox)?;

        // Random 128-bit suffix: captures against the same sandbox
        // filesystem never collide, across instances or processes.
        let path = format!("{dir}/screenshot_{}.png", Uuid::new_v4().simple());
        let command = format!("{}scrot -f {path} -p", session.display_prefix());
        self.sandbox
            .execute(&command)
            .await
            .map_err(ComputerError::Sandbox)?;

        if self.settings.scaling_enabled {
            let geometry = session.geometry();
            let (w, h) = scale_coordinates(
                geometry,
                ScalingSource::Device,
                geometry.width,
                geometry.height,
            )?;
            self.sandbox
                .execute(&format!("convert {path} -resize {w}x{h}! {path}"))
                .await
                .map_err(ComputerError::Sandbox)?;
        }

        let (host_path, copy_stderr) = self
            .sandbox
            .copy_out(&path)
            .await
            .map_err(ComputerError::Sandbox)?;

        let bytes = match tokio::fs::read(&host_path).await {
            Ok(bytes) => bytes,
            Err(_) => return Err(ComputerError::CaptureFailed(copy_stderr)),
        };

        Ok(ToolResult {
            error: non_empty(copy_stderr),
            image_base64: Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            ..ToolResult::default()
        })
    }

    fn scale(
        &self,
        session: &Session,
        source: ScalingSource,
        x: u32,
        y: u32,
    ) -> Result<(u32, u32), ComputerError> {
        if !self.settings.scaling_enabled {
            return Ok((x, y));
        }
        scale_coordinates(session.geometry(), source, x, y)
    }
}

// ── Agent tool surface ──────────────────────────────────────────────────────

#[async_trait]
impl Tool for ComputerTool {
    fn name(&self) -> &str {
        "computer"
    }

    fn description(&self) -> &str {
        "Control the screen, keyboard, and mouse of a sandboxed X display. \
         Actions: get_screen_info (run this first), screenshot, mouse_move, \
         left_click, right_click, middle_click, double_click, left_click_drag, \
         key (xdotool key syntax, e.g. ctrl+s), type (literal text), \
         scroll_up, scroll_down, cursor_position. Coordinates are expressed \
         in the scaled API resolution reported by get_screen_info."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "description": "Action to perform",
                    "enum": [
                        "key", "type", "mouse_move", "left_click",
                        "left_click_drag", "right_click", "middle_click",
                        "double_click", "screenshot", "cursor_position",
                        "scroll_up", "scroll_down", "get_screen_info"
                    ]
                },
                "text": {
                    "type": "string",
                    "description": "Key combo for key, literal text for type"
                },
                "coordinate": {
                    "type": "array",
                    "items": {"type": "integer", "minimum": 0},
                    "minItems": 2,
                    "maxItems": 2,
                    "description": "[x, y] in API space for mouse_move and left_click_drag"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let Some(action) = args.get("action").and_then(|v| v.as_str()) else {
            return Ok(ToolResult::with_error("missing required parameter: action"));
        };
        let action: Action = match action.parse() {
            Ok(action) => action,
            Err(e) => return Ok(ToolResult::with_error(e.to_string())),
        };
        let text = args.get("text").and_then(|v| v.as_str());
        let coordinate = match coordinate_from_args(&args) {
            Ok(coordinate) => coordinate,
            Err(message) => return Ok(ToolResult::with_error(message)),
        };

        match self.dispatch(action, text, coordinate).await {
            Ok(result) => Ok(result),
            Err(e) => Ok(ToolResult::with_error(e.to_string())),
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn reject_text(action: Action, text: Option<&str>) -> Result<(), ComputerError> {
    if text.is_some() {
        return Err(ComputerError::InvalidArgument(format!(
            "text is not accepted for {action}"
        )));
    }
    Ok(())
}

fn reject_coordinate(action: Action, coordinate: Option<(u32, u32)>) -> Result<(), ComputerError> {
    if coordinate.is_some() {
        return Err(ComputerError::InvalidArgument(format!(
            "coordinate is not accepted for {action}"
        )));
    }
    Ok(())
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Split text into fixed-size chunks on char boundaries.
fn chunk_text(s: &str, size: usize) -> Vec<String> {
    s.chars()
        .collect::<Vec<_>>()
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Quote for the sandbox's `sh -c`: single quotes, with embedded quotes
/// closed, escaped, and reopened.
fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Extract device coordinates from `xdotool getmouselocation --shell`
/// output (`X=..` / `Y=..` lines).
fn parse_mouse_location(report: &str) -> Option<(u32, u32)> {
    let mut x = None;
    let mut y = None;
    for line in report.lines() {
        if let Some(value) = line.strip_prefix("X=") {
            x = value.trim().parse().ok();
        } else if let Some(value) = line.strip_prefix("Y=") {
            y = value.trim().parse().ok();
        }
    }
    Some((x?, y?))
}

/// Parse the optional `coordinate` argument: a `[x, y]` array of
/// non-negative integers.
fn coordinate_from_args(args: &serde_json::Value) -> Result<Option<(u32, u32)>, String> {
    let Some(value) = args.get("coordinate") else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }

    let err = || format!("{value} must be a pair of non-negative integers");
    let pair = value.as_array().ok_or_else(err)?;
    if pair.len() != 2 {
        return Err(err());
    }
    let x = pair[0]
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(err)?;
    let y = pair[1]
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(err)?;
    Ok(Some((x, y)))
}

// ── Tests ───────────────────────────────────────────────────────────────────
