//! Action kinds and the typed request surface an agent framework speaks.

use crate::error::ComputerError;
use crate::result::ToolResult;
use crate::tools::ComputerTool;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Everything the computer tool can do. The dispatcher matches exhaustively,
/// so adding a variant fails to compile until every arm handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Key,
    Type,
    MouseMove,
    LeftClick,
    LeftClickDrag,
    RightClick,
    MiddleClick,
    DoubleClick,
    Screenshot,
    CursorPosition,
    ScrollUp,
    ScrollDown,
    GetScreenInfo,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Type => "type",
            Self::MouseMove => "mouse_move",
            Self::LeftClick => "left_click",
            Self::LeftClickDrag => "left_click_drag",
            Self::RightClick => "right_click",
            Self::MiddleClick => "middle_click",
            Self::DoubleClick => "double_click",
            Self::Screenshot => "screenshot",
            Self::CursorPosition => "cursor_position",
            Self::ScrollUp => "scroll_up",
            Self::ScrollDown => "scroll_down",
            Self::GetScreenInfo => "get_screen_info",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ComputerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "key" => Self::Key,
            "type" => Self::Type,
            "mouse_move" => Self::MouseMove,
            "left_click" => Self::LeftClick,
            "left_click_drag" => Self::LeftClickDrag,
            "right_click" => Self::RightClick,
            "middle_click" => Self::MiddleClick,
            "double_click" => Self::DoubleClick,
            "screenshot" => Self::Screenshot,
            "cursor_position" => Self::CursorPosition,
            "scroll_up" => Self::ScrollUp,
            "scroll_down" => Self::ScrollDown,
            "get_screen_info" => Self::GetScreenInfo,
            other => return Err(ComputerError::InvalidAction(other.to_string())),
        })
    }
}

// ── Typed request surface ───────────────────────────────────────────────────

/// Keyboard action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyboardAction {
    Key,
    Type,
}

/// Payload-free mouse buttons and wheel directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonKind {
    LeftClick,
    RightClick,
    MiddleClick,
    DoubleClick,
    ScrollUp,
    ScrollDown,
}

impl ButtonKind {
    fn action(self) -> Action {
        match self {
            Self::LeftClick => Action::LeftClick,
            Self::RightClick => Action::RightClick,
            Self::MiddleClick => Action::MiddleClick,
            Self::DoubleClick => Action::DoubleClick,
            Self::ScrollUp => Action::ScrollUp,
            Self::ScrollDown => Action::ScrollDown,
        }
    }
}

/// Mouse sub-actions; movement carries an API-space coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MouseAction {
    MouseMove { x: u32, y: u32 },
    LeftClickDrag { x: u32, y: u32 },
    Button { button: ButtonKind },
}

/// One request from the agent framework, tagged with the target container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    GetScreenInfo {
        container_id: String,
    },
    ScreenShot {
        container_id: String,
    },
    Keyboard {
        container_id: String,
        action: KeyboardAction,
        text: String,
    },
    Mouse {
        container_id: String,
        action: MouseAction,
    },
}

impl Request {
    /// The container this request targets; the caller builds the matching
    /// sandbox and tool from it.
    pub fn container_id(&self) -> &str {
        match self {
            Self::GetScreenInfo { container_id }
            | Self::ScreenShot { container_id }
            | Self::Keyboard { container_id, .. }
            | Self::Mouse { container_id, .. } => container_id,
        }
    }

    /// Flatten into the dispatcher's `(action, text, coordinate)` triple.
    pub fn action_parts(&self) -> (Action, Option<&str>, Option<(u32, u32)>) {
        match self {
            Self::GetScreenInfo { .. } => (Action::GetScreenInfo, None, None),
            Self::ScreenShot { .. } => (Action::Screenshot, None, None),
            Self::Keyboard { action, text, .. } => {
                let action = match action {
                    KeyboardAction::Key => Action::Key,
                    KeyboardAction::Type => Action::Type,
                };
                (action, Some(text.as_str()), None)
            }
            Self::Mouse { action, .. } => match *action {
                MouseAction::MouseMove { x, y } => (Action::MouseMove, None, Some((x, y))),
                MouseAction::LeftClickDrag { x, y } => (Action::LeftClickDrag, None, Some((x, y))),
                MouseAction::Button { button } => (button.action(), None, None),
            },
        }
    }
}

/// Text surface handed back to the agent framework.
pub fn combined_text(result: &ToolResult) -> String {
    format!(
        "stdout: {}, stderr: {}",
        result.output.as_deref().unwrap_or(""),
        result.error.as_deref().unwrap_or("")
    )
}

/// Dispatch a request on a tool already bound to the request's container.
/// Returns the combined text plus the base64 image (empty when no capture).
pub async fn run_request(
    tool: &ComputerTool,
    request: &Request,
) -> Result<(String, String), ComputerError> {
    let (action, text, coordinate) = request.action_parts();
    let result = tool.dispatch(action, text, coordinate).await?;
    let image = result.image_base64.clone().unwrap_or_default();
    Ok((combined_text(&result), image))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComputerConfig;
    use crate::sandbox::{ExecOutput, Sandbox};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Just enough sandbox for a bootstrap and a capture.
    struct ScriptedSandbox {
        copy_dir: TempDir,
    }

    #[async_trait]
    impl Sandbox for ScriptedSandbox {
        fn id(&self) -> &str {
            "scripted"
        }

        async fn execute(&self, command: &str) -> anyhow::Result<ExecOutput> {
            let stdout = if command.starts_with("echo $WIDTH") {
                "2560,1600,1".to_string()
            } else {
                String::new()
            };
            Ok(ExecOutput {
                exit_code: 0,
                stdout,
                stderr: String::new(),
            })
        }

        async fn copy_out(&self, path: &str) -> anyhow::Result<(PathBuf, String)> {
            let host = self.copy_dir.path().join(path.rsplit('/').next().unwrap());
            std::fs::write(&host, b"png")?;
            Ok((host, String::new()))
        }
    }

    #[tokio::test]
    async fn run_request_formats_the_protocol_surface() {
        let tool = ComputerTool::new(
            Arc::new(ScriptedSandbox {
                copy_dir: TempDir::new().unwrap(),
            }),
            ComputerConfig {
                screenshot_delay_ms: 0,
                ..ComputerConfig::default()
            },
        );

        let request = Request::GetScreenInfo {
            container_id: "scripted".into(),
        };
        let (text, image) = run_request(&tool, &request).await.unwrap();
        assert_eq!(
            text,
            "stdout: width: 2560, height: 1600, display_num: 1, stderr: "
        );
        assert!(!image.is_empty());

        let request = Request::Mouse {
            container_id: "scripted".into(),
            action: MouseAction::Button {
                button: ButtonKind::LeftClick,
            },
        };
        let (text, image) = run_request(&tool, &request).await.unwrap();
        assert_eq!(text, "stdout: , stderr: ");
        assert!(!image.is_empty());
    }

    #[test]
    fn action_string_round_trip() {
        for action in [
            Action::Key,
            Action::Type,
            Action::MouseMove,
            Action::LeftClick,
            Action::LeftClickDrag,
            Action::RightClick,
            Action::MiddleClick,
            Action::DoubleClick,
            Action::Screenshot,
            Action::CursorPosition,
            Action::ScrollUp,
            Action::ScrollDown,
            Action::GetScreenInfo,
        ] {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(matches!(
            "fly".parse::<Action>(),
            Err(ComputerError::InvalidAction(a)) if a == "fly"
        ));
    }

    #[test]
    fn action_serde_uses_snake_case() {
        let json = serde_json::to_string(&Action::LeftClickDrag).unwrap();
        assert_eq!(json, "\"left_click_drag\"");
        let parsed: Action = serde_json::from_str("\"scroll_up\"").unwrap();
        assert_eq!(parsed, Action::ScrollUp);
    }

    #[test]
    fn request_action_parts() {
        let req = Request::Mouse {
            container_id: "c1".into(),
            action: MouseAction::MouseMove { x: 10, y: 20 },
        };
        assert_eq!(req.container_id(), "c1");
        assert_eq!(req.action_parts(), (Action::MouseMove, None, Some((10, 20))));

        let req = Request::Keyboard {
            container_id: "c1".into(),
            action: KeyboardAction::Type,
            text: "hello".into(),
        };
        assert_eq!(req.action_parts(), (Action::Type, Some("hello"), None));

        let req = Request::Mouse {
            container_id: "c1".into(),
            action: MouseAction::Button {
                button: ButtonKind::DoubleClick,
            },
        };
        assert_eq!(req.action_parts(), (Action::DoubleClick, None, None));
    }

    #[test]
    fn request_serde_round_trip() {
        let req = Request::Mouse {
            container_id: "abc123".into(),
            action: MouseAction::LeftClickDrag { x: 5, y: 7 },
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"type\":\"mouse\""));
        assert!(json.contains("\"kind\":\"left_click_drag\""));
        let parsed: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn combined_text_formats_both_streams() {
        let result = ToolResult {
            output: Some("ok".into()),
            error: Some("warn".into()),
            ..ToolResult::default()
        };
        assert_eq!(combined_text(&result), "stdout: ok, stderr: warn");
        assert_eq!(combined_text(&ToolResult::default()), "stdout: , stderr: ");
    }
}
