//! Computer-use automation for sandboxed X displays.
//!
//! An agent asks for abstract actions (move the mouse, click, type text,
//! take a screenshot); sandpilot turns each one into `xdotool` / `scrot` /
//! `convert` commands executed inside a running container and hands back a
//! uniform result with text output and an optional base64 screenshot.
//!
//! Coordinates cross two spaces: the container's native display resolution
//! ("device space") and one of a small set of standard target resolutions
//! ("API space") that caps the coordinate range the agent sees. The
//! [`scaling`] module holds that policy; [`tools::ComputerTool`] is the
//! dispatcher that enforces per-action argument rules and drives the sandbox.

pub mod action;
pub mod config;
pub mod error;
pub mod result;
pub mod sandbox;
pub mod scaling;
pub mod session;
pub mod tools;

pub use action::{Action, Request};
pub use config::Config;
pub use error::ComputerError;
pub use result::ToolResult;
pub use sandbox::{DockerSandbox, ExecOutput, Sandbox};
pub use session::{DisplayGeometry, Session};
pub use tools::{ComputerTool, Tool};
