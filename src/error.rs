use thiserror::Error;

/// Failures raised by the computer-use tool.
///
/// Sandbox command stderr is normally surfaced as `error` text on the
/// [`crate::ToolResult`] rather than raised; these variants cover the cases
/// where a call cannot produce a meaningful result at all.
#[derive(Debug, Error)]
pub enum ComputerError {
    /// Unknown action tag at the request boundary.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// An argument is present, absent, or shaped in violation of the
    /// per-action contract.
    #[error("{0}")]
    InvalidArgument(String),

    /// A coordinate- or text-bearing action was dispatched before
    /// `get_screen_info` established the display geometry.
    #[error("screen geometry is not established; dispatch get_screen_info first")]
    GeometryRequired,

    /// The geometry bootstrap command errored or produced unparsable output.
    #[error("could not determine screen geometry: {0}")]
    GeometryUnavailable(String),

    /// An API-space coordinate exceeds the device display bounds.
    #[error("coordinates {x}, {y} are out of bounds")]
    OutOfBounds { x: u32, y: u32 },

    /// The capture/export pipeline did not yield a file on the host.
    #[error("failed to take screenshot: {0}")]
    CaptureFailed(String),

    /// Two results carrying an image each cannot be merged.
    #[error("cannot combine two results that both carry an image")]
    ImageConflict,

    /// The sandbox collaborator itself failed (spawn error, timeout).
    #[error("sandbox command failed: {0}")]
    Sandbox(anyhow::Error),
}
