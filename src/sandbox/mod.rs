//! Sandbox collaborators: command execution and file export.

pub mod docker;

pub use docker::DockerSandbox;

use async_trait::async_trait;
use std::path::PathBuf;

/// Output of one command executed inside the sandbox.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// The isolated environment where UI automation commands actually run.
///
/// A non-zero exit code is not an `Err`: stderr travels back in
/// [`ExecOutput`] and is surfaced as result text by the dispatcher. `Err`
/// means the collaborator itself broke (spawn failure, timeout).
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Identifier of the underlying container.
    fn id(&self) -> &str;

    /// Run a shell command inside the sandbox.
    async fn execute(&self, command: &str) -> anyhow::Result<ExecOutput>;

    /// Copy a file out of the sandbox. Returns the host path and any stderr
    /// chatter from the copy command.
    async fn copy_out(&self, path: &str) -> anyhow::Result<(PathBuf, String)>;
}
