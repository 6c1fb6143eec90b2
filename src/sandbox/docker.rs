use super::{ExecOutput, Sandbox};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

/// A running Docker container driven through `docker exec` / `docker cp`.
///
/// `docker cp` writes the exported file to the same path on the host, so a
/// sandbox path doubles as the host path once the copy succeeds.
pub struct DockerSandbox {
    container_id: String,
    command_timeout: Duration,
}

impl DockerSandbox {
    pub fn new(container_id: impl Into<String>, command_timeout: Duration) -> Self {
        Self {
            container_id: container_id.into(),
            command_timeout,
        }
    }

    /// Run a docker subcommand with timeout, returning the raw output.
    async fn run_docker(&self, args: &[&str]) -> anyhow::Result<Output> {
        let result = tokio::time::timeout(
            self.command_timeout,
            tokio::process::Command::new("docker").args(args).output(),
        )
        .await;

        match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(anyhow::anyhow!("failed to execute docker: {e}")),
            Err(_) => Err(anyhow::anyhow!(
                "docker {} timed out after {}s",
                args.first().copied().unwrap_or(""),
                self.command_timeout.as_secs()
            )),
        }
    }
}

#[async_trait]
impl Sandbox for DockerSandbox {
    fn id(&self) -> &str {
        &self.container_id
    }

    async fn execute(&self, command: &str) -> anyhow::Result<ExecOutput> {
        tracing::debug!(container = %self.container_id, %command, "docker exec");
        let output = self
            .run_docker(&["exec", &self.container_id, "sh", "-c", command])
            .await?;

        Ok(ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn copy_out(&self, path: &str) -> anyhow::Result<(PathBuf, String)> {
        let source = format!("{}:{path}", self.container_id);
        tracing::debug!(container = %self.container_id, %path, "docker cp");
        let output = self.run_docker(&["cp", &source, path]).await?;

        Ok((
            PathBuf::from(path),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_container_id() {
        let sandbox = DockerSandbox::new("c0ffee", Duration::from_secs(20));
        assert_eq!(sandbox.id(), "c0ffee");
    }
}
