use crate::result::ToolResult;
use async_trait::async_trait;

/// Core tool trait — implement for anything an agent loop can invoke with
/// untyped JSON arguments.
///
/// Tools report domain failures through the result's `error` field; an `Err`
/// from `execute` means the tool machinery itself broke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as exposed to the agent.
    fn name(&self) -> &str;

    /// One-paragraph description for the agent's tool listing.
    fn description(&self) -> &str;

    /// JSON schema of the accepted arguments.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute with JSON arguments.
    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult>;
}
