use anyhow::Context;
use base64::Engine;
use clap::{Parser, Subcommand};
use sandpilot::action::combined_text;
use sandpilot::{Action, ComputerTool, Config, DockerSandbox, ToolResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "sandpilot",
    version,
    about = "Keyboard, mouse, and screen automation for sandboxed X displays"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the sandbox display geometry and take a first screenshot.
    Info {
        /// Target container id or name.
        #[arg(long)]
        container: String,
        /// Write the captured screenshot to this host path.
        #[arg(long)]
        save_image: Option<PathBuf>,
    },
    /// Dispatch a single action against a container.
    Act {
        /// Target container id or name.
        #[arg(long)]
        container: String,
        /// Action kind (key, type, mouse_move, left_click, ...).
        #[arg(long)]
        action: String,
        /// Text payload for key/type.
        #[arg(long)]
        text: Option<String>,
        /// Coordinate as "X,Y" in API space for mouse_move/left_click_drag.
        #[arg(long)]
        coordinate: Option<String>,
        /// Write the captured screenshot to this host path.
        #[arg(long)]
        save_image: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Info {
            container,
            save_image,
        } => {
            let tool = build_tool(&container, &config);
            let result = tool.dispatch(Action::GetScreenInfo, None, None).await?;
            report(&result, save_image.as_deref())
        }
        Commands::Act {
            container,
            action,
            text,
            coordinate,
            save_image,
        } => {
            let tool = build_tool(&container, &config);
            let action: Action = action.parse()?;
            let coordinate = coordinate.as_deref().map(parse_coordinate).transpose()?;

            // A one-shot CLI process carries no session from a previous run,
            // so every non-bootstrap action is preceded by the bootstrap.
            if action != Action::GetScreenInfo {
                tool.dispatch(Action::GetScreenInfo, None, None).await?;
            }

            let result = tool.dispatch(action, text.as_deref(), coordinate).await?;
            report(&result, save_image.as_deref())
        }
    }
}

fn build_tool(container: &str, config: &Config) -> ComputerTool {
    let sandbox = Arc::new(DockerSandbox::new(
        container,
        config.sandbox.command_timeout(),
    ));
    ComputerTool::new(sandbox, config.computer.clone())
}

fn parse_coordinate(raw: &str) -> anyhow::Result<(u32, u32)> {
    let (x, y) = raw
        .split_once(',')
        .with_context(|| format!("coordinate must be \"X,Y\", got \"{raw}\""))?;
    let x = x
        .trim()
        .parse()
        .with_context(|| format!("coordinate X must be a non-negative integer, got \"{x}\""))?;
    let y = y
        .trim()
        .parse()
        .with_context(|| format!("coordinate Y must be a non-negative integer, got \"{y}\""))?;
    Ok((x, y))
}

fn report(result: &ToolResult, save_image: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", combined_text(result));

    if let Some(path) = save_image {
        match result.image_base64.as_deref() {
            Some(image) => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(image)
                    .context("result carried an undecodable image payload")?;
                std::fs::write(path, bytes)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("screenshot written to {}", path.display());
            }
            None => eprintln!("no screenshot in result; nothing written"),
        }
    }

    Ok(())
}
