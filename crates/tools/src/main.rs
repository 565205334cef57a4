use std::fs;
use std::path::PathBuf;

use bridge::BridgeConfig;
use clap::{Parser, Subcommand};
use protocol::encode_event;
use tracing_subscriber::EnvFilter;

/// Drive the map bridge without a browser.
#[derive(Debug, Parser)]
#[command(name = "chartbridge", version)]
struct Cli {
    /// Bridge config (JSON). Defaults apply when absent.
    #[arg(long, global = true, env = "CHARTBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Run a JSON-lines script and print outbound events, then a summary.
    Replay { script: PathBuf },
    /// Validate a config file.
    CheckConfig { file: PathBuf },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main(Cli::parse()) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main(cli: Cli) -> Result<(), String> {
    match cli.command {
        Cmd::CheckConfig { file } => {
            let config = BridgeConfig::from_path(&file).map_err(|e| e.to_string())?;
            let text = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
            println!("{text}");
            Ok(())
        }
        Cmd::Replay { script } => {
            let config = match &cli.config {
                Some(path) => BridgeConfig::from_path(path).map_err(|e| e.to_string())?,
                None => BridgeConfig::default(),
            };
            let text =
                fs::read_to_string(&script).map_err(|e| format!("read {script:?}: {e}"))?;
            let report = tools::replay(&text, config).map_err(|e| e.to_string())?;
            for event in &report.events {
                println!("{}", encode_event(event));
            }
            let summary = serde_json::json!({
                "summary": report.summary,
                "hidden_elements": report.hidden_elements,
                "counters": report.counters,
            });
            println!("{summary}");
            Ok(())
        }
    }
}
