use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use equipment_client::{charts, render, ApiClient};

#[derive(Parser, Debug)]
#[command(name = "equipment-client", about = "Upload equipment CSVs and inspect their summaries")]
struct Cli {
    /// API root, without the `/api` suffix.
    #[arg(long, env = "EQUIPMENT_API_URL", default_value = "http://localhost:8000")]
    base_url: String,

    #[arg(long, env = "EQUIPMENT_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "EQUIPMENT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a CSV file and print its summary.
    Upload { file: PathBuf },
    /// Print the most recent summary.
    Summary,
    /// Print the retained upload history, newest first.
    History,
    /// Download the PDF report for the latest dataset.
    Report {
        #[arg(long, default_value = "chemical_equipment_report.pdf")]
        out: PathBuf,
    },
    /// Write the type distribution pie and averages bar chart (SVG) for the latest dataset.
    Charts {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut client = ApiClient::new(&cli.base_url);
    if let Some(user) = cli.username {
        client = client.with_basic_auth(user, cli.password.unwrap_or_default());
    }

    match cli.command {
        Command::Upload { file } => {
            let resp = client
                .upload_file(&file)
                .await
                .with_context(|| format!("Upload of {} failed", file.display()))?;
            println!("{}\n", resp.message);
            print!("{}", render::summary_table(&resp.summary));
        }
        Command::Summary => {
            let summary = client.summary().await.context("Failed to fetch summary")?;
            print!("{}", render::summary_table(&summary));
        }
        Command::History => {
            let entries = client.history().await.context("Failed to fetch history")?;
            if entries.is_empty() {
                println!("No uploads yet");
            } else {
                print!("{}", render::history_table(&entries));
            }
        }
        Command::Report { out } => {
            let pdf = client.report().await.context("Failed to download report")?;
            tokio::fs::write(&out, &pdf)
                .await
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Report saved to {} ({} bytes)", out.display(), pdf.len());
        }
        Command::Charts { out_dir } => {
            let summary = client.summary().await.context("Failed to fetch summary")?;
            let written = tokio::task::spawn_blocking(move || charts::write_charts(&summary, &out_dir))
                .await
                .context("Chart task failed")??;
            for path in written {
                println!("Chart saved to {}", path.display());
            }
        }
    }

    Ok(())
}
