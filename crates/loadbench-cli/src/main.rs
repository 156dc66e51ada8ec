//! loadbench CLI - submit a load-test trace file and check job status
//! against a running loadbench-server.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "loadbench")]
#[command(about = "Operator CLI for the load-test ingestion service")]
#[command(version)]
struct Cli {
    /// Base URL of the loadbench-server instance
    #[arg(long, env = "LOADBENCH_SERVER_URL", default_value = "http://127.0.0.1:8080")]
    server_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a trace file and trigger ingestion
    Upload {
        /// Path to the k6 JSON or CSV trace file
        path: std::path::PathBuf,
    },

    /// Fetch the status of a job
    Status {
        job_id: i64,
    },

    /// Retry a failed job
    Retry {
        job_id: i64,
        /// Bypass `can_retry` and retry even a non-failed job
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Upload { path } => upload(&client, &cli.server_url, &path).await?,
        Commands::Status { job_id } => status(&client, &cli.server_url, job_id).await?,
        Commands::Retry { job_id, force } => retry(&client, &cli.server_url, job_id, force).await?,
    }

    Ok(())
}

async fn upload(client: &reqwest::Client, server_url: &str, path: &std::path::Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("trace")
        .to_string();

    let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
    let form = reqwest::multipart::Form::new().part("file", part);

    info!("uploading {} to {}", path.display(), server_url);
    let response = client
        .post(format!("{server_url}/upload/upload_file"))
        .multipart(form)
        .send()
        .await?;

    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        anyhow::bail!("upload failed: {}", status);
    }
    Ok(())
}

async fn status(client: &reqwest::Client, server_url: &str, job_id: i64) -> Result<()> {
    let response = client
        .get(format!("{server_url}/upload/jobs/{job_id}"))
        .send()
        .await?;
    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        anyhow::bail!("status request failed: {}", status);
    }
    Ok(())
}

async fn retry(client: &reqwest::Client, server_url: &str, job_id: i64, force: bool) -> Result<()> {
    let response = client
        .post(format!("{server_url}/jobs/{job_id}/retry"))
        .json(&serde_json::json!({"force_retry": force}))
        .send()
        .await?;
    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        anyhow::bail!("retry failed: {}", status);
    }
    Ok(())
}
