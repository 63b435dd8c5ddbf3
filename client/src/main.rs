use anyhow::Result;
use clap::{Parser, Subcommand};
use common::{JobView, SubmitRequest, SubmitResponse};
use reqwest::Client;
use std::env;

/// Igual que en el worker:
/// - En Docker: MASTER_URL=http://master:8080
/// - Local: default http://localhost:8080
fn master_base_url() -> String {
    env::var("MASTER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI simple para hablar con el master")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Envía un job de entrenamiento sobre un dataset
    Submit {
        /// Ruta del dataset (un registro por línea)
        #[arg(value_name = "DATASET")]
        dataset_ref: String,

        /// Cantidad de chunks (default: la configurada en el master)
        #[arg(long)]
        chunks: Option<u32>,
    },
    /// Consulta el estado de un job
    Status {
        #[arg(value_name = "JOB_ID")]
        id: String,
    },
    /// Cancela un job
    Cancel {
        #[arg(value_name = "JOB_ID")]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base = master_base_url();

    match cli.command {
        Commands::Submit { dataset_ref, chunks } => {
            let res = client
                .post(format!("{}/jobs", base))
                .json(&SubmitRequest {
                    dataset_ref,
                    chunk_count: chunks,
                })
                .send()
                .await?;

            if !res.status().is_success() {
                anyhow::bail!("submit rechazado: {} {}", res.status(), res.text().await?);
            }
            let resp: SubmitResponse = res.json().await?;
            println!("job_id: {}", resp.job_id);
        }
        Commands::Status { id } => {
            let res = client.get(format!("{}/jobs/{}", base, id)).send().await?;
            if res.status() == reqwest::StatusCode::NOT_FOUND {
                anyhow::bail!("el job {} no existe", id);
            }
            let view: JobView = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Commands::Cancel { id } => {
            let res = client
                .post(format!("{}/jobs/{}/cancel", base, id))
                .send()
                .await?;
            if res.status() == reqwest::StatusCode::NOT_FOUND {
                anyhow::bail!("el job {} no existe", id);
            }
            let view: JobView = res.json().await?;
            println!("job {} -> {:?}", id, view.status);
        }
    }

    Ok(())
}
