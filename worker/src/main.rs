mod train;

use anyhow::Result;
use common::{report_id, ReportAck, ReportOutcome, TaskMessage, TaskPollResponse, WorkerReport};
use reqwest::Client;
use std::{env, time::Duration};
use tracing::{info, warn};
use tracing_subscriber;

/// Obtiene la URL base del master.
/// - En Docker usaremos: MASTER_URL=http://master:8080
/// - Si no está definida, usa http://localhost:8080 (para pruebas locales)
fn master_base_url() -> String {
    env::var("MASTER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("worker=debug,reqwest=info")
        .init();

    let client = Client::new();
    let base_url = master_base_url();

    // Loop infinito pidiendo tareas al master
    loop {
        let poll_url = format!("{}/tasks/next", base_url);
        let resp = client.post(&poll_url).send().await?;
        let poll: TaskPollResponse = resp.json().await?;

        if let Some(task) = poll.task {
            info!(
                "tengo el chunk {} del job {} (intento {})",
                task.chunk_index, task.job_id, task.attempt
            );

            let report = run_task(&task);

            let report_url = format!("{}/reports", base_url);
            let ack = client
                .post(&report_url)
                .json(&report)
                .send()
                .await?
                .json::<ReportAck>()
                .await;

            match ack {
                Ok(_) => info!("reporte {} entregado", report.report_id),
                // el master pudo rechazarlo (contención, artefacto malo);
                // con at-least-once alcanza con reintentar después
                Err(e) => warn!("reporte {} no aceptado: {}", report.report_id, e),
            }
        } else {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}

/// Corre el entrenamiento opaco sobre el chunk y arma el reporte. El
/// report_id sale de (job, chunk, intento), así una redelivery del mismo
/// intento produce el mismo id y el master la deduplica.
fn run_task(task: &TaskMessage) -> WorkerReport {
    let id = report_id(&task.job_id, task.chunk_index, task.attempt);

    match train::train(&task.chunk_ref) {
        Ok(artifact) => WorkerReport {
            job_id: task.job_id.clone(),
            chunk_index: task.chunk_index,
            report_id: id,
            outcome: ReportOutcome::Success,
            artifact: Some(artifact),
            reason: None,
        },
        Err(e) => {
            warn!(
                "entrenamiento del chunk {} del job {} falló: {}",
                task.chunk_index, task.job_id, e
            );
            WorkerReport {
                job_id: task.job_id.clone(),
                chunk_index: task.chunk_index,
                report_id: id,
                outcome: ReportOutcome::Failure,
                artifact: None,
                reason: Some(e.to_string()),
            }
        }
    }
}
