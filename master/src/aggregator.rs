use chrono::Utc;
use common::{
    CoordError, Job, JobStatus, ReportOutcome, TaskMessage, WorkerReport, CHUNK_RETRY_EXHAUSTED,
};
use tracing::{info, warn};

use crate::dispatch::TaskTransport;
use crate::store::JobStore;

/// Aplica un reporte de worker como una única transición atómica a
/// través del store. El agregador no guarda estado entre llamadas: cada
/// decisión sale sólo del registro almacenado y del reporte entrante,
/// así aplicar el mismo reporte dos veces (o en cualquier orden entre
/// chunks) deja el mismo estado final.
pub fn on_report(
    store: &JobStore,
    transport: &dyn TaskTransport,
    max_attempts: u32,
    report: &WorkerReport,
) -> Result<Job, CoordError> {
    let job = store.apply_transition(&report.job_id, |current| {
        transition(current, report, max_attempts)
    })?;

    // Re-despacho tras un fallo no agotado, fuera de la transición y
    // fire-and-forget como el dispatch inicial. Una redelivery duplicada
    // puede re-despachar de más; el dedup por report_id lo absorbe.
    if report.outcome == ReportOutcome::Failure
        && !job.is_terminal()
        && !job.completed.contains(&report.chunk_index)
        && !job.exhausted.contains(&report.chunk_index)
    {
        if let Some(&attempts) = job.failed_attempts.get(&report.chunk_index) {
            redispatch(transport, &job, report.chunk_index, attempts);
        }
    }

    Ok(job)
}

/// Función de transición pura: (job almacenado, reporte) -> job nuevo.
fn transition(current: &Job, report: &WorkerReport, max_attempts: u32) -> Result<Job, CoordError> {
    // 1) Job terminal: el reporte tardío se acepta pero no toca nada.
    //    No puede resucitar ni corromper un job ya cerrado.
    if current.is_terminal() {
        return Ok(current.clone());
    }

    // 2) Redelivery de un reporte ya procesado: no-op.
    if current.processed_reports.contains(&report.report_id) {
        return Ok(current.clone());
    }

    if report.chunk_index >= current.total_chunks() {
        return Err(CoordError::InvalidReport(format!(
            "chunk {} fuera de rango para el job {} ({} chunks)",
            report.chunk_index,
            current.id,
            current.total_chunks()
        )));
    }

    let mut next = current.clone();

    match report.outcome {
        ReportOutcome::Success => {
            let partial = report.artifact.as_ref().ok_or_else(|| {
                CoordError::InvalidArtifact(format!(
                    "reporte success {} sin artefacto",
                    report.report_id
                ))
            })?;

            // El merge valida primero: un artefacto malformado corta acá
            // y el report_id no se registra, así una redelivery corregida
            // todavía puede aplicarse.
            if !next.completed.contains(&report.chunk_index) {
                next.artifact.merge(partial)?;
                next.completed.insert(report.chunk_index);
            }
            next.failed_attempts.remove(&report.chunk_index);
        }
        ReportOutcome::Failure => {
            // Un fallo rezagado de un chunk ya completado no cuenta:
            // sólo se registra el reporte.
            if !next.completed.contains(&report.chunk_index) {
                let attempts = next.failed_attempts.entry(report.chunk_index).or_insert(0);
                *attempts += 1;
                if *attempts > max_attempts {
                    next.exhausted.insert(report.chunk_index);
                }
            }
        }
    }

    next.processed_reports.insert(report.report_id.clone());

    // 5) Recomputar estado. COMPLETED exactamente cuando todos los
    //    chunks completaron; FAILED apenas un chunk agota reintentos.
    if next.completed.len() as u32 == next.total_chunks() {
        next.status = JobStatus::Completed;
        next.finished_at = Some(Utc::now());
    } else if !next.exhausted.is_empty() {
        next.status = JobStatus::Failed;
        next.failure_reason = Some(CHUNK_RETRY_EXHAUSTED.to_string());
        next.finished_at = Some(Utc::now());
        info!(
            "job {} FAILED: chunk {} agotó reintentos",
            next.id, report.chunk_index
        );
    } else {
        next.status = JobStatus::Running;
    }

    Ok(next)
}

fn redispatch(transport: &dyn TaskTransport, job: &Job, chunk_index: u32, attempts: u32) {
    let Some(chunk) = job.chunks.iter().find(|c| c.index == chunk_index) else {
        return;
    };

    let task = TaskMessage {
        job_id: job.id.clone(),
        chunk_index,
        chunk_ref: chunk.chunk_ref.clone(),
        total_chunks: job.total_chunks(),
        // intento = fallos acumulados: el primero re-despacha el 1, etc.
        attempt: attempts,
    };

    if let Err(e) = transport.send(task) {
        // el chunk queda a la espera de la próxima redelivery del fallo
        warn!(
            "no se pudo re-despachar el chunk {} del job {}: {}",
            chunk_index, job.id, e
        );
    } else {
        info!(
            "chunk {} del job {} re-despachado (intento {})",
            chunk_index, job.id, attempts
        );
    }
}
