use chrono::Utc;
use common::{CoordError, Job, JobId, JobStatus, JobView};
use tracing::{error, info};
use uuid::Uuid;

use crate::state::AppState;
use crate::{dispatch, partition};

/// Alta de un job: particiona el dataset, persiste el registro PENDING,
/// despacha una tarea por chunk y recién entonces pasa a RUNNING. No
/// espera a que los chunks terminen: el dispatch es fire-and-forget y el
/// progreso llega después por los reportes de los workers.
///
/// Si el transporte rechaza algún mensaje el job queda FAILED en vez de
/// PENDING a medias: un chunk nunca despachado no progresaría jamás.
pub fn submit(
    state: &AppState,
    dataset_ref: &str,
    chunk_count: Option<u32>,
) -> Result<JobId, CoordError> {
    let count = chunk_count
        .unwrap_or(state.config.default_chunk_count)
        .max(1);

    // si el dataset no resuelve o está vacío, el job nunca se crea
    let chunks = partition::partition(&state.config.data_dir, dataset_ref, count)?;

    let job_id = Uuid::new_v4().to_string();
    let job = Job::new(job_id.clone(), dataset_ref.to_string(), chunks);
    let chunk_list = job.chunks.clone();
    state.store.create_job(job)?;

    match dispatch::dispatch(state.transport.as_ref(), &job_id, &chunk_list) {
        Ok(()) => {
            state.store.apply_transition(&job_id, |current| {
                let mut next = current.clone();
                if next.status == JobStatus::Pending {
                    next.status = JobStatus::Running;
                }
                Ok(next)
            })?;
            info!(
                "job {} creado: {} chunks sobre {}",
                job_id,
                chunk_list.len(),
                dataset_ref
            );
            Ok(job_id)
        }
        Err(e) => {
            error!("dispatch incompleto para el job {}: {}", job_id, e);
            state.store.apply_transition(&job_id, |current| {
                let mut next = current.clone();
                next.status = JobStatus::Failed;
                next.failure_reason = Some(e.to_string());
                next.finished_at = Some(Utc::now());
                Ok(next)
            })?;
            Err(e)
        }
    }
}

/// Consulta de estado: proyección de sólo lectura del último estado
/// commiteado, nunca uno aplicado a medias.
pub fn status(state: &AppState, job_id: &str) -> Result<JobView, CoordError> {
    Ok(state.store.get_job(job_id)?.view())
}

/// Cancela un job: transición al terminal CANCELLED bajo la misma
/// disciplina CAS que todo lo demás; los reportes posteriores se ignoran
/// igual que para COMPLETED/FAILED. Sobre un job ya terminal es un no-op
/// idempotente.
pub fn cancel(state: &AppState, job_id: &str) -> Result<JobView, CoordError> {
    let job = state.store.apply_transition(job_id, |current| {
        if current.is_terminal() {
            return Ok(current.clone());
        }
        let mut next = current.clone();
        next.status = JobStatus::Cancelled;
        next.finished_at = Some(Utc::now());
        Ok(next)
    })?;
    info!("job {} -> {:?}", job_id, job.status);
    Ok(job.view())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator;
    use crate::config::Config;
    use common::{report_id, ReportOutcome, WorkerReport};
    use std::collections::HashMap;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(sub: &str) -> PathBuf {
        let base = env::temp_dir().join("orchestrator_tests").join(sub);
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).unwrap();
        base
    }

    fn state_con_data_dir(dir: &std::path::Path, queue_capacity: usize) -> AppState {
        AppState::new(Config {
            bind_addr: "127.0.0.1:0".to_string(),
            data_dir: dir.to_string_lossy().to_string(),
            default_chunk_count: 4,
            max_chunk_attempts: 3,
            queue_capacity,
        })
    }

    fn write_dataset(dir: &std::path::Path, lines: usize) -> String {
        let path = dir.join("test.csv");
        let body: String = (0..lines).map(|i| format!("{i},{i}\n")).collect();
        fs::write(&path, body).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn submit_crea_un_job_running_con_sus_tareas() {
        let dir = temp_dir("submit_ok");
        let state = state_con_data_dir(&dir, 64);
        let dataset = write_dataset(&dir, 8);

        let job_id = submit(&state, &dataset, Some(4)).unwrap();

        let view = status(&state, &job_id).unwrap();
        assert_eq!(view.status, JobStatus::Running);
        assert_eq!(view.progress_percent, 0);

        let mut tareas = 0;
        while let Some(task) = state.transport.poll() {
            assert_eq!(task.job_id, job_id);
            assert_eq!(task.total_chunks, 4);
            tareas += 1;
        }
        assert_eq!(tareas, 4);
    }

    #[test]
    fn submit_con_dataset_vacio_no_crea_nada() {
        let dir = temp_dir("submit_vacio");
        let state = state_con_data_dir(&dir, 64);
        let dataset = write_dataset(&dir, 0);

        let err = submit(&state, &dataset, Some(4)).unwrap_err();
        assert!(matches!(err, CoordError::InvalidDataset(_)));

        // ni registro ni tareas
        assert!(state.store.list_views().is_empty());
        assert!(state.transport.poll().is_none());
    }

    #[test]
    fn dispatch_parcial_fuerza_el_job_a_failed() {
        let dir = temp_dir("dispatch_parcial");
        // cola para 2 mensajes, job de 4 chunks
        let state = state_con_data_dir(&dir, 2);
        let dataset = write_dataset(&dir, 8);

        let err = submit(&state, &dataset, Some(4)).unwrap_err();
        assert!(matches!(err, CoordError::Dispatch(_)));

        let views = state.store.list_views();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].status, JobStatus::Failed);
    }

    #[test]
    fn status_de_job_desconocido_es_not_found() {
        let dir = temp_dir("status_desconocido");
        let state = state_con_data_dir(&dir, 64);

        let err = status(&state, "no-existe").unwrap_err();
        assert!(matches!(err, CoordError::NotFound(_)));
    }

    #[test]
    fn cancel_es_terminal_y_los_reportes_posteriores_se_ignoran() {
        let dir = temp_dir("cancel");
        let state = state_con_data_dir(&dir, 64);
        let dataset = write_dataset(&dir, 8);

        let job_id = submit(&state, &dataset, Some(2)).unwrap();

        let view = cancel(&state, &job_id).unwrap();
        assert_eq!(view.status, JobStatus::Cancelled);

        // cancel repetido: no-op idempotente
        let view = cancel(&state, &job_id).unwrap();
        assert_eq!(view.status, JobStatus::Cancelled);

        let mut artifact = HashMap::new();
        artifact.insert("w".to_string(), vec![1.0]);
        let report = WorkerReport {
            job_id: job_id.clone(),
            chunk_index: 0,
            report_id: report_id(&job_id, 0, 0),
            outcome: ReportOutcome::Success,
            artifact: Some(artifact),
            reason: None,
        };
        let job = aggregator::on_report(
            &state.store,
            state.transport.as_ref(),
            state.config.max_chunk_attempts,
            &report,
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
        assert!(job.completed.is_empty());
    }
}
