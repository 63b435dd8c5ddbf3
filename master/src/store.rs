use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use common::{CoordError, Job, JobId};

/// Reintentos de CAS antes de rendirse con TransientStore. La transición
/// nunca bloquea al caller indefinidamente: si la contención no afloja,
/// el caller puede redeliverar el reporte más tarde.
const MAX_CAS_RETRIES: u32 = 8;

struct Versioned {
    /// Número de versión que respalda el compare-and-swap por job.
    version: u64,
    job: Job,
}

/// Store de jobs en memoria. Es el único dueño del registro autoritativo:
/// toda mutación pasa por `apply_transition`, que commitea sólo si la
/// versión leída no cambió. Dos transiciones concurrentes sobre el mismo
/// job nunca se pisan; jobs distintos no contienden entre sí.
pub struct JobStore {
    jobs: Mutex<HashMap<JobId, Versioned>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn create_job(&self, job: Job) -> Result<JobId, CoordError> {
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.contains_key(&job.id) {
            return Err(CoordError::DuplicateJob(job.id.clone()));
        }
        let id = job.id.clone();
        jobs.insert(id.clone(), Versioned { version: 0, job });
        Ok(id)
    }

    pub fn get_job(&self, job_id: &str) -> Result<Job, CoordError> {
        let jobs = self.jobs.lock().unwrap();
        jobs.get(job_id)
            .map(|v| v.job.clone())
            .ok_or_else(|| CoordError::NotFound(job_id.to_string()))
    }

    pub fn list_views(&self) -> Vec<common::JobView> {
        let jobs = self.jobs.lock().unwrap();
        jobs.values().map(|v| v.job.view()).collect()
    }

    /// Aplica `f` sobre un snapshot del job y commitea bajo chequeo de
    /// versión. `f` corre fuera del lock: si otra transición ganó la
    /// carrera, se reintenta sobre el estado fresco hasta MAX_CAS_RETRIES.
    /// Un error de `f` corta de inmediato y se propaga sin commitear.
    pub fn apply_transition<F>(&self, job_id: &str, f: F) -> Result<Job, CoordError>
    where
        F: Fn(&Job) -> Result<Job, CoordError>,
    {
        for _ in 0..MAX_CAS_RETRIES {
            let (version, snapshot) = {
                let jobs = self.jobs.lock().unwrap();
                let entry = jobs
                    .get(job_id)
                    .ok_or_else(|| CoordError::NotFound(job_id.to_string()))?;
                (entry.version, entry.job.clone())
            };

            let mut next = f(&snapshot)?;
            next.updated_at = Utc::now();

            let mut jobs = self.jobs.lock().unwrap();
            match jobs.get_mut(job_id) {
                Some(entry) if entry.version == version => {
                    entry.version += 1;
                    entry.job = next.clone();
                    return Ok(next);
                }
                // perdimos la carrera: reintentar sobre el estado nuevo
                Some(_) => continue,
                None => return Err(CoordError::NotFound(job_id.to_string())),
            }
        }

        Err(CoordError::TransientStore(job_id.to_string()))
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ChunkDescriptor, JobStatus};
    use std::sync::Arc;
    use std::thread;

    fn job_de_prueba(id: &str, n: u32) -> Job {
        let chunks = (0..n)
            .map(|i| ChunkDescriptor {
                index: i,
                chunk_ref: format!("/tmp/{id}-chunk-{i}"),
                size_records: 5,
            })
            .collect();
        Job::new(id.to_string(), "dataset".to_string(), chunks)
    }

    #[test]
    fn create_y_get_devuelven_el_job() {
        let store = JobStore::new();
        store.create_job(job_de_prueba("j1", 2)).unwrap();

        let job = store.get_job("j1").unwrap();
        assert_eq!(job.id, "j1");
        assert_eq!(job.total_chunks(), 2);
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn get_de_job_desconocido_es_not_found() {
        let store = JobStore::new();
        let err = store.get_job("nope").unwrap_err();
        assert!(matches!(err, CoordError::NotFound(_)));
    }

    #[test]
    fn create_con_id_repetido_falla() {
        let store = JobStore::new();
        store.create_job(job_de_prueba("j1", 2)).unwrap();
        let err = store.create_job(job_de_prueba("j1", 2)).unwrap_err();
        assert!(matches!(err, CoordError::DuplicateJob(_)));
    }

    #[test]
    fn apply_transition_commitea_y_devuelve_el_estado_nuevo() {
        let store = JobStore::new();
        store.create_job(job_de_prueba("j1", 2)).unwrap();

        let job = store
            .apply_transition("j1", |current| {
                let mut next = current.clone();
                next.status = JobStatus::Running;
                Ok(next)
            })
            .unwrap();

        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(store.get_job("j1").unwrap().status, JobStatus::Running);
    }

    #[test]
    fn un_error_de_la_transicion_no_commitea_nada() {
        let store = JobStore::new();
        store.create_job(job_de_prueba("j1", 2)).unwrap();

        let err = store
            .apply_transition("j1", |_| {
                Err(CoordError::InvalidReport("prueba".to_string()))
            })
            .unwrap_err();

        assert!(matches!(err, CoordError::InvalidReport(_)));
        assert_eq!(store.get_job("j1").unwrap().status, JobStatus::Pending);
    }

    #[test]
    fn transiciones_concurrentes_no_pierden_actualizaciones() {
        let store = Arc::new(JobStore::new());
        store.create_job(job_de_prueba("j1", 8)).unwrap();

        let mut handles = Vec::new();
        for i in 0..8u32 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store
                    .apply_transition("j1", |current| {
                        let mut next = current.clone();
                        next.completed.insert(i);
                        Ok(next)
                    })
                    .unwrap();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let job = store.get_job("j1").unwrap();
        assert_eq!(job.completed.len(), 8, "ninguna actualización se perdió");
    }
}
