use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::artifact::Artifact;
use crate::chunk::ChunkDescriptor;
use crate::JobId;

/// Motivo registrado cuando un chunk agota sus reintentos y arrastra el
/// job a FAILED.
pub const CHUNK_RETRY_EXHAUSTED: &str = "ChunkRetryExhausted";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Un job terminal es inmutable salvo para lectura.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Registro autoritativo de un job de entrenamiento. Vive en el store y
/// sólo se muta a través de su primitiva de transición; ningún componente
/// guarda memoria entre llamadas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub dataset_ref: String,

    /// Lista ordenada de chunks, fijada al particionar.
    pub chunks: Vec<ChunkDescriptor>,

    pub status: JobStatus,

    /// Índices de chunks completados. El progreso se deriva siempre de
    /// este set, nunca se guarda como contador aparte.
    pub completed: BTreeSet<u32>,

    /// chunk_index -> intentos fallidos acumulados.
    pub failed_attempts: HashMap<u32, u32>,

    /// Chunks que agotaron sus reintentos.
    pub exhausted: BTreeSet<u32>,

    /// report_ids ya procesados, para reconocer redeliveries.
    pub processed_reports: HashSet<String>,

    /// Artefacto fusionado (media corrida por parámetro).
    pub artifact: Artifact,

    /// Motivo del estado FAILED, si aplica.
    pub failure_reason: Option<String>,

    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(id: JobId, dataset_ref: String, chunks: Vec<ChunkDescriptor>) -> Self {
        let now = Utc::now();
        Self {
            id,
            dataset_ref,
            chunks,
            status: JobStatus::Pending,
            completed: BTreeSet::new(),
            failed_attempts: HashMap::new(),
            exhausted: BTreeSet::new(),
            processed_reports: HashSet::new(),
            artifact: Artifact::default(),
            failure_reason: None,
            submitted_at: now,
            updated_at: now,
            finished_at: None,
        }
    }

    pub fn total_chunks(&self) -> u32 {
        self.chunks.len() as u32
    }

    /// Progreso derivado: 100 * |completados| / total.
    pub fn progress_percent(&self) -> u32 {
        let total = self.chunks.len();
        if total == 0 {
            return 0;
        }
        (100 * self.completed.len() / total) as u32
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Proyección de sólo lectura para consultas de estado. El artefacto
    /// fusionado sólo se expone una vez COMPLETED.
    pub fn view(&self) -> JobView {
        JobView {
            job_id: self.id.clone(),
            status: self.status,
            progress_percent: self.progress_percent(),
            failure_reason: self.failure_reason.clone(),
            artifact: if self.status == JobStatus::Completed {
                Some(self.artifact.clone())
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress_percent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
}

/// Body de POST /jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub dataset_ref: String,

    /// Cantidad de chunks; si falta se usa la configurada en el master.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: JobId,
}
