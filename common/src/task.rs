use serde::{Deserialize, Serialize};

use crate::JobId;

/// Mensaje de tarea que el dispatcher emite al transporte, uno por chunk.
/// La clave es el job_id; el orden de entrega es best-effort y los
/// consumidores no deben asumir ninguno.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMessage {
    pub job_id: JobId,
    pub chunk_index: u32,
    pub chunk_ref: String,
    pub total_chunks: u32,

    /// Número de intento (0 en el dispatch inicial, crece en cada
    /// re-despacho tras un fallo). El worker lo necesita para derivar
    /// un report_id determinista: la redelivery del mismo intento
    /// reproduce el mismo id.
    pub attempt: u32,
}

/// Respuesta al poll de un worker: la siguiente tarea pendiente, si hay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPollResponse {
    pub task: Option<TaskMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportAck {
    pub ok: bool,
}
