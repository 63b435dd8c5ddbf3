use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportOutcome {
    Success,
    Failure,
}

/// Reporte de un worker al terminar (bien o mal) un chunk. El transporte
/// es at-least-once: el mismo reporte lógico puede llegar varias veces y
/// el agregador lo reconoce por `report_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerReport {
    pub job_id: JobId,
    pub chunk_index: u32,

    /// Id determinista derivado de (job, chunk, intento); ver `report_id`.
    pub report_id: String,

    pub outcome: ReportOutcome,

    /// Resultado parcial del entrenamiento: parámetro -> vector numérico.
    /// Sólo presente en reportes success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<HashMap<String, Vec<f64>>>,

    /// Motivo del fallo. Sólo presente en reportes failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Id determinista de reporte. No es aleatorio a propósito: la redelivery
/// del mismo intento produce exactamente el mismo id, y eso es lo que
/// permite deduplicar; un re-despacho real lleva otro número de intento.
pub fn report_id(job_id: &str, chunk_index: u32, attempt: u32) -> String {
    format!("{job_id}:{chunk_index}:{attempt}")
}
