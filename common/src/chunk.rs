use serde::{Deserialize, Serialize};

/// Descriptor de un chunk: una partición contigua del dataset, la unidad
/// de trabajo que se despacha a un worker. Se crea en el particionado y
/// no se muta nunca más.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkDescriptor {
    /// Índice 0-based, denso y contiguo dentro del job.
    pub index: u32,

    /// Ubicación del chunk ya materializado, direccionada de forma
    /// determinista por (dataset, índice): re-particionar el mismo
    /// dataset con el mismo conteo produce las mismas refs.
    pub chunk_ref: String,

    /// Cantidad de registros que cayeron en este chunk.
    pub size_records: u64,
}
