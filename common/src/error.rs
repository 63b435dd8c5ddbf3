use thiserror::Error;

/// Taxonomía de errores del plano de coordinación.
#[derive(Debug, Error)]
pub enum CoordError {
    /// El dataset no se puede resolver o está vacío.
    /// Se rechaza el submit y el job nunca llega a crearse.
    #[error("dataset inválido: {0}")]
    InvalidDataset(String),

    /// El transporte rechazó un mensaje de tarea. Un job despachado a
    /// medias se fuerza a FAILED: un chunk nunca emitido estancaría el
    /// progreso para siempre.
    #[error("fallo de dispatch: {0}")]
    Dispatch(String),

    /// Contención sostenida sobre el registro del job. Reintentable por
    /// el caller (el reporte se puede redeliverar); nunca es fallo del job.
    #[error("conflicto transitorio en el store para el job {0}")]
    TransientStore(String),

    /// Colisión de id al crear un job. Con ids uuid v4 es prácticamente
    /// inalcanzable, pero el store lo reporta igual.
    #[error("ya existe un job con id {0}")]
    DuplicateJob(String),

    /// Job desconocido.
    #[error("job no encontrado: {0}")]
    NotFound(String),

    /// Resultado parcial malformado (vector vacío, valores no finitos,
    /// largo inconsistente). Se rechaza sin consumir el report_id, así
    /// una redelivery corregida todavía puede aplicarse.
    #[error("artefacto inválido: {0}")]
    InvalidArtifact(String),

    /// Reporte que no se corresponde con el job (ej: índice de chunk
    /// fuera de rango).
    #[error("reporte inválido: {0}")]
    InvalidReport(String),

    #[error("error de io: {0}")]
    Io(#[from] std::io::Error),
}
