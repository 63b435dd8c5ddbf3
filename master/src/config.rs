use std::env;

/// Configuración del master, tomada de variables de entorno.
/// - En Docker: MASTER_BIND=0.0.0.0:8080, DATA_DIR=/data
/// - Local: los defaults alcanzan
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,

    /// Directorio base local: los chunks materializados van a
    /// {data_dir}/chunks.
    pub data_dir: String,

    /// Cantidad de chunks por job si el submit no la especifica.
    pub default_chunk_count: u32,

    /// Reintentos permitidos por chunk; un fallo más allá de este
    /// límite agota el chunk y arrastra el job a FAILED.
    pub max_chunk_attempts: u32,

    /// Capacidad de la cola de tareas en memoria.
    pub queue_capacity: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("MASTER_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "/data".to_string()),
            default_chunk_count: env_u32("CHUNK_COUNT", 4),
            max_chunk_attempts: env_u32("MAX_CHUNK_ATTEMPTS", 3),
            queue_capacity: env_u32("QUEUE_CAPACITY", 1024) as usize,
        }
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(default)
}
