use std::collections::VecDeque;
use std::sync::Mutex;

use common::{ChunkDescriptor, CoordError, TaskMessage};
use tracing::debug;

/// Frontera con el transporte de tareas. El master sólo conoce `send`;
/// la entrega es best-effort, at-least-once y sin garantía de orden.
pub trait TaskTransport: Send + Sync {
    fn send(&self, task: TaskMessage) -> Result<(), CoordError>;
}

/// Transporte en memoria: una cola acotada que los workers drenan por
/// HTTP (POST /tasks/next). Cuando la cola está llena el send se rechaza
/// con Dispatch, igual que lo haría un broker saturado.
pub struct QueueTransport {
    capacity: usize,
    queue: Mutex<VecDeque<TaskMessage>>,
}

impl QueueTransport {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Saca la siguiente tarea pendiente, si hay.
    pub fn poll(&self) -> Option<TaskMessage> {
        self.queue.lock().unwrap().pop_front()
    }
}

impl TaskTransport for QueueTransport {
    fn send(&self, task: TaskMessage) -> Result<(), CoordError> {
        let mut queue = self.queue.lock().unwrap();
        if queue.len() >= self.capacity {
            return Err(CoordError::Dispatch(format!(
                "cola de tareas llena ({} mensajes)",
                self.capacity
            )));
        }
        queue.push_back(task);
        Ok(())
    }
}

/// Emite un mensaje de tarea por chunk, con clave job_id e intento 0.
/// Corta en el primer rechazo del transporte: el orquestador decide qué
/// hacer con el job (lo fuerza a FAILED en vez de dejarlo corto de
/// tareas en silencio).
pub fn dispatch(
    transport: &dyn TaskTransport,
    job_id: &str,
    chunks: &[ChunkDescriptor],
) -> Result<(), CoordError> {
    let total = chunks.len() as u32;

    for chunk in chunks {
        transport.send(TaskMessage {
            job_id: job_id.to_string(),
            chunk_index: chunk.index,
            chunk_ref: chunk.chunk_ref.clone(),
            total_chunks: total,
            attempt: 0,
        })?;
        debug!(
            "tarea despachada: job={} chunk={} ref={}",
            job_id, chunk.index, chunk.chunk_ref
        );
    }
    Ok(())
}
