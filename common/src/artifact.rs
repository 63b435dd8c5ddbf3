use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::CoordError;

/// Estado acumulado de un parámetro dentro del artefacto fusionado:
/// la media corrida del vector y cuántos chunks contribuyeron a ella.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamState {
    pub mean: Vec<f64>,
    pub contributions: u32,
}

/// Artefacto fusionado del job: nombre de parámetro -> media corrida de
/// los vectores reportados por los chunks. La política es promedio, no
/// last-write-wins: cada chunk que aporta un parámetro re-normaliza la
/// media, así el resultado final no depende del orden de llegada.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub params: HashMap<String, ParamState>,
}

impl Artifact {
    /// Valida un resultado parcial en el ingreso: vectores no vacíos,
    /// valores finitos, y largo consistente con lo ya acumulado para
    /// ese parámetro.
    pub fn validate_partial(
        &self,
        partial: &HashMap<String, Vec<f64>>,
    ) -> Result<(), CoordError> {
        for (name, values) in partial {
            if values.is_empty() {
                return Err(CoordError::InvalidArtifact(format!(
                    "parámetro '{name}' con vector vacío"
                )));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(CoordError::InvalidArtifact(format!(
                    "parámetro '{name}' con valores no finitos"
                )));
            }
            if let Some(existing) = self.params.get(name) {
                if existing.mean.len() != values.len() {
                    return Err(CoordError::InvalidArtifact(format!(
                        "parámetro '{name}' con largo {} pero lo acumulado tiene {}",
                        values.len(),
                        existing.mean.len()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Incorpora un resultado parcial con media corrida por parámetro:
    /// mean' = mean + (x - mean) / (n + 1). Para índices de chunk
    /// distintos el resultado es el mismo en cualquier orden de llegada;
    /// los duplicados se filtran antes de llegar acá (por report_id).
    pub fn merge(&mut self, partial: &HashMap<String, Vec<f64>>) -> Result<(), CoordError> {
        self.validate_partial(partial)?;

        for (name, values) in partial {
            match self.params.get_mut(name) {
                None => {
                    self.params.insert(
                        name.clone(),
                        ParamState {
                            mean: values.clone(),
                            contributions: 1,
                        },
                    );
                }
                Some(param) => {
                    let n = param.contributions as f64;
                    for (m, x) in param.mean.iter_mut().zip(values) {
                        *m += (*x - *m) / (n + 1.0);
                    }
                    param.contributions += 1;
                }
            }
        }
        Ok(())
    }
}
