use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};

/// "Entrenamiento" de un chunk: para el plano de coordinación esto es una
/// función opaca chunk -> resultado parcial. Acá computamos la media por
/// columna de registros CSV numéricos ("w") y la cantidad de registros
/// ("b") como stand-in determinista de un fit real.
pub fn train(chunk_ref: &str) -> Result<HashMap<String, Vec<f64>>> {
    let file =
        File::open(chunk_ref).with_context(|| format!("no se pudo abrir el chunk {chunk_ref}"))?;
    let reader = BufReader::new(file);

    let mut sums: Vec<f64> = Vec::new();
    let mut rows: u64 = 0;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let values: Vec<f64> = line
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .with_context(|| format!("registro no numérico en {chunk_ref}: {line}"))?;

        if sums.is_empty() {
            sums = vec![0.0; values.len()];
        }
        if values.len() != sums.len() {
            bail!(
                "registro con {} columnas en {chunk_ref}, esperaba {}",
                values.len(),
                sums.len()
            );
        }

        for (s, v) in sums.iter_mut().zip(&values) {
            *s += v;
        }
        rows += 1;
    }

    let mut artifact = HashMap::new();
    if rows > 0 {
        artifact.insert(
            "w".to_string(),
            sums.iter().map(|s| s / rows as f64).collect(),
        );
    }
    // un chunk vacío igual reporta: aporta 0 registros al conteo
    artifact.insert("b".to_string(), vec![rows as f64]);
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use std::path::PathBuf;

    fn temp_chunk(sub: &str, body: &str) -> String {
        let dir: PathBuf = env::temp_dir().join("train_tests");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(sub);
        fs::write(&path, body).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn promedia_las_columnas_del_chunk() {
        let chunk = temp_chunk("ok.csv", "1,2\n3,4\n");
        let artifact = train(&chunk).unwrap();

        assert_eq!(artifact["w"], vec![2.0, 3.0]);
        assert_eq!(artifact["b"], vec![2.0]);
    }

    #[test]
    fn chunk_vacio_reporta_solo_el_conteo() {
        let chunk = temp_chunk("vacio.csv", "");
        let artifact = train(&chunk).unwrap();

        assert!(!artifact.contains_key("w"));
        assert_eq!(artifact["b"], vec![0.0]);
    }

    #[test]
    fn registro_no_numerico_falla() {
        let chunk = temp_chunk("malo.csv", "1,2\nx,4\n");
        assert!(train(&chunk).is_err());
    }

    #[test]
    fn columnas_inconsistentes_fallan() {
        let chunk = temp_chunk("inconsistente.csv", "1,2\n3\n");
        assert!(train(&chunk).is_err());
    }
}
