use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use common::{ChunkDescriptor, CoordError};
use tracing::info;

/// Particiona el dataset (un registro por línea) en `chunk_count` grupos
/// contiguos y no solapados. Todos los chunks salvo el último llevan
/// ceil(n / c) registros; el último absorbe el resto, así la suma da
/// exactamente n. Función pura de (dataset, conteo): re-particionar con
/// los mismos argumentos reproduce las mismas refs.
///
/// Precondición: chunk_count >= 1 (el orquestador la garantiza).
pub fn partition(
    data_dir: &str,
    dataset_ref: &str,
    chunk_count: u32,
) -> Result<Vec<ChunkDescriptor>, CoordError> {
    let file = File::open(dataset_ref).map_err(|e| {
        CoordError::InvalidDataset(format!("no se pudo resolver {dataset_ref}: {e}"))
    })?;
    let reader = BufReader::new(file);

    let records: Vec<String> = reader
        .lines()
        .collect::<Result<_, _>>()
        .map_err(CoordError::Io)?;

    if records.is_empty() {
        return Err(CoordError::InvalidDataset(format!(
            "dataset vacío: {dataset_ref}"
        )));
    }

    let total = records.len();
    let count = chunk_count as usize;
    // ceil-division; con n < c los chunks del final quedan en 0 registros
    let base = (total + count - 1) / count;

    let dataset_id = dataset_id_for(dataset_ref);
    let chunk_dir = Path::new(data_dir).join("chunks");
    fs::create_dir_all(&chunk_dir)?;

    let mut chunks = Vec::with_capacity(count);
    let mut offset = 0usize;

    for index in 0..count {
        let remaining = total - offset;
        let size = if index == count - 1 {
            remaining
        } else {
            base.min(remaining)
        };

        let chunk_path = chunk_path_for(&chunk_dir, &dataset_id, index as u32);
        write_chunk_atomic(&chunk_path, &records[offset..offset + size])?;
        offset += size;

        chunks.push(ChunkDescriptor {
            index: index as u32,
            chunk_ref: chunk_path.to_string_lossy().to_string(),
            size_records: size as u64,
        });
    }

    info!(
        "dataset {} particionado en {} chunks ({} registros)",
        dataset_ref, count, total
    );
    Ok(chunks)
}

/// Id del dataset para direccionar chunks: el nombre de archivo.
fn dataset_id_for(dataset_ref: &str) -> String {
    Path::new(dataset_ref)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| dataset_ref.to_string())
}

fn chunk_path_for(chunk_dir: &Path, dataset_id: &str, index: u32) -> PathBuf {
    chunk_dir.join(format!("{dataset_id}-chunk-{index}"))
}

/// Escribe un chunk de forma atómica: primero a un temporal en el mismo
/// directorio y después rename. Un chunk está completo o no existe;
/// nunca se despacha uno a medio escribir.
fn write_chunk_atomic(path: &Path, records: &[String]) -> Result<(), CoordError> {
    // no with_extension: el nombre del chunk lleva puntos y lo truncaría
    let mut tmp_os = path.as_os_str().to_owned();
    tmp_os.push(".tmp");
    let tmp_path = PathBuf::from(tmp_os);

    {
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        for record in records {
            writeln!(writer, "{record}")?;
        }
        writer.flush()?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_dir(sub: &str) -> PathBuf {
        let base = env::temp_dir().join("partition_tests").join(sub);
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).unwrap();
        base
    }

    fn write_dataset(dir: &Path, name: &str, lines: usize) -> String {
        let path = dir.join(name);
        let body: String = (0..lines).map(|i| format!("registro-{i}\n")).collect();
        fs::write(&path, body).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn produce_c_chunks_que_suman_n() {
        let dir = temp_dir("suman_n");
        let dataset = write_dataset(&dir, "test.csv", 10);

        let chunks = partition(dir.to_str().unwrap(), &dataset, 4).unwrap();

        assert_eq!(chunks.len(), 4);
        let sizes: Vec<u64> = chunks.iter().map(|c| c.size_records).collect();
        // ceil(10/4) = 3 para todos menos el último, que absorbe el resto
        assert_eq!(sizes, vec![3, 3, 3, 1]);
        assert_eq!(sizes.iter().sum::<u64>(), 10);

        // índices densos y contiguos desde 0
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i as u32);
        }
    }

    #[test]
    fn suma_exacta_para_todo_c_y_n() {
        let dir = temp_dir("todo_c_y_n");
        for n in [1usize, 2, 3, 5, 8, 13] {
            let dataset = write_dataset(&dir, &format!("ds-{n}.csv"), n);
            for c in 1u32..=6 {
                let chunks = partition(dir.to_str().unwrap(), &dataset, c).unwrap();
                assert_eq!(chunks.len(), c as usize, "n={n} c={c}");
                let sum: u64 = chunks.iter().map(|k| k.size_records).sum();
                assert_eq!(sum, n as u64, "n={n} c={c}");
            }
        }
    }

    #[test]
    fn los_chunks_quedan_materializados_completos() {
        let dir = temp_dir("materializados");
        let dataset = write_dataset(&dir, "test.csv", 7);

        let chunks = partition(dir.to_str().unwrap(), &dataset, 3).unwrap();

        let mut total_lineas = 0;
        for chunk in &chunks {
            let body = fs::read_to_string(&chunk.chunk_ref).unwrap();
            let lineas = body.lines().count() as u64;
            assert_eq!(lineas, chunk.size_records);
            total_lineas += lineas;
        }
        assert_eq!(total_lineas, 7);
    }

    #[test]
    fn reparticionar_reproduce_las_mismas_refs() {
        let dir = temp_dir("reproducible");
        let dataset = write_dataset(&dir, "test.csv", 9);

        let a = partition(dir.to_str().unwrap(), &dataset, 3).unwrap();
        let b = partition(dir.to_str().unwrap(), &dataset, 3).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn dataset_vacio_es_invalido() {
        let dir = temp_dir("vacio");
        let dataset = write_dataset(&dir, "vacio.csv", 0);

        let err = partition(dir.to_str().unwrap(), &dataset, 4).unwrap_err();
        assert!(matches!(err, CoordError::InvalidDataset(_)));
    }

    #[test]
    fn dataset_inexistente_es_invalido() {
        let dir = temp_dir("inexistente");
        let err = partition(dir.to_str().unwrap(), "/no/existe.csv", 4).unwrap_err();
        assert!(matches!(err, CoordError::InvalidDataset(_)));
    }
}
