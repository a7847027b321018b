use crate::config::AppConfig;
use crate::topology::Topology;
use crate::types::PlantRecord;
use anyhow::{Context, Result};
use std::path::Path;

/// Load both inputs concurrently and resolve only when both succeed.
/// If either load fails the whole pipeline fails; nothing downstream
/// runs on a partial result.
pub async fn load_all(config: &AppConfig) -> Result<(Vec<PlantRecord>, Topology)> {
    let (records, topology) = tokio::try_join!(
        load_plants(&config.input.plants_csv),
        load_topology(&config.input.boundaries_json),
    )?;
    println!(
        "Loaded {} plant records and {} topology arcs",
        records.len(),
        topology.arcs.len()
    );
    Ok((records, topology))
}

pub async fn load_plants(path: &Path) -> Result<Vec<PlantRecord>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read plant CSV: {:?}", path))?;
    let mut rdr = csv::ReaderBuilder::new().from_reader(raw.as_bytes());
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: PlantRecord =
            result.with_context(|| format!("Malformed plant record in {:?}", path))?;
        records.push(record);
    }
    Ok(records)
}

pub async fn load_topology(path: &Path) -> Result<Topology> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read boundary topology: {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse topology: {:?}", path))
}

/// Placeholder reshaping stage. Passes the loaded data through
/// untouched; future filtering or renaming hooks in here.
pub fn transform(loaded: (Vec<PlantRecord>, Topology)) -> (Vec<PlantRecord>, Topology) {
    loaded
}
