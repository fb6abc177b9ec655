use crate::domain::model::Poi;
use crate::utils::error::{IsochroneError, Result};
use crate::utils::validation::validate_file_extension;
use std::path::Path;

pub const POI_FILE_EXTENSIONS: [&str; 2] = ["json", "csv"];

/// Reads a POI catalog from a JSON array or a CSV file with header
/// `id,name,lat,lng,category,description,rating`.
pub fn load_pois<P: AsRef<Path>>(path: P) -> Result<Vec<Poi>> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();
    validate_file_extension("pois", &path_str, &POI_FILE_EXTENSIONS)?;

    let bytes = std::fs::read(path)?;
    let pois = match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase) {
        Some(ext) if ext == "csv" => parse_csv(&bytes)?,
        _ => serde_json::from_slice::<Vec<Poi>>(&bytes)?,
    };

    tracing::debug!("loaded {} POIs from {}", pois.len(), path_str);
    Ok(pois)
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<Poi>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    reader
        .deserialize::<Poi>()
        .map(|row| row.map_err(IsochroneError::from))
        .collect()
}
