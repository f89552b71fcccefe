//! CSV persistence for crime, force, and neighbourhood tables.
//!
//! Headers are written from fixed column lists rather than derived from
//! the first record, so an empty table still produces a header row.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use uk_crime_crime_models::{CRIME_ROW_COLUMNS, CrimeRow, Neighbourhood, PoliceForce};

use crate::PipelineError;
use crate::clean::CrimeTable;

/// Columns of a force table.
pub const FORCE_COLUMNS: &[&str] = &["police_force_id", "police_force_name"];

/// Columns of a neighbourhood table.
pub const NEIGHBOURHOOD_COLUMNS: &[&str] =
    &["neighbourhood_id", "neighbourhood_name", "police_force_id"];

/// Writes `records` as CSV under an explicit header.
///
/// # Errors
///
/// Returns [`PipelineError`] if serialization or the underlying write
/// fails.
pub fn write_records<W: Write, T: Serialize>(
    writer: W,
    columns: &[&str],
    records: &[T],
) -> Result<(), PipelineError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(columns)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Reads CSV records, matching columns by header name.
///
/// # Errors
///
/// Returns [`PipelineError::Csv`] if a row does not fit `T`.
pub fn read_records<R: Read, T: DeserializeOwned>(reader: R) -> Result<Vec<T>, PipelineError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    Ok(csv_reader.deserialize().collect::<Result<Vec<T>, _>>()?)
}

/// Creates `path` (and its parent directory) for writing.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the file cannot be created.
pub fn create_file(path: &Path) -> Result<File, PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

/// Writes a cleaned crime table in [`CRIME_ROW_COLUMNS`] order.
///
/// # Errors
///
/// Returns [`PipelineError`] if writing fails.
pub fn write_crime_table<W: Write>(writer: W, table: &CrimeTable) -> Result<(), PipelineError> {
    write_records(writer, CRIME_ROW_COLUMNS, &table.rows)
}

/// Writes a cleaned crime table to `path`.
///
/// # Errors
///
/// Returns [`PipelineError`] if the file cannot be created or written.
pub fn write_crime_csv(path: &Path, table: &CrimeTable) -> Result<(), PipelineError> {
    write_crime_table(create_file(path)?, table)?;
    log::info!("Wrote {} crime(s) to {}", table.len(), path.display());
    Ok(())
}

/// Reads a crime table previously written by [`write_crime_table`].
///
/// # Errors
///
/// Returns [`PipelineError::Csv`] if a row is malformed.
pub fn read_crime_table<R: Read>(reader: R) -> Result<CrimeTable, PipelineError> {
    read_records::<_, CrimeRow>(reader).map(CrimeTable::from)
}

/// Reads a crime CSV from `path`.
///
/// # Errors
///
/// Returns [`PipelineError`] if the file cannot be read or parsed.
pub fn read_crime_csv(path: &Path) -> Result<CrimeTable, PipelineError> {
    read_crime_table(File::open(path)?)
}

/// Writes forces as `police_force_id,police_force_name`.
///
/// # Errors
///
/// Returns [`PipelineError`] if the file cannot be created or written.
pub fn write_forces_csv(path: &Path, forces: &[PoliceForce]) -> Result<(), PipelineError> {
    write_records(create_file(path)?, FORCE_COLUMNS, forces)?;
    log::info!("Wrote {} force(s) to {}", forces.len(), path.display());
    Ok(())
}

/// Reads a force CSV written by [`write_forces_csv`].
///
/// # Errors
///
/// Returns [`PipelineError`] if the file cannot be read or parsed.
pub fn read_forces_csv(path: &Path) -> Result<Vec<PoliceForce>, PipelineError> {
    read_records(File::open(path)?)
}

/// Writes neighbourhoods with their owning force.
///
/// # Errors
///
/// Returns [`PipelineError`] if the file cannot be created or written.
pub fn write_neighbourhoods_csv(
    path: &Path,
    neighbourhoods: &[Neighbourhood],
) -> Result<(), PipelineError> {
    write_records(create_file(path)?, NEIGHBOURHOOD_COLUMNS, neighbourhoods)?;
    log::info!(
        "Wrote {} neighbourhood(s) to {}",
        neighbourhoods.len(),
        path.display()
    );
    Ok(())
}
