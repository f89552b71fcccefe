//! Force population figures.
//!
//! Published tables give populations like `"1.2m"`. These are normalised
//! to whole numbers before crime rates are computed.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::PipelineError;
use crate::output::{create_file, read_records, write_records};

/// Columns of a cleaned population table.
pub const POPULATION_COLUMNS: &[&str] = &["police_force_id", "population"];

/// A population row as published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationRecord {
    /// Force identifier.
    pub police_force_id: String,
    /// Raw population, e.g. `"1.2m"` or `"850000"`.
    pub population: String,
}

/// A force's population as a whole number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcePopulation {
    /// Force identifier.
    pub police_force_id: String,
    /// Number of residents.
    pub population: u64,
}

/// Converts a raw population into a whole number.
///
/// A trailing `m` or `M` means millions (`"1.2m"` is 1,200,000) and is
/// rounded to the nearest integer. Other values must be plain numbers;
/// thousands separators are ignored.
///
/// # Errors
///
/// Returns [`PipelineError::Population`] for empty, negative, or
/// non-numeric values.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clean_population(value: &str) -> Result<u64, PipelineError> {
    let invalid = || PipelineError::Population {
        value: value.to_string(),
    };

    let trimmed = value.trim().replace(',', "");
    let (number, scale) = match trimmed.strip_suffix(['m', 'M']) {
        Some(number) => (number.trim_end(), 1_000_000.0),
        None => (trimmed.as_str(), 1.0),
    };

    let parsed: f64 = number.parse().map_err(|_| invalid())?;
    let scaled = (parsed * scale).round();
    if !scaled.is_finite() || scaled < 0.0 {
        return Err(invalid());
    }

    Ok(scaled as u64)
}

/// Cleans every row of a population table.
///
/// # Errors
///
/// Returns [`PipelineError::Population`] for the first invalid value.
pub fn clean_population_table(
    records: Vec<PopulationRecord>,
) -> Result<Vec<ForcePopulation>, PipelineError> {
    records
        .into_iter()
        .map(|record| {
            Ok(ForcePopulation {
                population: clean_population(&record.population)?,
                police_force_id: record.police_force_id,
            })
        })
        .collect()
}

/// Reads a population CSV, raw or already cleaned, and cleans it.
///
/// Columns other than `police_force_id` and `population` are ignored.
///
/// # Errors
///
/// Returns [`PipelineError`] if the file cannot be read or a value is
/// invalid.
pub fn read_population_csv(path: &Path) -> Result<Vec<ForcePopulation>, PipelineError> {
    let records: Vec<PopulationRecord> = read_records(std::fs::File::open(path)?)?;
    clean_population_table(records)
}

/// Writes a cleaned population table.
///
/// # Errors
///
/// Returns [`PipelineError`] if the file cannot be created or written.
pub fn write_population_csv(
    path: &Path,
    populations: &[ForcePopulation],
) -> Result<(), PipelineError> {
    write_records(create_file(path)?, POPULATION_COLUMNS, populations)?;
    log::info!(
        "Wrote {} population row(s) to {}",
        populations.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millions_suffix_is_scaled() {
        assert_eq!(clean_population("1.2m").unwrap(), 1_200_000);
        assert_eq!(clean_population("0.65M").unwrap(), 650_000);
        assert_eq!(clean_population(" 2 m ").unwrap(), 2_000_000);
    }

    #[test]
    fn rounding_removes_float_noise() {
        assert_eq!(clean_population("1.1m").unwrap(), 1_100_000);
        assert_eq!(clean_population("0.25m").unwrap(), 250_000);
    }

    #[test]
    fn plain_numbers_pass_through() {
        assert_eq!(clean_population("850000").unwrap(), 850_000);
        assert_eq!(clean_population("1,234,567").unwrap(), 1_234_567);
    }

    #[test]
    fn invalid_values_are_errors() {
        for value in ["", "m", "lots", "-1.2m", "1.2k"] {
            assert!(
                matches!(clean_population(value), Err(PipelineError::Population { .. })),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn cleans_table_rows() {
        let cleaned = clean_population_table(vec![
            PopulationRecord {
                police_force_id: "kent".to_string(),
                population: "1.9m".to_string(),
            },
            PopulationRecord {
                police_force_id: "city-of-london".to_string(),
                population: "8600".to_string(),
            },
        ])
        .unwrap();

        assert_eq!(
            cleaned,
            vec![
                ForcePopulation {
                    police_force_id: "kent".to_string(),
                    population: 1_900_000,
                },
                ForcePopulation {
                    police_force_id: "city-of-london".to_string(),
                    population: 8_600,
                },
            ]
        );
    }

    #[test]
    fn reads_raw_csv_with_extra_columns() {
        let text = "police_force_id,police_force_name,population\nkent,Kent Police,1.9m\n";
        let records: Vec<PopulationRecord> = read_records(text.as_bytes()).unwrap();
        let cleaned = clean_population_table(records).unwrap();
        assert_eq!(cleaned[0].population, 1_900_000);
    }
}
