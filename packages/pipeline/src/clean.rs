//! Cleaning a raw crime table into flat [`CrimeRow`]s.
//!
//! [`clean`] runs four steps in order, each a pure function usable on its
//! own:
//!
//! 1. [`fill_blank_outcome_status`]
//! 2. [`remove_duplicates`]
//! 3. [`extract_coordinates_and_street`]
//! 4. [`extract_date_components`]

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use uk_crime_crime_models::{Coordinate, CrimeRow, OutcomeStatus};

use crate::aggregate::{IdentifierField, RawCrime, RawCrimeTable};

/// Cleaned crimes, ready to be written out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrimeTable {
    /// Rows in first-seen order.
    pub rows: Vec<CrimeRow>,
}

impl CrimeTable {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<CrimeRow>> for CrimeTable {
    fn from(rows: Vec<CrimeRow>) -> Self {
        Self { rows }
    }
}

/// A crime with its location flattened but its month still raw.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedCrime {
    /// Category slug.
    pub category: String,
    /// Raw `YYYY-MM` month.
    pub month: String,
    /// Parsed latitude, `None` when missing or not numeric.
    pub latitude: Option<f64>,
    /// Parsed longitude, `None` when missing or not numeric.
    pub longitude: Option<f64>,
    /// Street description.
    pub street_name: Option<String>,
    /// Street identifier.
    pub street_id: Option<u64>,
    /// Outcome, already defaulted.
    pub outcome_status: OutcomeStatus,
    /// Force the crime was fetched for.
    pub police_force_id: String,
    /// Record identifier.
    pub id: Option<u64>,
    /// Identifier stable across releases.
    pub persistent_id: Option<String>,
    /// `"Force"` or `"BTP"`.
    pub location_type: Option<String>,
    /// BTP location subtype.
    pub location_subtype: Option<String>,
    /// Extra context.
    pub context: Option<String>,
}

/// Runs the full cleaning sequence.
#[must_use]
pub fn clean(table: RawCrimeTable) -> CrimeTable {
    let input = table.len();
    let table = remove_duplicates(fill_blank_outcome_status(table));
    let duplicates = input - table.len();
    if duplicates > 0 {
        log::debug!("Removed {duplicates} duplicate crime(s)");
    }

    let rows = extract_date_components(extract_coordinates_and_street(table));
    log::info!("Cleaned {input} raw crime(s) into {} row(s)", rows.len());

    CrimeTable { rows }
}

/// Replaces a missing or blank outcome with [`OutcomeStatus::UNKNOWN`].
#[must_use]
pub fn fill_blank_outcome_status(mut table: RawCrimeTable) -> RawCrimeTable {
    for row in &mut table.rows {
        let blank = row
            .crime
            .outcome_status
            .as_ref()
            .is_none_or(|outcome| outcome.category.trim().is_empty());
        if blank {
            let date = row
                .crime
                .outcome_status
                .take()
                .and_then(|outcome| outcome.date);
            row.crime.outcome_status = Some(OutcomeStatus {
                date,
                ..OutcomeStatus::unknown()
            });
        }
    }
    table
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum DedupKey {
    Id(u64),
    Location {
        latitude: Option<CoordinateKey>,
        longitude: Option<CoordinateKey>,
        month: String,
        category: String,
    },
}

/// Numeric coordinates compare by value, so `"52.6"` and `"52.60"` match.
#[derive(Debug, PartialEq, Eq, Hash)]
enum CoordinateKey {
    Value(u64),
    Text(String),
}

fn coordinate_key(coordinate: &Coordinate) -> CoordinateKey {
    match coordinate.to_f64() {
        // Adding zero folds -0.0 into 0.0.
        Some(value) => CoordinateKey::Value((value + 0.0).to_bits()),
        None => CoordinateKey::Text(match coordinate {
            Coordinate::Number(value) => value.to_string(),
            Coordinate::Text(text) => text.trim().to_string(),
        }),
    }
}

/// Blank pass-through text becomes `None`, matching how an empty CSV
/// field reads back.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn location_key(row: &RawCrime) -> DedupKey {
    let location = row.crime.location.as_ref();
    DedupKey::Location {
        latitude: location.map(|l| coordinate_key(&l.latitude)),
        longitude: location.map(|l| coordinate_key(&l.longitude)),
        month: row.crime.month.clone(),
        category: row.crime.category.clone(),
    }
}

/// Drops repeated crimes, keeping the first occurrence.
///
/// Tables whose schema declares record ids are deduplicated on `id`; a row
/// without an id falls back to the location key. Tables without ids are
/// deduplicated on (latitude, longitude, month, category). Applying it
/// twice gives the same table as applying it once.
#[must_use]
pub fn remove_duplicates(mut table: RawCrimeTable) -> RawCrimeTable {
    let mut seen = HashSet::with_capacity(table.rows.len());
    let by_id = table.schema.identifier == IdentifierField::RecordId;

    table.rows.retain(|row| {
        let key = match row.crime.id {
            Some(id) if by_id => DedupKey::Id(id),
            _ => location_key(row),
        };
        seen.insert(key)
    });
    table
}

/// Flattens each row's nested location into coordinates and street.
///
/// Coordinates that are missing or not numeric become `None`; the row is
/// kept. Blank text fields (police.uk sends `"context": ""`) become `None`.
#[must_use]
pub fn extract_coordinates_and_street(table: RawCrimeTable) -> Vec<LocatedCrime> {
    table
        .rows
        .into_iter()
        .map(|RawCrime { police_force_id, crime }| {
            let (latitude, longitude, street) = match crime.location {
                Some(location) => (
                    location.latitude.to_f64(),
                    location.longitude.to_f64(),
                    location.street,
                ),
                None => (None, None, None),
            };
            let (street_id, street_name) =
                street.map_or((None, None), |street| (street.id, street.name));

            LocatedCrime {
                category: crime.category,
                month: crime.month,
                latitude,
                longitude,
                street_name: non_blank(street_name),
                street_id,
                outcome_status: crime
                    .outcome_status
                    .unwrap_or_else(OutcomeStatus::unknown),
                police_force_id,
                id: crime.id,
                persistent_id: non_blank(crime.persistent_id),
                location_type: non_blank(crime.location_type),
                location_subtype: non_blank(crime.location_subtype),
                context: non_blank(crime.context),
            }
        })
        .collect()
}

/// Parses a `YYYY-MM` month into `(year, month)`.
#[must_use]
pub fn parse_month(month: &str) -> Option<(i32, u32)> {
    let date = NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d").ok()?;
    Some((date.year(), date.month()))
}

/// Splits the raw `YYYY-MM` month into integer year and month columns.
///
/// An unparseable month leaves both columns empty and is logged; the row
/// is kept.
#[must_use]
pub fn extract_date_components(crimes: Vec<LocatedCrime>) -> Vec<CrimeRow> {
    crimes
        .into_iter()
        .map(|crime| {
            let parsed = parse_month(&crime.month);
            if parsed.is_none() {
                log::warn!(
                    "Unparseable month {:?} for crime {:?} ({})",
                    crime.month,
                    crime.id,
                    crime.police_force_id
                );
            }
            let (year, month) = parsed.unzip();

            CrimeRow {
                category: crime.category,
                latitude: crime.latitude,
                longitude: crime.longitude,
                street_name: crime.street_name,
                year,
                month,
                outcome_status: crime.outcome_status.category,
                police_force_id: Some(crime.police_force_id),
                id: crime.id,
                persistent_id: crime.persistent_id,
                location_type: crime.location_type,
                location_subtype: crime.location_subtype,
                context: crime.context,
                street_id: crime.street_id,
                outcome_date: crime.outcome_status.date,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use uk_crime_crime_models::{CrimeLocation, Street, StreetCrime};

    use super::*;
    use crate::aggregate::{CrimeSchema, aggregate};

    fn street_crime(id: Option<u64>, lat: &str, lng: &str) -> StreetCrime {
        StreetCrime {
            category: "burglary".to_string(),
            month: "2023-09".to_string(),
            location: Some(CrimeLocation {
                latitude: Coordinate::Text(lat.to_string()),
                longitude: Coordinate::Text(lng.to_string()),
                street: Some(Street {
                    id: Some(1_234),
                    name: Some("On or near High Street".to_string()),
                }),
            }),
            outcome_status: None,
            id,
            persistent_id: None,
            location_type: Some("Force".to_string()),
            location_subtype: None,
            context: None,
        }
    }

    fn outcome(category: &str) -> Option<OutcomeStatus> {
        Some(OutcomeStatus {
            category: category.to_string(),
            date: Some("2023-10".to_string()),
        })
    }

    #[test]
    fn null_outcomes_become_unknown() {
        let mut crimes = vec![
            street_crime(Some(1), "52.6", "-1.1"),
            street_crime(Some(2), "52.6", "-1.1"),
            street_crime(Some(3), "52.6", "-1.1"),
        ];
        crimes[1].outcome_status = outcome("Under investigation");

        let table = fill_blank_outcome_status(aggregate(vec![crimes], "kent"));
        let outcomes: Vec<&str> = table
            .rows
            .iter()
            .map(|row| row.crime.outcome_status.as_ref().unwrap().category.as_str())
            .collect();
        assert_eq!(outcomes, ["Unknown", "Under investigation", "Unknown"]);
    }

    #[test]
    fn blank_outcome_category_keeps_its_date() {
        let mut crime = street_crime(Some(1), "52.6", "-1.1");
        crime.outcome_status = outcome("  ");
        let table = fill_blank_outcome_status(aggregate(vec![vec![crime]], "kent"));
        let status = table.rows[0].crime.outcome_status.as_ref().unwrap();
        assert_eq!(status.category, OutcomeStatus::UNKNOWN);
        assert_eq!(status.date.as_deref(), Some("2023-10"));
    }

    #[test]
    fn duplicate_ids_keep_first_row() {
        let first = street_crime(Some(1), "52.6", "-1.1");
        let mut second = street_crime(Some(1), "51.0", "0.5");
        second.category = "robbery".to_string();

        let table = remove_duplicates(aggregate(vec![vec![first.clone(), second]], "kent"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].crime, first);
    }

    #[test]
    fn tables_without_ids_dedup_on_location_tuple() {
        let mut table = aggregate(
            vec![vec![
                street_crime(Some(1), "52.6", "-1.1"),
                street_crime(Some(2), "52.6", "-1.1"),
                street_crime(Some(3), "52.7", "-1.1"),
            ]],
            "kent",
        );
        table.schema = CrimeSchema::WITHOUT_IDS;

        let deduped = remove_duplicates(table);
        let ids: Vec<Option<u64>> = deduped.rows.iter().map(|row| row.crime.id).collect();
        assert_eq!(ids, [Some(1), Some(3)]);
    }

    #[test]
    fn rows_missing_ids_fall_back_to_location_key() {
        let table = aggregate(
            vec![vec![
                street_crime(None, "52.6", "-1.1"),
                street_crime(None, "52.6", "-1.1"),
                street_crime(Some(9), "52.6", "-1.1"),
            ]],
            "kent",
        );
        assert_eq!(remove_duplicates(table).len(), 2);
    }

    #[test]
    fn dedup_is_idempotent() {
        let table = aggregate(
            vec![
                vec![
                    street_crime(Some(1), "52.6", "-1.1"),
                    street_crime(Some(2), "52.6", "-1.1"),
                ],
                vec![
                    street_crime(Some(2), "52.6", "-1.1"),
                    street_crime(None, "52.8", "-1.1"),
                    street_crime(None, "52.8", "-1.1"),
                ],
            ],
            "kent",
        );
        let once = remove_duplicates(table);
        let twice = remove_duplicates(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn bad_coordinates_become_missing() {
        let table = aggregate(
            vec![vec![
                street_crime(Some(1), "52.63", "-1.13"),
                street_crime(Some(2), "not a number", ""),
            ]],
            "kent",
        );
        let located = extract_coordinates_and_street(table);
        assert_eq!(located.len(), 2);
        assert_eq!(located[0].latitude, Some(52.63));
        assert_eq!(located[0].longitude, Some(-1.13));
        assert_eq!(located[0].street_name.as_deref(), Some("On or near High Street"));
        assert_eq!(located[0].street_id, Some(1_234));
        assert_eq!(located[1].latitude, None);
        assert_eq!(located[1].longitude, None);
    }

    #[test]
    fn crime_without_location_is_kept() {
        let mut crime = street_crime(Some(1), "0", "0");
        crime.location = None;
        let located = extract_coordinates_and_street(aggregate(vec![vec![crime]], "kent"));
        assert_eq!(located.len(), 1);
        assert_eq!(located[0].latitude, None);
        assert_eq!(located[0].street_name, None);
    }

    #[test]
    fn splits_month_into_year_and_month() {
        assert_eq!(parse_month("2023-09"), Some((2023, 9)));
        assert_eq!(parse_month("2024-12"), Some((2024, 12)));
        assert_eq!(parse_month("2024-13"), None);
        assert_eq!(parse_month("September"), None);
        assert_eq!(parse_month(""), None);
    }

    #[test]
    fn unparseable_month_is_kept_as_missing() {
        let mut bad = street_crime(Some(2), "52.6", "-1.1");
        bad.month = "unknown".to_string();
        let table = clean(aggregate(
            vec![vec![street_crime(Some(1), "52.6", "-1.1"), bad]],
            "kent",
        ));
        assert_eq!(table.len(), 2);
        assert_eq!((table.rows[0].year, table.rows[0].month), (Some(2023), Some(9)));
        assert_eq!((table.rows[1].year, table.rows[1].month), (None, None));
    }

    #[test]
    fn clean_produces_flat_rows() {
        let mut crime = street_crime(Some(7), "52.63", "-1.13");
        crime.outcome_status = outcome("Under investigation");
        let table = clean(aggregate(vec![vec![crime.clone(), crime]], "leicestershire"));

        assert_eq!(table.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.category, "burglary");
        assert_eq!(row.year, Some(2023));
        assert_eq!(row.month, Some(9));
        assert_eq!(row.outcome_status, "Under investigation");
        assert_eq!(row.outcome_date.as_deref(), Some("2023-10"));
        assert_eq!(row.police_force_id.as_deref(), Some("leicestershire"));
        assert_eq!(row.id, Some(7));
    }

    #[test]
    fn cleaning_is_deterministic() {
        let raw = aggregate(
            vec![vec![
                street_crime(Some(3), "52.6", "-1.1"),
                street_crime(Some(1), "bad", "-1.1"),
                street_crime(Some(3), "52.9", "-1.1"),
            ]],
            "kent",
        );
        assert_eq!(clean(raw.clone()), clean(raw));
    }

    #[test]
    fn fallback_dedup_ignores_input_order() {
        let mut robbery = street_crime(None, "52.7", "-1.1");
        robbery.category = "robbery".to_string();
        let rows = vec![
            street_crime(None, "52.6", "-1.1"),
            robbery.clone(),
            street_crime(None, "52.6", "-1.1"),
            street_crime(None, "52.8", "-1.1"),
            robbery,
        ];

        let cleaned_rows = |crimes: Vec<StreetCrime>| {
            let mut table = aggregate(vec![crimes], "kent");
            table.schema = CrimeSchema::WITHOUT_IDS;
            let mut rows = clean(table).rows;
            rows.sort_by_key(|row| format!("{row:?}"));
            rows
        };

        let forward = cleaned_rows(rows.clone());
        let mut reversed = rows.clone();
        reversed.reverse();
        let mut rotated = rows;
        rotated.rotate_left(2);

        assert_eq!(forward.len(), 3);
        assert_eq!(forward, cleaned_rows(reversed));
        assert_eq!(forward, cleaned_rows(rotated));
    }

    #[test]
    fn equal_coordinates_written_differently_are_duplicates() {
        let mut table = aggregate(
            vec![vec![
                street_crime(None, "52.6", "-1.1"),
                street_crime(None, "52.60", "-1.100"),
                street_crime(None, " 52.6 ", "-1.1"),
                street_crime(None, "52.61", "-1.1"),
            ]],
            "kent",
        );
        table.schema = CrimeSchema::WITHOUT_IDS;
        assert_eq!(remove_duplicates(table).len(), 2);

        assert_eq!(
            coordinate_key(&Coordinate::Number(52.6)),
            coordinate_key(&Coordinate::Text("52.600".to_string()))
        );
        assert_ne!(
            coordinate_key(&Coordinate::Text("n/a".to_string())),
            coordinate_key(&Coordinate::Text("N/A".to_string()))
        );
    }

    #[test]
    fn blank_text_fields_become_missing() {
        let mut crime = street_crime(Some(1), "52.6", "-1.1");
        crime.context = Some(String::new());
        crime.persistent_id = Some(" ".to_string());
        crime.location_subtype = Some(String::new());

        let table = clean(aggregate(vec![vec![crime]], "kent"));
        let row = &table.rows[0];
        assert_eq!(row.context, None);
        assert_eq!(row.persistent_id, None);
        assert_eq!(row.location_subtype, None);
        assert_eq!(row.location_type.as_deref(), Some("Force"));
    }

    #[test]
    fn empty_table_cleans_to_empty() {
        assert!(clean(RawCrimeTable::default()).is_empty());
    }
}
