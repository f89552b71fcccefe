//! Combining per-triangle API responses into one raw table.

use uk_crime_crime_models::StreetCrime;

/// Field that uniquely identifies a crime record, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentifierField {
    /// Rows carry the police.uk record `id`.
    #[default]
    RecordId,
    /// Rows have no identifier; duplicates are detected by location,
    /// month, and category.
    None,
}

/// Declared shape of a raw crime table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrimeSchema {
    /// How rows are identified for deduplication.
    pub identifier: IdentifierField,
}

impl CrimeSchema {
    /// Schema of `/crimes-street/all-crime` responses.
    pub const STREET_CRIMES: Self = Self {
        identifier: IdentifierField::RecordId,
    };

    /// Schema for sources without record ids.
    pub const WITHOUT_IDS: Self = Self {
        identifier: IdentifierField::None,
    };

    /// Schema of a union: ids are only usable if every part has them.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        match (self.identifier, other.identifier) {
            (IdentifierField::RecordId, IdentifierField::RecordId) => Self::STREET_CRIMES,
            _ => Self::WITHOUT_IDS,
        }
    }
}

/// A crime as returned by the API, tagged with the force it was fetched
/// for.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCrime {
    /// Force whose area was queried.
    pub police_force_id: String,
    /// The API record.
    pub crime: StreetCrime,
}

/// Uncleaned crimes for one or more areas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCrimeTable {
    /// Declared schema of the rows.
    pub schema: CrimeSchema,
    /// Rows in fetch order.
    pub rows: Vec<RawCrime>,
}

impl RawCrimeTable {
    /// Creates an empty table with the given schema.
    #[must_use]
    pub const fn new(schema: CrimeSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

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

/// Concatenates per-triangle results for one force and tags each row
/// with `force_id`.
#[must_use]
pub fn aggregate(batches: Vec<Vec<StreetCrime>>, force_id: &str) -> RawCrimeTable {
    let rows = batches
        .into_iter()
        .flatten()
        .map(|crime| RawCrime {
            police_force_id: force_id.to_string(),
            crime,
        })
        .collect();

    RawCrimeTable {
        schema: CrimeSchema::STREET_CRIMES,
        rows,
    }
}

/// Unions tables from several forces.
#[must_use]
pub fn union_tables(tables: Vec<RawCrimeTable>) -> RawCrimeTable {
    tables
        .into_iter()
        .reduce(|mut acc, table| {
            acc.schema = acc.schema.merge(table.schema);
            acc.rows.extend(table.rows);
            acc
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crime(id: u64) -> StreetCrime {
        StreetCrime {
            category: "burglary".to_string(),
            month: "2024-01".to_string(),
            location: None,
            outcome_status: None,
            id: Some(id),
            persistent_id: None,
            location_type: None,
            location_subtype: None,
            context: None,
        }
    }

    #[test]
    fn tags_every_row_with_force() {
        let table = aggregate(vec![vec![crime(1), crime(2)], vec![], vec![crime(3)]], "kent");
        assert_eq!(table.len(), 3);
        assert!(table.rows.iter().all(|row| row.police_force_id == "kent"));
        assert_eq!(table.schema, CrimeSchema::STREET_CRIMES);
    }

    #[test]
    fn empty_input_is_an_empty_table() {
        assert!(aggregate(Vec::new(), "kent").is_empty());
        assert!(union_tables(Vec::new()).is_empty());
    }

    #[test]
    fn union_keeps_all_rows_and_narrows_schema() {
        let a = aggregate(vec![vec![crime(1)]], "kent");
        let mut b = aggregate(vec![vec![crime(1), crime(2)]], "essex");
        b.schema = CrimeSchema::WITHOUT_IDS;

        let union = union_tables(vec![a, b]);
        assert_eq!(union.len(), 3);
        assert_eq!(union.schema, CrimeSchema::WITHOUT_IDS);
    }
}
