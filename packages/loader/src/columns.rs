//! Column canonicalization.
//!
//! Source headers are matched case-insensitively after trimming, so the
//! historical `Lat` column and the API's `LAT` column resolve to the same
//! canonical name.

use std::collections::BTreeMap;

use boston_crime_incident_models::columns;
use boston_crime_source::RawTable;

use crate::LoadError;

/// Canonical name for a raw header: trimmed and uppercased.
#[must_use]
pub fn canonical_name(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Maps canonical column names to their position in a [`RawTable`].
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    positions: BTreeMap<String, usize>,
}

impl ColumnIndex {
    /// Builds the index for `table`. When two headers canonicalize to the
    /// same name the first one wins.
    #[must_use]
    pub fn new(table: &RawTable) -> Self {
        let mut positions = BTreeMap::new();
        for (i, column) in table.columns.iter().enumerate() {
            positions.entry(canonical_name(column)).or_insert(i);
        }
        Self { positions }
    }

    /// Builds the index and checks that every required column is present.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingColumn`] naming the first absent column.
    pub fn validated(table: &RawTable) -> Result<Self, LoadError> {
        let index = Self::new(table);
        if let Some(column) = columns::REQUIRED
            .iter()
            .find(|c| !index.positions.contains_key(**c))
        {
            return Err(LoadError::MissingColumn {
                source_name: table.source_name.clone(),
                column: (*column).to_string(),
            });
        }
        Ok(index)
    }

    /// Returns the value of `column` in `row`, if the column exists.
    #[must_use]
    pub fn get<'a>(&self, row: &'a [String], column: &str) -> Option<&'a str> {
        self.positions
            .get(column)
            .and_then(|&i| row.get(i))
            .map(String::as_str)
    }
}
