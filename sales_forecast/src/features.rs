//! Feature encoding for (date, product) pairs
//!
//! A feature row is the product's one-hot block followed by three calendar
//! columns: day of month, month and weekday (0 = Monday).

use crate::records::ProductId;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Calendar-derived numeric features of a date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarFeatures {
    /// Day of month, 1..=31
    pub day: u32,
    /// Month, 1..=12
    pub month: u32,
    /// Day of week, 0 = Monday ..= 6 = Sunday
    pub weekday: u32,
}

impl CalendarFeatures {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day: date.day(),
            month: date.month(),
            weekday: date.weekday().num_days_from_monday(),
        }
    }
}

/// Raw (not yet encoded) model input for one product on one date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureVector {
    pub product_id: ProductId,
    pub calendar: CalendarFeatures,
}

impl FeatureVector {
    pub fn new(date: NaiveDate, product_id: ProductId) -> Self {
        Self {
            product_id,
            calendar: CalendarFeatures::from_date(date),
        }
    }
}

/// Number of calendar columns appended after the one-hot block
pub const CALENDAR_WIDTH: usize = 3;

/// One-hot encoder over the product ids seen at training time.
///
/// The vocabulary is fixed at construction; there is no way to add
/// categories afterwards. Ids outside it encode to an all-zero block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEncoder {
    columns: BTreeMap<ProductId, usize>,
}

impl ProductEncoder {
    /// Learn the vocabulary from the observed product ids (sorted, deduplicated)
    pub fn fit<I: IntoIterator<Item = ProductId>>(ids: I) -> Self {
        let mut columns: BTreeMap<ProductId, usize> =
            ids.into_iter().map(|id| (id, 0)).collect();
        for (column, slot) in columns.values_mut().enumerate() {
            *slot = column;
        }
        Self { columns }
    }

    /// Column of `product_id` in the one-hot block, if known
    pub fn column(&self, product_id: ProductId) -> Option<usize> {
        self.columns.get(&product_id).copied()
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.columns.contains_key(&product_id)
    }

    /// Known product ids in column order
    pub fn products(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.columns.keys().copied()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.columns.len()
    }

    /// Whether columns are numbered `0..n` in product order, as `fit` assigns them
    pub fn is_consistent(&self) -> bool {
        self.columns
            .values()
            .enumerate()
            .all(|(expected, &column)| column == expected)
    }

    /// Total width of an encoded row
    pub fn width(&self) -> usize {
        self.columns.len() + CALENDAR_WIDTH
    }

    /// Encode one feature vector as a dense numeric row
    pub fn encode(&self, features: &FeatureVector) -> Vec<f64> {
        let mut row = vec![0.0; self.width()];
        if let Some(column) = self.column(features.product_id) {
            row[column] = 1.0;
        }

        let offset = self.columns.len();
        row[offset] = f64::from(features.calendar.day);
        row[offset + 1] = f64::from(features.calendar.month);
        row[offset + 2] = f64::from(features.calendar.weekday);
        row
    }

    /// Encode many feature vectors
    pub fn encode_all(&self, rows: &[FeatureVector]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.encode(row)).collect()
    }
}
