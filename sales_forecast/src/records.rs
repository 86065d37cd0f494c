//! Record types flowing through the training and prediction pipelines

use crate::error::{ForecastError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Product identifier as stored in the shop's product table
pub type ProductId = u32;

/// Which raw stream a transaction line item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    /// Point-of-sale line item
    PointOfSale,
    /// Separately placed order line item
    Order,
}

impl fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionSource::PointOfSale => write!(f, "point-of-sale"),
            TransactionSource::Order => write!(f, "order"),
        }
    }
}

/// One line item from either transaction source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    occurred_at: NaiveDateTime,
    product_id: ProductId,
    product_name: String,
    quantity: u32,
    source: TransactionSource,
}

impl TransactionRecord {
    /// Create a transaction record, rejecting blank product names
    pub fn new(
        occurred_at: NaiveDateTime,
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        source: TransactionSource,
    ) -> Result<Self> {
        let product_name = product_name.into();
        if product_name.trim().is_empty() {
            return Err(ForecastError::ValidationError(format!(
                "Product {} has an empty name",
                product_id
            )));
        }

        Ok(Self {
            occurred_at,
            product_id,
            product_name,
            quantity,
            source,
        })
    }

    /// Timestamp of the transaction
    pub fn occurred_at(&self) -> NaiveDateTime {
        self.occurred_at
    }

    /// Calendar day of the transaction, time of day discarded
    pub fn date(&self) -> NaiveDate {
        self.occurred_at.date()
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn source(&self) -> TransactionSource {
        self.source
    }
}

/// Total quantity of one product sold on one day across both sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDemandRecord {
    pub date: NaiveDate,
    pub product_id: ProductId,
    pub product_name: String,
    pub total_quantity: u64,
}

/// Forecast quantity for one product on the target date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub product_id: ProductId,
    pub predicted_quantity: i64,
}
