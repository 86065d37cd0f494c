//! Daily demand aggregation
//!
//! Point-of-sale and order line items are unioned as-is and summed per
//! (calendar date, product id); each product id carries a single name. The result is the training
//! series, ordered by date.

use crate::error::{ForecastError, Result};
use crate::records::{DailyDemandRecord, ProductId, TransactionRecord};
use crate::store::SalesStore;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Sum both transaction streams into daily demand records.
///
/// Records come back ascending by date; within a date they are ordered by
/// product id, although callers should not depend on that. A product id must
/// carry one name across the whole history; a conflicting name is a
/// `DataSource` error since it would split one (date, product) total in two.
pub fn aggregate_records(
    point_of_sale: &[TransactionRecord],
    orders: &[TransactionRecord],
) -> Result<Vec<DailyDemandRecord>> {
    let mut names: HashMap<ProductId, &str> = HashMap::new();
    let mut totals: BTreeMap<(NaiveDate, ProductId), u64> = BTreeMap::new();

    for record in point_of_sale.iter().chain(orders.iter()) {
        let name = *names
            .entry(record.product_id())
            .or_insert(record.product_name());
        if name != record.product_name() {
            return Err(ForecastError::DataSource(format!(
                "product {} appears as both '{}' and '{}'",
                record.product_id(),
                name,
                record.product_name()
            )));
        }

        *totals
            .entry((record.date(), record.product_id()))
            .or_insert(0) += u64::from(record.quantity());
    }

    Ok(totals
        .into_iter()
        .map(|((date, product_id), total_quantity)| DailyDemandRecord {
            date,
            product_id,
            product_name: names
                .get(&product_id)
                .map(|name| name.to_string())
                .unwrap_or_default(),
            total_quantity,
        })
        .collect())
}

/// Add zero-demand records for days a product did not sell.
///
/// Each product is filled from its first recorded day up to the last day of
/// the whole series, so products introduced later are not padded before they
/// existed. Filled records reuse the product's most recent name. Output keeps
/// the date-ascending order.
pub fn fill_missing_days(records: &[DailyDemandRecord]) -> Vec<DailyDemandRecord> {
    let Some(last_date) = records.iter().map(|r| r.date).max() else {
        return Vec::new();
    };

    let mut first_seen: BTreeMap<ProductId, (NaiveDate, NaiveDate, &str)> = BTreeMap::new();
    for record in records {
        let entry = first_seen
            .entry(record.product_id)
            .or_insert((record.date, record.date, record.product_name.as_str()));
        entry.0 = entry.0.min(record.date);
        if record.date >= entry.1 {
            entry.1 = record.date;
            entry.2 = record.product_name.as_str();
        }
    }

    let observed: BTreeMap<(NaiveDate, ProductId), u64> = records
        .iter()
        .fold(BTreeMap::new(), |mut acc, r| {
            *acc.entry((r.date, r.product_id)).or_insert(0) += r.total_quantity;
            acc
        });

    let mut filled: Vec<DailyDemandRecord> = records.to_vec();
    for (&product_id, &(first, _, name)) in &first_seen {
        for date in first.iter_days().take_while(|d| *d <= last_date) {
            if !observed.contains_key(&(date, product_id)) {
                filled.push(DailyDemandRecord {
                    date,
                    product_id,
                    product_name: name.to_string(),
                    total_quantity: 0,
                });
            }
        }
    }

    filled.sort_by(|a, b| (a.date, a.product_id).cmp(&(b.date, b.product_id)));
    filled
}

/// Builds the daily demand series from a store
#[derive(Debug)]
pub struct Aggregator<'a, S: SalesStore> {
    store: &'a S,
}

impl<'a, S: SalesStore> Aggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Fetch both streams and aggregate them.
    ///
    /// Fails with `EmptyDataset` when neither stream has any line items.
    pub fn aggregate(&self) -> Result<Vec<DailyDemandRecord>> {
        let point_of_sale = self.store.point_of_sale_records()?;
        let orders = self.store.order_records()?;
        debug!(
            point_of_sale = point_of_sale.len(),
            orders = orders.len(),
            "fetched transaction streams"
        );

        let records = aggregate_records(&point_of_sale, &orders)?;
        if records.is_empty() {
            return Err(ForecastError::EmptyDataset);
        }

        info!(daily_records = records.len(), "aggregated daily demand");
        Ok(records)
    }
}

/// Write the aggregated series as CSV for audit.
///
/// Columns: `date,product_id,product_name,total_quantity`.
pub fn write_summary<P: AsRef<Path>>(path: P, records: &[DailyDemandRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = records.len(), "wrote daily demand summary");
    Ok(())
}
