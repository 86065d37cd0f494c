//! Read-only access to the shop's transactional data
//!
//! The pipelines never talk to storage directly. They receive a
//! [`SalesStore`] handle and issue three queries through it: the two
//! product-joined line item streams and the distinct product list.

use crate::error::{ForecastError, Result};
use crate::records::{ProductId, TransactionRecord, TransactionSource};
use crate::utils::parse_timestamp;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Queries the forecasting pipelines need from the data store
pub trait SalesStore {
    /// Point-of-sale line items joined with their sale date and product
    fn point_of_sale_records(&self) -> Result<Vec<TransactionRecord>>;

    /// Order line items joined with their order date and product
    fn order_records(&self) -> Result<Vec<TransactionRecord>>;

    /// Distinct product identifiers, in store order
    fn product_ids(&self) -> Result<Vec<ProductId>>;
}

/// Store backed by plain vectors
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    point_of_sale: Vec<TransactionRecord>,
    orders: Vec<TransactionRecord>,
    products: Vec<ProductId>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_point_of_sale(mut self, records: Vec<TransactionRecord>) -> Self {
        self.point_of_sale = records;
        self
    }

    pub fn with_orders(mut self, records: Vec<TransactionRecord>) -> Self {
        self.orders = records;
        self
    }

    pub fn with_products(mut self, products: Vec<ProductId>) -> Self {
        self.products = products;
        self
    }
}

impl SalesStore for InMemoryStore {
    fn point_of_sale_records(&self) -> Result<Vec<TransactionRecord>> {
        Ok(self.point_of_sale.clone())
    }

    fn order_records(&self) -> Result<Vec<TransactionRecord>> {
        Ok(self.orders.clone())
    }

    fn product_ids(&self) -> Result<Vec<ProductId>> {
        Ok(self.products.clone())
    }
}

pub const PRODUCT_TABLE: &str = "product.csv";
pub const SALES_TABLE: &str = "sales.csv";
pub const SALE_ITEMS_TABLE: &str = "sale_items.csv";
pub const ORDERS_TABLE: &str = "orders.csv";
pub const ORDER_ITEMS_TABLE: &str = "order_product.csv";

#[derive(Debug, Deserialize)]
struct ProductRow {
    product_id: ProductId,
    product_name: String,
}

#[derive(Debug, Deserialize)]
struct SaleRow {
    sale_id: u64,
    sale_date: String,
}

#[derive(Debug, Deserialize)]
struct SaleItemRow {
    sale_id: u64,
    product_id: ProductId,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct OrderRow {
    order_id: u64,
    date: String,
}

#[derive(Debug, Deserialize)]
struct OrderItemRow {
    order_id: u64,
    product_id: ProductId,
    quantity: u32,
}

/// Store reading the shop tables from a directory of CSV exports.
///
/// Expected tables: `product.csv (product_id, product_name)`,
/// `sales.csv (sale_id, sale_date)`, `sale_items.csv (sale_id, product_id, quantity)`,
/// `orders.csv (order_id, date)` and `order_product.csv (order_id, product_id, quantity)`.
/// Line items whose header or product is missing are dropped, as an inner
/// join would.
#[derive(Debug, Clone)]
pub struct CsvStore {
    root: PathBuf,
}

impl CsvStore {
    /// Open a store rooted at `root`
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(ForecastError::DataSource(format!(
                "Data directory {} does not exist",
                root.display()
            )));
        }

        debug!(root = %root.display(), "opened csv store");
        Ok(Self { root })
    }

    /// Directory the tables are read from
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_table<T: for<'de> Deserialize<'de>>(&self, table: &str) -> Result<Vec<T>> {
        let path = self.root.join(table);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| {
                ForecastError::DataSource(format!("Cannot read {}: {}", path.display(), e))
            })?;

        reader
            .deserialize()
            .collect::<std::result::Result<Vec<T>, csv::Error>>()
            .map_err(|e| ForecastError::DataSource(format!("Malformed {}: {}", table, e)))
    }

    fn product_names(&self) -> Result<HashMap<ProductId, String>> {
        Ok(self
            .read_table::<ProductRow>(PRODUCT_TABLE)?
            .into_iter()
            .map(|row| (row.product_id, row.product_name))
            .collect())
    }

    /// Join line items to their header timestamps and product names
    fn join_items(
        &self,
        headers: HashMap<u64, NaiveDateTime>,
        items: impl Iterator<Item = (u64, ProductId, u32)>,
        source: TransactionSource,
    ) -> Result<Vec<TransactionRecord>> {
        let products = self.product_names()?;
        let mut records = Vec::new();
        let mut dropped = 0usize;

        for (header_id, product_id, quantity) in items {
            let (Some(occurred_at), Some(name)) =
                (headers.get(&header_id), products.get(&product_id))
            else {
                dropped += 1;
                continue;
            };
            records.push(TransactionRecord::new(
                *occurred_at,
                product_id,
                name.as_str(),
                quantity,
                source,
            )?);
        }

        if dropped > 0 {
            warn!(%source, dropped, "line items without a matching header or product were skipped");
        }
        debug!(%source, records = records.len(), "joined line items");
        Ok(records)
    }
}

fn parse_header_date(table: &str, id: u64, raw: &str) -> Result<NaiveDateTime> {
    parse_timestamp(raw).ok_or_else(|| {
        ForecastError::DataSource(format!(
            "{} row {} has an unparsable date '{}'",
            table, id, raw
        ))
    })
}

impl SalesStore for CsvStore {
    fn point_of_sale_records(&self) -> Result<Vec<TransactionRecord>> {
        let headers = self
            .read_table::<SaleRow>(SALES_TABLE)?
            .into_iter()
            .map(|row| -> Result<(u64, NaiveDateTime)> {
                let occurred_at = parse_header_date(SALES_TABLE, row.sale_id, &row.sale_date)?;
                Ok((row.sale_id, occurred_at))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        let items = self.read_table::<SaleItemRow>(SALE_ITEMS_TABLE)?;

        self.join_items(
            headers,
            items
                .into_iter()
                .map(|row| (row.sale_id, row.product_id, row.quantity)),
            TransactionSource::PointOfSale,
        )
    }

    fn order_records(&self) -> Result<Vec<TransactionRecord>> {
        let headers = self
            .read_table::<OrderRow>(ORDERS_TABLE)?
            .into_iter()
            .map(|row| -> Result<(u64, NaiveDateTime)> {
                let occurred_at = parse_header_date(ORDERS_TABLE, row.order_id, &row.date)?;
                Ok((row.order_id, occurred_at))
            })
            .collect::<Result<HashMap<_, _>>>()?;
        let items = self.read_table::<OrderItemRow>(ORDER_ITEMS_TABLE)?;

        self.join_items(
            headers,
            items
                .into_iter()
                .map(|row| (row.order_id, row.product_id, row.quantity)),
            TransactionSource::Order,
        )
    }

    fn product_ids(&self) -> Result<Vec<ProductId>> {
        let mut seen = HashSet::new();
        Ok(self
            .read_table::<ProductRow>(PRODUCT_TABLE)?
            .into_iter()
            .map(|row| row.product_id)
            .filter(|id| seen.insert(*id))
            .collect())
    }
}
