//! Raw string rows → typed records.
//!
//! Key fields that fail validation drop the row. Non-key fields that fail
//! parsing are nulled (price) or zeroed (counts) and the row survives.
//! Only structural problems (missing columns) are errors.

use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::RowFilter;
use crate::error::ReconError;
use crate::model::{cell, ErpRecord, LinkageRecord, RawTable, WebRecord};

/// Column the web export uses for its identifier; `id_web` is accepted too.
pub const WEB_KEY_COLUMN: &str = "sku";

static STRICT_DIGITS: OnceLock<Regex> = OnceLock::new();

fn strict_digits() -> &'static Regex {
    STRICT_DIGITS.get_or_init(|| Regex::new(r"^[0-9]+$").expect("static pattern"))
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Row accounting for one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    pub raw_rows: usize,
    pub filtered_rows: usize,
    pub rejected_rows: usize,
    pub coerced_fields: usize,
}

#[derive(Debug, Clone)]
pub struct Cleaned<T> {
    pub records: Vec<T>,
    pub stats: CleanStats,
}

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

/// Strictly positive identifier made only of ASCII digits.
/// `"13127-1"`, `"bon-cadeau-25-euros"`, `"0"` and `"+5"` are all rejected.
pub fn parse_strict_id(raw: &str) -> Option<i64> {
    if !strict_digits().is_match(raw) {
        return None;
    }
    raw.parse::<i64>().ok().filter(|v| *v > 0)
}

/// Decimal price with a comma or dot separator. Negative values are rejected.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let repaired = raw.replace(',', ".");
    Decimal::from_str(&repaired)
        .ok()
        .filter(|d| !d.is_sign_negative() || d.is_zero())
        .map(|d| if d.is_zero() { Decimal::ZERO } else { d })
}

/// Integer count. Accepts `"4"` and integral decimals such as `"4.0"` or `"4,0"`.
pub fn parse_count(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let d = Decimal::from_str(&raw.replace(',', ".")).ok()?;
    if d.fract().is_zero() {
        d.to_i64()
    } else {
        None
    }
}

/// On-sale style flag: integers (non-zero is true) or true/false, yes/no, y/n.
pub fn parse_flag(raw: &str) -> Option<bool> {
    if let Some(n) = parse_count(raw) {
        return Some(n != 0);
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "t" => Some(true),
        "false" | "no" | "n" | "f" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Row filtering
// ---------------------------------------------------------------------------

/// Rows of `table` that pass `filter`. The filter column must exist.
fn selected_rows<'a>(
    table: &'a RawTable,
    filter: Option<&RowFilter>,
    stats: &mut CleanStats,
) -> Result<Vec<(usize, &'a [String])>, ReconError> {
    stats.raw_rows = table.rows.len();

    let filter_idx = match filter {
        Some(f) => Some((table.column(&f.column)?, f)),
        None => None,
    };

    let mut rows = Vec::with_capacity(table.rows.len());
    for (i, row) in table.rows.iter().enumerate() {
        if let Some((fi, f)) = filter_idx {
            if !f.accepts(cell(row, fi).unwrap_or("")) {
                stats.filtered_rows += 1;
                continue;
            }
        }
        // +2: 1-based, plus the header line.
        rows.push((i + 2, row.as_slice()));
    }
    Ok(rows)
}

fn log_stats(table: &RawTable, stats: &CleanStats, kept: usize) {
    info!(
        source = %table.source,
        raw = stats.raw_rows,
        filtered = stats.filtered_rows,
        rejected = stats.rejected_rows,
        coerced = stats.coerced_fields,
        kept,
        "cleaned source"
    );
}

// ---------------------------------------------------------------------------
// ERP
// ---------------------------------------------------------------------------

pub fn clean_erp(
    table: &RawTable,
    filter: Option<&RowFilter>,
) -> Result<Cleaned<ErpRecord>, ReconError> {
    let product_id_idx = table.column("product_id")?;
    let onsale_idx = table.column("onsale_web")?;
    let price_idx = table.column("price")?;
    let stock_qty_idx = table.column("stock_quantity")?;
    let stock_status_idx = table.column("stock_status")?;

    let mut stats = CleanStats::default();
    let rows = selected_rows(table, filter, &mut stats)?;
    let mut records = Vec::with_capacity(rows.len());

    for (line, row) in rows {
        let Some(product_id) = cell(row, product_id_idx).and_then(parse_count) else {
            debug!(source = %table.source, line, "dropping row: invalid product_id");
            stats.rejected_rows += 1;
            continue;
        };

        let onsale_web = match cell(row, onsale_idx) {
            None => false,
            Some(raw) => parse_flag(raw).unwrap_or_else(|| {
                debug!(line, product_id, value = raw, "onsale_web coerced to false");
                stats.coerced_fields += 1;
                false
            }),
        };

        let price = match cell(row, price_idx) {
            None => None,
            Some(raw) => {
                let parsed = parse_price(raw);
                if parsed.is_none() {
                    debug!(line, product_id, value = raw, "price coerced to null");
                    stats.coerced_fields += 1;
                }
                parsed
            }
        };

        let stock_quantity = match cell(row, stock_qty_idx) {
            None => 0,
            Some(raw) => parse_count(raw).unwrap_or_else(|| {
                debug!(line, product_id, value = raw, "stock_quantity coerced to 0");
                stats.coerced_fields += 1;
                0
            }),
        };

        records.push(ErpRecord {
            product_id,
            onsale_web,
            price,
            stock_quantity,
            stock_status: cell(row, stock_status_idx).unwrap_or("").to_string(),
        });
    }

    log_stats(table, &stats, records.len());
    Ok(Cleaned { records, stats })
}

// ---------------------------------------------------------------------------
// Linkage
// ---------------------------------------------------------------------------

pub fn clean_linkage(
    table: &RawTable,
    filter: Option<&RowFilter>,
) -> Result<Cleaned<LinkageRecord>, ReconError> {
    let product_id_idx = table.column("product_id")?;
    let id_web_idx = table.column("id_web")?;

    let mut stats = CleanStats::default();
    let rows = selected_rows(table, filter, &mut stats)?;
    let mut records = Vec::with_capacity(rows.len());

    for (line, row) in rows {
        let Some(product_id) = cell(row, product_id_idx).and_then(parse_count) else {
            debug!(source = %table.source, line, "dropping row: invalid product_id");
            stats.rejected_rows += 1;
            continue;
        };

        // Null stays null; a non-null value must be strictly numeric.
        let id_web = match cell(row, id_web_idx) {
            None => None,
            Some(raw) => match parse_strict_id(raw) {
                Some(id) => Some(id),
                None => {
                    debug!(line, product_id, value = raw, "dropping row: non-numeric id_web");
                    stats.rejected_rows += 1;
                    continue;
                }
            },
        };

        records.push(LinkageRecord { product_id, id_web });
    }

    log_stats(table, &stats, records.len());
    Ok(Cleaned { records, stats })
}

// ---------------------------------------------------------------------------
// Web
// ---------------------------------------------------------------------------

/// Clean the web export. `require_post_type` makes a missing `post_type`
/// column fatal; otherwise it is read when present.
pub fn clean_web(
    table: &RawTable,
    filter: Option<&RowFilter>,
    require_post_type: bool,
) -> Result<Cleaned<WebRecord>, ReconError> {
    let key_idx = match table.find_column(WEB_KEY_COLUMN) {
        Some(i) => i,
        None => table.column("id_web").map_err(|_| ReconError::MissingColumn {
            table: table.source,
            column: WEB_KEY_COLUMN.into(),
        })?,
    };
    let total_sales_idx = table.column("total_sales")?;
    let post_title_idx = table.column("post_title")?;
    let post_type_idx = if require_post_type {
        Some(table.column("post_type")?)
    } else {
        table.find_column("post_type")
    };

    let mut stats = CleanStats::default();
    let rows = selected_rows(table, filter, &mut stats)?;
    let mut records = Vec::with_capacity(rows.len());

    for (line, row) in rows {
        let Some(id_web) = cell(row, key_idx).and_then(parse_strict_id) else {
            debug!(
                source = %table.source,
                line,
                value = cell(row, key_idx).unwrap_or(""),
                "dropping row: non-numeric sku"
            );
            stats.rejected_rows += 1;
            continue;
        };

        let total_sales = match cell(row, total_sales_idx) {
            None => 0,
            Some(raw) => parse_count(raw).unwrap_or_else(|| {
                debug!(line, id_web, value = raw, "total_sales coerced to 0");
                stats.coerced_fields += 1;
                0
            }),
        };

        records.push(WebRecord {
            id_web,
            total_sales,
            post_title: cell(row, post_title_idx).unwrap_or("").to_string(),
            post_type: post_type_idx.and_then(|i| cell(row, i)).map(str::to_string),
        });
    }

    log_stats(table, &stats, records.len());
    Ok(Cleaned { records, stats })
}
