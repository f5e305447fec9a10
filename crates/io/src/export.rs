// Report sinks: `;`-separated UTF-8 CSV and pretty JSON

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use tracing::info;
use vinmerge_recon::model::{PricedProduct, RevenueLine, UnlinkedProduct};
use vinmerge_recon::{MergedProduct, ReconResult};

use crate::error::IoError;

pub const MERGED_FILE: &str = "merged.csv";
pub const REVENUE_FILE: &str = "revenue.csv";
pub const PREMIUM_FILE: &str = "premium.csv";
pub const ORDINARY_FILE: &str = "ordinary.csv";
pub const UNLINKED_FILE: &str = "unlinked.csv";

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn money(value: Decimal) -> String {
    value.round_dp(2).to_string()
}

/// Header row plus one record per item. Empty input still gets a header.
fn write_csv<T>(
    path: &Path,
    header: &[&str],
    items: &[T],
    record: impl Fn(&T) -> Vec<String>,
) -> Result<(), IoError> {
    let mut writer = ::csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .map_err(|e| IoError::write(path, e))?;

    writer
        .write_record(header)
        .map_err(|e| IoError::write(path, e))?;
    for item in items {
        writer
            .write_record(record(item))
            .map_err(|e| IoError::write(path, e))?;
    }
    writer.flush().map_err(|e| IoError::write(path, e))?;
    Ok(())
}

pub fn write_merged(path: &Path, merged: &[MergedProduct]) -> Result<(), IoError> {
    write_csv(
        path,
        &[
            "product_id",
            "onsale_web",
            "price",
            "stock_quantity",
            "stock_status",
            "id_web",
            "total_sales",
            "post_title",
            "post_type",
        ],
        merged,
        |m| {
            vec![
                m.product_id.to_string(),
                u8::from(m.onsale_web).to_string(),
                opt(m.price),
                m.stock_quantity.to_string(),
                m.stock_status.clone(),
                opt(m.id_web),
                opt(m.total_sales),
                m.post_title.clone().unwrap_or_default(),
                m.post_type.clone().unwrap_or_default(),
            ]
        },
    )
}

pub fn write_revenue(path: &Path, lines: &[RevenueLine]) -> Result<(), IoError> {
    write_csv(
        path,
        &["product_id", "id_web", "post_title", "price", "total_sales", "revenue"],
        lines,
        |l| {
            vec![
                l.product_id.to_string(),
                opt(l.id_web),
                l.post_title.clone().unwrap_or_default(),
                l.price.to_string(),
                l.total_sales.to_string(),
                money(l.revenue),
            ]
        },
    )
}

pub fn write_tier(path: &Path, products: &[PricedProduct]) -> Result<(), IoError> {
    write_csv(
        path,
        &[
            "product_id",
            "id_web",
            "post_title",
            "price",
            "total_sales",
            "revenue",
            "z_score",
        ],
        products,
        |p| {
            vec![
                p.product_id.to_string(),
                opt(p.id_web),
                p.post_title.clone().unwrap_or_default(),
                p.price.to_string(),
                p.total_sales.to_string(),
                money(p.revenue),
                format!("{:.4}", p.z_score),
            ]
        },
    )
}

pub fn write_unlinked(path: &Path, products: &[UnlinkedProduct]) -> Result<(), IoError> {
    write_csv(
        path,
        &["product_id", "price", "stock_quantity", "stock_status"],
        products,
        |u| {
            vec![
                u.product_id.to_string(),
                opt(u.price),
                u.stock_quantity.to_string(),
                u.stock_status.clone(),
            ]
        },
    )
}

/// Whole result as pretty JSON.
pub fn write_json(path: &Path, result: &ReconResult) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::write(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, result).map_err(|e| IoError::write(path, e))?;
    writer.flush().map_err(|e| IoError::write(path, e))?;
    info!(path = %path.display(), "wrote JSON result");
    Ok(())
}

/// Write every CSV sink into `dir`, creating it if needed. Returns the paths written.
pub fn export_all(dir: &Path, result: &ReconResult) -> Result<Vec<PathBuf>, IoError> {
    std::fs::create_dir_all(dir).map_err(|e| IoError::write(dir, e))?;

    let merged = dir.join(MERGED_FILE);
    write_merged(&merged, &result.merged)?;
    let revenue = dir.join(REVENUE_FILE);
    write_revenue(&revenue, &result.revenue.lines)?;
    let premium = dir.join(PREMIUM_FILE);
    write_tier(&premium, &result.outliers.premium)?;
    let ordinary = dir.join(ORDINARY_FILE);
    write_tier(&ordinary, &result.outliers.ordinary)?;
    let unlinked = dir.join(UNLINKED_FILE);
    write_unlinked(&unlinked, &result.integrity.unlinked_products)?;

    let written = vec![merged, revenue, premium, ordinary, unlinked];
    info!(dir = %dir.display(), files = written.len(), "exported reports");
    Ok(written)
}
