use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::RevenueRule;
use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// The three product sources the pipeline reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Erp,
    Linkage,
    Web,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Erp, Source::Linkage, Source::Web];

    /// Label used in the validation report.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Erp => "ERP",
            Self::Linkage => "Linkage",
            Self::Web => "Web",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Erp => write!(f, "erp"),
            Self::Linkage => write!(f, "linkage"),
            Self::Web => write!(f, "web"),
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One source as the ingestion collaborator hands it over: normalized
/// header names and untyped string cells.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub source: Source,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(source: Source, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { source, headers, rows }
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of a required column. Absence is fatal for the run.
    pub fn column(&self, name: &str) -> Result<usize, ReconError> {
        if self.headers.is_empty() {
            return Err(ReconError::EmptyHeader { table: self.source });
        }
        self.find_column(name).ok_or_else(|| ReconError::MissingColumn {
            table: self.source,
            column: name.into(),
        })
    }
}

/// Trimmed cell value; `None` when the row is short or the cell is blank.
pub fn cell(row: &[String], idx: usize) -> Option<&str> {
    row.get(idx).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Pre-loaded raw tables for one run.
#[derive(Debug, Clone)]
pub struct ReconInput {
    pub erp: RawTable,
    pub linkage: RawTable,
    pub web: RawTable,
    /// Content fingerprints keyed by source name, when the loader computed them.
    pub fingerprints: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Cleaned records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErpRecord {
    pub product_id: i64,
    pub onsale_web: bool,
    pub price: Option<Decimal>,
    pub stock_quantity: i64,
    pub stock_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkageRecord {
    pub product_id: i64,
    pub id_web: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebRecord {
    pub id_web: i64,
    pub total_sales: i64,
    pub post_title: String,
    pub post_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// One row per ERP product; web fields are `None` when unlinked or unmatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedProduct {
    pub product_id: i64,
    pub onsale_web: bool,
    pub price: Option<Decimal>,
    pub stock_quantity: i64,
    pub stock_status: String,
    pub id_web: Option<i64>,
    pub total_sales: Option<i64>,
    pub post_title: Option<String>,
    pub post_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Revenue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueLine {
    pub product_id: i64,
    pub id_web: Option<i64>,
    pub post_title: Option<String>,
    pub price: Decimal,
    pub total_sales: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    pub rule: RevenueRule,
    /// Eligible lines, revenue descending then product_id ascending.
    pub lines: Vec<RevenueLine>,
    pub total: Decimal,
    pub eligible: usize,
    pub excluded: usize,
}

impl RevenueReport {
    /// The `n` highest-revenue lines. The total is unaffected.
    pub fn top(&self, n: usize) -> &[RevenueLine] {
        &self.lines[..n.min(self.lines.len())]
    }
}

// ---------------------------------------------------------------------------
// Validation report
// ---------------------------------------------------------------------------

/// Per-source row accounting from raw input to the deduplicated set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: Source,
    pub raw_rows: usize,
    pub filtered_rows: usize,
    pub rejected_rows: usize,
    pub coerced_fields: usize,
    pub before: usize,
    pub after: usize,
    pub duplicates_removed: usize,
}

// ---------------------------------------------------------------------------
// Price tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PricedProduct {
    pub product_id: i64,
    pub id_web: Option<i64>,
    pub post_title: Option<String>,
    pub price: Decimal,
    pub total_sales: i64,
    pub revenue: Decimal,
    pub z_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceOutliers {
    pub threshold: f64,
    pub mean: f64,
    pub std_dev: f64,
    /// z-score above threshold, z descending.
    pub premium: Vec<PricedProduct>,
    /// Everything else, product_id ascending.
    pub ordinary: Vec<PricedProduct>,
}

// ---------------------------------------------------------------------------
// Integrity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlinkedProduct {
    pub product_id: i64,
    pub price: Option<Decimal>,
    pub stock_quantity: i64,
    pub stock_status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub erp_without_linkage: Vec<i64>,
    pub web_without_linkage: Vec<i64>,
    pub unlinked_products: Vec<UnlinkedProduct>,
    pub duplicate_keys_after_dedupe: usize,
}

// ---------------------------------------------------------------------------
// Quality checks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityCheck {
    pub name: String,
    pub status: CheckStatus,
    pub expected: String,
    pub actual: String,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub rule: RevenueRule,
    pub fingerprints: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub validation: Vec<SourceReport>,
    pub merged: Vec<MergedProduct>,
    pub revenue: RevenueReport,
    pub outliers: PriceOutliers,
    pub integrity: IntegrityReport,
    pub checks: Vec<QualityCheck>,
}

impl ReconResult {
    pub fn failed_checks(&self) -> impl Iterator<Item = &QualityCheck> {
        self.checks.iter().filter(|c| c.status == CheckStatus::Fail)
    }
}
