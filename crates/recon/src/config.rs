use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::Source;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    #[serde(default)]
    pub input: InputConfig,
    pub sources: SourcesConfig,
    #[serde(default)]
    pub revenue: RevenueConfig,
    #[serde(default)]
    pub outliers: OutlierConfig,
    #[serde(default)]
    pub checks: ChecksConfig,
}

// ---------------------------------------------------------------------------
// Input format
// ---------------------------------------------------------------------------

/// How the source files are laid out on disk. Only the loader reads this.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// WHATWG encoding label, used when a file is not valid UTF-8.
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

fn default_delimiter() -> char {
    ';'
}

fn default_encoding() -> String {
    "windows-1252".into()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            encoding: default_encoding(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub erp: SourceConfig,
    pub linkage: SourceConfig,
    pub web: SourceConfig,
}

impl SourcesConfig {
    pub fn get(&self, source: Source) -> &SourceConfig {
        match source {
            Source::Erp => &self.erp,
            Source::Linkage => &self.linkage,
            Source::Web => &self.web,
        }
    }

    pub fn get_mut(&mut self, source: Source) -> &mut SourceConfig {
        match source {
            Source::Erp => &mut self.erp,
            Source::Linkage => &mut self.linkage,
            Source::Web => &mut self.web,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub file: String,
    #[serde(default)]
    pub filter: Option<RowFilter>,
}

/// Keep only raw rows whose `column` holds one of `values`.
#[derive(Debug, Clone, Deserialize)]
pub struct RowFilter {
    pub column: String,
    pub values: Vec<String>,
}

impl RowFilter {
    pub fn accepts(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value.trim())
    }
}

// ---------------------------------------------------------------------------
// Revenue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevenueRule {
    /// `onsale_web` and a known price.
    OnSale,
    /// `OnSale`, plus positive sales and a web post type equal to the
    /// configured product marker.
    CatalogProduct,
}

impl Default for RevenueRule {
    fn default() -> Self {
        Self::OnSale
    }
}

impl std::fmt::Display for RevenueRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OnSale => write!(f, "on_sale"),
            Self::CatalogProduct => write!(f, "catalog_product"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevenueConfig {
    #[serde(default)]
    pub rule: RevenueRule,
    #[serde(default = "default_product_type")]
    pub product_type: String,
    #[serde(default = "default_top")]
    pub top: usize,
}

fn default_product_type() -> String {
    "product".into()
}

fn default_top() -> usize {
    10
}

impl Default for RevenueConfig {
    fn default() -> Self {
        Self {
            rule: RevenueRule::default(),
            product_type: default_product_type(),
            top: default_top(),
        }
    }
}

/// Resolved eligibility predicate for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    OnSale,
    CatalogProduct { product_type: String },
}

impl Eligibility {
    pub fn rule(&self) -> RevenueRule {
        match self {
            Self::OnSale => RevenueRule::OnSale,
            Self::CatalogProduct { .. } => RevenueRule::CatalogProduct,
        }
    }
}

impl RevenueConfig {
    pub fn eligibility(&self) -> Eligibility {
        match self.rule {
            RevenueRule::OnSale => Eligibility::OnSale,
            RevenueRule::CatalogProduct => Eligibility::CatalogProduct {
                product_type: self.product_type.clone(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Outliers + Checks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OutlierConfig {
    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,
}

fn default_z_threshold() -> f64 {
    2.0
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            z_threshold: default_z_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChecksConfig {
    #[serde(default)]
    pub expected_merged_rows: Option<usize>,
    #[serde(default)]
    pub expected_total_revenue: Option<Decimal>,
    #[serde(default = "default_revenue_tolerance")]
    pub revenue_tolerance: Decimal,
}

fn default_revenue_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            expected_merged_rows: None,
            expected_total_revenue: None,
            revenue_tolerance: default_revenue_tolerance(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if !self.input.delimiter.is_ascii() {
            return Err(ReconError::ConfigValidation(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.input.delimiter
            )));
        }

        for source in Source::ALL {
            let sc = self.sources.get(source);
            if sc.file.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "source '{source}': file must not be empty"
                )));
            }
            if let Some(ref filter) = sc.filter {
                if filter.column.trim().is_empty() || filter.values.is_empty() {
                    return Err(ReconError::ConfigValidation(format!(
                        "source '{source}': filter needs a column and at least one value"
                    )));
                }
            }
        }

        if self.revenue.rule == RevenueRule::CatalogProduct
            && self.revenue.product_type.trim().is_empty()
        {
            return Err(ReconError::ConfigValidation(
                "revenue.product_type must not be empty for rule catalog_product".into(),
            ));
        }

        if self.revenue.top == 0 {
            return Err(ReconError::ConfigValidation(
                "revenue.top must be at least 1".into(),
            ));
        }

        if !self.outliers.z_threshold.is_finite() || self.outliers.z_threshold <= 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "outliers.z_threshold must be a positive number, got {}",
                self.outliers.z_threshold
            )));
        }

        if self.checks.revenue_tolerance.is_sign_negative() {
            return Err(ReconError::ConfigValidation(
                "checks.revenue_tolerance must not be negative".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
