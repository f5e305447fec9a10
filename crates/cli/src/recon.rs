//! `vinmerge run` and `vinmerge validate`: config-driven product reconciliation.

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::debug;
use vinmerge_recon::model::CheckStatus;
use vinmerge_recon::{ReconConfig, ReconError, ReconResult, Source};

use crate::exit_codes::{EXIT_CHECK_FAILED, EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_RUNTIME};
use crate::util::{render_table, Align};
use crate::CliError;

#[derive(Args)]
pub struct RunArgs {
    /// Path to the .vinmerge.toml config file
    pub config: PathBuf,

    /// ERP export (overrides sources.erp.file)
    #[arg(long, value_name = "PATH")]
    pub erp: Option<PathBuf>,

    /// Linkage table (overrides sources.linkage.file)
    #[arg(long, value_name = "PATH")]
    pub linkage: Option<PathBuf>,

    /// Web-catalog export (overrides sources.web.file)
    #[arg(long, value_name = "PATH")]
    pub web: Option<PathBuf>,

    /// Rows in the revenue table (overrides revenue.top)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub top: Option<u64>,

    /// Output JSON to stdout instead of the human summary
    #[arg(long)]
    pub json: bool,

    /// Write JSON output to file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Write merged/revenue/tier/unlinked CSVs into this directory
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,
}

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        match &err {
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                recon_err(EXIT_INVALID_CONFIG, err.to_string())
            }
            ReconError::MissingColumn { table, .. } => recon_err(EXIT_RUNTIME, err.to_string())
                .with_hint(format!(
                    "check the header row of the {} file (headers are matched lowercased, spaces as '_')",
                    table.label()
                )),
            _ => recon_err(EXIT_RUNTIME, err.to_string()),
        }
    }
}

impl From<vinmerge_io::IoError> for CliError {
    fn from(err: vinmerge_io::IoError) -> Self {
        recon_err(EXIT_RUNTIME, err.to_string())
    }
}

/// Parse and validate the config; source paths resolve against its directory.
fn load_config(config_path: &Path) -> Result<(ReconConfig, PathBuf), CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        recon_err(
            EXIT_RUNTIME,
            format!("cannot read config {}: {e}", config_path.display()),
        )
    })?;
    let config = ReconConfig::from_toml(&config_str)?;
    let base_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    debug!(config = %config_path.display(), base_dir = %base_dir.display(), "loaded config");
    Ok((config, base_dir))
}

/// Command-line paths are relative to the working directory, not the config.
fn absolutize(path: &Path) -> Result<PathBuf, CliError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| recon_err(EXIT_RUNTIME, format!("cannot resolve working directory: {e}")))?;
    Ok(cwd.join(path))
}

fn apply_overrides(config: &mut ReconConfig, args: &RunArgs) -> Result<(), CliError> {
    for (source, path) in [
        (Source::Erp, &args.erp),
        (Source::Linkage, &args.linkage),
        (Source::Web, &args.web),
    ] {
        if let Some(path) = path {
            let resolved = absolutize(path)?;
            config.sources.get_mut(source).file = resolved.to_string_lossy().into_owned();
        }
    }
    if let Some(top) = args.top {
        config.revenue.top = usize::try_from(top).unwrap_or(usize::MAX);
    }
    Ok(())
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let (mut config, base_dir) = load_config(&args.config)?;
    apply_overrides(&mut config, &args)?;

    let input = vinmerge_io::load_input(&config, &base_dir)?;
    let result = vinmerge_recon::run(&config, &input)?;

    if let Some(ref path) = args.output {
        vinmerge_io::export::write_json(path, &result)?;
        eprintln!("wrote {}", path.display());
    }

    if let Some(ref dir) = args.export_dir {
        let written = vinmerge_io::export::export_all(dir, &result)?;
        eprintln!("exported {} file(s) to {}", written.len(), dir.display());
    }

    if args.json {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| recon_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        print!("{}", render_summary(&result, config.revenue.top));
    }

    let failed: Vec<&str> = result.failed_checks().map(|c| c.name.as_str()).collect();
    if !failed.is_empty() {
        return Err(recon_err(
            EXIT_CHECK_FAILED,
            format!("{} quality check(s) failed: {}", failed.len(), failed.join(", ")),
        )
        .with_hint("outputs were written; compare expected/actual in the checks section"));
    }

    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let (config, base_dir) = load_config(&config_path)?;
    let input = vinmerge_io::load_input(&config, &base_dir)?;
    let stats = vinmerge_recon::inspect(&config, &input)?;

    let rows: Vec<Vec<String>> = stats
        .iter()
        .map(|(source, s)| {
            vec![
                source.label().to_string(),
                s.raw_rows.to_string(),
                s.filtered_rows.to_string(),
                s.rejected_rows.to_string(),
                s.coerced_fields.to_string(),
            ]
        })
        .collect();
    eprint!(
        "{}",
        render_table(
            &["Source", "Rows", "Filtered", "Rejected", "Coerced"],
            &[Align::Left, Align::Right, Align::Right, Align::Right, Align::Right],
            &rows,
        )
    );
    eprintln!(
        "valid: '{}' with rule {} and 3 readable source(s)",
        config.name, config.revenue.rule
    );
    Ok(())
}

/// Human report: validation table, top-N revenue table, total, checks.
pub(crate) fn render_summary(result: &ReconResult, top: usize) -> String {
    let mut out = String::new();

    out.push_str(&format!("Validation: {}\n\n", result.meta.config_name));
    let rows: Vec<Vec<String>> = result
        .validation
        .iter()
        .map(|r| {
            vec![
                r.source.label().to_string(),
                r.before.to_string(),
                r.after.to_string(),
                r.duplicates_removed.to_string(),
            ]
        })
        .collect();
    out.push_str(&render_table(
        &["Source", "Before", "After", "DuplicatesRemoved"],
        &[Align::Left, Align::Right, Align::Right, Align::Right],
        &rows,
    ));

    let revenue = &result.revenue;
    out.push_str(&format!(
        "\nTop {} products by revenue (rule: {})\n\n",
        top.min(revenue.lines.len()),
        revenue.rule
    ));
    let rows: Vec<Vec<String>> = revenue
        .top(top)
        .iter()
        .enumerate()
        .map(|(i, l)| {
            vec![
                (i + 1).to_string(),
                l.product_id.to_string(),
                l.id_web.map(|id| id.to_string()).unwrap_or_default(),
                l.post_title.clone().unwrap_or_default(),
                l.price.to_string(),
                l.total_sales.to_string(),
                format!("{:.2}", l.revenue),
            ]
        })
        .collect();
    out.push_str(&render_table(
        &["#", "ProductID", "IdWeb", "Title", "Price", "Sales", "Revenue"],
        &[
            Align::Right,
            Align::Right,
            Align::Right,
            Align::Left,
            Align::Right,
            Align::Right,
            Align::Right,
        ],
        &rows,
    ));

    out.push_str(&format!(
        "\nTotal revenue: {:.2} ({} eligible, {} excluded)\n",
        revenue.total, revenue.eligible, revenue.excluded
    ));
    out.push_str(&format!(
        "Premium-priced products: {} (z > {})\n",
        result.outliers.premium.len(),
        result.outliers.threshold
    ));
    out.push_str(&format!(
        "Unlinked ERP products: {}\n",
        result.integrity.unlinked_products.len()
    ));

    out.push('\n');
    for check in &result.checks {
        let mark = match check.status {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "FAIL",
        };
        out.push_str(&format!(
            "{mark}  {}  expected {}, actual {}\n",
            check.name, check.expected, check.actual
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(config: &str) -> RunArgs {
        RunArgs {
            config: PathBuf::from(config),
            erp: None,
            linkage: None,
            web: None,
            top: None,
            json: false,
            output: None,
            export_dir: None,
        }
    }

    const CONFIG: &str = r#"
name = "CLI Test"
[sources.erp]
file = "erp.csv"
[sources.linkage]
file = "liaison.csv"
[sources.web]
file = "web.csv"
"#;

    #[test]
    fn overrides_replace_paths_and_top() {
        let mut config = ReconConfig::from_toml(CONFIG).unwrap();
        let mut a = args("cellar.vinmerge.toml");
        a.web = Some(PathBuf::from("/data/web-2020.csv"));
        a.top = Some(3);
        apply_overrides(&mut config, &a).unwrap();

        assert_eq!(config.sources.web.file, "/data/web-2020.csv");
        assert_eq!(config.sources.erp.file, "erp.csv");
        assert_eq!(config.revenue.top, 3);
    }

    #[test]
    fn relative_override_is_cwd_based() {
        let mut config = ReconConfig::from_toml(CONFIG).unwrap();
        let mut a = args("cellar.vinmerge.toml");
        a.erp = Some(PathBuf::from("erp-2021.csv"));
        apply_overrides(&mut config, &a).unwrap();
        assert!(Path::new(&config.sources.erp.file).is_absolute());
    }

    #[test]
    fn engine_errors_map_to_exit_codes() {
        let err: CliError = ReconError::ConfigValidation("bad".into()).into();
        assert_eq!(err.code, EXIT_INVALID_CONFIG);

        let err: CliError = ReconError::MissingColumn {
            table: Source::Web,
            column: "sku".into(),
        }
        .into();
        assert_eq!(err.code, EXIT_RUNTIME);
        assert!(err.hint.unwrap().contains("Web"));
    }

    #[test]
    fn unreadable_config_is_runtime_error() {
        let dir = std::env::temp_dir();
        let path = dir.join("vinmerge-missing-config.toml");
        let err = load_config(&path).unwrap_err();
        assert_eq!(err.code, EXIT_RUNTIME);
    }
}
