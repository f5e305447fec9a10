// Config-driven source loading

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;
use vinmerge_recon::config::InputConfig;
use vinmerge_recon::{RawTable, ReconConfig, ReconInput, Source};

use crate::csv::{decode, parse_table};
use crate::error::IoError;
use crate::fingerprint::fingerprint;

/// Relative source paths are taken relative to the config file's directory.
pub fn resolve_path(base_dir: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Read one source file. Returns the table and the fingerprint of its raw bytes.
pub fn load_table(
    source: Source,
    path: &Path,
    input: &InputConfig,
) -> Result<(RawTable, String), IoError> {
    let bytes = std::fs::read(path).map_err(|e| IoError::read(path, e))?;
    let digest = fingerprint(&bytes);
    let content = decode(bytes, &input.encoding)?;
    let table = parse_table(source, path, &content, input.delimiter as u8)?;

    info!(
        %source,
        path = %path.display(),
        rows = table.rows.len(),
        "loaded source"
    );
    Ok((table, digest))
}

/// Load the three sources named in `config`.
pub fn load_input(config: &ReconConfig, base_dir: &Path) -> Result<ReconInput, IoError> {
    let mut fingerprints = BTreeMap::new();
    let mut load = |source: Source| -> Result<RawTable, IoError> {
        let path = resolve_path(base_dir, &config.sources.get(source).file);
        let (table, digest) = load_table(source, &path, &config.input)?;
        fingerprints.insert(source.to_string(), digest);
        Ok(table)
    };

    let erp = load(Source::Erp)?;
    let linkage = load(Source::Linkage)?;
    let web = load(Source::Web)?;

    Ok(ReconInput {
        erp,
        linkage,
        web,
        fingerprints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const CONFIG: &str = r#"
name = "Load Test"

[sources.erp]
file = "erp.csv"
[sources.linkage]
file = "liaison.csv"
[sources.web]
file = "web.csv"
"#;

    fn write_sources(dir: &Path) {
        fs::write(
            dir.join("erp.csv"),
            b"product_id;onsale_web;price;stock_quantity;stock_status\n3847;1;24,2;0;outofstock\n",
        )
        .unwrap();
        fs::write(dir.join("liaison.csv"), b"product_id;id_web\n3847;15298\n").unwrap();
        // Latin-1: "Pr\xe9face"
        fs::write(
            dir.join("web.csv"),
            b"SKU;Total Sales;Post Title\n15298;6;Pierre Jean Villa Saint-Joseph Pr\xe9face 2018\n",
        )
        .unwrap();
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/data/cellar");
        assert_eq!(resolve_path(base, "erp.csv"), PathBuf::from("/data/cellar/erp.csv"));
        assert_eq!(resolve_path(base, "/tmp/erp.csv"), PathBuf::from("/tmp/erp.csv"));
    }

    #[test]
    fn test_load_input() {
        let dir = tempdir().unwrap();
        write_sources(dir.path());
        let config = ReconConfig::from_toml(CONFIG).unwrap();

        let input = load_input(&config, dir.path()).unwrap();
        assert_eq!(input.erp.rows.len(), 1);
        assert_eq!(input.web.headers, vec!["sku", "total_sales", "post_title"]);
        assert_eq!(input.web.rows[0][2], "Pierre Jean Villa Saint-Joseph Préface 2018");

        let keys: Vec<_> = input.fingerprints.keys().cloned().collect();
        assert_eq!(keys, vec!["erp", "linkage", "web"]);
        assert_eq!(
            input.fingerprints["linkage"],
            fingerprint(b"product_id;id_web\n3847;15298\n")
        );
    }

    #[test]
    fn test_missing_source_file() {
        let dir = tempdir().unwrap();
        write_sources(dir.path());
        fs::remove_file(dir.path().join("liaison.csv")).unwrap();
        let config = ReconConfig::from_toml(CONFIG).unwrap();

        let err = load_input(&config, dir.path()).unwrap_err();
        assert!(matches!(err, IoError::Read { .. }));
        assert!(err.to_string().contains("liaison.csv"), "got: {err}");
    }

    #[test]
    fn test_loaded_input_runs() {
        let dir = tempdir().unwrap();
        write_sources(dir.path());
        let config = ReconConfig::from_toml(CONFIG).unwrap();

        let input = load_input(&config, dir.path()).unwrap();
        let result = vinmerge_recon::run(&config, &input).unwrap();
        assert_eq!(result.merged.len(), 1);
        assert_eq!(result.revenue.total.to_string(), "145.2");
        assert_eq!(result.meta.fingerprints.len(), 3);
    }
}
