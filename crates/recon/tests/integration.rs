use std::collections::BTreeMap;
use std::path::PathBuf;

use rust_decimal::Decimal;
use vinmerge_recon::config::RevenueRule;
use vinmerge_recon::model::CheckStatus;
use vinmerge_recon::{run, RawTable, ReconConfig, ReconInput, ReconResult, Source};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Fixtures are plain `;`-separated UTF-8 without quoting.
fn load_table(source: Source, file: &str) -> RawTable {
    let path = fixtures_dir().join(file);
    let data = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    let mut lines = data.lines().filter(|l| !l.trim().is_empty());
    let headers = lines
        .next()
        .unwrap()
        .split(';')
        .map(|h| h.trim().to_lowercase())
        .collect();
    let rows = lines
        .map(|l| l.split(';').map(String::from).collect())
        .collect();
    RawTable::new(source, headers, rows)
}

fn load_input(config: &ReconConfig) -> ReconInput {
    ReconInput {
        erp: load_table(Source::Erp, &config.sources.erp.file),
        linkage: load_table(Source::Linkage, &config.sources.linkage.file),
        web: load_table(Source::Web, &config.sources.web.file),
        fingerprints: BTreeMap::new(),
    }
}

fn fixture_config() -> String {
    std::fs::read_to_string(fixtures_dir().join("cellar.vinmerge.toml")).unwrap()
}

fn load_and_run(config_toml: &str) -> ReconResult {
    let config = ReconConfig::from_toml(config_toml).unwrap();
    run(&config, &load_input(&config)).unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// -------------------------------------------------------------------------
// Validation report
// -------------------------------------------------------------------------

#[test]
fn validation_counts_per_source() {
    let result = load_and_run(&fixture_config());
    let by_source: BTreeMap<_, _> = result.validation.iter().map(|r| (r.source, r)).collect();

    let erp = by_source[&Source::Erp];
    assert_eq!(erp.raw_rows, 14);
    assert_eq!((erp.before, erp.after, erp.duplicates_removed), (14, 13, 1));
    // "prix" is the only unparseable price; the blank one is simply null.
    assert_eq!(erp.coerced_fields, 1);

    let linkage = by_source[&Source::Linkage];
    assert_eq!(linkage.rejected_rows, 1, "13127-1 is dropped");
    assert_eq!((linkage.before, linkage.after), (13, 12));

    let web = by_source[&Source::Web];
    assert_eq!(web.rejected_rows, 1, "gift card sku is dropped");
    assert_eq!((web.before, web.after, web.duplicates_removed), (14, 13, 1));
}

#[test]
fn validation_report_is_in_source_order() {
    let result = load_and_run(&fixture_config());
    let order: Vec<_> = result.validation.iter().map(|r| r.source).collect();
    assert_eq!(order, vec![Source::Erp, Source::Linkage, Source::Web]);
}

// -------------------------------------------------------------------------
// Merge
// -------------------------------------------------------------------------

#[test]
fn merged_view_has_one_row_per_erp_product() {
    let result = load_and_run(&fixture_config());
    assert_eq!(result.merged.len(), 13);

    let ids: Vec<_> = result.merged.iter().map(|m| m.product_id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(ids, sorted, "ascending, no repeats");

    // Product 9999 exists only in the linkage table.
    assert!(!ids.contains(&9999));
    assert_eq!(result.integrity.duplicate_keys_after_dedupe, 0);
}

#[test]
fn first_erp_row_wins() {
    let result = load_and_run(&fixture_config());
    let p = result.merged.iter().find(|m| m.product_id == 4040).unwrap();
    assert_eq!(p.price, Some(dec("34.3")));
}

#[test]
fn resolved_linkage_beats_null() {
    let result = load_and_run(&fixture_config());
    let p = result.merged.iter().find(|m| m.product_id == 4048).unwrap();
    assert_eq!(p.id_web, Some(16044));
    assert_eq!(p.total_sales, Some(4));
    assert_eq!(p.price, None);
}

#[test]
fn attachment_row_does_not_fan_out() {
    let result = load_and_run(&fixture_config());
    let p = result.merged.iter().find(|m| m.product_id == 4041).unwrap();
    assert_eq!(p.total_sales, Some(10));
    assert_eq!(p.post_title.as_deref(), Some("Domaine Croix Blanche Pinot Noir 2019"));
}

#[test]
fn rejected_linkage_leaves_product_unlinked() {
    let result = load_and_run(&fixture_config());
    let p = result.merged.iter().find(|m| m.product_id == 4045).unwrap();
    assert_eq!(p.id_web, None);
    assert_eq!(p.total_sales, None);
    assert_eq!(p.post_title, None);
}

// -------------------------------------------------------------------------
// Revenue
// -------------------------------------------------------------------------

#[test]
fn on_sale_revenue() {
    let result = load_and_run(&fixture_config());
    let revenue = &result.revenue;

    assert_eq!(revenue.rule, RevenueRule::OnSale);
    assert_eq!(revenue.total, dec("799.10"));
    assert_eq!(revenue.eligible, 10);
    assert_eq!(revenue.excluded, 3);

    let order: Vec<_> = revenue.lines.iter().map(|l| l.product_id).collect();
    assert_eq!(
        order,
        vec![4041, 4042, 3847, 4040, 4043, 4032, 3849, 3850, 4045, 5000]
    );
    assert_eq!(revenue.lines[0].revenue, dec("327.0"));

    let sum: Decimal = revenue.lines.iter().map(|l| l.revenue).sum();
    assert_eq!(sum, revenue.total);
}

#[test]
fn top_is_a_view_over_the_lines() {
    let result = load_and_run(&fixture_config());
    let top = result.revenue.top(3);
    assert_eq!(top.len(), 3);
    assert_eq!(top[2].product_id, 3847);
    assert_eq!(result.revenue.top(100).len(), 10);
}

#[test]
fn catalog_product_rule_with_row_filter() {
    let toml = format!(
        "{}\n",
        fixture_config()
            .replace("rule = \"on_sale\"", "rule = \"catalog_product\"")
            .replace(
                "[sources.web]\nfile = \"web.csv\"",
                "[sources.web]\nfile = \"web.csv\"\nfilter = { column = \"post_type\", values = [\"product\"] }",
            )
    );
    let result = load_and_run(&toml);

    let web = &result.validation[2];
    assert_eq!(web.filtered_rows, 1);
    assert_eq!(web.duplicates_removed, 0);

    let ids: Vec<_> = result.revenue.lines.iter().map(|l| l.product_id).collect();
    assert_eq!(ids, vec![4041, 4042, 3847, 4040, 4043, 4032]);
    assert_eq!(result.revenue.total, dec("799.10"));
    assert_eq!(result.meta.rule, RevenueRule::CatalogProduct);
}

// -------------------------------------------------------------------------
// Tiers, integrity, checks
// -------------------------------------------------------------------------

#[test]
fn premium_tier() {
    let result = load_and_run(&fixture_config());
    let premium: Vec<_> = result.outliers.premium.iter().map(|p| p.product_id).collect();
    assert_eq!(premium, vec![5000]);
    // Every priced product lands in exactly one tier.
    assert_eq!(result.outliers.ordinary.len(), 10);
}

#[test]
fn integrity_orphans() {
    let result = load_and_run(&fixture_config());
    let integrity = &result.integrity;
    assert_eq!(integrity.erp_without_linkage, vec![4045, 5000]);
    assert_eq!(integrity.web_without_linkage, vec![18000]);
    let unlinked: Vec<_> = integrity.unlinked_products.iter().map(|u| u.product_id).collect();
    assert_eq!(unlinked, vec![4045, 5000]);
}

#[test]
fn configured_checks_pass() {
    let result = load_and_run(&fixture_config());
    assert_eq!(result.checks.len(), 3);
    assert!(result.checks.iter().all(|c| c.status == CheckStatus::Pass));
    assert_eq!(result.failed_checks().count(), 0);
}

#[test]
fn wrong_expectation_fails_check() {
    let toml = fixture_config().replace("\"799.10\"", "\"70568.60\"");
    let result = load_and_run(&toml);
    let failed: Vec<_> = result.failed_checks().map(|c| c.name.as_str()).collect();
    assert_eq!(failed, vec!["total_revenue"]);
}

#[test]
fn same_input_same_result() {
    let a = load_and_run(&fixture_config());
    let b = load_and_run(&fixture_config());
    assert_eq!(a.merged, b.merged);
    assert_eq!(a.revenue.lines, b.revenue.lines);
    assert_eq!(a.validation, b.validation);
}

// -------------------------------------------------------------------------
// Structural errors
// -------------------------------------------------------------------------

#[test]
fn missing_column_names_the_source() {
    let config = ReconConfig::from_toml(&fixture_config()).unwrap();
    let mut input = load_input(&config);
    input.linkage.headers = vec!["product_id".into(), "web_ref".into()];

    let err = run(&config, &input).unwrap_err();
    assert_eq!(err.table(), Some(Source::Linkage));
    assert!(err.to_string().contains("id_web"), "got: {err}");
}
