use tracing::info_span;

use crate::checks::run_checks;
use crate::clean::{clean_erp, clean_linkage, clean_web, CleanStats};
use crate::config::{RevenueRule, ReconConfig};
use crate::dedupe::{dedupe_erp, dedupe_linkage, dedupe_web};
use crate::error::ReconError;
use crate::evidence::{integrity_report, source_report};
use crate::merge::merge;
use crate::model::{ReconInput, ReconMeta, ReconResult, Source};
use crate::outliers::price_tiers;
use crate::revenue::compute_revenue;

/// Run the pipeline per config: clean → dedupe → merge → report.
///
/// Only structural input problems are errors; dirty cells degrade into
/// dropped rows or null fields, visible in the validation report.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    let span = info_span!("recon", config = %config.name);
    let _guard = span.enter();

    let sources = &config.sources;
    let eligibility = config.revenue.eligibility();
    let needs_post_type = eligibility.rule() == RevenueRule::CatalogProduct;

    // Clean every source before deduplicating so a missing column anywhere
    // aborts before any work is reported.
    let erp = clean_erp(&input.erp, sources.get(Source::Erp).filter.as_ref())?;
    let linkage = clean_linkage(&input.linkage, sources.get(Source::Linkage).filter.as_ref())?;
    let web = clean_web(
        &input.web,
        sources.get(Source::Web).filter.as_ref(),
        needs_post_type,
    )?;

    let erp_set = dedupe_erp(erp.records);
    let linkage_set = dedupe_linkage(linkage.records);
    let web_set = dedupe_web(web.records);

    let validation = vec![
        source_report(Source::Erp, &erp.stats, &erp_set),
        source_report(Source::Linkage, &linkage.stats, &linkage_set),
        source_report(Source::Web, &web.stats, &web_set),
    ];
    for r in &validation {
        tracing::info!(
            source = %r.source,
            before = r.before,
            after = r.after,
            duplicates_removed = r.duplicates_removed,
            "deduplicated"
        );
    }

    let merged = merge(&erp_set, &linkage_set, &web_set);
    let revenue = compute_revenue(&merged, &eligibility);
    let outliers = price_tiers(&merged, config.outliers.z_threshold);
    let integrity = integrity_report(&erp_set, &linkage_set, &web_set, &merged);
    let checks = run_checks(&config.checks, erp_set.len(), merged.len(), &revenue);

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            rule: eligibility.rule(),
            fingerprints: input.fingerprints.clone(),
        },
        validation,
        merged,
        revenue,
        outliers,
        integrity,
        checks,
    })
}

/// Clean every source without merging: confirms the required columns are
/// present and reports per-source row accounting.
pub fn inspect(
    config: &ReconConfig,
    input: &ReconInput,
) -> Result<Vec<(Source, CleanStats)>, ReconError> {
    let sources = &config.sources;
    let needs_post_type = config.revenue.rule == RevenueRule::CatalogProduct;

    Ok(vec![
        (
            Source::Erp,
            clean_erp(&input.erp, sources.get(Source::Erp).filter.as_ref())?.stats,
        ),
        (
            Source::Linkage,
            clean_linkage(&input.linkage, sources.get(Source::Linkage).filter.as_ref())?.stats,
        ),
        (
            Source::Web,
            clean_web(&input.web, sources.get(Source::Web).filter.as_ref(), needs_post_type)?
                .stats,
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CheckStatus, RawTable};
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;

    const CONFIG: &str = r#"
name = "Engine Test"

[sources.erp]
file = "erp.csv"
[sources.linkage]
file = "liaison.csv"
[sources.web]
file = "web.csv"
"#;

    fn table(source: Source, csv: &str) -> RawTable {
        let mut lines = csv.lines();
        let headers = lines.next().unwrap().split(';').map(String::from).collect();
        let rows = lines.map(|l| l.split(';').map(String::from).collect()).collect();
        RawTable::new(source, headers, rows)
    }

    fn input() -> ReconInput {
        ReconInput {
            erp: table(
                Source::Erp,
                "\
product_id;onsale_web;price;stock_quantity;stock_status
1;1;10,50;5;instock
2;0;5,00;1;instock
2;1;6,00;1;instock
3;1;;0;outofstock
",
            ),
            linkage: table(
                Source::Linkage,
                "\
product_id;id_web
1;100
2;200
3;
3;13127-1
",
            ),
            web: table(
                Source::Web,
                "\
sku;total_sales;post_title;post_type
100;4;X;product
200;3;Y;product
bon-cadeau-25-euros;12;Gift;product
",
            ),
            fingerprints: BTreeMap::new(),
        }
    }

    #[test]
    fn end_to_end() {
        let config = ReconConfig::from_toml(CONFIG).unwrap();
        let result = run(&config, &input()).unwrap();

        assert_eq!(result.merged.len(), 3);
        assert_eq!(result.revenue.total, Decimal::new(4200, 2));
        assert_eq!(result.revenue.lines.len(), 1);

        // Product 2: first ERP row (not on sale) wins, still merged with web data.
        let p2 = &result.merged[1];
        assert!(!p2.onsale_web);
        assert_eq!(p2.total_sales, Some(3));

        let erp = &result.validation[0];
        assert_eq!((erp.before, erp.after, erp.duplicates_removed), (4, 3, 1));
        let linkage = &result.validation[1];
        assert_eq!(linkage.rejected_rows, 1);
        assert_eq!((linkage.before, linkage.after), (3, 3));
        let web = &result.validation[2];
        assert_eq!(web.rejected_rows, 1);
        assert_eq!(web.after, 2);

        assert!(result.checks.iter().all(|c| c.status == CheckStatus::Pass));
        assert_eq!(result.integrity.unlinked_products.len(), 1);
    }

    #[test]
    fn catalog_rule_requires_post_type_column() {
        let config = ReconConfig::from_toml(&format!(
            "{CONFIG}\n[revenue]\nrule = \"catalog_product\"\n"
        ))
        .unwrap();
        let mut input = input();
        input.web = table(Source::Web, "sku;total_sales;post_title\n100;4;X\n");
        let err = run(&config, &input).unwrap_err();
        assert_eq!(err.table(), Some(Source::Web));
        assert!(inspect(&config, &input).is_err());
    }

    #[test]
    fn huge_parseable_values_do_not_abort_the_run() {
        let config = ReconConfig::from_toml(CONFIG).unwrap();
        let input = ReconInput {
            erp: table(
                Source::Erp,
                "product_id;onsale_web;price;stock_quantity;stock_status\n1;1;100000000000000000000;1;instock\n",
            ),
            linkage: table(Source::Linkage, "product_id;id_web\n1;100\n"),
            web: table(Source::Web, "sku;total_sales;post_title\n100;1000000000;X\n"),
            fingerprints: BTreeMap::new(),
        };
        let result = run(&config, &input).unwrap();

        assert_eq!(result.merged.len(), 1);
        assert_eq!(result.merged[0].total_sales, Some(1_000_000_000));
        assert!(result.revenue.lines.is_empty());
        assert_eq!(result.revenue.total, Decimal::ZERO);
        assert_eq!(result.revenue.excluded, 1);
        assert!(result.outliers.premium.is_empty() && result.outliers.ordinary.is_empty());
    }

    #[test]
    fn inspect_reports_stats_per_source() {
        let config = ReconConfig::from_toml(CONFIG).unwrap();
        let stats = inspect(&config, &input()).unwrap();
        let sources: Vec<_> = stats.iter().map(|(s, _)| *s).collect();
        assert_eq!(sources, Source::ALL.to_vec());
        assert_eq!(stats[0].1.raw_rows, 4);
        assert_eq!(stats[1].1.rejected_rows, 1);
        assert_eq!(stats[2].1.rejected_rows, 1);
    }
}
