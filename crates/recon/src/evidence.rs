use std::collections::BTreeSet;

use crate::clean::CleanStats;
use crate::dedupe::{count_duplicate_keys, KeyedSet};
use crate::model::{
    ErpRecord, IntegrityReport, LinkageRecord, MergedProduct, Source, SourceReport,
    UnlinkedProduct, WebRecord,
};

/// Before/after accounting for one source.
pub fn source_report<T>(source: Source, stats: &CleanStats, set: &KeyedSet<T>) -> SourceReport {
    SourceReport {
        source,
        raw_rows: stats.raw_rows,
        filtered_rows: stats.filtered_rows,
        rejected_rows: stats.rejected_rows,
        coerced_fields: stats.coerced_fields,
        before: set.before(),
        after: set.after(),
        duplicates_removed: set.duplicates_removed(),
    }
}

/// Cross-source referential checks, recomputed from the stage outputs.
pub fn integrity_report(
    erp: &KeyedSet<ErpRecord>,
    linkage: &KeyedSet<LinkageRecord>,
    web: &KeyedSet<WebRecord>,
    merged: &[MergedProduct],
) -> IntegrityReport {
    let linked_products: BTreeSet<i64> = linkage.iter().map(|l| l.product_id).collect();
    let linked_web_ids: BTreeSet<i64> = linkage.iter().filter_map(|l| l.id_web).collect();

    let erp_without_linkage = erp
        .iter()
        .map(|e| e.product_id)
        .filter(|id| !linked_products.contains(id))
        .collect();

    let web_without_linkage = web
        .iter()
        .map(|w| w.id_web)
        .filter(|id| !linked_web_ids.contains(id))
        .collect();

    let unlinked_products = merged
        .iter()
        .filter(|m| m.id_web.is_none())
        .map(|m| UnlinkedProduct {
            product_id: m.product_id,
            price: m.price,
            stock_quantity: m.stock_quantity,
            stock_status: m.stock_status.clone(),
        })
        .collect();

    let duplicate_keys_after_dedupe = count_duplicate_keys(erp.records(), |e| e.product_id)
        + count_duplicate_keys(linkage.records(), |l| l.product_id)
        + count_duplicate_keys(web.records(), |w| w.id_web)
        + count_duplicate_keys(merged, |m| m.product_id);

    IntegrityReport {
        erp_without_linkage,
        web_without_linkage,
        unlinked_products,
        duplicate_keys_after_dedupe,
    }
}
