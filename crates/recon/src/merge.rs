use std::collections::HashMap;

use tracing::info;

use crate::dedupe::KeyedSet;
use crate::model::{ErpRecord, LinkageRecord, MergedProduct, WebRecord};

/// ERP row after the first join: its linkage, if any.
struct Linked<'a> {
    erp: &'a ErpRecord,
    id_web: Option<i64>,
}

/// Left-join ERP ⟕ linkage on `product_id`, then ⟕ web on `id_web`.
///
/// Output has exactly one row per ERP record, ascending by `product_id`.
/// Unlinked products and links without a web row carry `None` web fields.
pub fn merge(
    erp: &KeyedSet<ErpRecord>,
    linkage: &KeyedSet<LinkageRecord>,
    web: &KeyedSet<WebRecord>,
) -> Vec<MergedProduct> {
    let linked = join_linkage(erp, linkage);
    let mut merged = join_web(&linked, web);

    // KeyedSet already yields key order; sorting keeps the contract explicit.
    merged.sort_by_key(|m| m.product_id);

    info!(
        erp = erp.len(),
        merged = merged.len(),
        linked = merged.iter().filter(|m| m.id_web.is_some()).count(),
        with_web = merged.iter().filter(|m| m.total_sales.is_some()).count(),
        "merged sources"
    );
    debug_assert_eq!(merged.len(), erp.len(), "left join must preserve ERP rows");
    merged
}

fn join_linkage<'a>(
    erp: &'a KeyedSet<ErpRecord>,
    linkage: &KeyedSet<LinkageRecord>,
) -> Vec<Linked<'a>> {
    let mut by_product: HashMap<i64, Option<i64>> = HashMap::with_capacity(linkage.len());
    for link in linkage {
        let prev = by_product.insert(link.product_id, link.id_web);
        debug_assert!(prev.is_none(), "linkage key {} not unique", link.product_id);
    }

    erp.iter()
        .map(|e| Linked {
            erp: e,
            id_web: by_product.get(&e.product_id).copied().flatten(),
        })
        .collect()
}

fn join_web(linked: &[Linked<'_>], web: &KeyedSet<WebRecord>) -> Vec<MergedProduct> {
    let mut by_id: HashMap<i64, &WebRecord> = HashMap::with_capacity(web.len());
    for w in web {
        let prev = by_id.insert(w.id_web, w);
        debug_assert!(prev.is_none(), "web key {} not unique", w.id_web);
    }

    linked
        .iter()
        .map(|l| {
            let w = l.id_web.and_then(|id| by_id.get(&id).copied());
            MergedProduct {
                product_id: l.erp.product_id,
                onsale_web: l.erp.onsale_web,
                price: l.erp.price,
                stock_quantity: l.erp.stock_quantity,
                stock_status: l.erp.stock_status.clone(),
                id_web: l.id_web,
                total_sales: w.map(|w| w.total_sales),
                post_title: w.map(|w| w.post_title.clone()),
                post_type: w.and_then(|w| w.post_type.clone()),
            }
        })
        .collect()
}
