use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::Eligibility;
use crate::model::{MergedProduct, RevenueLine, RevenueReport};

/// Whether a merged row contributes to revenue under `rule`.
pub fn is_eligible(product: &MergedProduct, rule: &Eligibility) -> bool {
    if !product.onsale_web || product.price.is_none() {
        return false;
    }
    match rule {
        Eligibility::OnSale => true,
        Eligibility::CatalogProduct { product_type } => {
            product.total_sales.unwrap_or(0) > 0
                && product.post_type.as_deref() == Some(product_type.as_str())
        }
    }
}

/// `price × total_sales`, missing sales counting as zero. `None` without a price,
/// or when the product does not fit in a `Decimal`.
pub fn line_for(product: &MergedProduct) -> Option<RevenueLine> {
    let price = product.price?;
    let total_sales = product.total_sales.unwrap_or(0);
    let Some(revenue) = price.checked_mul(Decimal::from(total_sales)) else {
        warn!(
            product_id = product.product_id,
            price = %price,
            total_sales,
            "revenue overflows, product skipped"
        );
        return None;
    };
    Some(RevenueLine {
        product_id: product.product_id,
        id_web: product.id_web,
        post_title: product.post_title.clone(),
        price,
        total_sales,
        revenue,
    })
}

/// Per-product and total revenue over the eligible rows of `merged`.
pub fn compute_revenue(merged: &[MergedProduct], rule: &Eligibility) -> RevenueReport {
    let mut lines: Vec<RevenueLine> = merged
        .iter()
        .filter(|m| is_eligible(m, rule))
        .filter_map(line_for)
        .collect();

    lines.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });

    // Largest first: a line that would overflow the running total is dropped.
    let mut total = Decimal::ZERO;
    lines.retain(|l| match total.checked_add(l.revenue) {
        Some(sum) => {
            total = sum;
            true
        }
        None => {
            warn!(product_id = l.product_id, revenue = %l.revenue, "total overflows, line skipped");
            false
        }
    });
    let eligible = lines.len();

    info!(rule = %rule.rule(), eligible, total = %total, "computed revenue");

    RevenueReport {
        rule: rule.rule(),
        lines,
        total,
        eligible,
        excluded: merged.len() - eligible,
    }
}
