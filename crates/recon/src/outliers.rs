//! Price z-scores over the merged view.
//!
//! Products priced more than `threshold` population standard deviations
//! above the mean are "premium"; every other priced product is "ordinary".
//! Rows without a price take no part in either the statistics or the tiers.

use rust_decimal::prelude::ToPrimitive;
use tracing::info;

use crate::model::{MergedProduct, PriceOutliers, PricedProduct};
use crate::revenue::line_for;

/// Mean and population standard deviation. `(0, 0)` for an empty slice.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

pub fn price_tiers(merged: &[MergedProduct], threshold: f64) -> PriceOutliers {
    let priced: Vec<_> = merged.iter().filter_map(line_for).collect();
    let prices: Vec<f64> = priced
        .iter()
        .map(|l| l.price.to_f64().unwrap_or(0.0))
        .collect();
    let (mean, std_dev) = mean_std(&prices);

    let mut premium = Vec::new();
    let mut ordinary = Vec::new();

    for (line, price) in priced.into_iter().zip(prices) {
        // Identical prices: nobody stands out.
        let z_score = if std_dev > 0.0 { (price - mean) / std_dev } else { 0.0 };
        let product = PricedProduct {
            product_id: line.product_id,
            id_web: line.id_web,
            post_title: line.post_title,
            price: line.price,
            total_sales: line.total_sales,
            revenue: line.revenue,
            z_score,
        };
        if z_score > threshold {
            premium.push(product);
        } else {
            ordinary.push(product);
        }
    }

    premium.sort_by(|a, b| {
        b.z_score
            .total_cmp(&a.z_score)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    ordinary.sort_by_key(|p| p.product_id);

    info!(
        mean,
        std_dev,
        threshold,
        premium = premium.len(),
        "price tiers"
    );

    PriceOutliers {
        threshold,
        mean,
        std_dev,
        premium,
        ordinary,
    }
}
