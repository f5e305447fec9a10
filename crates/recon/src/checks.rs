use tracing::warn;

use crate::config::ChecksConfig;
use crate::model::{CheckStatus, QualityCheck, RevenueReport};

fn check(name: &str, ok: bool, expected: String, actual: String) -> QualityCheck {
    let status = if ok { CheckStatus::Pass } else { CheckStatus::Fail };
    if status == CheckStatus::Fail {
        warn!(check = name, %expected, %actual, "quality check failed");
    }
    QualityCheck {
        name: name.into(),
        status,
        expected,
        actual,
    }
}

/// Evaluate the configured expectations plus the always-on completeness check.
pub fn run_checks(
    config: &ChecksConfig,
    erp_count: usize,
    merged_count: usize,
    revenue: &RevenueReport,
) -> Vec<QualityCheck> {
    let mut checks = vec![check(
        "merge_completeness",
        merged_count == erp_count,
        erp_count.to_string(),
        merged_count.to_string(),
    )];

    if let Some(expected) = config.expected_merged_rows {
        checks.push(check(
            "merged_row_count",
            merged_count == expected,
            expected.to_string(),
            merged_count.to_string(),
        ));
    }

    if let Some(expected) = config.expected_total_revenue {
        let within = revenue
            .total
            .checked_sub(expected)
            .is_some_and(|delta| delta.abs() <= config.revenue_tolerance);
        checks.push(check(
            "total_revenue",
            within,
            format!("{expected} ± {}", config.revenue_tolerance),
            revenue.total.round_dp(2).to_string(),
        ));
    }

    checks
}
