//! Grouped counts and sums over loaded rows.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dashboard::types::{
    ClaimFact, DateRange, DepartmentTotal, MonthTotal, StatusCount, StatusTotal,
};
use crate::document::DocumentStatus;

/// Label used for claims whose submitter has no department.
pub const UNASSIGNED: &str = "Unassigned";

/// `YYYY-MM` bucket of a date.
#[must_use]
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Counts statuses, in status order. Statuses with no rows are omitted.
#[must_use]
pub fn count_by_status(statuses: &[DocumentStatus]) -> Vec<StatusCount> {
    let mut counts: BTreeMap<DocumentStatus, u64> = BTreeMap::new();
    for status in statuses {
        *counts.entry(*status).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect()
}

/// Claim count and amount per status, in status order.
#[must_use]
pub fn claims_by_status(claims: &[ClaimFact]) -> Vec<StatusTotal> {
    let mut buckets: BTreeMap<DocumentStatus, (u64, Decimal)> = BTreeMap::new();
    for claim in claims {
        let entry = buckets.entry(claim.status).or_default();
        entry.0 += 1;
        entry.1 += claim.amount;
    }
    buckets
        .into_iter()
        .map(|(status, (count, total_amount))| StatusTotal {
            status,
            count,
            total_amount,
        })
        .collect()
}

/// Claim count and amount per department, largest total first.
///
/// `names` maps department ids to display names; unknown ids and claims
/// without a department are labeled [`UNASSIGNED`] under their own id.
#[must_use]
pub fn claims_by_department(
    claims: &[ClaimFact],
    names: &HashMap<Uuid, String>,
) -> Vec<DepartmentTotal> {
    let mut buckets: HashMap<Option<Uuid>, (u64, Decimal)> = HashMap::new();
    for claim in claims {
        let entry = buckets.entry(claim.department_id).or_default();
        entry.0 += 1;
        entry.1 += claim.amount;
    }

    let mut out: Vec<DepartmentTotal> = buckets
        .into_iter()
        .map(|(department_id, (count, total_amount))| DepartmentTotal {
            department_name: department_id
                .and_then(|id| names.get(&id).cloned())
                .unwrap_or_else(|| UNASSIGNED.to_string()),
            department_id,
            count,
            total_amount,
        })
        .collect();
    out.sort_by(|a, b| {
        b.total_amount
            .cmp(&a.total_amount)
            .then_with(|| a.department_name.cmp(&b.department_name))
    });
    out
}

/// Claim count and amount per month across the range.
///
/// Every month touched by the range appears, empty ones with zero. Claims
/// outside the range are ignored.
#[must_use]
pub fn claims_by_month(claims: &[ClaimFact], range: DateRange) -> Vec<MonthTotal> {
    let mut buckets: BTreeMap<String, (u64, Decimal)> = BTreeMap::new();

    let mut cursor = first_of_month(range.from);
    while cursor <= range.to {
        buckets.insert(month_key(cursor), (0, Decimal::ZERO));
        let Some(next) = next_month(cursor) else {
            break;
        };
        cursor = next;
    }

    for claim in claims.iter().filter(|c| range.contains(c.date)) {
        let entry = buckets.entry(month_key(claim.date)).or_default();
        entry.0 += 1;
        entry.1 += claim.amount;
    }

    buckets
        .into_iter()
        .map(|(month, (count, total_amount))| MonthTotal {
            month,
            count,
            total_amount,
        })
        .collect()
}

/// Sum of claims that entered review and were not rejected.
#[must_use]
pub fn total_claimed(claims: &[ClaimFact]) -> Decimal {
    claims
        .iter()
        .filter(|c| !matches!(c.status, DocumentStatus::Draft | DocumentStatus::Rejected))
        .map(|c| c.amount)
        .sum()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn next_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn claim(status: DocumentStatus, amount: Decimal, dept: Option<Uuid>, on: &str) -> ClaimFact {
        ClaimFact {
            status,
            amount,
            department_id: dept,
            date: date(on),
        }
    }

    #[test]
    fn test_by_status_sums_and_orders() {
        let claims = vec![
            claim(DocumentStatus::Approved, dec!(100), None, "2026-01-05"),
            claim(DocumentStatus::Draft, dec!(5), None, "2026-01-06"),
            claim(DocumentStatus::Approved, dec!(50.50), None, "2026-02-01"),
        ];
        let out = claims_by_status(&claims);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].status, DocumentStatus::Draft);
        assert_eq!(out[1].count, 2);
        assert_eq!(out[1].total_amount, dec!(150.50));
    }

    #[test]
    fn test_by_department_names_and_sorts() {
        let sales = Uuid::new_v4();
        let ops = Uuid::new_v4();
        let names = HashMap::from([(sales, "Sales".to_string()), (ops, "Operations".to_string())]);
        let claims = vec![
            claim(DocumentStatus::Paid, dec!(10), Some(ops), "2026-01-01"),
            claim(DocumentStatus::Paid, dec!(300), Some(sales), "2026-01-01"),
            claim(DocumentStatus::Paid, dec!(20), None, "2026-01-01"),
        ];
        let out = claims_by_department(&claims, &names);

        assert_eq!(out[0].department_name, "Sales");
        assert_eq!(out[1].department_name, UNASSIGNED);
        assert_eq!(out[2].department_name, "Operations");
    }

    #[test]
    fn test_by_month_fills_gaps_and_ignores_out_of_range() {
        let range = DateRange::new(date("2025-11-15"), date("2026-02-10")).unwrap();
        let claims = vec![
            claim(DocumentStatus::Approved, dec!(10), None, "2025-11-20"),
            claim(DocumentStatus::Approved, dec!(15), None, "2026-02-09"),
            claim(DocumentStatus::Approved, dec!(99), None, "2026-02-11"),
            claim(DocumentStatus::Approved, dec!(99), None, "2025-11-14"),
        ];
        let out = claims_by_month(&claims, range);

        let months: Vec<&str> = out.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, ["2025-11", "2025-12", "2026-01", "2026-02"]);
        assert_eq!(out[0].total_amount, dec!(10));
        assert_eq!(out[1].count, 0);
        assert_eq!(out[3].total_amount, dec!(15));
    }

    #[test]
    fn test_total_claimed_skips_drafts_and_rejections() {
        let claims = vec![
            claim(DocumentStatus::Draft, dec!(1000), None, "2026-01-01"),
            claim(DocumentStatus::Rejected, dec!(1000), None, "2026-01-01"),
            claim(DocumentStatus::Submitted, dec!(40), None, "2026-01-01"),
            claim(DocumentStatus::Paid, dec!(60), None, "2026-01-01"),
        ];
        assert_eq!(total_claimed(&claims), dec!(100));
    }

    #[test]
    fn test_count_by_status() {
        let out = count_by_status(&[
            DocumentStatus::Submitted,
            DocumentStatus::Draft,
            DocumentStatus::Submitted,
        ]);
        assert_eq!(
            out,
            vec![
                StatusCount {
                    status: DocumentStatus::Draft,
                    count: 1
                },
                StatusCount {
                    status: DocumentStatus::Submitted,
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_range_validation() {
        assert!(DateRange::new(date("2026-02-01"), date("2026-01-01")).is_err());
        assert!(DateRange::new(date("2020-01-01"), date("2026-01-01")).is_err());
    }
}
