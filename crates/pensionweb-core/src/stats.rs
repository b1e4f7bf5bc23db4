//! Figures derived locally from fetched collections

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Operation, OperationType, PaymentMethod, Pensioner, PensionerWithOperations};

/// Number of rows in the recent activity widget
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Signed sum of operations: payments and bonuses add, deductions subtract
pub fn net_total(operations: &[Operation]) -> Decimal {
    operations
        .iter()
        .map(|op| match op.operation_type {
            OperationType::Payment | OperationType::Bonus => op.amount,
            OperationType::Deduction => -op.amount,
            OperationType::Adjustment => Decimal::ZERO,
        })
        .sum()
}

/// Aggregates shown on the statistics page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    pub total_pensioners: usize,
    pub total_operations: usize,
    /// Sorted by descending count, then name
    pub by_city: Vec<(String, usize)>,
    pub by_payment_method: Vec<(PaymentMethod, usize)>,
    pub total_monthly_payments: Decimal,
    pub average_monthly_payment: Decimal,
}

fn ranked<K: Ord + Clone>(counts: BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut entries: Vec<(K, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
}

pub fn summarize(pensioners: &[Pensioner], operations: &[Operation]) -> StatisticsSummary {
    let mut cities: BTreeMap<String, usize> = BTreeMap::new();
    let mut methods: HashMap<PaymentMethod, usize> = HashMap::new();
    for pensioner in pensioners {
        *cities.entry(pensioner.city.clone()).or_default() += 1;
        *methods.entry(pensioner.payment_method).or_default() += 1;
    }

    let by_payment_method = PaymentMethod::ALL
        .iter()
        .filter_map(|m| methods.get(m).map(|n| (*m, *n)))
        .collect();

    let total: Decimal = pensioners.iter().map(|p| p.monthly_payment).sum();
    let average = if pensioners.is_empty() {
        Decimal::ZERO
    } else {
        (total / Decimal::from(pensioners.len())).round_dp(2)
    };

    StatisticsSummary {
        total_pensioners: pensioners.len(),
        total_operations: operations.len(),
        by_city: ranked(cities),
        by_payment_method,
        total_monthly_payments: total,
        average_monthly_payment: average,
    }
}

/// A deduction joined with its pensioner
#[derive(Debug, Clone, PartialEq)]
pub struct Refund {
    pub operation: Operation,
    pub pensioner: Option<Pensioner>,
}

/// Deductions, newest first; operations without a parseable timestamp sort last
pub fn refunds(operations: &[Operation], pensioners: &[Pensioner]) -> Vec<Refund> {
    let by_id: HashMap<i64, &Pensioner> = pensioners
        .iter()
        .filter_map(|p| p.id.map(|id| (id, p)))
        .collect();

    let mut rows: Vec<Refund> = operations
        .iter()
        .filter(|op| op.operation_type == OperationType::Deduction)
        .map(|op| Refund {
            pensioner: op
                .pensioner
                .clone()
                .or_else(|| op.owner_id().and_then(|id| by_id.get(&id).map(|p| (*p).clone()))),
            operation: op.clone(),
        })
        .collect();

    rows.sort_by(|a, b| b.operation.timestamp_naive().cmp(&a.operation.timestamp_naive()));
    rows
}

/// Operations in `[from, to]` grouped under their owners
///
/// Pensioners without an operation in range are left out.
pub fn slice_by_date(
    pensioners: &[Pensioner],
    operations: &[Operation],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<PensionerWithOperations> {
    let mut in_range: HashMap<i64, Vec<Operation>> = HashMap::new();
    for op in operations {
        let Some(date) = op.date() else { continue };
        if date < from || date > to {
            continue;
        }
        if let Some(owner) = op.owner_id() {
            in_range.entry(owner).or_default().push(op.clone());
        }
    }

    pensioners
        .iter()
        .filter_map(|p| {
            let ops = in_range.remove(&p.id?)?;
            Some(PensionerWithOperations {
                pensioner: p.clone(),
                operations: ops,
            })
        })
        .collect()
}

/// The `limit` newest operations
pub fn recent(operations: &[Operation], limit: usize) -> Vec<Operation> {
    let mut sorted = operations.to_vec();
    sorted.sort_by(|a, b| b.timestamp_naive().cmp(&a.timestamp_naive()));
    sorted.truncate(limit);
    sorted
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    fn pensioner(id: i64, city: &str, monthly: i64, method: PaymentMethod) -> Pensioner {
        Pensioner {
            id: Some(id),
            name: format!("P{}", id),
            city: city.to_string(),
            monthly_payment: Decimal::from(monthly),
            payment_method: method,
            last_payment_date: None,
            birth_date: None,
            phone_number: None,
        }
    }

    fn op(id: i64, owner: i64, kind: OperationType, amount: i64, timestamp: &str) -> Operation {
        Operation {
            id: Some(id),
            pensioner: None,
            pensioner_id: Some(owner),
            amount: Decimal::from(amount),
            operation_type: kind,
            timestamp: timestamp.to_string(),
            description: None,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_net_total_signs() {
        let ops = vec![
            op(1, 1, OperationType::Payment, 3000, "2024-01-01"),
            op(2, 1, OperationType::Bonus, 500, "2024-01-02"),
            op(3, 1, OperationType::Deduction, 150, "2024-01-03"),
            op(4, 1, OperationType::Adjustment, 999, "2024-01-04"),
        ];
        assert_eq!(net_total(&ops), Decimal::from(3350));
        assert_eq!(net_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_summarize() {
        let pensioners = vec![
            pensioner(1, "Rabat", 1000, PaymentMethod::Cash),
            pensioner(2, "Fès", 2000, PaymentMethod::Cash),
            pensioner(3, "Rabat", 3001, PaymentMethod::Check),
        ];
        let summary = summarize(&pensioners, &[]);
        assert_eq!(summary.total_pensioners, 3);
        assert_eq!(summary.by_city[0], ("Rabat".to_string(), 2));
        assert_eq!(summary.by_payment_method, vec![(PaymentMethod::Check, 1), (PaymentMethod::Cash, 2)]);
        assert_eq!(summary.total_monthly_payments, Decimal::from(6001));
        assert_eq!(summary.average_monthly_payment, Decimal::new(200033, 2));
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[], &[]);
        assert_eq!(summary.average_monthly_payment, Decimal::ZERO);
        assert!(summary.by_city.is_empty());
    }

    #[test]
    fn test_refunds_newest_first_with_owner() {
        let pensioners = vec![pensioner(7, "Rabat", 1000, PaymentMethod::Cash)];
        let ops = vec![
            op(1, 7, OperationType::Deduction, 10, "2024-01-01T08:00:00"),
            op(2, 7, OperationType::Payment, 1000, "2024-01-05T08:00:00"),
            op(3, 8, OperationType::Deduction, 20, "2024-02-01T08:00:00"),
        ];
        let rows = refunds(&ops, &pensioners);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].operation.id, Some(3));
        assert!(rows[0].pensioner.is_none());
        assert_eq!(rows[1].pensioner.as_ref().and_then(|p| p.id), Some(7));
    }

    #[test]
    fn test_slice_by_date_inclusive() {
        let pensioners = vec![
            pensioner(1, "Rabat", 1000, PaymentMethod::Cash),
            pensioner(2, "Fès", 1000, PaymentMethod::Cash),
        ];
        let ops = vec![
            op(1, 1, OperationType::Payment, 100, "2024-03-01T00:00:00"),
            op(2, 1, OperationType::Payment, 100, "2024-03-31T23:59:59"),
            op(3, 1, OperationType::Payment, 100, "2024-04-01T00:00:00"),
            op(4, 2, OperationType::Payment, 100, "2024-02-28T12:00:00"),
        ];
        let slice = slice_by_date(&pensioners, &ops, date("2024-03-01"), date("2024-03-31"));
        assert_eq!(slice.len(), 1);
        assert_eq!(slice[0].pensioner.id, Some(1));
        assert_eq!(slice[0].operations.len(), 2);
    }

    #[test]
    fn test_recent_limit() {
        let ops: Vec<Operation> = (1..=8)
            .map(|day| op(day, 1, OperationType::Payment, 1, &format!("2024-01-0{}", day)))
            .collect();
        let latest = recent(&ops, RECENT_ACTIVITY_LIMIT);
        assert_eq!(latest.len(), 5);
        assert_eq!(latest[0].id, Some(8));
        assert_eq!(latest[4].id, Some(4));
    }
}
