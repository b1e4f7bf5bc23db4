//! Static demonstration dataset
//!
//! Same shapes as live data; served when the fallback source is selected.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rust_decimal::Decimal;

use crate::models::{DashboardStats, MonthlyPayment, Operation, OperationType, PaymentMethod, Pensioner};

const MONTHLY_DESCRIPTION: &str = "Pension mensuelle - Janvier 2024";

/// The fallback dataset, with operation timestamps anchored at creation time
#[derive(Debug, Clone)]
pub struct FallbackDataset {
    stats: DashboardStats,
    pensioners: Vec<Pensioner>,
    recent_operations: Vec<Operation>,
    monthly_payments: Vec<MonthlyPayment>,
}

impl Default for FallbackDataset {
    fn default() -> Self {
        Self::new()
    }
}

fn pensioner(id: i64, name: &str, city: &str, monthly: i64, method: PaymentMethod) -> Pensioner {
    Pensioner {
        id: Some(id),
        name: name.to_string(),
        city: city.to_string(),
        monthly_payment: Decimal::from(monthly),
        payment_method: method,
        last_payment_date: None,
        birth_date: None,
        phone_number: None,
    }
}

fn counts(entries: &[(&str, u64)]) -> Vec<(String, u64)> {
    entries.iter().map(|(k, n)| (k.to_string(), *n)).collect()
}

impl FallbackDataset {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Build the dataset as seen from `now`
    pub fn at(now: DateTime<Utc>) -> Self {
        let pensioners = vec![
            pensioner(1001, "Ahmed Benali", "Casablanca", 3500, PaymentMethod::BankTransfer),
            pensioner(1002, "Fatima Alaoui", "Rabat", 2800, PaymentMethod::Check),
            pensioner(1003, "Mohamed Tazi", "Marrakech", 4200, PaymentMethod::BankTransfer),
            pensioner(1004, "Aicha Benjelloun", "Fès", 3100, PaymentMethod::BankTransfer),
            pensioner(1005, "Hassan Idrissi", "Tanger", 3900, PaymentMethod::DigitalWallet),
        ];

        let plan = [
            (OperationType::Payment, 3500, Duration::minutes(30), MONTHLY_DESCRIPTION),
            (OperationType::Payment, 2800, Duration::hours(2), MONTHLY_DESCRIPTION),
            (OperationType::Bonus, 500, Duration::hours(4), "Prime exceptionnelle"),
            (OperationType::Deduction, 150, Duration::hours(6), "Correction - Trop-perçu"),
            (OperationType::Payment, 3900, Duration::hours(8), MONTHLY_DESCRIPTION),
        ];

        let recent_operations = plan
            .iter()
            .zip(pensioners.iter())
            .enumerate()
            .map(|(index, ((kind, amount, age, description), owner))| Operation {
                id: Some(index as i64 + 1),
                pensioner: Some(owner.clone()),
                pensioner_id: owner.id,
                amount: Decimal::from(*amount),
                operation_type: *kind,
                timestamp: (now - *age).to_rfc3339_opts(SecondsFormat::Millis, true),
                description: Some(description.to_string()),
            })
            .collect();

        let stats = DashboardStats {
            total_pensioners: 1247,
            pensioners_by_city: counts(&[
                ("Casablanca", 423),
                ("Rabat", 312),
                ("Marrakech", 198),
                ("Fès", 156),
                ("Tanger", 89),
                ("Agadir", 69),
            ]),
            pensioners_by_payment_method: counts(&[
                ("BANK_TRANSFER", 856),
                ("CHECK", 234),
                ("CASH", 98),
                ("DIGITAL_WALLET", 59),
            ]),
            total_operations: 3456,
        };

        let monthly_payments = [
            ("Jan", 4_250_000),
            ("Fév", 4_180_000),
            ("Mar", 4_320_000),
            ("Avr", 4_290_000),
            ("Mai", 4_410_000),
            ("Jun", 4_380_000),
            ("Jul", 4_520_000),
            ("Aoû", 4_480_000),
            ("Sep", 4_350_000),
            ("Oct", 4_420_000),
            ("Nov", 4_390_000),
            ("Déc", 4_650_000),
        ]
        .iter()
        .map(|(month, amount)| MonthlyPayment {
            month: month.to_string(),
            amount: Decimal::from(*amount),
        })
        .collect();

        Self {
            stats,
            pensioners,
            recent_operations,
            monthly_payments,
        }
    }

    pub fn stats(&self) -> &DashboardStats {
        &self.stats
    }

    pub fn pensioners(&self) -> &[Pensioner] {
        &self.pensioners
    }

    pub fn pensioner(&self, id: i64) -> Option<&Pensioner> {
        self.pensioners.iter().find(|p| p.id == Some(id))
    }

    /// Newest first
    pub fn recent_operations(&self, limit: usize) -> Vec<Operation> {
        self.recent_operations.iter().take(limit).cloned().collect()
    }

    pub fn operations_for(&self, pensioner_id: i64) -> Vec<Operation> {
        self.recent_operations
            .iter()
            .filter(|op| op.owner_id() == Some(pensioner_id))
            .cloned()
            .collect()
    }

    pub fn monthly_payments(&self) -> &[MonthlyPayment] {
        &self.monthly_payments
    }
}

// ==================== Tests ====================
