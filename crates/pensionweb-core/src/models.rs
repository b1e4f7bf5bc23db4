//! Data models mirrored from the pension backend
//!
//! Field names follow the backend's camelCase JSON. Amounts are decimals
//! exchanged as JSON numbers.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==================== Enumerations ====================

/// How a pensioner is paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    BankTransfer,
    Check,
    Cash,
    DigitalWallet,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::BankTransfer
    }
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::BankTransfer,
        PaymentMethod::Check,
        PaymentMethod::Cash,
        PaymentMethod::DigitalWallet,
    ];

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "Virement Bancaire",
            PaymentMethod::Check => "Chèque",
            PaymentMethod::Cash => "Espèces",
            PaymentMethod::DigitalWallet => "Portefeuille Numérique",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bank_transfer" | "virement" => Ok(PaymentMethod::BankTransfer),
            "check" | "cheque" | "chèque" => Ok(PaymentMethod::Check),
            "cash" | "especes" | "espèces" => Ok(PaymentMethod::Cash),
            "digital_wallet" => Ok(PaymentMethod::DigitalWallet),
            _ => Err(format!("Invalid payment method: {}", s)),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::BankTransfer => write!(f, "BANK_TRANSFER"),
            PaymentMethod::Check => write!(f, "CHECK"),
            PaymentMethod::Cash => write!(f, "CASH"),
            PaymentMethod::DigitalWallet => write!(f, "DIGITAL_WALLET"),
        }
    }
}

/// Kind of financial operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Payment,
    Adjustment,
    Bonus,
    Deduction,
}

impl Default for OperationType {
    fn default() -> Self {
        OperationType::Payment
    }
}

impl OperationType {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            OperationType::Payment => "Paiement",
            OperationType::Adjustment => "Ajustement",
            OperationType::Bonus => "Prime",
            OperationType::Deduction => "Déduction",
        }
    }
}

impl std::str::FromStr for OperationType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "payment" => Ok(OperationType::Payment),
            "adjustment" => Ok(OperationType::Adjustment),
            "bonus" => Ok(OperationType::Bonus),
            "deduction" => Ok(OperationType::Deduction),
            _ => Err(format!("Invalid operation type: {}", s)),
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationType::Payment => write!(f, "PAYMENT"),
            OperationType::Adjustment => write!(f, "ADJUSTMENT"),
            OperationType::Bonus => write!(f, "BONUS"),
            OperationType::Deduction => write!(f, "DEDUCTION"),
        }
    }
}

/// Approval status of a demande
///
/// The backend has used both French labels and English constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DemandeStatus {
    #[serde(rename = "En cours", alias = "PENDING", alias = "pending", alias = "En attente")]
    Pending,
    #[serde(rename = "Approuvée", alias = "APPROVED", alias = "approved", alias = "Approuvé")]
    Approved,
    #[serde(rename = "Rejetée", alias = "REJECTED", alias = "rejected", alias = "Rejeté")]
    Rejected,
}

impl Default for DemandeStatus {
    fn default() -> Self {
        DemandeStatus::Pending
    }
}

impl std::str::FromStr for DemandeStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" | "en cours" | "en attente" => Ok(DemandeStatus::Pending),
            "approved" | "approuvée" | "approuvé" => Ok(DemandeStatus::Approved),
            "rejected" | "rejetée" | "rejeté" => Ok(DemandeStatus::Rejected),
            _ => Err(format!("Invalid demande status: {}", s)),
        }
    }
}

impl std::fmt::Display for DemandeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DemandeStatus::Pending => write!(f, "En cours"),
            DemandeStatus::Approved => write!(f, "Approuvée"),
            DemandeStatus::Rejected => write!(f, "Rejetée"),
        }
    }
}

// ==================== Entities ====================

/// A person receiving periodic pension payments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pensioner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub city: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_payment: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_payment_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl Pensioner {
    /// Id rendered for display and links, empty when unsaved
    pub fn id_text(&self) -> String {
        self.id.map(|id| id.to_string()).unwrap_or_default()
    }
}

/// A financial transaction tied to one pensioner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pensioner: Option<Pensioner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pensioner_id: Option<i64>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Operation {
    /// Owning pensioner id, from the explicit field or the embedded record
    pub fn owner_id(&self) -> Option<i64> {
        self.pensioner_id
            .or_else(|| self.pensioner.as_ref().and_then(|p| p.id))
    }

    /// Parse the timestamp; accepts RFC 3339, zone-less ISO and plain dates
    pub fn timestamp_naive(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }

    /// Calendar date of the operation
    pub fn date(&self) -> Option<NaiveDate> {
        self.timestamp_naive().map(|t| t.date())
    }
}

/// Parse a backend timestamp
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Bank account of a pensioner (one-to-one, optional)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankingInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub pensioner_id: i64,
    pub account_number: String,
    pub account_holder_name: String,
    pub bank_address: String,
}

/// A request or claim submitted by a pensioner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demande {
    pub id: String,
    pub pensioner_id: i64,
    #[serde(rename = "type")]
    pub demande_type: String,
    pub status: DemandeStatus,
    pub submission_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_date: Option<String>,
}

/// A named set of pensioners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pensioners: Option<Vec<Pensioner>>,
}

/// A contributing company and its members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyGroup {
    pub id: i64,
    pub company_name: String,
    pub sector: String,
    pub member_count: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_contribution: Decimal,
    pub city: String,
}

/// A contributing member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Affilie {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_affilie: Option<i64>,
    pub matricule: String,
    pub nom: String,
    pub prenom: String,
    pub actif: bool,
    pub ayant_droit: bool,
    pub adherent_id: i64,
}

impl Affilie {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom).trim().to_string()
    }
}

/// A benefit recipient linked to an affiliate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocataire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_allocataire: Option<i64>,
    pub numero_dossier: String,
    pub nom: String,
    pub prenom: String,
    pub affilie_id: i64,
}

impl Allocataire {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom).trim().to_string()
    }
}

/// Aggregates served by `/dashboard/stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_pensioners: u64,
    pub pensioners_by_city: Vec<(String, u64)>,
    pub pensioners_by_payment_method: Vec<(String, u64)>,
    pub total_operations: u64,
}

/// Total paid out in one month, for the payments chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPayment {
    pub month: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// Everything known about one pensioner, as fed to the record summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PensionerRecord {
    pub pensioner: Pensioner,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub banking: Option<BankingInfo>,
}

/// A pensioner with the operations selected for an analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PensionerWithOperations {
    #[serde(flatten)]
    pub pensioner: Pensioner,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pensioner_from_backend_json() {
        let value = json!({
            "id": 1001,
            "name": "Ahmed Benali",
            "city": "Casablanca",
            "monthlyPayment": 3500,
            "paymentMethod": "BANK_TRANSFER",
            "phoneNumber": "+212600000000"
        });
        let pensioner: Pensioner = serde_json::from_value(value).unwrap();
        assert_eq!(pensioner.id, Some(1001));
        assert_eq!(pensioner.monthly_payment, Decimal::from(3500));
        assert_eq!(pensioner.payment_method, PaymentMethod::BankTransfer);
        assert_eq!(pensioner.birth_date, None);
    }

    #[test]
    fn test_pensioner_serializes_amount_as_number() {
        let pensioner = Pensioner {
            id: None,
            name: "Fatima Alaoui".to_string(),
            city: "Rabat".to_string(),
            monthly_payment: Decimal::new(280050, 2),
            payment_method: PaymentMethod::Check,
            last_payment_date: None,
            birth_date: None,
            phone_number: None,
        };
        let value = serde_json::to_value(&pensioner).unwrap();
        assert_eq!(value["monthlyPayment"], json!(2800.5));
        assert_eq!(value["paymentMethod"], json!("CHECK"));
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_pensioner_missing_field_rejected() {
        let value = json!({
            "id": 1,
            "city": "Rabat",
            "monthlyPayment": 100,
            "paymentMethod": "CASH"
        });
        assert!(serde_json::from_value::<Pensioner>(value).is_err());
    }

    #[test]
    fn test_operation_owner_id() {
        let value = json!({
            "id": 4,
            "pensioner": {
                "id": 1004, "name": "Aicha Benjelloun", "city": "Fès",
                "monthlyPayment": 3100, "paymentMethod": "BANK_TRANSFER"
            },
            "amount": 150,
            "type": "DEDUCTION",
            "timestamp": "2024-01-15T10:30:00"
        });
        let operation: Operation = serde_json::from_value(value).unwrap();
        assert_eq!(operation.owner_id(), Some(1004));
        assert_eq!(operation.operation_type, OperationType::Deduction);
        assert_eq!(
            operation.date(),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2024-01-15T10:30:00Z").is_some());
        assert!(parse_timestamp("2024-01-15T10:30:00.123").is_some());
        assert!(parse_timestamp("2024-01-15 10:30:00").is_some());
        assert!(parse_timestamp("2024-01-15").is_some());
        assert!(parse_timestamp("15/01/2024").is_none());
    }

    #[test]
    fn test_demande_status_variants() {
        let french: DemandeStatus = serde_json::from_value(json!("Approuvée")).unwrap();
        let english: DemandeStatus = serde_json::from_value(json!("APPROVED")).unwrap();
        assert_eq!(french, english);
        assert_eq!(serde_json::to_value(DemandeStatus::Rejected).unwrap(), json!("Rejetée"));
        assert_eq!("en cours".parse::<DemandeStatus>().unwrap(), DemandeStatus::Pending);
    }

    #[test]
    fn test_dashboard_stats_tuple_shape() {
        let value = json!({
            "totalPensioners": 3,
            "pensionersByCity": [["Rabat", 2], ["Fès", 1]],
            "pensionersByPaymentMethod": [["CASH", 3]],
            "totalOperations": 7
        });
        let stats: DashboardStats = serde_json::from_value(value).unwrap();
        assert_eq!(stats.pensioners_by_city[0], ("Rabat".to_string(), 2));
    }

    #[test]
    fn test_payment_method_parse_and_label() {
        assert_eq!("BANK_TRANSFER".parse::<PaymentMethod>().unwrap(), PaymentMethod::BankTransfer);
        assert_eq!("Chèque".parse::<PaymentMethod>().unwrap(), PaymentMethod::Check);
        assert_eq!(PaymentMethod::DigitalWallet.label(), "Portefeuille Numérique");
        assert_eq!(PaymentMethod::Cash.to_string(), "CASH");
    }

    #[test]
    fn test_pensioner_with_operations_flattens() {
        let value = json!({
            "id": 7, "name": "Omar", "city": "Agadir",
            "monthlyPayment": 2000, "paymentMethod": "CASH",
            "operations": []
        });
        let entry: PensionerWithOperations = serde_json::from_value(value).unwrap();
        assert_eq!(entry.pensioner.name, "Omar");
        assert!(entry.operations.is_empty());
    }
}
