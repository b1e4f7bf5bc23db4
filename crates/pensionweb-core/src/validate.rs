//! Response validation at the client boundary
//!
//! Deserialization already rejects missing or mistyped fields; `Validate`
//! adds the value-level checks so a malformed backend record fails in the
//! client instead of surfacing as a blank cell in a page.

use rust_decimal::Decimal;

use crate::models::{
    Affilie, Allocataire, BankingInfo, CompanyGroup, DashboardStats, Demande, Group, Operation,
    Pensioner,
};

/// Value-level checks on a decoded entity
pub trait Validate {
    /// Entity name used in error messages
    fn entity() -> &'static str;

    fn validate(&self) -> Result<(), String>;
}

fn require(value: &str, field: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} is required", field))
    } else {
        Ok(())
    }
}

fn non_negative(value: Decimal, field: &str) -> Result<(), String> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(format!("{} must not be negative", field))
    } else {
        Ok(())
    }
}

impl Validate for Pensioner {
    fn entity() -> &'static str {
        "pensioner"
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.name, "name")?;
        require(&self.city, "city")?;
        non_negative(self.monthly_payment, "monthlyPayment")
    }
}

impl Validate for Operation {
    fn entity() -> &'static str {
        "operation"
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.timestamp, "timestamp")?;
        non_negative(self.amount, "amount")?;
        if let Some(pensioner) = &self.pensioner {
            pensioner.validate()?;
        }
        Ok(())
    }
}

impl Validate for BankingInfo {
    fn entity() -> &'static str {
        "banking info"
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.account_number, "accountNumber")?;
        require(&self.account_holder_name, "accountHolderName")
    }
}

impl Validate for Demande {
    fn entity() -> &'static str {
        "demande"
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.id, "id")?;
        require(&self.demande_type, "type")?;
        require(&self.submission_date, "submissionDate")
    }
}

impl Validate for Group {
    fn entity() -> &'static str {
        "group"
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.name, "name")?;
        for pensioner in self.pensioners.iter().flatten() {
            pensioner.validate()?;
        }
        Ok(())
    }
}

impl Validate for CompanyGroup {
    fn entity() -> &'static str {
        "company group"
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.company_name, "companyName")?;
        require(&self.sector, "sector")?;
        non_negative(self.total_contribution, "totalContribution")
    }
}

impl Validate for Affilie {
    fn entity() -> &'static str {
        "affilie"
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.matricule, "matricule")?;
        require(&self.nom, "nom")
    }
}

impl Validate for Allocataire {
    fn entity() -> &'static str {
        "allocataire"
    }

    fn validate(&self) -> Result<(), String> {
        require(&self.numero_dossier, "numeroDossier")?;
        require(&self.nom, "nom")
    }
}

impl Validate for DashboardStats {
    fn entity() -> &'static str {
        "dashboard stats"
    }

    fn validate(&self) -> Result<(), String> {
        let by_city: u64 = self.pensioners_by_city.iter().map(|(_, n)| n).sum();
        if by_city > self.total_pensioners {
            return Err(format!(
                "city breakdown counts {} pensioners but total is {}",
                by_city, self.total_pensioners
            ));
        }
        Ok(())
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn entity() -> &'static str {
        T::entity()
    }

    fn validate(&self) -> Result<(), String> {
        for (index, item) in self.iter().enumerate() {
            item.validate()
                .map_err(|message| format!("item {}: {}", index, message))?;
        }
        Ok(())
    }
}

impl<T: Validate> Validate for Option<T> {
    fn entity() -> &'static str {
        T::entity()
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Some(item) => item.validate(),
            None => Ok(()),
        }
    }
}

// ==================== Tests ====================
