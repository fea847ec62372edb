//! Budget transactions.

use super::{EntityId, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: EntityId,
    /// Serialized as `type` to match the persisted layout.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub description: String,
    /// Always non-negative; the sign is implied by `kind`.
    pub amount: f64,
    #[serde(default)]
    pub category: String,
    pub date: DateTime<Utc>,
}

impl Transaction {
    /// Amount with the sign implied by `kind` applied.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_amount(self.amount)?;
        if self.amount < 0.0 {
            return Err(ValidationError::NegativeAmount {
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}

/// Rejects amounts that would not survive a JSON round trip.
pub fn check_amount(amount: f64) -> Result<(), ValidationError> {
    if amount.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::AmountNotFinite)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub description: String,
    pub amount: f64,
    pub category: String,
}
