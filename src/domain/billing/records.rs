//! Record updates issued against the remote store.
//!
//! Each value describes the full set of columns one handler writes for a
//! single row; the row itself is selected by a processor-assigned id.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::stripe_event::AccountObject;

/// Terminal state of a payment transaction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }
}

/// State of a refund row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Completed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Completed => "completed",
        }
    }
}

/// Connected account status stored on the user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Pending,
}

impl AccountStatus {
    /// `active` once Stripe lets the account take charges.
    pub fn from_charges_enabled(charges_enabled: bool) -> Self {
        if charges_enabled {
            AccountStatus::Active
        } else {
            AccountStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Pending => "pending",
        }
    }
}

/// Columns written on `payment_transactions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTransactionUpdate {
    pub status: PaymentStatus,
    /// Only set for failures that carried a message; otherwise left untouched.
    pub error_message: Option<String>,
    pub processed_at: Timestamp,
}

impl PaymentTransactionUpdate {
    pub fn completed(processed_at: Timestamp) -> Self {
        Self {
            status: PaymentStatus::Completed,
            error_message: None,
            processed_at,
        }
    }

    pub fn failed(processed_at: Timestamp, error_message: Option<String>) -> Self {
        Self {
            status: PaymentStatus::Failed,
            error_message,
            processed_at,
        }
    }
}

/// Columns written on `refunds`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundUpdate {
    pub status: RefundStatus,
    pub processed_at: Timestamp,
}

impl RefundUpdate {
    pub fn completed(processed_at: Timestamp) -> Self {
        Self {
            status: RefundStatus::Completed,
            processed_at,
        }
    }
}

/// Columns written on `users` for a connected account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdate {
    pub status: AccountStatus,
    /// Replaces the stored list wholesale.
    pub requirements: Vec<String>,
}

impl From<&AccountObject> for AccountUpdate {
    fn from(account: &AccountObject) -> Self {
        Self {
            status: AccountStatus::from_charges_enabled(account.charges_enabled),
            requirements: account.currently_due(),
        }
    }
}
