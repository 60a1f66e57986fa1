use derive_more::Display;
use enum_utils::FromStr;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::user;

/// One device-repair job, as stored in the `devices` table of the hosted
/// database service.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Ticket {
    pub id: Id,
    pub device_type: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub issue_description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub service_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_paid: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining_amount: Decimal,
    pub serial_number: Option<String>,
    pub customer_notes: Option<String>,
    pub repair_notes: Option<String>,
    pub status: Status,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub delivered_at: Option<OffsetDateTime>,
    pub created_by: user::Id,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Self {
        Id(Uuid::new_v4())
    }
}

impl From<u128> for Id {
    fn from(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, FromStr, Hash, PartialEq,
    Serialize,
)]
#[enumeration(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Device is checked in and waiting on the workbench.
    #[display("pending")]
    Pending,

    /// Repair is done; the device waits to be picked up.
    #[display("repaired")]
    Repaired,

    /// Repair turned out to be impossible; the reason is kept in
    /// `repair_notes`.
    #[display("cannot_repair")]
    CannotRepair,

    /// Device is handed back to the customer. Terminal.
    #[display("delivered")]
    Delivered,
}

/// Money still owed by the customer.
///
/// Inputs are clamped to zero before subtraction, and the result never goes
/// below zero: an overpaid ticket owes nothing.
pub fn remaining_amount(service_price: Decimal, amount_paid: Decimal) -> Decimal {
    let price = service_price.max(Decimal::ZERO);
    let paid = amount_paid.max(Decimal::ZERO);
    (price - paid).max(Decimal::ZERO)
}

/// Fields supplied by the customer-intake form when a ticket is created.
#[derive(Clone, Debug, Default)]
pub struct Draft {
    pub device_type: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub issue_description: String,
    pub service_price: Decimal,
    pub amount_paid: Decimal,
    pub serial_number: Option<String>,
    pub customer_notes: Option<String>,
}

impl Draft {
    /// Checks that every required field is non-empty after trimming.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("device_type", &self.device_type),
            ("customer_name", &self.customer_name),
            ("customer_phone", &self.customer_phone),
            ("issue_description", &self.issue_description),
        ];

        let missing = required
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { missing })
        }
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("missing required field(s): {}", missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

impl Ticket {
    /// Applies a status change, returning the updated ticket.
    ///
    /// Legal transitions: `pending` to `repaired`, `pending` to
    /// `cannot_repair` (a reason is required and lands in `repair_notes`),
    /// and `repaired`/`cannot_repair` to `delivered` while nothing is owed.
    /// Everything else is rejected and `self` is left untouched. Nothing is
    /// persisted here; the caller hands the result to the store.
    pub fn transition(
        &self,
        target: Status,
        reason: Option<&str>,
        now: OffsetDateTime,
    ) -> Result<Ticket, TransitionError> {
        use Status as S;

        let mut updated = self.clone();
        match (self.status, target) {
            (S::Pending, S::Repaired) => {}
            (S::Pending, S::CannotRepair) => {
                let reason = reason
                    .map(str::trim)
                    .filter(|reason| !reason.is_empty())
                    .ok_or(TransitionError::MissingReason)?;
                updated.repair_notes = Some(reason.to_string());
            }
            (from, S::Delivered) => {
                let remaining =
                    remaining_amount(self.service_price, self.amount_paid);
                if remaining > Decimal::ZERO {
                    return Err(TransitionError::OutstandingBalance {
                        remaining,
                    });
                }
                if !matches!(from, S::Repaired | S::CannotRepair) {
                    return Err(TransitionError::Invalid {
                        from,
                        to: target,
                    });
                }
                updated.delivered_at = Some(now);
            }
            (from, to) => {
                return Err(TransitionError::Invalid { from, to });
            }
        }

        updated.status = target;
        updated.remaining_amount =
            remaining_amount(self.service_price, self.amount_paid);
        updated.updated_at = now;
        Ok(updated)
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TransitionError {
    #[error("ticket cannot go from {from} to {to}")]
    Invalid { from: Status, to: Status },

    #[error("ticket cannot be delivered while {remaining} is still owed")]
    OutstandingBalance { remaining: Decimal },

    #[error("a reason is required to mark a ticket as unrepairable")]
    MissingReason,
}
