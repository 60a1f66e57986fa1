use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{ticket, user};

pub use crate::ticket::{Id, Status};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
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

impl From<ticket::Ticket> for Ticket {
    fn from(ticket: ticket::Ticket) -> Self {
        Self {
            id: ticket.id,
            device_type: ticket.device_type,
            customer_name: ticket.customer_name,
            customer_phone: ticket.customer_phone,
            issue_description: ticket.issue_description,
            service_price: ticket.service_price,
            amount_paid: ticket.amount_paid,
            remaining_amount: ticket.remaining_amount,
            serial_number: ticket.serial_number,
            customer_notes: ticket.customer_notes,
            repair_notes: ticket.repair_notes,
            status: ticket.status,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
            delivered_at: ticket.delivered_at,
            created_by: ticket.created_by,
        }
    }
}
