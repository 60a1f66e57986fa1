use reqwest::Method;
use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    ticket::{self, Status, Ticket},
    user,
};

use super::{into_reply, Client, Error, Remote};

pub(super) const DEVICES: &str = "/rest/v1/devices";

const RETURN_ROW: (&str, &str) = ("Prefer", "return=representation");

impl Client {
    /// All tickets, newest first. Degrades to an empty list when the store
    /// is unreachable or unconfigured.
    pub async fn get_tickets(&self) -> Vec<Ticket> {
        let Some(remote) = self.remote() else {
            return Vec::new();
        };
        remote.fetch_tickets(None).await.unwrap_or_else(|e| {
            tracing::warn!("failed to fetch tickets: {e}");
            Vec::new()
        })
    }

    /// Tickets in the given status, newest first. Degrades to an empty
    /// list.
    pub async fn get_tickets_by_status(&self, status: Status) -> Vec<Ticket> {
        let Some(remote) = self.remote() else {
            return Vec::new();
        };
        remote
            .fetch_tickets(Some(status))
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(%status, "failed to fetch tickets: {e}");
                Vec::new()
            })
    }

    /// Degrades to `None`, which callers cannot tell apart from an unknown
    /// id. Writes against a missing ticket fail loudly instead.
    pub async fn get_ticket_by_id(&self, id: ticket::Id) -> Option<Ticket> {
        let remote = self.remote()?;
        match remote.fetch_ticket(id).await {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::warn!(%id, "failed to fetch ticket: {e}");
                None
            }
        }
    }

    pub async fn create_ticket(&self, insert: &Insert) -> Result<Ticket, Error> {
        let remote = self.remote().ok_or(Error::Unconfigured)?;
        let rows = into_reply(
            remote
                .request(Method::POST, DEVICES)
                .header(RETURN_ROW.0, RETURN_ROW.1)
                .json(insert)
                .send()
                .await?,
        )
        .await?
        .json::<Vec<Ticket>>()
        .await?;
        rows.into_iter().next().ok_or(Error::NoRows)
    }

    pub async fn update_ticket(
        &self,
        id: ticket::Id,
        patch: &Patch,
    ) -> Result<Ticket, Error> {
        let remote = self.remote().ok_or(Error::Unconfigured)?;
        let rows = into_reply(
            remote
                .request(Method::PATCH, DEVICES)
                .query(&[("id", format!("eq.{id}"))])
                .header(RETURN_ROW.0, RETURN_ROW.1)
                .json(patch)
                .send()
                .await?,
        )
        .await?
        .json::<Vec<Ticket>>()
        .await?;
        rows.into_iter().next().ok_or(Error::NoRows)
    }

    pub async fn delete_ticket(&self, id: ticket::Id) -> Result<(), Error> {
        let remote = self.remote().ok_or(Error::Unconfigured)?;
        into_reply(
            remote
                .request(Method::DELETE, DEVICES)
                .query(&[("id", format!("eq.{id}"))])
                .send()
                .await?,
        )
        .await
        .map(drop)
    }
}

impl Remote {
    async fn fetch_tickets(
        &self,
        status: Option<Status>,
    ) -> Result<Vec<Ticket>, Error> {
        let mut req = self
            .request(Method::GET, DEVICES)
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        if let Some(status) = status {
            req = req.query(&[("status", format!("eq.{status}"))]);
        }
        Ok(into_reply(req.send().await?).await?.json().await?)
    }

    async fn fetch_ticket(
        &self,
        id: ticket::Id,
    ) -> Result<Option<Ticket>, Error> {
        let rows = into_reply(
            self.request(Method::GET, DEVICES)
                .query(&[("select", "*".to_owned()), ("id", format!("eq.{id}"))])
                .send()
                .await?,
        )
        .await?
        .json::<Vec<Ticket>>()
        .await?;
        Ok(rows.into_iter().next())
    }
}

/// Row sent when a ticket is created. Money inputs are clamped to zero,
/// `remaining_amount` is derived from them, and the status always starts at
/// `pending`; `id`, `created_at` and `updated_at` are assigned by the store.
#[derive(Debug, Serialize)]
pub struct Insert {
    device_type: String,
    customer_name: String,
    customer_phone: String,
    issue_description: String,
    #[serde(with = "rust_decimal::serde::float")]
    service_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    amount_paid: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    remaining_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_notes: Option<String>,
    status: Status,
    created_by: user::Id,
}

impl Insert {
    pub fn new(draft: ticket::Draft, created_by: user::Id) -> Self {
        let service_price = draft.service_price.max(Decimal::ZERO);
        let amount_paid = draft.amount_paid.max(Decimal::ZERO);
        Self {
            device_type: draft.device_type,
            customer_name: draft.customer_name,
            customer_phone: draft.customer_phone,
            issue_description: draft.issue_description,
            service_price,
            amount_paid,
            remaining_amount: ticket::remaining_amount(
                service_price,
                amount_paid,
            ),
            serial_number: draft.serial_number,
            customer_notes: draft.customer_notes,
            status: Status::Pending,
            created_by,
        }
    }
}

/// Partial update of a ticket row. Absent fields are left untouched by the
/// store; `updated_at` is always refreshed.
#[derive(Debug, Serialize)]
pub struct Patch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_description: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub service_price: Option<Decimal>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub amount_paid: Option<Decimal>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub remaining_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub delivered_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Patch {
    pub fn new(updated_at: OffsetDateTime) -> Self {
        Self {
            device_type: None,
            customer_name: None,
            customer_phone: None,
            issue_description: None,
            service_price: None,
            amount_paid: None,
            remaining_amount: None,
            serial_number: None,
            customer_notes: None,
            repair_notes: None,
            status: None,
            delivered_at: None,
            updated_at,
        }
    }
}
