use futures::future;
use itertools::Itertools as _;
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Date, Duration};

use crate::ticket::Status;

use super::{into_reply, ticket::DEVICES, Client, Error, Remote};

const RPC_DAILY_INCOME: &str = "/rest/v1/rpc/calculate_daily_income";
const RPC_COMMON_ISSUES: &str = "/rest/v1/rpc/get_most_common_issues";
const RPC_COMMON_DEVICES: &str = "/rest/v1/rpc/get_most_common_devices";

/// Ranked tally of one issue or device type across all tickets.
///
/// Rows come back from the store ordered by count; equal counts are
/// re-sorted here by label so the ranking is deterministic.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AggregateCount {
    #[serde(alias = "issue", alias = "device")]
    pub label: String,
    pub count: u64,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub repaired: usize,
    pub cannot_repair: usize,
    pub delivered: usize,
    pub total: usize,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct IncomeReport {
    pub summary: IncomeSummary,
    pub analysis: IncomeAnalysis,
}

/// Income summed over the trailing 1-, 7-, 30- and 365-day windows, each
/// ending today.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct IncomeSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub daily: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub weekly: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub yearly: Decimal,
}

/// Percentage change of income against the previous period.
///
/// Only `daily_change` (today vs yesterday) is computed. The weekly,
/// monthly and yearly changes are placeholder zeroes until period
/// snapshots are recorded to compare against.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeAnalysis {
    #[serde(with = "rust_decimal::serde::float")]
    pub daily_change: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub weekly_change: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_change: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub yearly_change: Decimal,
}

impl Client {
    /// Income delivered on the given day. Degrades to zero.
    pub async fn get_daily_income(&self, date: Date) -> Decimal {
        let Some(remote) = self.remote() else {
            return Decimal::ZERO;
        };
        remote.fetch_daily_income(date).await.unwrap_or_else(|e| {
            tracing::warn!(%date, "failed to fetch daily income: {e}");
            Decimal::ZERO
        })
    }

    /// Income summary and analysis for the windows ending `today`.
    ///
    /// The windows are summed from one store call per day, dispatched
    /// concurrently; a single failing day fails the whole batch, which then
    /// degrades to an all-zero report.
    pub async fn get_income_report(&self, today: Date) -> IncomeReport {
        let Some(remote) = self.remote() else {
            return IncomeReport::default();
        };
        remote.fetch_income_report(today).await.unwrap_or_else(|e| {
            tracing::warn!(%today, "failed to fetch income report: {e}");
            IncomeReport::default()
        })
    }

    /// Most frequent issue descriptions. Degrades to an empty list.
    pub async fn get_most_common_issues(
        &self,
        limit: usize,
    ) -> Vec<AggregateCount> {
        let Some(remote) = self.remote() else {
            return Vec::new();
        };
        remote
            .fetch_aggregate(RPC_COMMON_ISSUES, limit)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("failed to fetch common issues: {e}");
                Vec::new()
            })
    }

    /// Most frequent device types. Degrades to an empty list.
    pub async fn get_most_common_devices(
        &self,
        limit: usize,
    ) -> Vec<AggregateCount> {
        let Some(remote) = self.remote() else {
            return Vec::new();
        };
        remote
            .fetch_aggregate(RPC_COMMON_DEVICES, limit)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("failed to fetch common devices: {e}");
                Vec::new()
            })
    }

    /// Ticket tally per status. Degrades to all zeroes.
    pub async fn get_status_counts(&self) -> StatusCounts {
        let Some(remote) = self.remote() else {
            return StatusCounts::default();
        };
        remote.fetch_status_counts().await.unwrap_or_else(|e| {
            tracing::warn!("failed to fetch status counts: {e}");
            StatusCounts::default()
        })
    }
}

impl Remote {
    async fn fetch_daily_income(&self, date: Date) -> Result<Decimal, Error> {
        #[derive(Deserialize)]
        struct Income(
            #[serde(with = "rust_decimal::serde::float_option")]
            Option<Decimal>,
        );

        let Income(income) = into_reply(
            self.request(Method::POST, RPC_DAILY_INCOME)
                .json(&json!({ "target_date": date.to_string() }))
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;
        Ok(income.unwrap_or(Decimal::ZERO))
    }

    async fn fetch_income_report(
        &self,
        today: Date,
    ) -> Result<IncomeReport, Error> {
        let yesterday = today - Duration::days(1);
        let (daily, weekly, monthly, yearly, previous_daily) = tokio::try_join!(
            self.fetch_daily_income(today),
            self.fetch_income_window(today, 7),
            self.fetch_income_window(today, 30),
            self.fetch_income_window(today, 365),
            self.fetch_daily_income(yesterday),
        )?;

        let daily_change = if previous_daily > Decimal::ZERO {
            (daily - previous_daily) / previous_daily * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        Ok(IncomeReport {
            summary: IncomeSummary {
                daily,
                weekly,
                monthly,
                yearly,
            },
            analysis: IncomeAnalysis {
                daily_change,
                weekly_change: Decimal::ZERO,
                monthly_change: Decimal::ZERO,
                yearly_change: Decimal::ZERO,
            },
        })
    }

    async fn fetch_income_window(
        &self,
        today: Date,
        days: i64,
    ) -> Result<Decimal, Error> {
        let per_day = future::try_join_all(
            (0..days)
                .map(|back| self.fetch_daily_income(today - Duration::days(back))),
        )
        .await?;
        Ok(per_day.into_iter().sum())
    }

    async fn fetch_aggregate(
        &self,
        rpc: &str,
        limit: usize,
    ) -> Result<Vec<AggregateCount>, Error> {
        let rows = into_reply(
            self.request(Method::POST, rpc)
                .json(&json!({ "limit_count": limit }))
                .send()
                .await?,
        )
        .await?
        .json::<Vec<AggregateCount>>()
        .await?;
        Ok(rows
            .into_iter()
            .sorted_by(|a, b| {
                b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label))
            })
            .collect())
    }

    async fn fetch_status_counts(&self) -> Result<StatusCounts, Error> {
        #[derive(Deserialize)]
        struct Row {
            status: Status,
        }

        let rows = into_reply(
            self.request(Method::GET, DEVICES)
                .query(&[("select", "status")])
                .send()
                .await?,
        )
        .await?
        .json::<Vec<Row>>()
        .await?;

        let total = rows.len();
        let by_status = rows.into_iter().map(|row| row.status).counts();
        let count = |status| by_status.get(&status).copied().unwrap_or_default();
        Ok(StatusCounts {
            pending: count(Status::Pending),
            repaired: count(Status::Repaired),
            cannot_repair: count(Status::CannotRepair),
            delivered: count(Status::Delivered),
            total,
        })
    }
}
