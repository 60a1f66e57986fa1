use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use crate::store::stats::{
    AggregateCount, IncomeAnalysis, IncomeReport, IncomeSummary, StatusCounts,
};

/// Everything the shop's home screen shows in one response.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub counts: StatusCounts,
    #[serde(with = "rust_decimal::serde::float")]
    pub daily_income: Decimal,
    pub common_issues: Vec<AggregateCount>,
    pub common_devices: Vec<AggregateCount>,
}
