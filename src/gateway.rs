use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, RequestPartsExt as _, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use derive_more::From;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    api,
    store,
    ticket::{self, Status},
};

const DEFAULT_AGGREGATE_LIMIT: usize = 10;

pub fn router(store: store::Client) -> Router {
    Router::new()
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-out", post(sign_out))
        .route("/user", get(get_user))
        .route("/ticket", get(list_tickets).post(add_ticket))
        .route("/ticket/:id", patch(edit_ticket).delete(delete_ticket))
        .route("/stats/overview", get(get_overview))
        .route("/stats/income", get(get_income))
        .route("/stats/issues", get(list_common_issues))
        .route("/stats/devices", get(list_common_devices))
        .with_state(Arc::new(AppState { store }))
}

#[derive(Deserialize)]
struct SignInInput {
    email: String,
    password: String,
}

async fn sign_in(
    State(state): State<SharedAppState>,
    Json(SignInInput { email, password }): Json<SignInInput>,
) -> Result<Json<api::Session>, AuthError> {
    use AuthError as E;

    let session = state
        .store
        .sign_in(&email, &password)
        .await
        .map_err(|e| match e {
            store::Error::Api {
                status: 400 | 401 | 403,
                ..
            } => E::WrongEmailOrPassword,
            e => E::Store(e),
        })?;

    Ok(Json(api::Session {
        access_token: session.access_token,
        user: session.user.into(),
    }))
}

#[derive(Debug, From)]
pub enum AuthError {
    #[from]
    Store(store::Error),
    MissingToken,
    WrongEmailOrPassword,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::Store(store::Error::Unconfigured) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::WrongEmailOrPassword => StatusCode::FORBIDDEN,
        }
        .into_response()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpInput {
    email: String,
    password: String,
    full_name: String,
}

async fn sign_up(
    State(state): State<SharedAppState>,
    Json(SignUpInput {
        email,
        password,
        full_name,
    }): Json<SignUpInput>,
) -> Result<Json<api::Session>, SignUpError> {
    use SignUpError as E;

    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(E::MissingFullName);
    }

    let session = state.store.sign_up(&email, &password, full_name).await?;

    Ok(Json(api::Session {
        access_token: session.access_token,
        user: session.user.into(),
    }))
}

#[derive(Debug, From)]
pub enum SignUpError {
    #[from]
    Store(store::Error),
    MissingFullName,
}

impl IntoResponse for SignUpError {
    fn into_response(self) -> Response {
        match self {
            Self::Store(store::Error::Unconfigured) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingFullName => StatusCode::BAD_REQUEST,
        }
        .into_response()
    }
}

async fn sign_out(
    State(state): State<SharedAppState>,
    token: AccessToken,
) -> Result<StatusCode, AuthError> {
    state.store.sign_out(token.as_str()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_user(
    State(state): State<SharedAppState>,
    token: AccessToken,
) -> Result<Json<api::User>, GetUserError> {
    use GetUserError as E;

    let my = state
        .store
        .get_current_user(token.as_str())
        .await
        .ok_or(E::Unauthorized)?;

    Ok(Json(my.into()))
}

#[derive(Debug)]
pub enum GetUserError {
    Unauthorized,
}

impl IntoResponse for GetUserError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
        .into_response()
    }
}

#[derive(Deserialize)]
struct ListTicketsInput {
    status: Option<String>,
}

async fn list_tickets(
    State(state): State<SharedAppState>,
    _: AccessToken,
    Query(ListTicketsInput { status }): Query<ListTicketsInput>,
) -> Result<Json<Vec<api::Ticket>>, ListTicketsError> {
    use ListTicketsError as E;

    let tickets = match status.as_deref() {
        Some(raw) => {
            let status = raw
                .parse::<Status>()
                .map_err(|()| E::InvalidStatus(raw.to_owned()))?;
            state.store.get_tickets_by_status(status).await
        }
        None => state.store.get_tickets().await,
    };

    Ok(Json(tickets.into_iter().map(api::Ticket::from).collect()))
}

#[derive(Debug)]
pub enum ListTicketsError {
    InvalidStatus(String),
}

impl IntoResponse for ListTicketsError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidStatus(_) => StatusCode::BAD_REQUEST,
        }
        .into_response()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddTicketInput {
    device_type: String,
    customer_name: String,
    customer_phone: String,
    issue_description: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    service_price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    amount_paid: Decimal,
    #[serde(default)]
    serial_number: Option<String>,
    #[serde(default)]
    customer_notes: Option<String>,
}

async fn add_ticket(
    State(state): State<SharedAppState>,
    token: AccessToken,
    Json(input): Json<AddTicketInput>,
) -> Result<Json<api::Ticket>, AddTicketError> {
    use AddTicketError as E;

    let my = state
        .store
        .get_current_user(token.as_str())
        .await
        .ok_or(E::Unauthorized)?;

    let draft = ticket::Draft {
        device_type: input.device_type,
        customer_name: input.customer_name,
        customer_phone: input.customer_phone,
        issue_description: input.issue_description,
        service_price: input.service_price,
        amount_paid: input.amount_paid,
        serial_number: input.serial_number,
        customer_notes: input.customer_notes,
    };
    draft.validate()?;

    let ticket = state
        .store
        .create_ticket(&store::Insert::new(draft, my.id))
        .await?;

    Ok(Json(ticket.into()))
}

#[derive(Debug, From)]
pub enum AddTicketError {
    #[from]
    Store(store::Error),
    #[from]
    Validation(ticket::ValidationError),
    Unauthorized,
}

impl IntoResponse for AddTicketError {
    fn into_response(self) -> Response {
        match self {
            Self::Store(store::Error::Unconfigured) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
        .into_response()
    }
}

#[derive(Deserialize)]
#[serde(content = "data", rename_all = "camelCase", tag = "op")]
enum EditTicketInput {
    #[serde(rename_all = "camelCase")]
    Edit {
        #[serde(default)]
        device_type: Option<String>,
        #[serde(default)]
        customer_name: Option<String>,
        #[serde(default)]
        customer_phone: Option<String>,
        #[serde(default)]
        issue_description: Option<String>,
        #[serde(default, with = "rust_decimal::serde::float_option")]
        service_price: Option<Decimal>,
        #[serde(default, with = "rust_decimal::serde::float_option")]
        amount_paid: Option<Decimal>,
        #[serde(default)]
        serial_number: Option<String>,
        #[serde(default)]
        customer_notes: Option<String>,
        #[serde(default)]
        repair_notes: Option<String>,
    },
    MarkRepaired,
    MarkCannotRepair {
        reason: String,
    },
    Deliver,
}

async fn edit_ticket(
    State(state): State<SharedAppState>,
    _: AccessToken,
    Path(id): Path<ticket::Id>,
    Json(op): Json<EditTicketInput>,
) -> Result<Json<api::Ticket>, EditTicketError> {
    use EditTicketError as E;
    use EditTicketInput as Op;

    let current = state
        .store
        .get_ticket_by_id(id)
        .await
        .ok_or(E::TicketNotFound)?;

    let now = OffsetDateTime::now_utc();
    let mut patch = store::Patch::new(now);

    match op {
        Op::Edit {
            device_type,
            customer_name,
            customer_phone,
            issue_description,
            service_price,
            amount_paid,
            serial_number,
            customer_notes,
            repair_notes,
        } => {
            let service_price =
                service_price.map(|price| price.max(Decimal::ZERO));
            let amount_paid = amount_paid.map(|paid| paid.max(Decimal::ZERO));
            if service_price.is_some() || amount_paid.is_some() {
                patch.remaining_amount = Some(ticket::remaining_amount(
                    service_price.unwrap_or(current.service_price),
                    amount_paid.unwrap_or(current.amount_paid),
                ));
            }
            patch.device_type = device_type;
            patch.customer_name = customer_name;
            patch.customer_phone = customer_phone;
            patch.issue_description = issue_description;
            patch.service_price = service_price;
            patch.amount_paid = amount_paid;
            patch.serial_number = serial_number;
            patch.customer_notes = customer_notes;
            patch.repair_notes = repair_notes;
        }
        Op::MarkRepaired => {
            let updated = current.transition(Status::Repaired, None, now)?;
            patch.status = Some(updated.status);
            patch.remaining_amount = Some(updated.remaining_amount);
        }
        Op::MarkCannotRepair { reason } => {
            let updated =
                current.transition(Status::CannotRepair, Some(&reason), now)?;
            patch.status = Some(updated.status);
            patch.repair_notes = updated.repair_notes;
            patch.remaining_amount = Some(updated.remaining_amount);
        }
        Op::Deliver => {
            let updated = current.transition(Status::Delivered, None, now)?;
            patch.status = Some(updated.status);
            patch.delivered_at = updated.delivered_at;
            patch.remaining_amount = Some(updated.remaining_amount);
        }
    }

    let updated = state.store.update_ticket(id, &patch).await?;

    Ok(Json(updated.into()))
}

#[derive(Debug, From)]
pub enum EditTicketError {
    #[from]
    Store(store::Error),
    #[from]
    Transition(ticket::TransitionError),
    TicketNotFound,
}

impl IntoResponse for EditTicketError {
    fn into_response(self) -> Response {
        match self {
            Self::Store(store::Error::Unconfigured) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Transition(ticket::TransitionError::OutstandingBalance {
                ..
            }) => StatusCode::CONFLICT,
            Self::Transition(_) => StatusCode::BAD_REQUEST,
            Self::TicketNotFound => StatusCode::NOT_FOUND,
        }
        .into_response()
    }
}

async fn delete_ticket(
    State(state): State<SharedAppState>,
    _: AccessToken,
    Path(id): Path<ticket::Id>,
) -> Result<StatusCode, DeleteTicketError> {
    state.store.delete_ticket(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, From)]
pub enum DeleteTicketError {
    #[from]
    Store(store::Error),
}

impl IntoResponse for DeleteTicketError {
    fn into_response(self) -> Response {
        match self {
            Self::Store(store::Error::Unconfigured) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
        .into_response()
    }
}

async fn get_overview(
    State(state): State<SharedAppState>,
    _: AccessToken,
) -> Json<api::stats::Overview> {
    let today = OffsetDateTime::now_utc().date();
    let (counts, daily_income, common_issues, common_devices) = tokio::join!(
        state.store.get_status_counts(),
        state.store.get_daily_income(today),
        state.store.get_most_common_issues(5),
        state.store.get_most_common_devices(5),
    );

    Json(api::stats::Overview {
        counts,
        daily_income,
        common_issues,
        common_devices,
    })
}

async fn get_income(
    State(state): State<SharedAppState>,
    _: AccessToken,
) -> Json<api::stats::IncomeReport> {
    let today = OffsetDateTime::now_utc().date();
    Json(state.store.get_income_report(today).await)
}

#[derive(Deserialize)]
struct AggregateInput {
    limit: Option<usize>,
}

async fn list_common_issues(
    State(state): State<SharedAppState>,
    _: AccessToken,
    Query(AggregateInput { limit }): Query<AggregateInput>,
) -> Json<Vec<api::stats::AggregateCount>> {
    let limit = limit.unwrap_or(DEFAULT_AGGREGATE_LIMIT);
    Json(state.store.get_most_common_issues(limit).await)
}

async fn list_common_devices(
    State(state): State<SharedAppState>,
    _: AccessToken,
    Query(AggregateInput { limit }): Query<AggregateInput>,
) -> Json<Vec<api::stats::AggregateCount>> {
    let limit = limit.unwrap_or(DEFAULT_AGGREGATE_LIMIT);
    Json(state.store.get_most_common_devices(limit).await)
}

type SharedAppState = Arc<AppState>;

pub struct AppState {
    store: store::Client,
}

/// Bearer token forwarded with every authenticated request. The gateway
/// never verifies it itself; the hosted auth service does.
pub struct AccessToken(String);

impl AccessToken {
    fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<SharedAppState> for AccessToken {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        _: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::MissingToken)?;
        Ok(Self(bearer.token().to_owned()))
    }
}
