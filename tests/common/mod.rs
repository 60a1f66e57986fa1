use std::time::Duration;

use repair_desk::{api, config, gateway, store};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const API_KEY: &str = "test-api-key";
pub const TOKEN: &str = "access-token-1";
pub const DEVICE_ID: &str = "7e3f8a90-5b1c-4c6d-8e2f-0a1b2c3d4e5f";
pub const USER_ID: &str = "9d2c1b4a-6f7e-4a5b-8c9d-0e1f2a3b4c5d";

/// Gateway served on an ephemeral port with the hosted database service
/// replaced by a `wiremock` server.
pub struct Client {
    pub store: MockServer,
    inner: reqwest::Client,
    base_url: String,
    pub auth_token: Option<String>,
}

impl Client {
    pub async fn spawn() -> Self {
        let store = MockServer::start().await;
        let client = store::connect(config::Store {
            url: Some(store.uri()),
            api_key: Some(API_KEY.to_owned()),
            request_timeout: Duration::from_secs(5),
        })
        .expect("failed to build a store client");
        Self::serve(client, store).await
    }

    /// Gateway whose store has no URL or API key configured.
    pub async fn spawn_unconfigured() -> Self {
        let store = MockServer::start().await;
        let client = store::connect(config::Store {
            url: None,
            api_key: None,
            request_timeout: Duration::from_secs(5),
        })
        .expect("failed to build a store client");
        Self::serve(client, store).await
    }

    async fn serve(client: store::Client, store: MockServer) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind a listener");
        let addr = listener.local_addr().expect("failed to get a local addr");
        tokio::spawn(async move {
            axum::serve(listener, gateway::router(client))
                .await
                .expect("gateway failed");
        });

        Self {
            store,
            inner: reqwest::Client::new(),
            base_url: format!("http://{addr}"),
            auth_token: None,
        }
    }

    pub fn authed(mut self) -> Self {
        self.auth_token = Some(TOKEN.to_owned());
        self
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .inner
            .request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        req
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<api::Session, StatusCode> {
        Ok(self
            .request(Method::POST, "/auth/sign-in")
            .json(&json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::Session>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<api::Session, StatusCode> {
        Ok(self
            .request(Method::POST, "/auth/sign-up")
            .json(&json!({
                "email": email,
                "password": password,
                "fullName": full_name,
            }))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::Session>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn sign_out(&self) -> Result<(), StatusCode> {
        self.request(Method::POST, "/auth/sign-out")
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))
            .map(drop)
    }

    pub async fn user(&self) -> Result<api::User, StatusCode> {
        Ok(self
            .request(Method::GET, "/user")
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::User>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn get_tickets(
        &self,
        status: Option<&str>,
    ) -> Result<Vec<api::Ticket>, StatusCode> {
        let path = match status {
            Some(status) => format!("/ticket?status={status}"),
            None => "/ticket".to_owned(),
        };
        Ok(self
            .request(Method::GET, &path)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<Vec<api::Ticket>>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn add_ticket(
        &self,
        input: Value,
    ) -> Result<api::Ticket, StatusCode> {
        Ok(self
            .request(Method::POST, "/ticket")
            .json(&input)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::Ticket>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn edit_ticket(
        &self,
        id: &str,
        op: Value,
    ) -> Result<api::Ticket, StatusCode> {
        Ok(self
            .request(Method::PATCH, &format!("/ticket/{id}"))
            .json(&op)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::Ticket>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn delete_ticket(&self, id: &str) -> Result<(), StatusCode> {
        self.request(Method::DELETE, &format!("/ticket/{id}"))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))
            .map(drop)
    }

    pub async fn overview(&self) -> Result<api::stats::Overview, StatusCode> {
        Ok(self
            .request(Method::GET, "/stats/overview")
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::stats::Overview>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn income_report(
        &self,
    ) -> Result<api::stats::IncomeReport, StatusCode> {
        Ok(self
            .request(Method::GET, "/stats/income")
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::stats::IncomeReport>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn common_issues(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<api::stats::AggregateCount>, StatusCode> {
        let path = match limit {
            Some(limit) => format!("/stats/issues?limit={limit}"),
            None => "/stats/issues".to_owned(),
        };
        Ok(self
            .request(Method::GET, &path)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<Vec<api::stats::AggregateCount>>()
            .await
            .expect("failed to get a response"))
    }
}

pub fn device_row(
    id: &str,
    status: &str,
    service_price: f64,
    amount_paid: f64,
) -> Value {
    json!({
        "id": id,
        "device_type": "iPhone 13",
        "customer_name": "Omar Said",
        "customer_phone": "+201000000000",
        "issue_description": "Cracked screen",
        "service_price": service_price,
        "amount_paid": amount_paid,
        "remaining_amount": (service_price - amount_paid).max(0.0),
        "serial_number": null,
        "customer_notes": null,
        "repair_notes": null,
        "status": status,
        "created_at": "2025-03-01T09:00:00Z",
        "updated_at": "2025-03-01T09:00:00Z",
        "delivered_at": null,
        "created_by": USER_ID,
    })
}

pub fn user_json() -> Value {
    json!({
        "id": USER_ID,
        "email": "tech@shop.example",
        "user_metadata": { "full_name": "Shop Tech" },
    })
}

/// Makes the auth service accept the test token.
pub async fn mock_current_user(store: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .mount(store)
        .await;
}
