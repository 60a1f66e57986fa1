pub mod common;

use reqwest::StatusCode;
use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

#[tokio::test]
async fn retrieves_current_user() {
    let client = common::Client::spawn().await.authed();
    common::mock_current_user(&client.store).await;

    let user = client.user().await.unwrap();
    assert_eq!(user.id.to_string(), common::USER_ID);
    assert_eq!(user.email, "tech@shop.example");
    assert_eq!(user.full_name.as_deref(), Some("Shop Tech"));
}

#[tokio::test]
async fn fails_when_unauthorized() {
    let client = common::Client::spawn().await;

    let status = client.user().await.unwrap_err();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn fails_when_token_is_rejected() {
    let client = common::Client::spawn().await.authed();
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&client.store)
        .await;

    let status = client.user().await.unwrap_err();
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
