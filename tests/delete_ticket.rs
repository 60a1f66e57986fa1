pub mod common;

use reqwest::StatusCode;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, ResponseTemplate,
};

#[tokio::test]
async fn deletes_ticket() {
    let client = common::Client::spawn().await.authed();
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/devices"))
        .and(query_param("id", format!("eq.{}", common::DEVICE_ID)))
        .respond_with(ResponseTemplate::new(204))
        .mount(&client.store)
        .await;

    client.delete_ticket(common::DEVICE_ID).await.unwrap();
}

#[tokio::test]
async fn delete_fails_loudly_when_store_fails() {
    let client = common::Client::spawn().await.authed();
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/devices"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&client.store)
        .await;

    let status = client.delete_ticket(common::DEVICE_ID).await.unwrap_err();
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn delete_fails_loudly_when_store_is_unconfigured() {
    let client = common::Client::spawn_unconfigured().await.authed();

    let status = client.delete_ticket(common::DEVICE_ID).await.unwrap_err();
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
