//! Integration tests for [`ApiManager`] against a local mock server.

mod support;

use std::time::Duration;

use triage_core::{ApiError, ApiManager, FormData, SelectedFile};

use support::{dead_endpoint, spawn_mock};

#[tokio::test]
async fn classifies_text() {
    let (endpoint, state) = spawn_mock().await;
    let api = ApiManager::new(endpoint);

    let result = api.process_form(FormData::with_text("Bom dia")).await.unwrap();
    assert_eq!(result.category, "produtivo");
    assert_eq!(result.response, "Obrigado");
    assert!(result.is_productive());
    assert_eq!(state.hits(), 1);
    assert!(!api.has_in_flight());
}

#[tokio::test]
async fn keeps_preview_and_unknown_fields() {
    let (endpoint, _state) = spawn_mock().await;
    let api = ApiManager::new(endpoint);

    let result = api.process_form(FormData::with_text("warning")).await.unwrap();
    assert!(!result.is_productive());
    assert_eq!(result.preview(), Some("feliz natal"));
    assert!(result.extra.contains_key("confianca"));
}

#[tokio::test]
async fn html_reply_is_invalid_content_type() {
    let (endpoint, _state) = spawn_mock().await;
    let api = ApiManager::new(endpoint);

    let err = api.process_form(FormData::with_text("html")).await.unwrap_err();
    match &err {
        ApiError::InvalidContentType { body } => {
            assert_eq!(body, "<h1>Internal Server Error</h1>");
        }
        other => panic!("expected InvalidContentType, got {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Resposta inválida do servidor: <h1>Internal Server Error</h1>"
    );
}

#[tokio::test]
async fn error_field_is_reported() {
    let (endpoint, _state) = spawn_mock().await;
    let api = ApiManager::new(endpoint);

    let err = api.process_form(FormData::with_text("error")).await.unwrap_err();
    assert!(matches!(&err, ApiError::ServerReported(m) if m == "bad input"));
}

#[tokio::test]
async fn status_is_checked_before_error_field() {
    let (endpoint, _state) = spawn_mock().await;
    let api = ApiManager::new(endpoint);

    let err = api.process_form(FormData::with_text("bad")).await.unwrap_err();
    assert!(matches!(err, ApiError::Http { status: 400 }));
    assert_eq!(err.to_string(), "Erro HTTP: 400");
}

#[tokio::test]
async fn incomplete_and_garbled_replies_are_malformed() {
    let (endpoint, _state) = spawn_mock().await;
    let api = ApiManager::new(endpoint);

    let err = api.process_form(FormData::with_text("incomplete")).await.unwrap_err();
    assert_eq!(err.to_string(), "Dados incompletos na resposta.");

    let err = api.process_form(FormData::with_text("garbled")).await.unwrap_err();
    assert_eq!(err.to_string(), "Resposta inesperada do servidor.");
}

#[tokio::test]
async fn file_field_reaches_the_server() {
    let (endpoint, _state) = spawn_mock().await;
    let api = ApiManager::new(endpoint);

    let mut form = FormData::with_text("echo");
    form.set_file(SelectedFile::new("email.txt", "hello"));
    let result = api.process_form(form).await.unwrap();
    assert_eq!(result.response, "text=echo; file=email.txt:5");
}

#[tokio::test]
async fn new_request_cancels_one_mid_flight() {
    let (endpoint, state) = spawn_mock().await;
    let api = ApiManager::new(endpoint);

    let first = api.process_form(FormData::with_text("slow"));
    let first_id = first.id();
    let first = tokio::spawn(first);
    state.arrived.notified().await;
    assert_eq!(api.in_flight(), Some(first_id));

    let second = api.process_form(FormData::with_text("again"));
    let second_id = second.id();
    assert_eq!(api.in_flight(), Some(second_id));

    assert!(matches!(first.await.unwrap(), Err(ApiError::Cancelled)));
    // The cancelled request must not release the newer one's slot.
    assert_eq!(api.in_flight(), Some(second_id));

    let result = second.await.unwrap();
    assert_eq!(result.response, "Obrigado");
    assert!(!api.has_in_flight());
}

#[tokio::test]
async fn abort_mid_flight_settles_as_cancelled() {
    let (endpoint, state) = spawn_mock().await;
    let api = ApiManager::new(endpoint);

    let pending = tokio::spawn(api.process_form(FormData::with_text("slow")));
    state.arrived.notified().await;

    assert!(api.abort());
    assert!(matches!(pending.await.unwrap(), Err(ApiError::Cancelled)));
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let api = ApiManager::new(dead_endpoint().await);

    let err = api.process_form(FormData::with_text("Bom dia")).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert!(!api.has_in_flight());
}

#[tokio::test]
async fn timeout_is_a_network_error() {
    let (endpoint, _state) = spawn_mock().await;
    let api = ApiManager::new(endpoint).with_timeout(Duration::from_millis(200));

    let err = api.process_form(FormData::with_text("slow")).await.unwrap_err();
    match err {
        ApiError::Network(e) => assert!(e.is_timeout()),
        other => panic!("expected a timeout, got {other:?}"),
    }
}
