//! A local stand-in for the classification server.
//!
//! The reply depends on the submitted `text` field:
//! `slow` never answers, `html` is a 500 HTML page, `error` is a 200 with an
//! `error` field, `bad` is a 400 JSON error, `incomplete` lacks `resposta`,
//! `garbled` is unparseable JSON, `warning` carries a processed-text preview
//! and `echo` describes what arrived. Anything else is classified productive.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Notify;

#[derive(Default)]
pub struct MockState {
    /// Requests that reached the handler.
    pub hits: AtomicUsize,
    /// Signalled once a request's fields have been read.
    pub arrived: Notify,
}

impl MockState {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Serve `router` on an ephemeral port and return the endpoint URL.
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/process")
}

pub async fn spawn_mock() -> (String, Arc<MockState>) {
    let state = Arc::new(MockState::default());
    let router = Router::new()
        .route("/process", post(classify))
        .with_state(Arc::clone(&state));
    (serve(router).await, state)
}

/// An endpoint on a port nothing listens on.
pub async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/process")
}

async fn classify(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let mut text = String::new();
    let mut file = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "text" => text = field.text().await.unwrap_or_default(),
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let len = field.bytes().await.map(|b| b.len()).unwrap_or(0);
                file = Some(format!("{file_name}:{len}"));
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }
    state.arrived.notify_one();

    match text.as_str() {
        "slow" => std::future::pending().await,
        "html" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>Internal Server Error</h1>"),
        )
            .into_response(),
        "error" => Json(json!({ "error": "bad input" })).into_response(),
        "bad" => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Nenhum texto enviado" })),
        )
            .into_response(),
        "incomplete" => Json(json!({ "categoria": "produtivo" })).into_response(),
        "garbled" => ([(header::CONTENT_TYPE, "application/json")], "{\"categoria\":").into_response(),
        "warning" => Json(json!({
            "categoria": "warning",
            "resposta": "Nenhuma ação necessária.",
            "texto_processado": "feliz natal",
            "confianca": 0.87
        }))
        .into_response(),
        "echo" => Json(json!({
            "categoria": "produtivo",
            "resposta": format!(
                "text={text}; file={}",
                file.as_deref().unwrap_or("none")
            )
        }))
        .into_response(),
        _ => Json(json!({ "categoria": "produtivo", "resposta": "Obrigado" })).into_response(),
    }
}
