//! JSON HTTP surface over the ledger.
//!
//! Handlers only translate requests into ledger calls; every rule lives in
//! [`crate::ledger`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::ledger::{Ledger, Outcome};
use crate::log_event;

#[derive(Clone)]
struct AppState {
    ledger: Arc<Ledger>,
}

/// Form body of a reserve/release request.
#[derive(Deserialize)]
struct UserForm {
    #[serde(default, alias = "user")]
    usuario: String,
}

#[derive(Clone, Copy)]
enum Action {
    Reserve,
    Release,
}

fn status_for(outcome: &Outcome) -> StatusCode {
    match outcome {
        Outcome::Reserved | Outcome::Released => StatusCode::OK,
        Outcome::Rejected(_) => StatusCode::BAD_REQUEST,
        Outcome::Denied => StatusCode::FORBIDDEN,
        Outcome::NotFound => StatusCode::NOT_FOUND,
        Outcome::AlreadyOccupied => StatusCode::CONFLICT,
    }
}

async fn apply(state: AppState, action: Action, name: String, user: String) -> Response {
    let ledger = state.ledger.clone();
    let result = tokio::task::spawn_blocking(move || {
        let outcome = match action {
            Action::Reserve => ledger.reserve(&name, &user),
            Action::Release => ledger.release(&name, &user),
        }?;
        Ok::<_, anyhow::Error>((outcome, ledger.list()))
    })
    .await;

    match result {
        Ok(Ok((outcome, servers))) => {
            let mut body = json!(outcome);
            body["servers"] = json!(servers);
            (status_for(&outcome), Json(body)).into_response()
        }
        Ok(Err(e)) => {
            log_event(&format!("❌ Ledger write failed: {:#}", e));
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("{:#}", e) })),
            )
                .into_response()
        }
        Err(e) => {
            log_event(&format!("❌ Ledger task failed: {}", e));
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn list_servers(State(state): State<AppState>) -> Response {
    let ledger = state.ledger.clone();
    match tokio::task::spawn_blocking(move || ledger.list()).await {
        Ok(servers) => Json(servers).into_response(),
        Err(e) => {
            log_event(&format!("❌ Ledger task failed: {}", e));
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn reserve_server(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Form(form): Form<UserForm>,
) -> Response {
    apply(state, Action::Reserve, name, form.usuario).await
}

async fn release_server(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Form(form): Form<UserForm>,
) -> Response {
    apply(state, Action::Release, name, form.usuario).await
}

pub fn router(ledger: Arc<Ledger>) -> Router {
    Router::new()
        .route("/servers", get(list_servers))
        .route("/servers/:name/reserve", post(reserve_server))
        .route("/servers/:name/release", post(release_server))
        .route("/health", get(|| async { "ok" }))
        .with_state(AppState { ledger })
}

/// Bind and serve until the process is stopped.
pub async fn start_server(ledger: Arc<Ledger>, host: &str, port: u16) -> anyhow::Result<()> {
    let servers = ledger.store().load();
    println!("🗄️  Server ledger starting on {}:{}", host, port);
    println!("   Store: {}", ledger.store().path().display());
    println!("   Servers tracked: {}", servers.len());

    let app = router(ledger);
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    println!("🎯 Ready! Waiting for requests...\n");

    axum::serve(listener, app).await?;

    Ok(())
}
