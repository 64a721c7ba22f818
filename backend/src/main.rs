use std::env;
use std::sync::Arc;

use backend::mail::LogMailer;
use backend::{app, AppState};
use santa_core::Roster;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let roster = match env::var("ROSTER_PATH") {
        Ok(path) => {
            let bytes = std::fs::read(&path).expect("read roster config");
            serde_json::from_slice::<Roster>(&bytes).expect("parse roster config")
        }
        Err(_) => Roster::default(),
    };

    let state = AppState::new(roster, Arc::new(LogMailer)).expect("valid roster config");
    let state = if let Ok(path) = env::var("PERSIST_PATH") {
        state.with_persistence(path).await
    } else {
        state
    };

    let addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let app = app(state);
    tracing::info!(%addr, "starting secret santa server");
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("bind"),
        app,
    )
    .await
    .expect("server error");
}
