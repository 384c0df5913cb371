mod commands;
mod db;
mod errors;
mod export;
mod handlers;
mod models;
mod tally;
mod tasks;
mod telegram;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use db::Database;
use handlers::Update;
use log::{error, info};
use std::env;
use std::sync::Arc;
use telegram::TelegramClient;

struct AppState {
    database: Arc<Database>,
    telegram: TelegramClient,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let token = env::var("BOT_TOKEN").expect("Expected a bot token in the environment");

    let database = match Database::new().await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return;
        }
    };

    let telegram = TelegramClient::new(&token);

    // --- Start Background Task for Summary Refresh ---
    let refresh_minutes = env::var("SUMMARY_REFRESH_MINUTES")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(15);
    if refresh_minutes > 0 {
        let db_clone = Arc::clone(&database);
        tokio::spawn(async move {
            tasks::summary_refresher::refresh_summary_task(db_clone, refresh_minutes).await;
        });
    }
    // --- End Background Task ---

    let state = Arc::new(AppState { database, telegram });
    let app = Router::new()
        .route("/", get(health).post(webhook))
        .with_state(state);

    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{port}");
    info!("Parish Pulse bot listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            return;
        }
    };

    if let Err(why) = axum::serve(listener, app).await {
        error!("Server error: {:?}", why);
    }
}

async fn health() -> &'static str {
    "Parish Pulse bot is up \u{1f7e2}"
}

// Answer 200 right away and process the update in a spawned task, so slow
// handlers never make Telegram re-deliver the update.
async fn webhook(State(state): State<Arc<AppState>>, Json(update): Json<Update>) -> StatusCode {
    tokio::spawn(async move {
        handlers::handle_update(&state.database, &state.telegram, update).await;
    });
    StatusCode::OK
}
