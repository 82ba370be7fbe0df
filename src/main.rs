use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use std::{env, sync::Arc};
use tickerwatch::{
    actions::ActionDispatcher,
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    forwarder,
    pipeline::{Extraction, SignalPipeline},
    tracker::RunStats,
    types::{EventError, InboundEvent, Signal},
};
use tokio::sync::{mpsc, Notify, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

pub struct AppState {
    pipeline: SignalPipeline,
    stats: RwLock<RunStats>,
    actions: Arc<ActionDispatcher>,
    forward_tx: Option<mpsc::Sender<Signal>>,
    stats_interval: u64,
    max_errors: u64,
    shutdown: Notify,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let (config, config_path) = AppConfig::load_from_env_or_default()?;

    let level = config.settings.tracing_level()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tickerwatch={}", level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("==================================================");
    info!("  TICKERWATCH - signal bot monitor");
    info!("==================================================");

    match &config_path {
        Some(path) => info!("Config loaded from {}", path.display()),
        None => warn!("{} not found, using built-in defaults", DEFAULT_CONFIG_PATH),
    }

    let port: u16 = env::var("PORT")
        .unwrap_or("3004".into())
        .parse()
        .unwrap_or(3004);

    let pipeline = config.build_pipeline()?;
    let enabled: Vec<String> = pipeline
        .grammars()
        .iter()
        .filter(|g| g.enabled)
        .map(|g| format!("@{}", g.sender_identifier))
        .collect();
    info!("Monitoring: {}", enabled.join(", "));

    let blacklist = pipeline.filter().blacklist();
    if blacklist.is_enabled() {
        info!("🚫 Blacklist active: {} tickers ({})", blacklist.len(), blacklist.sorted().join(", "));
    } else {
        info!("Blacklist disabled");
    }

    let forward_tx = config.forwarding.as_ref().map(forwarder::spawn);

    let state = Arc::new(AppState {
        pipeline,
        stats: RwLock::new(RunStats::new()),
        actions: Arc::new(ActionDispatcher::system(&config.settings, &config.notifications)),
        forward_tx,
        stats_interval: config.settings.stats_interval,
        max_errors: config.settings.max_errors,
        shutdown: Notify::new(),
    });

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/ws", get(ws_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on port {} (WebSocket at /ws)", port);

    let shutdown_state = Arc::clone(&state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown_state.shutdown.notified() => {}
                _ = tokio::signal::ctrl_c() => info!("🛑 Received stop signal"),
            }
        })
        .await?;

    state.stats.read().await.log_summary();
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "tickerwatch",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

async fn status(State(s): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = s.stats.read().await.clone();
    let grammars: Vec<serde_json::Value> = s
        .pipeline
        .grammars()
        .iter()
        .map(|g| serde_json::json!({ "name": g.name, "sender": g.sender_identifier, "enabled": g.enabled }))
        .collect();
    let blacklist = s.pipeline.filter().blacklist();

    Json(serde_json::json!({
        "stats": stats,
        "grammars": grammars,
        "cachedFingerprints": s.pipeline.filter().cached_fingerprints(),
        "blacklist": {
            "enabled": blacklist.is_enabled(),
            "tickers": blacklist.len()
        }
    }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    info!("Chat bridge connected");

    while let Some(msg) = receiver.next().await {
        let event = match msg {
            Ok(Message::Binary(data)) => InboundEvent::from_msgpack(&data),
            Ok(Message::Text(text)) => InboundEvent::from_json(&text),
            Ok(Message::Ping(payload)) => {
                let _ = sender.send(Message::Pong(payload)).await;
                continue;
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!("WebSocket error: {}", e);
                break;
            }
            _ => continue,
        };

        match event {
            Ok(event) => process_event(&state, event).await,
            Err(e) => record_error(&state, &e).await,
        }
    }
    info!("Chat bridge disconnected");
}

async fn process_event(state: &Arc<AppState>, event: InboundEvent) {
    let text = match event.scan_text() {
        Ok(text) => text,
        Err(e) => return record_error(state, &e).await,
    };
    info!("📨 New message from @{}", event.sender);

    let outcome = state.pipeline.evaluate(&text, &event.sender, event.message_id);
    let seen = {
        let mut stats = state.stats.write().await;
        stats.record(&outcome);
        stats.messages_seen
    };

    match outcome {
        Extraction::Accepted(signal) => {
            let direction = signal.direction_raw.as_deref().unwrap_or("N/A");
            info!(
                "✅ @{}: {} -> {} ({})",
                signal.source,
                signal.ticker,
                signal.mexc_symbol(),
                direction
            );
            if let Some(tx) = &state.forward_tx {
                if let Err(e) = tx.try_send(signal.clone()) {
                    warn!("Forward queue rejected {}: {}", signal.ticker, e);
                }
            }
            state.actions.dispatch(signal);
        }
        Extraction::Duplicate => return,
        Extraction::NoMatch => debug!("No ticker in message {} from @{}", event.message_id, event.sender),
        Extraction::Blacklisted { ticker } => info!("🚫 {} from @{} is blacklisted", ticker, event.sender),
    }

    if state.stats_interval > 0 && seen % state.stats_interval == 0 {
        state.stats.read().await.log_summary();
    }
}

async fn record_error(state: &Arc<AppState>, e: &EventError) {
    let errors = state.stats.write().await.record_error();
    warn!("Skipping malformed event: {}", e);
    if errors >= state.max_errors {
        error!("Reached error limit ({}), shutting down", errors);
        state.shutdown.notify_one();
    }
}
