// Contractor Lookup - Web Server
// JSON API where every client session owns its own selection state

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use contractor_lookup::{init_logging, DataArgs, LookupEngine, SessionId, SessionStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "lookup-server")]
#[command(about = "Contractor lookup JSON API", version)]
struct Args {
    #[command(flatten)]
    data: DataArgs,

    /// Address to listen on
    #[arg(long, env = "LOOKUP_BIND", default_value = "127.0.0.1:3000")]
    bind: String,

    /// Drop sessions idle for longer than this (1 minute to 1 year)
    #[arg(
        long,
        env = "LOOKUP_SESSION_IDLE_MINUTES",
        default_value_t = 30,
        value_parser = clap::value_parser!(i64).range(1..=525_600)
    )]
    session_idle_minutes: i64,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    engine: Arc<LookupEngine>,
    sessions: Arc<SessionStore>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message.into()),
        }),
    )
        .into_response()
}

fn unknown_session(id: SessionId) -> Response {
    api_error(StatusCode::NOT_FOUND, format!("Unknown or expired session {}", id))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    registry_rows: usize,
    contract_rows: usize,
    active_sessions: usize,
}

#[derive(Serialize)]
struct SessionCreated {
    session_id: SessionId,
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check(State(state): State<AppState>) -> Response {
    let data = state.engine.dataset();
    ApiResponse::ok(HealthResponse {
        status: "OK",
        version: contractor_lookup::VERSION,
        registry_rows: data.registry.len(),
        contract_rows: data.contracts.len(),
        active_sessions: state.sessions.len(),
    })
}

/// POST /api/sessions - Start a session
async fn create_session(State(state): State<AppState>) -> Response {
    let session_id = state.sessions.create();
    ApiResponse::ok(SessionCreated { session_id })
}

// Handlers only hold the store lock long enough to update or snapshot a
// session; registry scans and contract aggregation run outside it.

/// GET /api/sessions/:id - Current view
async fn get_session(State(state): State<AppState>, Path(id): Path<SessionId>) -> Response {
    match state.sessions.with_session(id, |session| session.clone()) {
        Some(session) => ApiResponse::ok(session.view(&state.engine)),
        None => unknown_session(id),
    }
}

/// DELETE /api/sessions/:id - End a session
async fn delete_session(State(state): State<AppState>, Path(id): Path<SessionId>) -> Response {
    if state.sessions.remove(id) {
        ApiResponse::ok("ended")
    } else {
        unknown_session(id)
    }
}

/// GET /api/sessions/:id/search?q= - Search the registry
async fn search(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Query(params): Query<SearchParams>,
) -> Response {
    let outcome = state.engine.search(&params.q);
    let snapshot = state.sessions.with_session(id, |session| {
        session.apply_search(&params.q, outcome);
        session.clone()
    });

    match snapshot {
        Some(session) => ApiResponse::ok(session.view(&state.engine)),
        None => unknown_session(id),
    }
}

/// POST /api/sessions/:id/select/:name - Choose among candidates
async fn select(
    State(state): State<AppState>,
    Path((id, name)): Path<(SessionId, String)>,
) -> Response {
    // Path segments arrive percent-decoded
    let outcome = state.sessions.with_session(id, |session| {
        session.select(&name).map(|()| session.clone())
    });

    match outcome {
        Some(Ok(session)) => ApiResponse::ok(session.view(&state.engine)),
        Some(Err(e)) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        None => unknown_session(id),
    }
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/search", get(search))
        .route("/sessions/:id/select/:name", post(select))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging("info,tower_http=debug");

    println!("🌐 Contractor Lookup - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let dataset = match args.data.load() {
        Ok(dataset) => dataset,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ Could not load data: {:#}", e);
            eprintln!("   Pass --registry and --contracts (or LOOKUP_REGISTRY_CSV / LOOKUP_CONTRACTS_CSV).");
            std::process::exit(1);
        }
    };
    println!(
        "✓ Loaded {} registry records and {} contracts",
        dataset.registry.len(),
        dataset.contracts.len()
    );

    // Create shared state
    let state = AppState {
        engine: Arc::new(LookupEngine::new(dataset)),
        sessions: Arc::new(SessionStore::new(chrono::Duration::minutes(
            args.session_idle_minutes,
        ))),
    };

    let app = router(state);

    // Start server
    let listener = match tokio::net::TcpListener::bind(&args.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("❌ Failed to bind to {}: {}", args.bind, e);
            std::process::exit(1);
        }
    };

    info!(bind = %args.bind, "server listening");
    println!("\n🚀 Server running on http://{}", args.bind);
    println!("   API: http://{}/api/health", args.bind);
    println!("\n   Press Ctrl+C to stop\n");

    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {}", e);
        std::process::exit(1);
    }
}
