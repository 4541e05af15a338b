//! Gateway module - HTTP and WebSocket front end
//!
//! ```text
//!   POST /execute ──► batch ──────────┐
//!                                     ├──► SandboxController ──► ContainerRuntime
//!   GET  /ws ──► interactive session ─┘
//!   GET  /languages, GET /health
//! ```

pub mod batch;
pub mod interactive;
pub mod protocol;
pub mod session;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::sandbox::{ContainerRuntime, DockerRuntime, SandboxController};

pub use protocol::{BatchResponse, ClientMessage, HealthResponse, LanguageInfo, ServerMessage};
pub use session::{InputBuffer, InteractiveSession, SessionPhase, PROCESS_FINISHED};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SandboxController>,
}

impl AppState {
    pub fn new(controller: SandboxController) -> Self {
        AppState {
            controller: Arc::new(controller),
        }
    }
}

/// Build the router
pub fn router(state: AppState, cors: bool) -> Router {
    let router = Router::new()
        .route("/execute", post(batch::execute_handler))
        .route("/ws", get(interactive::ws_handler))
        .route("/languages", get(list_languages))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn list_languages(State(state): State<AppState>) -> Json<Vec<LanguageInfo>> {
    let languages = state
        .controller
        .registry()
        .languages()
        .iter()
        .map(LanguageInfo::from)
        .collect();
    Json(languages)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Connect to Docker and serve until the process is stopped
pub async fn serve(config: &Config) -> Result<()> {
    let runtime: Arc<dyn ContainerRuntime> = Arc::new(DockerRuntime::connect()?);
    info!("Using {} container runtime", runtime.name());
    let controller = SandboxController::from_config(runtime, config);

    let languages: Vec<&str> = controller
        .registry()
        .languages()
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    info!("Languages: {}", languages.join(", "));

    let app = router(AppState::new(controller), config.server.cors);

    let address = config.server.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| Error::Config(format!("Cannot bind {}: {}", address, e)))?;
    info!("Listening on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}
