//! Batch execution endpoint
//!
//! Runs a submitted program to completion (or timeout) and answers with its
//! collected output. Every outcome, including internal failures, becomes a
//! [`BatchResponse`].

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::gateway::protocol::BatchResponse;
use crate::gateway::AppState;
use crate::sandbox::{ExecutionRequest, SandboxController};

const UNSUPPORTED_LANGUAGE: &str = "Unsupported language";
const RUNTIME_DOWN: &str = "Docker is not running.";

/// Execute `request` and map the outcome to a status and response body
pub async fn run_batch(
    controller: &SandboxController,
    request: &ExecutionRequest,
) -> (StatusCode, BatchResponse) {
    let result = controller.execute(request).await;

    let (status, response) = match result {
        Ok(output) => (StatusCode::OK, BatchResponse::ok(output.stdout, output.stderr)),
        Err(e) => {
            let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::OK);
            (status, failure_response(e))
        }
    };

    info!(
        "Batch {} execution finished: success={} status={}",
        request.language.trim(),
        response.success,
        status.as_u16()
    );
    (status, response)
}

fn failure_response(err: Error) -> BatchResponse {
    match err {
        Error::UnsupportedLanguage(language) => {
            debug!("Rejected unsupported language {:?}", language);
            BatchResponse::failed(String::new(), UNSUPPORTED_LANGUAGE)
        }
        Error::RuntimeUnavailable(reason) => {
            error!("Container runtime unavailable: {}", reason);
            BatchResponse::failed(String::new(), RUNTIME_DOWN)
        }
        Error::ExecutionTimeout { timeout, stdout, .. } => BatchResponse::failed(
            stdout,
            format!("Execution timed out after {} seconds.", timeout.as_secs_f64()),
        ),
        Error::ExecutionFailed {
            message,
            exit_code: Some(_),
            stdout,
            stderr,
        } => {
            let stderr = if stderr.is_empty() { message } else { stderr };
            BatchResponse::failed(stdout, stderr)
        }
        other => {
            if other.is_infrastructure_error() {
                error!("Batch execution failed: {}", other);
            } else {
                warn!("Batch execution failed: {}", other);
            }
            BatchResponse::failed(String::new(), other.to_string())
        }
    }
}

/// `POST /execute`
pub async fn execute_handler(
    State(state): State<AppState>,
    payload: Result<Json<ExecutionRequest>, JsonRejection>,
) -> (StatusCode, Json<BatchResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Rejected batch request: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(BatchResponse::failed(String::new(), rejection.body_text())),
            );
        }
    };

    let (status, response) = run_batch(&state.controller, &request).await;
    (status, Json(response))
}
