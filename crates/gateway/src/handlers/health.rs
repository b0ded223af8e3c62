//! Liveness and readiness probes

use axum::{extract::State, Json};
use pdfquery_common::Repository;
use serde::Serialize;
use std::time::Instant;

use crate::AppState;

#[derive(Serialize)]
pub struct Liveness {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct Readiness {
    pub status: &'static str,
    pub checks: Checks,
}

#[derive(Serialize)]
pub struct Checks {
    pub database: DatabaseCheck,
}

/// Outcome of pinging the document store
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DatabaseCheck {
    Up { latency_ms: u64, documents: u64 },
    Down { error: String },
}

impl DatabaseCheck {
    async fn run(repo: &Repository) -> Self {
        let start = Instant::now();
        let counted = match repo.ping().await {
            Ok(()) => repo.count_documents().await,
            Err(e) => Err(e),
        };

        match counted {
            Ok(documents) => DatabaseCheck::Up {
                latency_ms: start.elapsed().as_millis() as u64,
                documents,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Readiness check failed");
                DatabaseCheck::Down {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// The process is up and serving
pub async fn health() -> Json<Liveness> {
    Json(Liveness { status: "healthy" })
}

/// Ready once the document store answers
pub async fn ready(State(state): State<AppState>) -> Json<Readiness> {
    let database = DatabaseCheck::run(&state.repo).await;
    let status = match database {
        DatabaseCheck::Up { .. } => "ready",
        DatabaseCheck::Down { .. } => "not_ready",
    };

    Json(Readiness {
        status,
        checks: Checks { database },
    })
}
