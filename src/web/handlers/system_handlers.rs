// src/web/handlers/system_handlers.rs
use chrono::Utc;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{debug, error};

use crate::database::Database;
use crate::web::types::HealthResponse;

pub async fn health_handler(db: &State<Database>) -> Json<HealthResponse> {
    // Liveness only; a failing store is logged, not reported
    match db.health_check().await {
        Ok(()) => debug!("Health check passed"),
        Err(e) => error!("Health check could not reach the database: {:#}", e),
    }

    Json(HealthResponse {
        success: true,
        message: "Flowbase API is running".to_string(),
        timestamp: Utc::now(),
    })
}
