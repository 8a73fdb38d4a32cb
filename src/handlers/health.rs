use actix_web::web::Data;
use actix_web::HttpResponse;

use crate::services::database::DatabaseService;

pub async fn health_check(db: Data<DatabaseService>) -> HttpResponse {
    match db.health_check().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({ "status": "healthy" })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": e.to_string(),
        })),
    }
}

pub async fn statistics(db: Data<DatabaseService>) -> HttpResponse {
    match db.get_statistics().await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(e) => {
            log::error!("Failed to gather statistics: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to gather statistics",
            }))
        }
    }
}
