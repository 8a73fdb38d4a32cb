use actix_web::web::{Data, Json, Path};
use actix_web::{get, post, HttpResponse, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::BearerToken;
use crate::models::booking::{Booking, ConflictCheckResponse, QuoteRequest};
use crate::models::common::ApiResponse;
use crate::services::checkout::{quote, CheckoutError, Quote};
use crate::services::database::DatabaseService;

/// The advisory pre-flight conflict check the booking page runs before it
/// opens the payment modal. A conflict is a 200 carrying the existing
/// booking's range.
#[get("/active/{user_id}/{gym_id}")]
pub async fn active_booking(
    db: Data<DatabaseService>,
    path: Path<(String, Uuid)>,
    _token: BearerToken,
) -> Result<HttpResponse> {
    let (user_id, gym_id) = path.into_inner();
    let today = Utc::now().date_naive();

    match db.active_booking(&user_id, &gym_id, today).await {
        Ok(Some(booking)) => {
            Ok(HttpResponse::Ok().json(ConflictCheckResponse::conflicting(&booking)))
        }
        Ok(None) => Ok(HttpResponse::Ok().json(ConflictCheckResponse::clear())),
        Err(e) => {
            log::error!(
                "Conflict check failed for user {} at gym {}: {}",
                user_id,
                gym_id,
                e
            );
            Ok(HttpResponse::InternalServerError().json(
                ApiResponse::<ConflictCheckResponse>::error("Conflict check failed".to_string()),
            ))
        }
    }
}

#[get("/user/{user_id}")]
pub async fn user_bookings(
    db: Data<DatabaseService>,
    path: Path<String>,
    _token: BearerToken,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();

    match db.bookings_by_user(&user_id).await {
        Ok(bookings) => Ok(HttpResponse::Ok().json(ApiResponse::success(bookings))),
        Err(e) => {
            log::error!("Failed to list bookings for user {}: {}", user_id, e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<Vec<Booking>>::error(
                "Failed to list bookings".to_string(),
            )))
        }
    }
}

/// Price a plan for a slot selection without committing to anything.
#[post("/quote")]
pub async fn quote_plan(
    db: Data<DatabaseService>,
    payload: Json<QuoteRequest>,
    _token: BearerToken,
) -> Result<HttpResponse> {
    let request = payload.into_inner();

    let gym = match db.get_gym(&request.gym_id).await {
        Ok(Some(gym)) => gym,
        Ok(None) => {
            return Ok(HttpResponse::NotFound()
                .json(ApiResponse::<Quote>::error("Gym not found".to_string())))
        }
        Err(e) => {
            log::error!("Failed to fetch gym {}: {}", request.gym_id, e);
            return Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<Quote>::error("Failed to load pricing".to_string())));
        }
    };

    match quote(&gym, request.plan, &request.selection) {
        Ok(quote) => Ok(HttpResponse::Ok().json(ApiResponse::success(quote))),
        Err(CheckoutError::Validation(message)) => {
            Ok(HttpResponse::BadRequest().json(ApiResponse::<Quote>::error(message)))
        }
        Err(e) => {
            log::error!("Quote failed for gym {}: {}", request.gym_id, e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<Quote>::error("Quote failed".to_string())))
        }
    }
}
