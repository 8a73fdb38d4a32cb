use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, post, put, HttpResponse, Result};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::BearerToken;
use crate::models::common::ApiResponse;
use crate::models::gym::{CreateGymRequest, Gym, PricingResponse};
use crate::services::database::DatabaseService;

const DEFAULT_NEARBY_RADIUS_KM: f64 = 10.0;

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: Option<f64>,
}

#[post("")]
pub async fn create_gym(
    db: Data<DatabaseService>,
    payload: Json<CreateGymRequest>,
    _token: BearerToken,
) -> Result<HttpResponse> {
    if let Err(errors) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<Gym>::error(errors.to_string())));
    }

    match db.create_gym(Gym::new(payload.into_inner())).await {
        Ok(gym) => Ok(HttpResponse::Created().json(ApiResponse::success(gym))),
        Err(e) => {
            log::error!("Failed to create gym: {}", e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<Gym>::error("Failed to create gym".to_string())))
        }
    }
}

#[get("")]
pub async fn list_gyms(db: Data<DatabaseService>, _token: BearerToken) -> Result<HttpResponse> {
    match db.list_gyms().await {
        Ok(gyms) => Ok(HttpResponse::Ok().json(ApiResponse::success(gyms))),
        Err(e) => {
            log::error!("Failed to list gyms: {}", e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<Vec<Gym>>::error("Failed to list gyms".to_string())))
        }
    }
}

#[get("/nearby")]
pub async fn nearby_gyms(
    db: Data<DatabaseService>,
    query: Query<NearbyQuery>,
    _token: BearerToken,
) -> Result<HttpResponse> {
    let radius_km = query.radius_km.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);

    match db.find_gyms_near(query.lat, query.lng, radius_km).await {
        Ok(gyms) => Ok(HttpResponse::Ok().json(ApiResponse::success(gyms))),
        Err(e) => {
            log::error!("Nearby gym lookup failed: {}", e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<Vec<Gym>>::error("Failed to search gyms".to_string())))
        }
    }
}

#[get("/{gym_id}")]
pub async fn get_gym(
    db: Data<DatabaseService>,
    path: Path<Uuid>,
    _token: BearerToken,
) -> Result<HttpResponse> {
    let gym_id = path.into_inner();

    match db.get_gym(&gym_id).await {
        Ok(Some(gym)) => Ok(HttpResponse::Ok().json(ApiResponse::success(gym))),
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::<Gym>::error("Gym not found".to_string()))),
        Err(e) => {
            log::error!("Failed to fetch gym {}: {}", gym_id, e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<Gym>::error("Failed to fetch gym".to_string())))
        }
    }
}

#[get("/{gym_id}/pricing")]
pub async fn gym_pricing(
    db: Data<DatabaseService>,
    path: Path<Uuid>,
    _token: BearerToken,
) -> Result<HttpResponse> {
    let gym_id = path.into_inner();

    match db.get_gym(&gym_id).await {
        Ok(Some(gym)) => Ok(HttpResponse::Ok().json(PricingResponse::from_gym(&gym))),
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::<PricingResponse>::error("Gym not found".to_string()))),
        Err(e) => {
            log::error!("Failed to fetch pricing for gym {}: {}", gym_id, e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<PricingResponse>::error(
                "Failed to load pricing".to_string(),
            )))
        }
    }
}

#[put("/{gym_id}")]
pub async fn update_gym(
    db: Data<DatabaseService>,
    path: Path<Uuid>,
    payload: Json<CreateGymRequest>,
    _token: BearerToken,
) -> Result<HttpResponse> {
    if let Err(errors) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<Gym>::error(errors.to_string())));
    }

    let gym_id = path.into_inner();
    let mut gym = match db.get_gym(&gym_id).await {
        Ok(Some(gym)) => gym,
        Ok(None) => {
            return Ok(HttpResponse::NotFound()
                .json(ApiResponse::<Gym>::error("Gym not found".to_string())))
        }
        Err(e) => {
            log::error!("Failed to fetch gym {}: {}", gym_id, e);
            return Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<Gym>::error("Failed to update gym".to_string())));
        }
    };

    gym.apply(payload.into_inner());

    match db.update_gym(&gym).await {
        Ok(updated) => Ok(HttpResponse::Ok().json(ApiResponse::success(updated))),
        Err(e) => {
            log::error!("Failed to update gym {}: {}", gym_id, e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<Gym>::error("Failed to update gym".to_string())))
        }
    }
}

#[delete("/{gym_id}")]
pub async fn delete_gym(
    db: Data<DatabaseService>,
    path: Path<Uuid>,
    _token: BearerToken,
) -> Result<HttpResponse> {
    let gym_id = path.into_inner();

    match db.soft_delete_gym(&gym_id).await {
        Ok(true) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            gym_id,
            "Gym deleted".to_string(),
        ))),
        Ok(false) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::<Uuid>::error("Gym not found".to_string()))),
        Err(e) => {
            log::error!("Failed to delete gym {}: {}", gym_id, e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<Uuid>::error("Failed to delete gym".to_string())))
        }
    }
}
