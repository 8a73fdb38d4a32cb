use actix_web::web::{Data, Json, Path};
use actix_web::{get, post, HttpResponse, Result};
use validator::Validate;

use crate::auth::BearerToken;
use crate::models::common::ApiResponse;
use crate::models::order::{CheckoutSessionResponse, CreateOrderRequest, Order};
use crate::services::checkout::{CheckoutError, CheckoutOutcome, CheckoutService};
use crate::services::database::DatabaseService;

/// The checkout confirm step: validates the request, reserves the booking,
/// creates the payment order and returns the session for the hosted
/// checkout redirect.
#[post("")]
pub async fn create_order(
    db: Data<DatabaseService>,
    checkout: Data<CheckoutService>,
    payload: Json<CreateOrderRequest>,
    _token: BearerToken,
) -> Result<HttpResponse> {
    // Bad phone numbers and malformed amounts stop here, before any
    // reservation or gateway round trip.
    if let Err(errors) = payload.validate() {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::<CheckoutSessionResponse>::error(errors.to_string())));
    }

    let request = payload.into_inner();

    let gym = match db.get_gym(&request.gym_id).await {
        Ok(Some(gym)) => gym,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(
                ApiResponse::<CheckoutSessionResponse>::error("Gym not found".to_string()),
            ))
        }
        Err(e) => {
            log::error!("Failed to fetch gym {}: {}", request.gym_id, e);
            return Ok(HttpResponse::InternalServerError().json(
                ApiResponse::<CheckoutSessionResponse>::error("Failed to fetch gym".to_string()),
            ));
        }
    };

    match checkout.checkout(&gym, request).await {
        Ok(CheckoutOutcome::RedirectToCheckout(session)) => {
            Ok(HttpResponse::Ok().json(session))
        }
        Ok(CheckoutOutcome::Conflict {
            start_date,
            end_date,
        }) => Ok(HttpResponse::Conflict().json(serde_json::json!({
            "conflict": true,
            "booking": { "startDate": start_date, "endDate": end_date }
        }))),
        Err(CheckoutError::Validation(message)) => Ok(
            HttpResponse::BadRequest().json(ApiResponse::<CheckoutSessionResponse>::error(message))
        ),
        Err(CheckoutError::Gateway(e)) => {
            log::error!("Gateway order creation failed: {}", e);
            Ok(HttpResponse::BadGateway().json(
                ApiResponse::<CheckoutSessionResponse>::error(
                    "Failed to create payment session".to_string(),
                ),
            ))
        }
        Err(CheckoutError::Internal(e)) => {
            log::error!("Checkout failed: {}", e);
            Ok(HttpResponse::InternalServerError().json(
                ApiResponse::<CheckoutSessionResponse>::error("Checkout failed".to_string()),
            ))
        }
    }
}

#[get("/user/{user_id}")]
pub async fn user_orders(
    db: Data<DatabaseService>,
    path: Path<String>,
    _token: BearerToken,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();

    match db.orders_by_user(&user_id).await {
        Ok(orders) => Ok(HttpResponse::Ok().json(ApiResponse::success(orders))),
        Err(e) => {
            log::error!("Failed to list orders for user {}: {}", user_id, e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<Vec<Order>>::error("Failed to list orders".to_string())))
        }
    }
}

#[get("/{order_id}/status")]
pub async fn order_status(
    checkout: Data<CheckoutService>,
    path: Path<String>,
    _token: BearerToken,
) -> Result<HttpResponse> {
    let order_id = path.into_inner();

    match checkout.refresh_order_status(&order_id).await {
        Ok(Some(order)) => Ok(HttpResponse::Ok().json(ApiResponse::success(order))),
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::<Order>::error("Order not found".to_string()))),
        Err(CheckoutError::Gateway(e)) => {
            log::error!("Gateway status check failed for {}: {}", order_id, e);
            Ok(HttpResponse::BadGateway()
                .json(ApiResponse::<Order>::error("Status check failed".to_string())))
        }
        Err(e) => {
            log::error!("Status check failed for {}: {}", order_id, e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<Order>::error("Status check failed".to_string())))
        }
    }
}
