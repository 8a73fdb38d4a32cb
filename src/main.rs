mod auth;
mod config;
mod handlers;
mod models;
mod services;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::env;

use services::{
    cashfree::CashfreePaymentService,
    checkout::CheckoutService,
    database::DatabaseService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = config::Config::from_env().expect("Failed to load configuration");

    let database_service = DatabaseService::new(&config.database_url)
        .await
        .expect("Failed to initialize database");

    let cashfree_service = CashfreePaymentService::new(config.cashfree.clone());
    let checkout_service =
        CheckoutService::new(database_service.clone(), cashfree_service.clone());

    let port = env::var("PORT").unwrap_or_else(|_| "4000".to_string());
    let bind_address = format!("0.0.0.0:{}", port);

    log::info!("Starting gym booking server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .supports_credentials(),
            )
            .app_data(web::Data::new(database_service.clone()))
            .app_data(web::Data::new(cashfree_service.clone()))
            .app_data(web::Data::new(checkout_service.clone()))
            .service(
                web::scope("/api/v1")
                    // Gym records
                    .service(
                        web::scope("/gyms")
                            .service(handlers::gyms::nearby_gyms)
                            .service(handlers::gyms::create_gym)
                            .service(handlers::gyms::list_gyms)
                            .service(handlers::gyms::gym_pricing)
                            .service(handlers::gyms::get_gym)
                            .service(handlers::gyms::update_gym)
                            .service(handlers::gyms::delete_gym),
                    )
                    // Booking checks and quotes
                    .service(
                        web::scope("/bookings")
                            .service(handlers::bookings::active_booking)
                            .service(handlers::bookings::user_bookings)
                            .service(handlers::bookings::quote_plan),
                    )
                    // Checkout orders
                    .service(
                        web::scope("/orders")
                            .service(handlers::orders::create_order)
                            .service(handlers::orders::user_orders)
                            .service(handlers::orders::order_status),
                    )
                    // Gateway callbacks
                    .service(
                        web::scope("/payments").service(handlers::payments::payment_webhook),
                    )
                    // Health and ops visibility
                    .route("/health", web::get().to(handlers::health::health_check))
                    .route("/stats", web::get().to(handlers::health::statistics)),
            )
    })
    .bind(&bind_address)?
    .run()
    .await
}
