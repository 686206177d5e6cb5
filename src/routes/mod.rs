pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod placeholder;
pub mod products;

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::utils::error::AppError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .service(placeholder::placeholder)
            .configure(auth::auth_routes)
            .configure(orders::order_routes)
            .configure(products::product_routes)
            .configure(cart::cart_routes),
    );
}

/// Corps JSON invalide (syntaxe ou types) => même forme qu'une erreur de validation
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        // images base64: 5 x 6 Mo + marge d'encodage
        .limit(48 * 1024 * 1024)
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            AppError::validation(err.to_string()).into()
        })
}
