use actix_web::{get, HttpResponse};
use chrono::Utc;
use crate::models::health::HealthResponse;

#[get("/health")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        time: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use serde_json::Value;

    use super::*;

    #[actix_web::test]
    async fn reports_ok() {
        let app = test::init_service(App::new().service(health_check)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
        assert!(body["time"].is_string());
    }
}
