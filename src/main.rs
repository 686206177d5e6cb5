mod models;
mod routes;
mod db;
mod services;
mod utils;
mod middleware;
mod settings;
#[cfg(test)]
mod test_support;

use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::EnvFilter;

use crate::services::blob_store::{BlobStore, LocalBlobStore};
use crate::settings::Settings;
use crate::utils::jwt::TokenService;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::other(format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env().map_err(|e| startup_error("Invalid configuration", e))?;
    utils::error::expose_internal_errors(settings.expose_internal_errors);

    tracing::info!("connecting to database");
    let db = db::establish_connection(&settings.database_url)
        .await
        .map_err(|e| startup_error("Failed to connect to database", e))?;
    db::create_schema(&db)
        .await
        .map_err(|e| startup_error("Failed to create schema", e))?;
    tracing::info!("database ready");

    let tokens = web::Data::new(TokenService::new(&settings.jwt_secret, settings.jwt_ttl_hours));
    let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(
        &settings.upload_dir,
        &settings.public_base_url,
    ));
    let blobs = web::Data::from(blobs);
    let db = web::Data::new(db);
    let bind = (settings.host.clone(), settings.port);
    let settings = web::Data::new(settings);

    tracing::info!(host = %bind.0, port = bind.1, "starting server");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&settings.cors_origin)
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(db.clone())
            .app_data(tokens.clone())
            .app_data(blobs.clone())
            .app_data(settings.clone())
            .app_data(routes::json_config())
            .configure(routes::configure_routes)
    })
    .bind(bind)?
    .run()
    .await
}
