// src/main.rs
use actix_web::{App, HttpServer, middleware, web};
use log::{info, warn};

use garden_buddy::config::Config;
use garden_buddy::{AppState, configure};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("Failed to read .env file: {}", e);
        }
    }

    info!("Starting Garden Buddy service...");

    let config = Config::from_env();
    let app_state = AppState::from_config(&config)?;
    for status in app_state.dispatcher.statuses() {
        info!(
            "Provider {} ({}): {}",
            status.id,
            status.model,
            if status.configured { "configured" } else { "mock only" }
        );
    }

    let bind = (config.host.clone(), config.port);
    info!("Starting HTTP server on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
