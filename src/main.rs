use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::{Result, anyhow};
use clap::Parser;

mod api;
mod cli;
mod client;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod store;
mod utils;

use cli::{Cli, Command};
use config::Config;

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Employee directory is running"
}

/// Rolling daily log; the guard must live as long as the process.
fn init_tracing(config: &Config) -> Result<WorkerGuard> {
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(guard)
}

async fn serve(config: Config) -> Result<()> {
    info!(
        addr = %config.server_addr,
        backend = %config.store_backend,
        "Server starting..."
    );

    let store = Data::from(store::connect(&config).await?);
    let limiter = routes::build_limiter_config(config.rate_api_per_min)?;
    let employees_path = config.employees_path();
    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(routes::json_config())
            .app_data(routes::query_config())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &employees_path, &limiter))
    })
    .bind(server_addr)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}

#[actix_web::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Client(args) => cli::run_client(args).await,
        Command::Serve => {
            let config = Config::from_env()?;
            let _guard = init_tracing(&config)?;
            serve(config).await
        }
        Command::Counter(command) => {
            let config = Config::from_env()?;
            let _guard = init_tracing(&config)?;
            cli::run_counter(command, &config).await
        }
    }
}
