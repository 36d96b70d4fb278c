use crate::{api::employee, error::ApiError};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::{Result, anyhow};

pub type ApiLimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-peer-IP quota. The config owns the shared limiter state, so every
/// worker that builds a `Governor` from it draws from the same buckets.
pub fn build_limiter_config(requests_per_min: u32) -> Result<ApiLimiterConfig> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / u64::from(requests_per_min)).max(1)
    };

    GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} requests per minute"))
}

/// Malformed JSON bodies answer with the same `{message}` shape as every other 400.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| ApiError::validation(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::validation(err.to_string()).into())
}

pub fn configure(cfg: &mut web::ServiceConfig, employees_path: &str, limiter: &ApiLimiterConfig) {
    cfg.service(
        web::scope(employees_path)
            .wrap(Governor::new(limiter)) // rate limiting
            .configure(employee_routes),
    );
}

pub fn employee_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // /employees
        .service(
            web::resource("")
                .route(web::get().to(employee::list_employees))
                .route(web::post().to(employee::create_employee)),
        )
        // /employees/{id}
        .service(
            web::resource("/{id}")
                .route(web::get().to(employee::get_employee))
                .route(web::put().to(employee::update_employee))
                .route(web::delete().to(employee::delete_employee)),
        );
}
