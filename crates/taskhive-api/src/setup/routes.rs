//! Route configuration and setup

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::middleware::{
    request_id_middleware,
    security_headers::{security_headers_middleware, SecurityHeadersConfig},
};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use taskhive_core::Config;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

fn api(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(state.auth_state());

    let protected_routes = protected_routes().layer(axum::middleware::from_fn_with_state(
        auth_state,
        crate::auth::auth_middleware,
    ));
    let app_state_routes = public_routes().merge(protected_routes);

    let security_headers_config = Arc::new(SecurityHeadersConfig::new(config.is_production()));

    let http_concurrency_limit = config.http_concurrency_limit().max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let app = app_state_routes
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_request_body_bytes()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn_with_state(
            security_headers_config,
            security_headers_middleware,
        ))
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

/// Public routes (no authentication required)
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(&api("/health"), get(handlers::health::health_check))
        .route(&api("/auth/login"), post(handlers::auth::login))
        .route(&api("/auth/register"), post(handlers::auth::register))
        .route(&api("/auth/forgot"), post(handlers::auth::forgot_password))
        .route(&api("/auth/reset"), post(handlers::auth::reset_password))
        .route(
            &api("/orgs/teamleads"),
            get(handlers::orgs::team_leads_by_org),
        )
        .route(
            &api("/orgs/by-manager"),
            get(handlers::orgs::organization_by_manager),
        )
        .route(
            &api("/openapi.json"),
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

/// Protected routes (require a session)
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(user_routes())
        .merge(project_routes())
        .merge(task_routes())
        .merge(subtask_routes())
        .merge(insight_routes())
        .merge(note_routes())
        .route(
            &api("/team-leads/invite"),
            post(handlers::team_leads::invite_team_lead),
        )
}

fn user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(&api("/users/me"), get(handlers::users::me))
        .route(&api("/users"), get(handlers::users::list_team))
        .route(
            &api("/assignable-users"),
            get(handlers::users::assignable_users),
        )
}

fn project_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &api("/projects"),
            get(handlers::projects::list_projects)
                .post(handlers::projects::create_project)
                .put(handlers::projects::update_project)
                .delete(handlers::projects::delete_project),
        )
        .route(
            &api("/projects/{id}"),
            get(handlers::projects::get_project)
                .put(handlers::projects::update_project_by_path)
                .delete(handlers::projects::delete_project_by_path),
        )
}

fn task_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &api("/tasks"),
            get(handlers::tasks::list_tasks)
                .post(handlers::tasks::create_task)
                .put(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        )
        .route(
            &api("/tasks/{id}"),
            get(handlers::tasks::get_task)
                .put(handlers::tasks::update_task_by_path)
                .delete(handlers::tasks::delete_task_by_path),
        )
}

fn subtask_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &api("/subtasks"),
            get(handlers::subtasks::list_subtasks)
                .post(handlers::subtasks::create_subtask)
                .put(handlers::subtasks::update_subtask)
                .delete(handlers::subtasks::delete_subtask),
        )
        .route(
            &api("/subtasks/{id}"),
            axum::routing::put(handlers::subtasks::update_subtask_by_path)
                .delete(handlers::subtasks::delete_subtask_by_path),
        )
}

fn insight_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &api("/dashboard-insights"),
            get(handlers::insights::dashboard_insights)
                .post(handlers::insights::dashboard_insights),
        )
        .route(
            &api("/project-insights"),
            get(handlers::insights::project_insights)
                .post(handlers::insights::project_insights_post),
        )
        .route(
            &api("/team-lead-insights"),
            get(handlers::insights::team_lead_insights)
                .post(handlers::insights::team_lead_insights_post),
        )
        .route(
            &api("/insights"),
            get(handlers::insights::list_insights).post(handlers::insights::generate_insight),
        )
}

fn note_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &api("/notes"),
            get(handlers::notes::list_notes).post(handlers::notes::create_note),
        )
        .route(
            &api("/notes/{id}"),
            axum::routing::delete(handlers::notes::delete_note),
        )
        .route(
            &api("/notes/{id}/attachments/{attachment_id}"),
            get(handlers::notes::download_attachment)
                .delete(handlers::notes::delete_attachment),
        )
}
