//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::TokenExchangeService;
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::interfaces::http::common::{ApiResponse, MessageResponse};
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::interfaces::http::modules::{auth, health, password_reset};

/// Everything the routes need, built once at startup
#[derive(Clone)]
pub struct AppServices {
    pub db: DatabaseConnection,
    pub jwt_config: JwtConfig,
    pub token_exchange: Arc<TokenExchangeService>,
    pub password_reset: Arc<password_reset::SeaOrmPasswordResetService>,
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token from /api/v1/auth/oidc/exchange"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::exchange_id_token,
        auth::get_current_session,
        password_reset::forgot_password,
        password_reset::reset_password,
    ),
    components(
        schemas(
            ApiResponse<String>,
            MessageResponse,
            health::HealthResponse,
            health::ComponentHealth,
            auth::OidcExchangeRequest,
            auth::SessionTokenResponse,
            auth::SessionInfo,
            password_reset::ForgotPasswordRequest,
            password_reset::ForgotPasswordResponse,
            password_reset::VerifyResetRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Authentication", description = "OIDC id_token exchange and session inspection"),
        (name = "Password Reset", description = "Emailed reset codes for alumni accounts"),
    ),
    info(
        title = "Alumni Auth API",
        version = "1.0.0",
        description = "Authentication endpoints for the alumni association backend",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(services: AppServices) -> Router {
    let middleware_state = AuthState {
        jwt_config: services.jwt_config.clone(),
    };

    let health_state = health::HealthState {
        db: services.db.clone(),
        started_at: Arc::new(Instant::now()),
    };

    let auth_state = auth::AuthHandlerState {
        token_exchange: services.token_exchange.clone(),
    };

    let reset_state = password_reset::PasswordResetHandlerState {
        service: services.password_reset.clone(),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/oidc/exchange", post(auth::exchange_id_token))
        .with_state(auth_state);

    // Auth routes (protected)
    let auth_protected_routes = Router::new()
        .route("/me", get(auth::get_current_session))
        .layer(middleware::from_fn_with_state(
            middleware_state,
            auth_middleware,
        ));

    // Password reset routes (public)
    let reset_routes = Router::new()
        .route("/forgot", post(password_reset::forgot_password))
        .route("/reset", post(password_reset::reset_password))
        .with_state(reset_state);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    // Build router
    Router::new()
        // Swagger UI
        .merge(swagger_routes)
        // Health
        .route("/health", get(health::health_check))
        .with_state(health_state)
        // Auth
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/auth", auth_protected_routes)
        .nest("/api/v1/auth/password", reset_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
