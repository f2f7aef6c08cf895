use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, map_response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::{ApiConfig, SecurityConfig};
use crate::database::CourseStore;
use crate::handlers::{self, actions};
use crate::middleware::{envelope_rejections, identity_middleware};

/// Shared handles every request sees
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CourseStore>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn CourseStore>, jwt_secret: impl Into<Arc<str>>) -> Self {
        Self {
            store,
            jwt_secret: jwt_secret.into(),
        }
    }
}

/// Action names exposed under `/api/actions/`
pub const ACTION_NAMES: &[&str] = &[
    "createCourse",
    "updateCourse",
    "listMyCourses",
    "getCourseWithItems",
    "saveCourseItem",
    "deleteCourseItem",
    "upsertCourseProgress",
    "updateCourseItemProgress",
    "getCourseProgress",
];

pub fn app(state: AppState, api: &ApiConfig, security: &SecurityConfig) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        // Identity resolved here, enforced per action
        .nest("/api/actions", action_routes(state.clone()))
        .fallback(handlers::not_found)
        .with_state(state);

    // Body limit sits innermost so its rejection passes through the envelope rewrite
    let router = router
        .layer(RequestBodyLimitLayer::new(api.max_request_size_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(security))
                .layer(map_response(envelope_rejections)),
        );

    if api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn action_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/createCourse", post(actions::create_course))
        .route("/updateCourse", post(actions::update_course))
        .route("/listMyCourses", post(actions::list_my_courses))
        .route("/getCourseWithItems", post(actions::get_course_with_items))
        .route("/saveCourseItem", post(actions::save_course_item))
        .route("/deleteCourseItem", post(actions::delete_course_item))
        .route("/upsertCourseProgress", post(actions::upsert_course_progress))
        .route("/updateCourseItemProgress", post(actions::update_course_item_progress))
        .route("/getCourseProgress", post(actions::get_course_progress))
        .route_layer(from_fn_with_state(state, identity_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if security.cors_origins.iter().any(|origin| origin == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Skipping invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
}
