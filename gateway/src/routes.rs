//! 路由模块

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/greet", post(handlers::greet_by_name))
        .route("/schemas", post(handlers::list_schemas))
        .route("/tables", post(handlers::list_tables))
        .route("/table_content", post(handlers::table_content))
        .route("/update_table", put(handlers::update_table))
        .route("/select", post(handlers::execute_select))
        .route("/health", get(handlers::health_check))
}
