use axum::{
    routing::{get, patch, put},
    Router,
};

use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/api/expenses/:id",
            get(handlers::get_expense)
                .put(handlers::update_expense)
                .delete(handlers::delete_expense),
        )
        .route("/api/summary", get(handlers::summary))
        .route("/api/budgets", get(handlers::list_budgets))
        .route(
            "/api/budgets/:payer",
            put(handlers::set_budget).delete(handlers::delete_budget),
        )
        .route(
            "/api/trips",
            get(handlers::list_trips).post(handlers::create_trip),
        )
        .route(
            "/api/trips/:id",
            get(handlers::get_trip).delete(handlers::delete_trip),
        )
        .route(
            "/api/trips/:id/files",
            get(handlers::list_files).post(handlers::upload_file),
        )
        .route(
            "/api/files/:id",
            patch(handlers::update_file_note).delete(handlers::delete_file),
        )
        .route(
            "/api/profiles",
            get(handlers::list_profiles).post(handlers::create_profile),
        )
        .route("/api/profiles/:id", axum::routing::delete(handlers::delete_profile))
        .route(
            "/api/settings",
            get(handlers::get_settings).put(handlers::save_settings),
        )
        .route("/api/export.pdf", get(handlers::export_pdf))
}
