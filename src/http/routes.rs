//! HTTP API Route Definitions

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, AppState};

/// Create the API router with all routes
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Catalog views and reconciled details
        .route("/api/games/popular", get(handlers::popular_games))
        .route("/api/games/discounted", get(handlers::discounted_games))
        .route("/api/games/upcoming", get(handlers::upcoming_games))
        .route("/api/games/search", get(handlers::search_games))
        .route("/api/games/category/:category", get(handlers::games_by_category))
        // Local games table
        .route("/api/games/query", get(handlers::query_games))
        .route("/api/games/local", get(handlers::list_local_games))
        .route("/api/games/batch", post(handlers::batch_create_games))
        .route("/api/games", post(handlers::create_game))
        .route(
            "/api/games/:appid",
            get(handlers::game_details).put(handlers::update_game),
        )
        // Steam pass-through
        .route("/api/steam/apps", get(handlers::all_apps))
        .route("/api/steam/apps/:appid/details", get(handlers::app_details))
        .route("/api/steam/apps/:appid/store", get(handlers::store_page))
        .route("/api/steam/apps/:appid/community", get(handlers::community_page))
        .route("/api/steam/apps/:appid/players", get(handlers::current_players))
        .route(
            "/api/steam/charts/concurrent-players",
            get(handlers::concurrent_players_chart),
        )
        .route("/api/steam/charts/top-sellers", get(handlers::top_sellers))
        .with_state(app_state)
}
