//! HTTP API Request Handlers

mod games;
mod steam;
mod system;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::types::{resolve_appid, ErrorResponse};
use crate::steam::SteamClient;
use crate::store::GameStore;
use crate::types::AppId;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<SteamClient>,
    pub store: GameStore,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(client: Arc<SteamClient>, store: GameStore) -> Self {
        Self {
            client,
            store,
            started_at: Instant::now(),
        }
    }
}

pub use games::{
    batch_create_games, create_game, discounted_games, game_details, games_by_category,
    list_local_games, popular_games, query_games, search_games, upcoming_games, update_game,
};
pub use steam::{
    all_apps, app_details, community_page, concurrent_players_chart, current_players,
    store_page, top_sellers,
};
pub use system::health;

fn error_response(status: StatusCode, body: ErrorResponse) -> Response {
    (status, Json(body)).into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, ErrorResponse::bad_request(message))
}

/// Query string, or a 400 envelope
fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, Response> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| bad_request(rejection.body_text()))
}

/// Positive appid path segment, or a 400 envelope
fn appid_param(path: Result<Path<i64>, PathRejection>) -> Result<AppId, Response> {
    let Path(raw) = path.map_err(|rejection| bad_request(rejection.body_text()))?;
    resolve_appid(raw).map_err(bad_request)
}
