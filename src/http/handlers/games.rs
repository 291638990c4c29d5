//! Game handlers: catalog views, reconciled details, local games table

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error};

use super::{appid_param, bad_request, error_response, query_params, AppState};
use crate::http::types::*;
use crate::steam::{CatalogView, Category};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| bad_request(rejection.body_text()))
}

async fn catalog_view(
    state: &AppState,
    view: CatalogView,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Response {
    let params = match query_params(query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let limit = match resolve_limit(params.limit) {
        Ok(limit) => limit,
        Err(message) => return bad_request(message),
    };

    debug!(view = view.name(), limit, "HTTP catalog request");
    let games = state.client.catalog(&view, limit).await;
    let message = format!("Fetched {} {} games", games.len(), view.name());
    (StatusCode::OK, Json(ApiResponse::list(games).with_message(message))).into_response()
}

pub async fn popular_games(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Response {
    catalog_view(&state, CatalogView::Popular, query).await
}

pub async fn discounted_games(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Response {
    catalog_view(&state, CatalogView::Discounted, query).await
}

pub async fn upcoming_games(
    State(state): State<AppState>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Response {
    catalog_view(&state, CatalogView::Upcoming, query).await
}

pub async fn search_games(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Response {
    let params = match query_params(query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let term = params.q.as_deref().map(str::trim).unwrap_or_default();
    if term.is_empty() {
        return bad_request("query parameter 'q' is required");
    }
    if term.chars().count() > MAX_QUERY_LENGTH {
        return bad_request(format!(
            "query parameter 'q' must be at most {} characters",
            MAX_QUERY_LENGTH
        ));
    }
    let view = CatalogView::Search(term.to_string());
    catalog_view(&state, view, Ok(Query(LimitQuery { limit: params.limit }))).await
}

pub async fn games_by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> Response {
    let category = match category.parse::<Category>() {
        Ok(category) => category,
        Err(message) => {
            let known: Vec<_> = Category::ALL.iter().map(Category::as_str).collect();
            return bad_request(format!("{}; expected one of {}", message, known.join(", ")));
        }
    };
    let view = CatalogView::Category(category.as_str().to_string());
    catalog_view(&state, view, query).await
}

/// Reconciled details for one app
pub async fn game_details(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Response {
    let appid = match appid_param(path) {
        Ok(appid) => appid,
        Err(response) => return response,
    };

    match state.client.get_game_details(appid).await {
        Some(game) => (
            StatusCode::OK,
            Json(ApiResponse::ok(game).with_message(format!("Fetched details for {}", appid))),
        )
            .into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            ErrorResponse::not_found(format!("No game with appid {}", appid)),
        ),
    }
}

/// Lookup in the local table by appid, else by name
pub async fn query_games(
    State(state): State<AppState>,
    query: Result<Query<GameQuery>, QueryRejection>,
) -> Response {
    let params = match query_params(query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let limit = match resolve_limit(params.limit) {
        Ok(limit) => limit,
        Err(message) => return bad_request(message),
    };
    let name = params.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let rows = match (params.appid, name) {
        (Some(raw), _) => {
            let appid = match resolve_appid(raw) {
                Ok(appid) => appid,
                Err(message) => return bad_request(message),
            };
            match state.store.get(appid) {
                Ok(row) => row.into_iter().collect(),
                Err(e) => {
                    error!("Local query for {} failed: {}", appid, e);
                    return error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::internal_error(e.to_string()),
                    );
                }
            }
        }
        (None, Some(name)) => state.store.find_by_name(name, limit),
        (None, None) => return bad_request("at least one of 'appid' or 'name' is required"),
    };

    let message = format!("Found {} games", rows.len());
    (StatusCode::OK, Json(ApiResponse::list(rows).with_message(message))).into_response()
}

pub async fn list_local_games(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Response {
    let params = match query_params(query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let (limit, offset) = match (resolve_limit(params.limit), resolve_offset(params.offset)) {
        (Ok(limit), Ok(offset)) => (limit, offset),
        (Err(message), _) | (_, Err(message)) => return bad_request(message),
    };

    let rows = state.store.list(limit, offset);
    let message = format!("Local games, offset {}, limit {}", offset, limit);
    (StatusCode::OK, Json(ApiResponse::list(rows).with_message(message))).into_response()
}

pub async fn create_game(
    State(state): State<AppState>,
    payload: Result<Json<GameInput>, JsonRejection>,
) -> Response {
    let input = match body(payload) {
        Ok(input) => input,
        Err(response) => return response,
    };
    let (appid, name) = match (resolve_appid(input.appid), resolve_name(&input.name)) {
        (Ok(appid), Ok(name)) => (appid, name),
        (Err(message), _) | (_, Err(message)) => return bad_request(message),
    };

    match state.store.upsert(appid, name) {
        Ok(row) => {
            let message = format!("Saved game {}", row.name);
            (StatusCode::CREATED, Json(ApiResponse::ok(row).with_message(message))).into_response()
        }
        Err(e) => {
            error!("Saving game {} failed: {}", appid, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::internal_error(e.to_string()),
            )
        }
    }
}

pub async fn batch_create_games(
    State(state): State<AppState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Response {
    let request = match body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    if request.games.is_empty() {
        return bad_request("games must not be empty");
    }
    if request.games.len() > MAX_BATCH {
        return bad_request(format!("a batch may hold at most {} games", MAX_BATCH));
    }

    let mut validated = Vec::with_capacity(request.games.len());
    for game in &request.games {
        match (resolve_appid(game.appid), resolve_name(&game.name)) {
            (Ok(appid), Ok(name)) => validated.push((game.appid, appid, name)),
            (Err(message), _) | (_, Err(message)) => return bad_request(message),
        }
    }

    let mut results = Vec::new();
    let mut errors = Vec::new();
    for (raw, appid, name) in validated {
        match state.store.upsert(appid, name) {
            Ok(row) => results.push(row),
            Err(e) => errors.push(BatchItemError {
                appid: raw,
                error: e.to_string(),
            }),
        }
    }

    if results.is_empty() {
        error!(failed = errors.len(), "Batch insert failed for every game");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": "Batch insert failed",
                "message": "every game in the batch failed",
                "results": [],
                "errors": errors,
            })),
        )
            .into_response();
    }

    let (status, message) = if errors.is_empty() {
        (StatusCode::CREATED, format!("Saved {} games", results.len()))
    } else {
        (
            StatusCode::MULTI_STATUS,
            format!("Saved {} games, {} failed", results.len(), errors.len()),
        )
    };
    let count = results.len();
    let response = BatchResponse {
        success: errors.is_empty(),
        message,
        results,
        errors,
        count,
    };
    (status, Json(response)).into_response()
}

pub async fn update_game(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateGameRequest>, JsonRejection>,
) -> Response {
    let appid = match appid_param(path) {
        Ok(appid) => appid,
        Err(response) => return response,
    };
    let request = match body(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let name = match resolve_name(&request.name) {
        Ok(name) => name,
        Err(message) => return bad_request(message),
    };

    match state.store.update_name(appid, name) {
        Ok(Some(row)) => (
            StatusCode::OK,
            Json(ApiResponse::ok(row).with_message(format!("Updated game {}", appid))),
        )
            .into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            ErrorResponse::not_found(format!("No game with appid {}", appid)),
        ),
        Err(e) => {
            error!("Updating game {} failed: {}", appid, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::internal_error(e.to_string()),
            )
        }
    }
}
