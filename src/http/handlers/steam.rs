//! Pass-through Steam handlers: app list, raw payloads, community, charts

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use super::{appid_param, error_response, query_params, AppState};
use crate::http::types::*;
use crate::steam::api::language_currency;

fn upstream_failure(context: &str, e: impl std::fmt::Display) -> Response {
    error!("{}: {}", context, e);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse::upstream(format!("{}: {}", context, e)),
    )
}

/// Every app known to Steam
pub async fn all_apps(State(state): State<AppState>) -> Response {
    match state.client.get_all_games().await {
        Ok(apps) => {
            let message = format!("Fetched {} apps", apps.len());
            (StatusCode::OK, Json(ApiResponse::list(apps).with_message(message))).into_response()
        }
        Err(e) => upstream_failure("App list request failed", e),
    }
}

/// Unmodified `appdetails` payload
pub async fn app_details(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<LangQuery>, QueryRejection>,
) -> Response {
    let appid = match appid_param(path) {
        Ok(appid) => appid,
        Err(response) => return response,
    };
    let params = match query_params(query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let language = params
        .lang
        .unwrap_or_else(|| state.client.config().language.clone());

    match state.client.get_api_game_details(appid, &language).await {
        Some(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            ErrorResponse::not_found(format!("No appdetails for {}", appid)),
        ),
    }
}

/// Raw store page HTML as a JSON string
pub async fn store_page(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Response {
    let appid = match appid_param(path) {
        Ok(appid) => appid,
        Err(response) => return response,
    };
    match state.client.get_store_page_html(appid).await {
        Ok(html) => (StatusCode::OK, Json(ApiResponse::ok(html))).into_response(),
        Err(e) => upstream_failure(&format!("Store page for {} failed", appid), e),
    }
}

/// Community hub HTML, through the age gate
pub async fn community_page(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<SectionQuery>, QueryRejection>,
) -> Response {
    let appid = match appid_param(path) {
        Ok(appid) => appid,
        Err(response) => return response,
    };
    let params = match query_params(query) {
        Ok(params) => params,
        Err(response) => return response,
    };

    match state
        .client
        .get_game_community_html(appid, params.section.as_deref())
        .await
    {
        Ok(html) => (StatusCode::OK, Json(ApiResponse::ok(html))).into_response(),
        Err(e) => upstream_failure(&format!("Community page for {} failed", appid), e),
    }
}

pub async fn current_players(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Response {
    let appid = match appid_param(path) {
        Ok(appid) => appid,
        Err(response) => return response,
    };
    match state.client.get_number_of_current_players(appid).await {
        Ok(players) => (StatusCode::OK, Json(ApiResponse::ok(players))).into_response(),
        Err(e) => upstream_failure("Current players request failed", e),
    }
}

pub async fn concurrent_players_chart(State(state): State<AppState>) -> Response {
    match state.client.get_games_by_concurrent_players().await {
        Ok(chart) => {
            let count = chart.ranks.len();
            (StatusCode::OK, Json(ApiResponse::ok(chart).with_count(count))).into_response()
        }
        Err(e) => upstream_failure("Charts request failed", e),
    }
}

pub async fn top_sellers(
    State(state): State<AppState>,
    query: Result<Query<CountryQuery>, QueryRejection>,
) -> Response {
    let params = match query_params(query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let country = params
        .country
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| language_currency(&state.client.config().language).1.to_string());

    match state.client.get_store_top_sellers(&country).await {
        Ok(sellers) => {
            let count = sellers.ranks.len();
            (StatusCode::OK, Json(ApiResponse::ok(sellers).with_count(count))).into_response()
        }
        Err(e) => upstream_failure("Top sellers request failed", e),
    }
}
