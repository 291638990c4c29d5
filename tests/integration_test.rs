//! Integration tests for steam-fetch
//!
//! These drive the HTTP router end to end against a scripted transport and a
//! temporary games store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use steam_fetch::{
    config::SteamConfig,
    http::{create_router, AppState},
    steam::{
        Capability, FetchError, HttpRequest, HttpResponse, HttpTransport, Method,
        SeededSessionIds, SteamClient,
    },
    store::GameStore,
};
use tower::ServiceExt;

/// Answers by first matching URL substring; records every request
struct ScriptedTransport {
    routes: Vec<(Method, &'static str, u16, String)>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn new() -> Self {
        Self {
            routes: Vec::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn get(mut self, pattern: &'static str, status: u16, body: impl Into<String>) -> Self {
        self.routes.push((Method::Get, pattern, status, body.into()));
        self
    }

    fn post(mut self, pattern: &'static str, status: u16, body: impl Into<String>) -> Self {
        self.routes.push((Method::Post, pattern, status, body.into()));
        self
    }

    fn urls(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|r| r.url.clone()).collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        self.seen.lock().unwrap().push(request.clone());
        self.routes
            .iter()
            .find(|(method, pattern, _, _)| *method == request.method && request.url.contains(pattern))
            .map(|(_, _, status, body)| HttpResponse::new(*status, body.clone()))
            .ok_or_else(|| FetchError::Transport(format!("unscripted request {}", request.url)))
    }
}

fn store_page(name: &str, discount: Option<u32>) -> String {
    let discount = discount
        .map(|d| format!(r#"<div class="discount_pct">-{}%</div>"#, d))
        .unwrap_or_default();
    format!(
        r#"<html><body><div class="apphub_AppName">{}</div>
        <div class="release_date"><div class="date">2015年5月18日</div></div>{}</body></html>"#,
        name, discount
    )
}

fn search_page(ids: &[u32]) -> String {
    ids.iter()
        .map(|id| {
            format!(
                r#"<a href="https://store.steampowered.com/app/{}/x/" class="search_result_row">{}</a>"#,
                id, id
            )
        })
        .collect()
}

fn app(transport: Arc<ScriptedTransport>) -> (Router, GameStore) {
    let client = SteamClient::with_transport(
        &SteamConfig::default(),
        Capability::StreamingDom,
        transport,
    )
    .with_session_ids(Arc::new(SeededSessionIds::new(1)));
    let store = GameStore::temporary().unwrap();
    let router = create_router(AppState::new(Arc::new(client), store.clone()));
    (router, store)
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let (router, _) = app(Arc::new(ScriptedTransport::new()));
    let (status, body) = call(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime"].is_number());
}

#[tokio::test]
async fn test_game_details_merges_sources() {
    let api = json!({"292030": {"success": true, "data": {
        "name": "The Witcher 3: Wild Hunt",
        "developers": ["CD PROJEKT RED"],
        "release_date": {"coming_soon": false, "date": "2015-01-01"}
    }}});
    let transport = Arc::new(
        ScriptedTransport::new()
            .get("appdetails?appids=292030", 200, api.to_string())
            .get("/app/292030/", 200, store_page("The Witcher 3: Wild Hunt", None)),
    );
    let (router, _) = app(transport);

    let (status, body) = call(&router, "GET", "/api/games/292030", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["appid"], 292030);
    assert_eq!(body["data"]["name"], "The Witcher 3: Wild Hunt");
    assert_eq!(body["data"]["releaseDate"], "2015年5月18日");
    assert_eq!(body["data"]["developer"], "CD PROJEKT RED");
    assert_eq!(body["data"]["dataSource"], "steam_store_page");
}

#[tokio::test]
async fn test_unknown_game_is_404() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .get("appdetails", 200, r#"{"999":{"success":false}}"#)
            .get("/app/999/", 200, "<html><title>Welcome to Steam</title></html>"),
    );
    let (router, _) = app(transport);
    let (status, body) = call(&router, "GET", "/api/games/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("999"));

    let (status, _) = call(&router, "GET", "/api/games/-4", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_discounted_view_orders_by_discount() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .get("/search/", 200, search_page(&[1, 2, 3]))
            .get("appdetails", 500, "")
            .get("/app/1/", 200, store_page("One", Some(10)))
            .get("/app/2/", 200, store_page("Two", Some(50)))
            .get("/app/3/", 200, store_page("Three", Some(25))),
    );
    let (router, _) = app(transport.clone());

    let (status, body) = call(&router, "GET", "/api/games/discounted?limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    let discounts: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["discountPercentage"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(discounts, vec!["50", "25", "10"]);
    assert!(transport.urls()[0].contains("specials=1"));
}

#[tokio::test]
async fn test_query_parameter_validation() {
    let (router, _) = app(Arc::new(ScriptedTransport::new()));

    for uri in [
        "/api/games/popular?limit=0",
        "/api/games/popular?limit=101",
        "/api/games/popular?limit=abc",
        "/api/games/search",
        "/api/games/search?q=%20",
        "/api/games/category/puzzle",
        "/api/games/query",
        "/api/games/local?offset=-1",
    ] {
        let (status, body) = call(&router, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["success"], false, "{}", uri);
    }
}

#[tokio::test]
async fn test_catalog_survives_search_failure() {
    let transport = Arc::new(ScriptedTransport::new().get("/search/", 503, ""));
    let (router, _) = app(transport);
    let (status, body) = call(&router, "GET", "/api/games/category/rpg", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_local_games_crud() {
    let (router, store) = app(Arc::new(ScriptedTransport::new()));

    let (status, body) = call(
        &router,
        "POST",
        "/api/games",
        Some(json!({"appid": 730, "name": "Counter-Strike 2"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["appid"], 730);
    assert!(body["data"]["lastFetchedAt"].is_string());

    let (status, body) = call(
        &router,
        "PUT",
        "/api/games/730",
        Some(json!({"name": "CS2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "CS2");

    let (status, _) = call(&router, "PUT", "/api/games/731", Some(json!({"name": "x"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&router, "GET", "/api/games/query?name=cs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, body) = call(&router, "GET", "/api/games/query?appid=730", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "CS2");

    let (status, _) = call(
        &router,
        "POST",
        "/api/games",
        Some(json!({"appid": 0, "name": "Nothing"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_batch_insert() {
    let (router, store) = app(Arc::new(ScriptedTransport::new()));

    let (status, body) = call(
        &router,
        "POST",
        "/api/games/batch",
        Some(json!({"games": [
            {"appid": 10, "name": "Counter-Strike"},
            {"appid": 20, "name": "Team Fortress Classic"}
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(store.len(), 2);

    let (status, _) = call(&router, "POST", "/api/games/batch", Some(json!({"games": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let too_many: Vec<_> = (1..=101).map(|i| json!({"appid": i, "name": "g"})).collect();
    let (status, _) = call(
        &router,
        "POST",
        "/api/games/batch",
        Some(json!({ "games": too_many })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&router, "GET", "/api/games/local?limit=1&offset=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_community_page_through_age_gate() {
    let gated = r#"<div class="contentcheck_header">Content warning</div>"#;
    let transport = Arc::new(
        ScriptedTransport::new()
            .get("age-gate", 200, gated)
            .get("/app/3117820", 200, gated)
            .post("/agecheckset/app/3117820/", 200, r#"{"success":1}"#),
    );
    let (router, _) = app(transport.clone());

    let (status, body) = call(&router, "GET", "/api/steam/apps/3117820/community", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_str().unwrap().contains("contentcheck_header"));

    let urls = transport.urls();
    assert_eq!(urls.len(), 4);
    assert!(urls[2].ends_with("/agecheckset/app/3117820/"));
}

#[tokio::test]
async fn test_steam_passthrough_errors() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .get("GetAppList", 502, "")
            .get("GetGamesByConcurrentPlayers", 500, "")
            .get("GetNumberOfCurrentPlayers", 200, r#"{"response":{"player_count":42,"result":1}}"#),
    );
    let (router, _) = app(transport);

    let (status, body) = call(&router, "GET", "/api/steam/apps", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("cannot fetch Steam game list"));

    let (status, body) = call(&router, "GET", "/api/steam/charts/concurrent-players", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Steam Charts API request failed"));

    let (status, body) = call(&router, "GET", "/api/steam/apps/730/players", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["player_count"], 42);
}
