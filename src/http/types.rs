//! HTTP API Request/Response Types
//!
//! Every body is wrapped in a `{success, ...}` envelope.

use serde::{Deserialize, Serialize};

use crate::store::GameRow;
use crate::types::AppId;

/// Default page size
pub const DEFAULT_LIMIT: i64 = 20;
/// Largest accepted `limit`
pub const MAX_LIMIT: i64 = 100;
/// Largest accepted batch insert
pub const MAX_BATCH: usize = 100;
/// Largest accepted search term
pub const MAX_QUERY_LENGTH: usize = 100;

/// Successful response envelope
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            count: None,
            message: None,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// List envelope with `count` filled in
    pub fn list(data: Vec<T>) -> Self {
        let count = data.len();
        Self::ok(data).with_count(count)
    }
}

/// Error response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    /// Short error category
    pub error: String,
    /// Human-readable detail
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("Invalid request", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("Not found", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("Internal error", message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new("Upstream request failed", message)
    }
}

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    /// Seconds since the server started
    pub uptime: f64,
}

/// `?limit=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

/// `?q=&limit=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

/// `?limit=&offset=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `?appid=&name=&limit=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameQuery {
    pub appid: Option<i64>,
    pub name: Option<String>,
    pub limit: Option<i64>,
}

/// `?lang=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

/// `?section=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionQuery {
    pub section: Option<String>,
}

/// `?country=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountryQuery {
    pub country: Option<String>,
}

/// Body of `POST /api/games` and batch items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInput {
    pub appid: i64,
    pub name: String,
}

/// Body of `POST /api/games/batch`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub games: Vec<GameInput>,
}

/// Body of `PUT /api/games/:appid`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateGameRequest {
    pub name: String,
}

/// One failed batch item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItemError {
    pub appid: i64,
    pub error: String,
}

/// `POST /api/games/batch` response
#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<GameRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BatchItemError>,
    pub count: usize,
}

/// Validated `limit`
pub fn resolve_limit(limit: Option<i64>) -> Result<usize, String> {
    match limit {
        None => Ok(DEFAULT_LIMIT as usize),
        Some(n) if (1..=MAX_LIMIT).contains(&n) => Ok(n as usize),
        Some(n) => Err(format!("limit must be between 1 and {}, got {}", MAX_LIMIT, n)),
    }
}

/// Validated `offset`
pub fn resolve_offset(offset: Option<i64>) -> Result<usize, String> {
    match offset {
        None => Ok(0),
        Some(n) if n >= 0 => Ok(n as usize),
        Some(n) => Err(format!("offset must not be negative, got {}", n)),
    }
}

/// Validated positive appid
pub fn resolve_appid(appid: i64) -> Result<AppId, String> {
    match AppId::try_from(appid) {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(format!("appid must be a positive integer, got {}", appid)),
    }
}

/// Validated game name
pub fn resolve_name(name: &str) -> Result<&str, String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err("name must not be empty".to_string())
    } else {
        Ok(trimmed)
    }
}
