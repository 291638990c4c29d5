//! In-memory transport for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::fetcher::{FetchError, HttpRequest, HttpResponse, HttpTransport, Method};

#[derive(Clone)]
enum Reply {
    Response(HttpResponse),
    Fail(String),
}

struct Route {
    method: Method,
    pattern: String,
    replies: VecDeque<Reply>,
}

/// Replays canned responses keyed by method and URL substring.
///
/// Each route pops its replies in order and keeps repeating the last one.
/// Routes are tried in registration order. Every request is recorded.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, method: Method, pattern: &str, reply: Reply) -> Self {
        {
            let mut routes = self.routes.lock().unwrap();
            match routes
                .iter_mut()
                .find(|r| r.method == method && r.pattern == pattern)
            {
                Some(route) => route.replies.push_back(reply),
                None => routes.push(Route {
                    method,
                    pattern: pattern.to_string(),
                    replies: VecDeque::from([reply]),
                }),
            }
        }
        self
    }

    pub fn on_get(self, pattern: &str, response: HttpResponse) -> Self {
        self.push(Method::Get, pattern, Reply::Response(response))
    }

    pub fn on_post(self, pattern: &str, response: HttpResponse) -> Self {
        self.push(Method::Post, pattern, Reply::Response(response))
    }

    pub fn fail_get(self, pattern: &str, message: &str) -> Self {
        self.push(Method::Get, pattern, Reply::Fail(message.to_string()))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(request.clone());

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            let route = routes
                .iter_mut()
                .find(|r| r.method == request.method && request.url.contains(&r.pattern));
            match route {
                Some(route) if route.replies.len() > 1 => route.replies.pop_front(),
                Some(route) => route.replies.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(FetchError::Transport(message)),
            None => Err(FetchError::Transport(format!(
                "no mock route for {:?} {}",
                request.method, request.url
            ))),
        }
    }
}
