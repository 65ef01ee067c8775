use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use restroom_finder::{app::build_app, memory::MemoryStore, state::AppState};
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::MemoryStore as SessionMemoryStore;

/// Fresh app over in-memory stores; the store handle lets tests inspect rows.
pub fn test_app() -> (Router, Arc<MemoryStore>) {
    test_app_with_sessions(SessionMemoryStore::default())
}

pub fn test_app_with_sessions(sessions: SessionMemoryStore) -> (Router, Arc<MemoryStore>) {
    let fake = AppState::fake();
    let store = Arc::new(MemoryStore::new());
    let state = AppState::from_parts(store.clone(), store.clone(), fake.geocoder, fake.config);
    (build_app(state, sessions), store)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    pub fn flash_messages(&self) -> Vec<String> {
        self.body["flashes"]
            .as_array()
            .map(|flashes| {
                flashes
                    .iter()
                    .filter_map(|f| f["message"].as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A browser stand-in: keeps the session cookie between requests.
pub struct Client {
    app: Router,
    cookie: Option<String>,
}

impl Client {
    pub fn new(app: &Router) -> Self {
        Self {
            app: app.clone(),
            cookie: None,
        }
    }

    async fn send(&mut self, method: Method, uri: &str, content_type: Option<&str>, body: Body) -> TestResponse {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            req = req.header(header::CONTENT_TYPE, ct);
        }
        if let Some(cookie) = &self.cookie {
            req = req.header(header::COOKIE, cookie);
        }
        let res = self
            .app
            .clone()
            .oneshot(req.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = res.headers().get(header::SET_COOKIE) {
            let raw = set_cookie.to_str().unwrap();
            if raw.contains("Max-Age=0") {
                self.cookie = None;
            } else {
                self.cookie = raw.split(';').next().map(str::to_owned);
            }
        }

        let status = res.status();
        let headers = res.headers().clone();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Value of the `id` session cookie, if the server has issued one.
    pub fn session_id(&self) -> Option<&str> {
        self.cookie.as_deref().and_then(|c| c.strip_prefix("id="))
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, Body::empty()).await
    }

    pub async fn post_form(&mut self, uri: &str, form: &str) -> TestResponse {
        self.send(
            Method::POST,
            uri,
            Some("application/x-www-form-urlencoded"),
            Body::from(form.to_owned()),
        )
        .await
    }

    pub async fn post_json(&mut self, uri: &str, json: Value) -> TestResponse {
        self.send(
            Method::POST,
            uri,
            Some("application/json"),
            Body::from(json.to_string()),
        )
        .await
    }

    /// Signs up and returns the new user's id as shown on the search page.
    pub async fn sign_up(&mut self, username: &str, email: &str, password: &str) -> String {
        let form = format!(
            "username={username}&email={}&password={password}",
            email.replace('@', "%40")
        );
        let res = self.post_form("/signup", &form).await;
        assert_eq!(res.status, StatusCode::SEE_OTHER, "signup failed: {:?}", res.body);
        let page = self.get("/search").await;
        page.body["current_user"]["id"]
            .as_str()
            .expect("signed-in user on search page")
            .to_owned()
    }
}
