use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use astra::{Body, Request, Response};

use crate::config::AppConfig;
use crate::db::connection::{init_db, Database};
use crate::domain::session::SessionContext;
use crate::errors::ServerError;
use crate::responses::ResultResp;

static DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Fresh, schema-initialized database in the temp dir. Each call gets its own file.
pub fn init_test_db() -> Database {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let n = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir().join(format!("agent_desk_test_{nanos}_{n}.sqlite"));

    let db = Database::new(path.to_string_lossy().into_owned());
    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

pub fn session() -> SessionContext {
    SessionContext::new("brk_test", "agent_test", "user_test")
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.session.brokerage_id = "brk_test".into();
    cfg.session.agent_id = "agent_test".into();
    cfg.session.user_id = "user_test".into();
    cfg
}

pub fn get(uri: &str) -> Request {
    http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, json: serde_json::Value) -> Request {
    http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

pub fn post_text(uri: &str, content_type: &str, body: &str) -> Request {
    http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", content_type)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn body_bytes(resp: Response) -> Vec<u8> {
    let mut body = resp.into_body();
    let mut out = Vec::new();
    body.reader().read_to_end(&mut out).unwrap();
    out
}

pub fn body_string(resp: Response) -> String {
    String::from_utf8(body_bytes(resp)).unwrap()
}

pub fn body_json(resp: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(resp)).unwrap()
}

/// `unwrap_err` for handler results (responses are not `Debug`).
pub trait ExpectError {
    fn expect_error(self) -> ServerError;
}

impl ExpectError for ResultResp {
    fn expect_error(self) -> ServerError {
        match self {
            Ok(resp) => panic!("expected an error, got status {}", resp.status()),
            Err(e) => e,
        }
    }
}
