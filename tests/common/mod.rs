#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use rusqlite::params;
use tempfile::TempDir;
use tower::ServiceExt;

use gazette::auth::{session, SESSION_COOKIE};
use gazette::blog::posts::{self, PostDraft};
use gazette::blog::profiles::{self, ADMIN_ROLE};
use gazette::config::Config;
use gazette::db;
use gazette::routes;
use gazette::state::{AppState, DbPool};

pub const BOUNDARY: &str = "gazette-test-boundary";

pub struct TestApp {
    _dir: TempDir,
    pub pool: DbPool,
    pub config: Config,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `name=value` pair of a cookie set by the response.
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|c| c.starts_with(&format!("{}=", name)))
            .and_then(|c| c.split(';').next())
            .map(str::to_string)
    }
}

impl TestApp {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let pool = db::create_pool(&dir.path().join("test.db")).unwrap();
        db::run_migrations(&pool).unwrap();
        Self {
            _dir: dir,
            pool,
            config: Config::default(),
        }
    }

    pub fn router(&self) -> Router {
        let state = AppState::from_config(self.pool.clone(), self.config.clone()).unwrap();
        routes::app(state)
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Create a profile with a live session and return its cookie pair.
    pub fn sign_in(&self, user_id: &str, name: &str, admin: bool) -> String {
        let conn = self.pool.get().unwrap();
        profiles::upsert_profile(&conn, user_id, name).unwrap();
        if admin {
            profiles::grant_role(&conn, user_id, ADMIN_ROLE).unwrap();
        }
        let token = session::create_session(&conn, user_id, 1).unwrap();
        format!("{}={}", SESSION_COOKIE, token)
    }

    pub fn insert_post(&self, author_id: &str, title: &str) -> String {
        let conn = self.pool.get().unwrap();
        profiles::upsert_profile(&conn, author_id, "Author").unwrap();
        posts::insert_post(
            &conn,
            author_id,
            &PostDraft::new(title, "First paragraph.\n\nSecond paragraph.").unwrap(),
            None,
        )
        .unwrap()
    }

    pub fn count(&self, table: &str) -> i64 {
        let conn = self.pool.get().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }

    pub fn reaction_of(&self, post_id: &str, user_id: &str) -> Option<String> {
        let conn = self.pool.get().unwrap();
        conn.query_row(
            "SELECT reaction_type FROM post_reactions WHERE post_id = ?1 AND visitor_id = ?2",
            params![post_id, user_id],
            |r| r.get(0),
        )
        .ok()
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form(method: &str, uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// A file part for `multipart`.
pub struct FilePart<'a> {
    pub name: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub data: Vec<u8>,
}

pub fn multipart(
    uri: &str,
    fields: &[(&str, &str)],
    file: Option<FilePart<'_>>,
    cookie: Option<&str>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file.name, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(&file.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}
