//! Stable per-browser visitor identifiers.
//!
//! A visitor id is a random UUID the browser keeps in a cookie. It is not a
//! credential: it only lets the view counter tell one browser from another.
//! When the browser refuses to keep the cookie every request gets a fresh id
//! and deduplication quietly degrades to none.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::cookie_value;
use crate::error::AppError;

pub const VISITOR_COOKIE: &str = "gazette_visitor";

/// Browsers cap cookie lifetimes at 400 days.
const VISITOR_COOKIE_MAX_AGE_SECS: u64 = 400 * 24 * 3600;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisitorId(String);

impl VisitorId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Accept only well-formed UUIDs; anything else is treated as absent.
    pub fn parse(raw: &str) -> Option<Self> {
        uuid::Uuid::parse_str(raw.trim())
            .ok()
            .map(|id| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("visitor storage unavailable: {0}")]
    Unavailable(String),
}

/// Wherever the visitor's id lives between requests.
pub trait VisitorStore {
    fn load(&self) -> Option<String>;
    fn save(&mut self, id: &VisitorId) -> Result<(), StoreError>;
}

/// Return the stored visitor id, generating and persisting one on first use.
pub fn resolve_visitor<S: VisitorStore + ?Sized>(store: &mut S) -> VisitorId {
    if let Some(existing) = store.load().as_deref().and_then(VisitorId::parse) {
        return existing;
    }

    let fresh = VisitorId::generate();
    if let Err(e) = store.save(&fresh) {
        tracing::warn!("Visitor id not persisted, views will not be deduplicated: {}", e);
    }
    fresh
}

/// Reads the visitor cookie from a request and remembers an id to hand back.
pub struct CookieStore<'a> {
    headers: &'a HeaderMap,
    issued: Option<VisitorId>,
}

impl<'a> CookieStore<'a> {
    pub fn new(headers: &'a HeaderMap) -> Self {
        Self {
            headers,
            issued: None,
        }
    }

    pub fn into_issued(self) -> Option<VisitorId> {
        self.issued
    }
}

impl VisitorStore for CookieStore<'_> {
    fn load(&self) -> Option<String> {
        cookie_value(self.headers, VISITOR_COOKIE).map(str::to_string)
    }

    fn save(&mut self, id: &VisitorId) -> Result<(), StoreError> {
        self.issued = Some(id.clone());
        Ok(())
    }
}

pub fn visitor_cookie(id: &VisitorId) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        VISITOR_COOKIE, id, VISITOR_COOKIE_MAX_AGE_SECS
    )
}

/// Middleware: attach a `VisitorId` to every request, issuing the cookie
/// on the response when the browser did not send one.
pub async fn track_visitor(mut req: Request, next: Next) -> Response {
    let (visitor, issued) = {
        let mut store = CookieStore::new(req.headers());
        let visitor = resolve_visitor(&mut store);
        (visitor, store.into_issued())
    };

    req.extensions_mut().insert(visitor);
    let mut response = next.run(req).await;

    if let Some(id) = issued {
        match HeaderValue::from_str(&visitor_cookie(&id)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!("Could not encode visitor cookie: {}", e),
        }
    }

    response
}

impl<S: Send + Sync> FromRequestParts<S> for VisitorId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VisitorId>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Visitor middleware is not installed".into()))
    }
}
