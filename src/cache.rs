use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Validity window for a cached listing response. Readers may see a list up
/// to this much out of date.
pub const PAGE_CACHE_TTL: Duration = Duration::from_secs(20);

// Listing bodies are small; anything larger is not worth holding in memory.
const MAX_CACHED_BODY: usize = 1024 * 1024;

struct CachedEntry {
    expires_at: Instant,
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

/// Process-wide time-boxed response cache, keyed by request path and query
/// so that each page of a listing is cached independently.
#[derive(Clone, Default)]
pub struct ResponseCache {
    entries: Arc<RwLock<HashMap<String, CachedEntry>>>,
}

impl ResponseCache {
    pub async fn lookup(&self, key: &str) -> Option<(StatusCode, HeaderMap, Bytes)> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some((entry.status, entry.headers.clone(), entry.body.clone()))
    }

    pub async fn store(&self, key: String, status: StatusCode, headers: HeaderMap, body: Bytes) {
        let mut entries = self.entries.write().await;
        // Expired entries are swept on write so the map stays bounded.
        let now = Instant::now();
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            key,
            CachedEntry {
                expires_at: now + PAGE_CACHE_TTL,
                status,
                headers,
                body,
            },
        );
    }
}

/// Middleware serving successful GET responses from the cache for
/// [`PAGE_CACHE_TTL`]. Mutations and error responses pass through untouched.
pub async fn cache_page(
    State(cache): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = request.uri().to_string();

    if let Some((status, headers, body)) = cache.lookup(&key).await {
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        return response;
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_CACHED_BODY).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    cache
        .store(key, parts.status, parts.headers.clone(), bytes.clone())
        .await;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = parts.status;
    *response.headers_mut() = parts.headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_parts() -> (StatusCode, HeaderMap, Bytes) {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        (StatusCode::OK, headers, Bytes::from_static(b"{\"posts\":[]}"))
    }

    #[tokio::test(start_paused = true)]
    async fn stored_response_is_served_within_ttl() {
        let cache = ResponseCache::default();
        let (status, headers, body) = entry_parts();
        cache
            .store("/api/posts".to_string(), status, headers, body.clone())
            .await;

        tokio::time::advance(Duration::from_secs(19)).await;

        let (hit_status, _, hit_body) = cache.lookup("/api/posts").await.unwrap();
        assert_eq!(hit_status, StatusCode::OK);
        assert_eq!(hit_body, body);
    }

    #[tokio::test(start_paused = true)]
    async fn stored_response_expires_after_ttl() {
        let cache = ResponseCache::default();
        let (status, headers, body) = entry_parts();
        cache
            .store("/api/posts".to_string(), status, headers, body)
            .await;

        tokio::time::advance(PAGE_CACHE_TTL).await;

        assert!(cache.lookup("/api/posts").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn pages_are_cached_under_distinct_keys() {
        let cache = ResponseCache::default();
        let (status, headers, body) = entry_parts();
        cache
            .store("/api/posts?page=1".to_string(), status, headers, body)
            .await;

        assert!(cache.lookup("/api/posts?page=2").await.is_none());
        assert!(cache.lookup("/api/posts?page=1").await.is_some());
    }
}
