//! Composition of the fetch client and the render cache: the
//! hit / miss / revalidate / stale-on-error state machine.

use tracing::debug;

use super::{Client, FetchError, FetchResult};
use crate::cache::{Cache, Entry, Status};

/// Fetch client with a rendered-page cache in front of it.
pub struct CachedClient {
    client: Client,
    cache: Cache,
}

/// A fetch result annotated with how the cache participated.
#[derive(Debug)]
pub struct CachedResult {
    pub result: FetchResult,
    pub cache_status: Status,
}

impl CachedClient {
    pub fn new(client: Client, cache: Cache) -> Self {
        Self { client, cache }
    }

    /// Fetches `url`, consulting the cache first. Returns the fetch result
    /// and, when a cached copy should be served, the cache entry.
    ///
    /// - miss: unconditional fetch, no entry.
    /// - hit: cached entry, no upstream round trip.
    /// - expired: conditional GET with the entry's validators. A 304
    ///   refreshes the TTL and serves the entry (`revalidated`); fresh
    ///   content comes back with status `expired` for the caller to render
    ///   and store; an upstream failure serves the entry anyway (`stale`).
    pub async fn fetch(&self, url: &str) -> Result<(CachedResult, Option<Entry>), FetchError> {
        let (entry, status) = self.cache.get(url);

        match status {
            Status::Hit => Ok((
                CachedResult {
                    result: served_from_cache(),
                    cache_status: Status::Hit,
                },
                entry,
            )),

            Status::Expired => {
                let entry = entry.expect("expired status always carries an entry");
                let result = self
                    .client
                    .fetch(url, entry.etag.as_deref(), entry.last_modified.as_deref())
                    .await;

                match result {
                    Err(err) => {
                        debug!(error = %err, "revalidation failed, serving stale");
                        Ok((
                            CachedResult {
                                result: served_from_cache(),
                                cache_status: Status::Stale,
                            },
                            Some(entry),
                        ))
                    }
                    Ok(result) if result.status == 304 => {
                        self.cache.refresh_ttl(url);
                        Ok((
                            CachedResult {
                                result,
                                cache_status: Status::Revalidated,
                            },
                            Some(entry),
                        ))
                    }
                    Ok(result) => Ok((
                        CachedResult {
                            result,
                            cache_status: Status::Expired,
                        },
                        None,
                    )),
                }
            }

            _ => {
                let result = self.client.fetch(url, None, None).await?;
                Ok((
                    CachedResult {
                        result,
                        cache_status: Status::Miss,
                    },
                    None,
                ))
            }
        }
    }

    /// Stores a rendered page under the upstream URL key. Called by the
    /// server after rendering a 2xx response.
    pub fn store(&self, key: &str, entry: Entry) {
        self.cache.put(key, entry);
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }
}

fn served_from_cache() -> FetchResult {
    FetchResult {
        status: 200,
        ..FetchResult::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ClientOptions;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn open_client() -> Client {
        Client::new(ClientOptions {
            ssrf_protection: false,
            ..ClientOptions::default()
        })
        .unwrap()
    }

    fn rendered_entry(body: &str, etag: &str) -> Entry {
        Entry {
            html: Bytes::copy_from_slice(body.as_bytes()),
            etag: Some(etag.to_string()),
            last_modified: None,
            size: body.len() as u64,
            content_type: "markdown".to_string(),
            expires_at: Instant::now(),
        }
    }

    fn manual_clock() -> (Arc<AtomicU64>, Box<dyn Fn() -> Instant + Send + Sync>) {
        let offset = Arc::new(AtomicU64::new(0));
        let handle = offset.clone();
        let origin = Instant::now();
        (
            offset,
            Box::new(move || origin + Duration::from_secs(handle.load(Ordering::SeqCst))),
        )
    }

    #[tokio::test]
    async fn miss_fetches_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# fresh"))
            .expect(1)
            .mount(&server)
            .await;

        let cached = CachedClient::new(open_client(), Cache::new(Duration::from_secs(60), 1 << 20));
        let url = format!("{}/doc.md", server.uri());

        let (result, entry) = cached.fetch(&url).await.unwrap();
        assert_eq!(result.cache_status, Status::Miss);
        assert_eq!(result.result.status, 200);
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn hit_skips_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# fresh"))
            .expect(0)
            .mount(&server)
            .await;

        let cached = CachedClient::new(open_client(), Cache::new(Duration::from_secs(60), 1 << 20));
        let url = format!("{}/doc.md", server.uri());
        cached.store(&url, rendered_entry("<h1>page</h1>", "\"v1\""));

        let (result, entry) = cached.fetch(&url).await.unwrap();
        assert_eq!(result.cache_status, Status::Hit);
        assert_eq!(entry.unwrap().html, Bytes::from_static(b"<h1>page</h1>"));
    }

    #[tokio::test]
    async fn expired_entry_revalidates_with_304() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.md"))
            .and(header("if-none-match", "\"v1\""))
            .respond_with(ResponseTemplate::new(304).insert_header("etag", "\"v1\""))
            .expect(1)
            .mount(&server)
            .await;

        let (offset, clock) = manual_clock();
        let cache = Cache::with_clock(Duration::from_secs(10), 1 << 20, clock);
        let cached = CachedClient::new(open_client(), cache);
        let url = format!("{}/doc.md", server.uri());
        cached.store(&url, rendered_entry("<h1>old</h1>", "\"v1\""));

        offset.store(11, Ordering::SeqCst);
        let (result, entry) = cached.fetch(&url).await.unwrap();
        assert_eq!(result.cache_status, Status::Revalidated);
        assert_eq!(entry.unwrap().html, Bytes::from_static(b"<h1>old</h1>"));

        // TTL was refreshed, so the next lookup is a plain hit.
        let (result, _) = cached.fetch(&url).await.unwrap();
        assert_eq!(result.cache_status, Status::Hit);
    }

    #[tokio::test]
    async fn expired_entry_with_changed_upstream_returns_fresh_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.md"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("etag", "\"v2\"")
                    .set_body_string("# updated"),
            )
            .mount(&server)
            .await;

        let (offset, clock) = manual_clock();
        let cache = Cache::with_clock(Duration::from_secs(10), 1 << 20, clock);
        let cached = CachedClient::new(open_client(), cache);
        let url = format!("{}/doc.md", server.uri());
        cached.store(&url, rendered_entry("<h1>old</h1>", "\"v1\""));

        offset.store(11, Ordering::SeqCst);
        let (result, entry) = cached.fetch(&url).await.unwrap();
        assert_eq!(result.cache_status, Status::Expired);
        assert!(entry.is_none(), "fresh content is rendered by the caller");
        assert_eq!(result.result.body, Bytes::from_static(b"# updated"));
        assert_eq!(result.result.etag.as_deref(), Some("\"v2\""));
    }

    #[tokio::test]
    async fn unreachable_upstream_serves_stale() {
        // Point at a server that is immediately shut down.
        let server = MockServer::start().await;
        let url = format!("{}/doc.md", server.uri());
        drop(server);

        let (offset, clock) = manual_clock();
        let cache = Cache::with_clock(Duration::from_secs(10), 1 << 20, clock);
        let cached = CachedClient::new(open_client(), cache);
        cached.store(&url, rendered_entry("<h1>stale but served</h1>", "\"v1\""));

        offset.store(11, Ordering::SeqCst);
        let (result, entry) = cached.fetch(&url).await.unwrap();
        assert_eq!(result.cache_status, Status::Stale);
        assert_eq!(result.result.status, 200);
        assert_eq!(
            entry.unwrap().html,
            Bytes::from_static(b"<h1>stale but served</h1>")
        );
    }
}
