// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Token verification against a remote JSON Web Key Set.

use crate::{AuthzError, AuthzResult, ParsedToken, TokenVerifier};
use async_trait::async_trait;
use bytes::Buf;
use derivative::Derivative;
use futures::lock::Mutex;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{DecodingKey, Validation};
use log::debug;
use lru_time_cache::LruCache;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tenancy_core::env::{get_optional_var, get_required_var};
use url::Url;

/// Default TTL of the cached signing keys.
const DEFAULT_CACHE_TTL_SECONDS: u64 = 60 * 60;

/// Default maximum number of signing keys to keep in the cache.
const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Default minimum time between two downloads of the key set.
const DEFAULT_MIN_REFETCH_INTERVAL_SECONDS: u64 = 30;

/// Subset of the token claims that we care about.
#[derive(Deserialize)]
struct Claims {
    /// Email address of the caller.
    email: String,
}

/// Options to establish a `JwksVerifier`.
#[derive(Derivative)]
#[derivative(Debug)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct JwksVerifierOptions {
    /// Location of the key set used to verify token signatures.
    pub url: Url,

    /// The TTL for the keys in the cache.
    pub cache_ttl: Duration,

    /// The cache capacity in number of keys.
    pub cache_capacity: usize,

    /// Minimum time between two downloads of the key set.  Unknown key identifiers seen within
    /// this interval of the last download are rejected without contacting the server.
    pub min_refetch_interval: Duration,
}

impl JwksVerifierOptions {
    /// Creates a set of options pointing to the key set at `url` with default cache settings.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            min_refetch_interval: Duration::from_secs(DEFAULT_MIN_REFETCH_INTERVAL_SECONDS),
        }
    }

    /// Creates a set of options from the `JWKS_URL` and `JWKS_CACHE_TTL` environment variables.
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            url: get_required_var::<Url>("JWKS_URL")?,
            cache_ttl: get_optional_var::<Duration>("JWKS_CACHE_TTL")?
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS)),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            min_refetch_interval: Duration::from_secs(DEFAULT_MIN_REFETCH_INTERVAL_SECONDS),
        })
    }
}

/// Verifier that checks token signatures against the keys published at a JWKS URL.
///
/// Keys are cached by their identifier.  Tokens signed with a key that is not in the cache cause
/// the key set to be refetched, which is how rotated keys are discovered, but no more often than
/// once per `min_refetch_interval`.
#[derive(Clone)]
pub struct JwksVerifier {
    /// Location of the key set.
    url: Url,

    /// Asynchronous HTTP client with which to fetch the key set.
    client: Client,

    /// Cache of known signing keys keyed by their identifier.
    cache: Arc<Mutex<LruCache<String, Jwk>>>,

    /// Minimum time between two downloads of the key set.
    min_refetch_interval: Duration,

    /// Time of the last successful download.  Held while downloading so that concurrent misses
    /// trigger a single request.
    last_fetch: Arc<Mutex<Option<Instant>>>,
}

impl JwksVerifier {
    /// Creates a new verifier using `opts` for configuration.
    pub fn new(opts: JwksVerifierOptions) -> Self {
        let cache =
            LruCache::with_expiry_duration_and_capacity(opts.cache_ttl, opts.cache_capacity);
        Self {
            url: opts.url,
            client: Client::default(),
            cache: Arc::from(Mutex::from(cache)),
            min_refetch_interval: opts.min_refetch_interval,
            last_fetch: Arc::from(Mutex::from(None)),
        }
    }

    /// Downloads the key set.
    async fn fetch_keys(&self) -> AuthzResult<JwkSet> {
        debug!("Fetching signing keys from {}", self.url);
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| AuthzError::KeysUnavailable(e.to_string()))?;
        match response.status() {
            StatusCode::OK => {
                let bytes =
                    response.bytes().await.map_err(|e| AuthzError::KeysUnavailable(e.to_string()))?;
                serde_json::from_reader(bytes.reader())
                    .map_err(|e| AuthzError::KeysUnavailable(format!("Invalid key set: {}", e)))
            }
            status => Err(AuthzError::KeysUnavailable(format!(
                "HTTP request to {} returned status {}",
                self.url, status
            ))),
        }
    }

    /// Looks up `kid` in the cache.
    async fn cached_key(&self, kid: &str) -> Option<Jwk> {
        let mut cache = self.cache.lock().await;
        cache.get(kid).cloned()
    }

    /// Gets the key identified by `kid`, refreshing the cache if it is not known.
    async fn find_key(&self, kid: &str) -> AuthzResult<Jwk> {
        if let Some(jwk) = self.cached_key(kid).await {
            return Ok(jwk);
        }

        let mut last_fetch = self.last_fetch.lock().await;

        // Another caller may have refreshed the keys while we waited for the lock.
        if let Some(jwk) = self.cached_key(kid).await {
            return Ok(jwk);
        }

        if last_fetch.is_some_and(|last| last.elapsed() < self.min_refetch_interval) {
            debug!("Not refetching signing keys for unknown key '{}' so soon", kid);
            return Err(AuthzError::InvalidToken(format!("Unknown signing key '{}'", kid)));
        }

        let keys = self.fetch_keys().await?;
        *last_fetch = Some(Instant::now());

        let mut found = None;
        let mut cache = self.cache.lock().await;
        for jwk in keys.keys {
            let Some(key_id) = jwk.common.key_id.clone() else {
                continue;
            };
            if key_id == kid {
                found = Some(jwk.clone());
            }
            cache.insert(key_id, jwk);
        }
        found.ok_or_else(|| AuthzError::InvalidToken(format!("Unknown signing key '{}'", kid)))
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> AuthzResult<ParsedToken> {
        let header =
            jsonwebtoken::decode_header(token).map_err(|e| AuthzError::InvalidToken(e.to_string()))?;
        let kid = match header.kid {
            Some(kid) => kid,
            None => return Err(AuthzError::InvalidToken("Missing key identifier".to_owned())),
        };

        let jwk = self.find_key(&kid).await?;
        let key = DecodingKey::from_jwk(&jwk).map_err(|e| {
            AuthzError::KeysUnavailable(format!("Unusable signing key '{}': {}", kid, e))
        })?;

        let mut validation = Validation::new(header.alg);
        validation.validate_aud = false;
        let data = jsonwebtoken::decode::<Claims>(token, &key, &validation)
            .map_err(|e| AuthzError::InvalidToken(e.to_string()))?;

        Ok(ParsedToken { email: data.claims.email })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::State;
    use axum::routing::get;
    use jsonwebtoken::{Algorithm, EncodingKey, Header};
    use serde::Serialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Private key whose public counterpart is published in `testdata/jwks.json`.
    const SIGNING_KEY: &str = include_str!("testdata/signing-key.pem");

    /// Private key that is not published anywhere.
    const FOREIGN_KEY: &str = include_str!("testdata/foreign-key.pem");

    /// Key set that publishes the public part of `SIGNING_KEY` under the `key-1` identifier.
    const JWKS: &str = include_str!("testdata/jwks.json");

    #[derive(Serialize)]
    struct TestClaims<'a> {
        email: Option<&'a str>,
        exp: u64,
    }

    /// Creates a token for `email` signed with `pem` and tagged with `kid`, expiring after
    /// `ttl_secs` seconds (negative values produce expired tokens).
    fn make_token(pem: &str, kid: &str, email: Option<&str>, ttl_secs: i64) -> String {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
        let exp = now.checked_add_signed(ttl_secs).unwrap();
        let header = Header { kid: Some(kid.to_owned()), ..Header::new(Algorithm::RS256) };
        let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
        jsonwebtoken::encode(&header, &TestClaims { email, exp }, &key).unwrap()
    }

    /// Serves `body` with `status` over HTTP and returns the URL to reach it plus a counter of
    /// the requests received.
    async fn serve_keys(status: StatusCode, body: &'static str) -> (Url, Arc<AtomicUsize>) {
        let hits = Arc::from(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/keys",
                get(move |State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    (status, body)
                }),
            )
            .with_state(hits.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (Url::parse(&format!("http://{}/keys", addr)).unwrap(), hits)
    }

    #[test]
    fn test_options_from_env_all_present() {
        let overrides = [
            ("JWKS_URL", Some("https://auth.example.com/.well-known/jwks.json")),
            ("JWKS_CACHE_TTL", Some("5m")),
        ];
        temp_env::with_vars(overrides, || {
            let opts = JwksVerifierOptions::from_env().unwrap();
            assert_eq!(
                JwksVerifierOptions {
                    url: Url::parse("https://auth.example.com/.well-known/jwks.json").unwrap(),
                    cache_ttl: Duration::from_secs(300),
                    cache_capacity: DEFAULT_CACHE_CAPACITY,
                    min_refetch_interval: Duration::from_secs(
                        DEFAULT_MIN_REFETCH_INTERVAL_SECONDS
                    ),
                },
                opts
            );
        });
    }

    #[test]
    fn test_options_from_env_missing_url() {
        temp_env::with_vars_unset(["JWKS_URL", "JWKS_CACHE_TTL"], || {
            let err = JwksVerifierOptions::from_env().unwrap_err();
            assert!(err.contains("JWKS_URL not present"));
        });
    }

    #[tokio::test]
    async fn test_verify_ok() {
        let (url, _hits) = serve_keys(StatusCode::OK, JWKS).await;
        let verifier = JwksVerifier::new(JwksVerifierOptions::new(url));

        let token = make_token(SIGNING_KEY, "key-1", Some("someone@example.com"), 3600);
        let parsed = verifier.verify(&token).await.unwrap();
        assert_eq!(ParsedToken { email: "someone@example.com".to_owned() }, parsed);
    }

    #[tokio::test]
    async fn test_verify_keys_are_cached() {
        let (url, hits) = serve_keys(StatusCode::OK, JWKS).await;
        let verifier = JwksVerifier::new(JwksVerifierOptions::new(url));

        let token = make_token(SIGNING_KEY, "key-1", Some("someone@example.com"), 3600);
        verifier.verify(&token).await.unwrap();
        verifier.verify(&token).await.unwrap();
        assert_eq!(1, hits.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_verify_unknown_key_refetches() {
        let (url, hits) = serve_keys(StatusCode::OK, JWKS).await;
        let opts = JwksVerifierOptions {
            min_refetch_interval: Duration::ZERO,
            ..JwksVerifierOptions::new(url)
        };
        let verifier = JwksVerifier::new(opts);

        let token = make_token(SIGNING_KEY, "key-2", Some("someone@example.com"), 3600);
        for _ in 0..2 {
            match verifier.verify(&token).await {
                Err(AuthzError::InvalidToken(e)) => assert!(e.contains("Unknown signing key")),
                e => panic!("{:?}", e),
            }
        }
        assert_eq!(2, hits.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_verify_unknown_keys_refetch_is_rate_limited() {
        let (url, hits) = serve_keys(StatusCode::OK, JWKS).await;
        let verifier = JwksVerifier::new(JwksVerifierOptions::new(url));

        for kid in ["key-2", "key-3", "key-4"] {
            let token = make_token(SIGNING_KEY, kid, Some("someone@example.com"), 3600);
            match verifier.verify(&token).await {
                Err(AuthzError::InvalidToken(e)) => assert!(e.contains("Unknown signing key")),
                e => panic!("{:?}", e),
            }
        }
        assert_eq!(1, hits.load(Ordering::SeqCst));

        // Keys fetched by the first miss are still served from the cache.
        let token = make_token(SIGNING_KEY, "key-1", Some("someone@example.com"), 3600);
        verifier.verify(&token).await.unwrap();
        assert_eq!(1, hits.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_verify_failed_fetch_does_not_rate_limit() {
        let (url, hits) = serve_keys(StatusCode::INTERNAL_SERVER_ERROR, "oops").await;
        let verifier = JwksVerifier::new(JwksVerifierOptions::new(url));

        let token = make_token(SIGNING_KEY, "key-1", Some("someone@example.com"), 3600);
        for _ in 0..2 {
            match verifier.verify(&token).await {
                Err(AuthzError::KeysUnavailable(e)) => assert!(e.contains("500")),
                e => panic!("{:?}", e),
            }
        }
        assert_eq!(2, hits.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_verify_bad_signature() {
        let (url, _hits) = serve_keys(StatusCode::OK, JWKS).await;
        let verifier = JwksVerifier::new(JwksVerifierOptions::new(url));

        let token = make_token(FOREIGN_KEY, "key-1", Some("someone@example.com"), 3600);
        match verifier.verify(&token).await {
            Err(AuthzError::InvalidToken(e)) => assert!(e.contains("InvalidSignature")),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_verify_expired() {
        let (url, _hits) = serve_keys(StatusCode::OK, JWKS).await;
        let verifier = JwksVerifier::new(JwksVerifierOptions::new(url));

        let token = make_token(SIGNING_KEY, "key-1", Some("someone@example.com"), -3600);
        match verifier.verify(&token).await {
            Err(AuthzError::InvalidToken(e)) => assert!(e.contains("ExpiredSignature")),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_verify_missing_email() {
        let (url, _hits) = serve_keys(StatusCode::OK, JWKS).await;
        let verifier = JwksVerifier::new(JwksVerifierOptions::new(url));

        let token = make_token(SIGNING_KEY, "key-1", None, 3600);
        match verifier.verify(&token).await {
            Err(AuthzError::InvalidToken(e)) => assert!(e.contains("email")),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_verify_malformed() {
        let (url, hits) = serve_keys(StatusCode::OK, JWKS).await;
        let verifier = JwksVerifier::new(JwksVerifierOptions::new(url));

        match verifier.verify("not-a-token").await {
            Err(AuthzError::InvalidToken(_)) => (),
            e => panic!("{:?}", e),
        }
        assert_eq!(0, hits.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_verify_keys_unavailable() {
        let (url, _hits) = serve_keys(StatusCode::INTERNAL_SERVER_ERROR, "oops").await;
        let verifier = JwksVerifier::new(JwksVerifierOptions::new(url));

        let token = make_token(SIGNING_KEY, "key-1", Some("someone@example.com"), 3600);
        match verifier.verify(&token).await {
            Err(AuthzError::KeysUnavailable(e)) => assert!(e.contains("500")),
            e => panic!("{:?}", e),
        }
    }
}
