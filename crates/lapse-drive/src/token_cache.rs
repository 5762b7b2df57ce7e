//! Token caching for Drive authentication.
//!
//! Thread-safe, async-aware token cache with a refresh margin, single-flight
//! refresh, and graceful fallback to a still-usable token when refresh
//! fails.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{DriveError, DriveResult};

/// Refresh margin: refresh the token 60 seconds before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Conservative token TTL when expiry is unknown (50 minutes).
/// OAuth tokens are typically valid for 60 minutes.
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

/// OAuth scope for full Drive access.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Cached token with expiration tracking.
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    /// Still technically usable even if a refresh is due.
    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Thread-safe token cache with single-flight refresh.
pub struct TokenCache {
    auth: Option<Arc<dyn TokenProvider>>,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    /// Create a new token cache backed by a provider.
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            auth: Some(auth),
            cache: RwLock::new(None),
        }
    }

    /// Cache pre-seeded with a long-lived token and no provider.
    #[cfg(test)]
    pub(crate) fn with_static_token(token: &str) -> Self {
        Self {
            auth: None,
            cache: RwLock::new(Some(CachedToken {
                access_token: token.to_string(),
                expires_at: Instant::now() + Duration::from_secs(3600),
            })),
        }
    }

    /// Invalidate the cached token.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_token(&self) -> DriveResult<String> {
        // Fast path: check read lock first
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        // Slow path: acquire write lock and refresh
        let mut cache = self.cache.write().await;

        // Double-check: another task may have refreshed while we waited
        if let Some(cached) = cache.as_ref() {
            if cached.is_valid() {
                return Ok(cached.access_token.clone());
            }
        }

        self.refresh_token(&mut cache).await
    }

    async fn refresh_token(&self, cache: &mut Option<CachedToken>) -> DriveResult<String> {
        let auth = match self.auth.as_ref() {
            Some(auth) => auth,
            None => {
                // No provider: fall back to a usable cached token or fail.
                if let Some(cached) = cache.as_ref() {
                    if cached.is_usable() {
                        return Ok(cached.access_token.clone());
                    }
                }
                return Err(DriveError::auth_error("No token provider configured"));
            }
        };

        match auth.token(&[DRIVE_SCOPE]).await {
            Ok(token) => {
                let access_token = token.as_str().to_string();

                // Prefer the real expiry from gcp_auth, fall back to a
                // conservative default.
                let expires_at = {
                    let now = Utc::now();
                    let exp = token.expires_at();

                    if exp > now {
                        match (exp - now).to_std() {
                            Ok(ttl) => Instant::now() + ttl,
                            Err(_) => Instant::now() + TOKEN_DEFAULT_TTL,
                        }
                    } else {
                        // An already-expired token forces a refresh on the
                        // next request.
                        Instant::now()
                    }
                };

                *cache = Some(CachedToken {
                    access_token: access_token.clone(),
                    expires_at,
                });

                debug!("Refreshed Drive auth token");
                Ok(access_token)
            }
            Err(e) => {
                if let Some(cached) = cache.as_ref() {
                    if cached.is_usable() {
                        warn!("Token refresh failed, using existing token: {}", e);
                        return Ok(cached.access_token.clone());
                    }
                }

                Err(DriveError::auth_error(format!(
                    "Failed to obtain auth token: {}",
                    e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_refresh_margin() {
        assert_eq!(TOKEN_REFRESH_MARGIN, Duration::from_secs(60));
    }

    #[test]
    fn test_drive_scope() {
        assert!(DRIVE_SCOPE.contains("auth/drive"));
    }

    #[tokio::test]
    async fn test_static_token_is_served_from_cache() {
        let cache = TokenCache::with_static_token("tok-123");
        assert_eq!(cache.get_token().await.unwrap(), "tok-123");
    }

    #[tokio::test]
    async fn test_invalidate_without_provider_errors() {
        let cache = TokenCache::with_static_token("tok-123");
        cache.invalidate().await;
        assert!(cache.get_token().await.is_err());
    }
}
