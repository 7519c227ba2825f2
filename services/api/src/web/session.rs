//! services/api/src/web/session.rs
//!
//! Cookie-keyed server-side sessions. Handlers take a `ClientSession`
//! extractor, read or change its data, and commit it before responding.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use chrono::Utc;
use rango_core::{domain::SessionData, ports::SessionStore};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{error::ApiError, web::state::AppState};

/// Name of the cookie carrying the session key.
pub const SESSION_COOKIE: &str = "sessionid";
/// Session key written by the index page and consumed by the about page.
pub const TEST_COOKIE_KEY: &str = "testcookie";
const TEST_COOKIE_VALUE: &str = "worked";

/// The session belonging to the current request.
#[derive(Debug)]
pub struct ClientSession {
    key: String,
    data: SessionData,
    modified: bool,
}

/// Extracts the value of the session cookie from the request headers.
pub fn session_key_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let c = c.trim();
            c.strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|key| !key.is_empty())
}

impl FromRequestParts<Arc<AppState>> for ClientSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(key) = session_key_from_headers(&parts.headers) {
            if let Some(data) = state.sessions.load_session(key).await? {
                return Ok(Self {
                    key: key.to_string(),
                    data,
                    modified: false,
                });
            }
            debug!("Unknown or expired session key presented; starting a new session");
        }
        Ok(Self::fresh())
    }
}

impl ClientSession {
    /// A brand new, empty session with a random key.
    pub fn fresh() -> Self {
        Self {
            key: Uuid::new_v4().simple().to_string(),
            data: SessionData::new(),
            modified: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Mutable access; marks the session for saving.
    pub fn data_mut(&mut self) -> &mut SessionData {
        self.modified = true;
        &mut self.data
    }

    /// Records a marker used to check that the client sends cookies back.
    pub fn set_test_cookie(&mut self) {
        self.data_mut().insert(TEST_COOKIE_KEY, TEST_COOKIE_VALUE);
    }

    pub fn test_cookie_worked(&self) -> bool {
        self.data
            .get(TEST_COOKIE_KEY)
            .and_then(|v| v.as_str())
            .is_some_and(|v| v == TEST_COOKIE_VALUE)
    }

    pub fn delete_test_cookie(&mut self) {
        if self.data.contains_key(TEST_COOKIE_KEY) {
            self.data_mut().remove(TEST_COOKIE_KEY);
        }
    }

    /// Persists the session if it changed and returns the `Set-Cookie` value
    /// the response should carry, if any.
    pub async fn commit(self, state: &AppState) -> Result<Option<String>, ApiError> {
        if !self.modified {
            return Ok(None);
        }
        let age = state.config.session_age;
        state
            .sessions
            .save_session(&self.key, &self.data, Utc::now() + age)
            .await?;
        Ok(Some(format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            SESSION_COOKIE,
            self.key,
            age.num_seconds()
        )))
    }
}

/// Sweeps expired sessions from `store` every `every`, starting immediately.
pub fn spawn_session_purger(store: Arc<dyn SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match store.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(removed) => info!("Purged {} expired sessions", removed),
                Err(e) => warn!("Failed to purge expired sessions: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rango_core::memory::InMemoryDatabase;

    #[test]
    fn session_key_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; sessionid=abc123; lang=en"),
        );
        assert_eq!(session_key_from_headers(&headers), Some("abc123"));
    }

    #[test]
    fn similarly_named_or_empty_cookies_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("sessionid_old=zzz; sessionid="),
        );
        assert_eq!(session_key_from_headers(&headers), None);
        assert_eq!(session_key_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_cookie_round_trip() {
        let mut session = ClientSession::fresh();
        assert!(!session.test_cookie_worked());
        session.set_test_cookie();
        assert!(session.test_cookie_worked());
        session.delete_test_cookie();
        assert!(!session.test_cookie_worked());
    }

    #[test]
    fn reading_does_not_mark_the_session_modified() {
        let session = ClientSession::fresh();
        let _ = session.data().get("visits");
        assert!(!session.modified);
    }

    #[tokio::test]
    async fn purger_sweeps_expired_sessions_on_start() {
        let store = Arc::new(InMemoryDatabase::new());
        let data = SessionData::new();
        store
            .save_session("gone", &data, Utc::now() - chrono::Duration::hours(1))
            .await
            .unwrap();
        store
            .save_session("kept", &data, Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();

        let handle = spawn_session_purger(store.clone(), Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert_eq!(store.purge_expired_sessions().await.unwrap(), 0);
        assert!(store.load_session("kept").await.unwrap().is_some());
    }
}
