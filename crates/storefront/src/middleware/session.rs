//! Session middleware configuration.
//!
//! Sessions hold nothing but the visitor's cart ID, which Zid can always
//! replace, so they live in a process-local `moka` cache rather than a
//! database. Entries are evicted when their session expires.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{Expiry, future::Cache};
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};
use tower_sessions::{Expiry as SessionExpiry, SessionManagerLayer};

use crate::config::ThemeConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "zid_theme_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Upper bound on live sessions; least recently used ones go first.
const MAX_SESSIONS: u64 = 100_000;

// =============================================================================
// Store
// =============================================================================

/// Session store backed by a `moka` cache.
///
/// Each entry lives until its record's expiry date. A save moves the
/// deadline, so inactive sessions are evicted without a cleanup task.
#[derive(Clone)]
pub struct MokaSessionStore {
    cache: Cache<Id, Record>,
}

impl MokaSessionStore {
    /// Create a store holding at most `max_sessions` sessions.
    #[must_use]
    pub fn new(max_sessions: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_sessions)
                .expire_after(UntilRecordExpiry)
                .build(),
        }
    }
}

impl Default for MokaSessionStore {
    fn default() -> Self {
        Self::new(MAX_SESSIONS)
    }
}

impl std::fmt::Debug for MokaSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaSessionStore")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl SessionStore for MokaSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while self.cache.contains_key(&record.id) {
            record.id = Id::default();
        }
        self.cache.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.cache.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self
            .cache
            .get(session_id)
            .await
            .filter(|record| record.expiry_date > OffsetDateTime::now_utc()))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.cache.invalidate(session_id).await;
        Ok(())
    }
}

/// Expire cache entries at the session's own expiry date.
struct UntilRecordExpiry;

impl UntilRecordExpiry {
    fn remaining(record: &Record) -> Duration {
        Duration::try_from(record.expiry_date - OffsetDateTime::now_utc()).unwrap_or_default()
    }
}

impl Expiry<Id, Record> for UntilRecordExpiry {
    fn expire_after_create(&self, _id: &Id, record: &Record, _created_at: Instant) -> Option<Duration> {
        Some(Self::remaining(record))
    }

    fn expire_after_update(
        &self,
        _id: &Id,
        record: &Record,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(Self::remaining(record))
    }
}

// =============================================================================
// Layer
// =============================================================================

/// Create the session layer.
#[must_use]
pub fn create_session_layer(config: &ThemeConfig) -> SessionManagerLayer<MokaSessionStore> {
    SessionManagerLayer::new(MokaSessionStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(SessionExpiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_sessions::cookie::time::Duration as CookieDuration;

    use super::*;

    fn record(expires_in: CookieDuration) -> Record {
        Record {
            id: Id::default(),
            data: std::collections::HashMap::default(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_create_then_load() {
        let store = MokaSessionStore::default();
        let mut record = record(CookieDuration::minutes(30));
        store.create(&mut record).await.unwrap();

        assert_eq!(store.load(&record.id).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_create_avoids_id_collision() {
        let store = MokaSessionStore::default();
        let mut first = record(CookieDuration::minutes(30));
        store.create(&mut first).await.unwrap();

        let mut second = record(CookieDuration::minutes(30));
        second.id = first.id;
        store.create(&mut second).await.unwrap();

        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_not_loaded() {
        let store = MokaSessionStore::default();
        let expired = record(CookieDuration::seconds(-5));
        store.save(&expired).await.unwrap();

        assert_eq!(store.load(&expired.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_evicted() {
        let store = MokaSessionStore::default();
        let expired = record(CookieDuration::seconds(-5));
        store.save(&expired).await.unwrap();
        store.cache.run_pending_tasks().await;

        assert!(!store.cache.contains_key(&expired.id));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MokaSessionStore::default();
        let mut record = record(CookieDuration::minutes(30));
        store.create(&mut record).await.unwrap();
        store.delete(&record.id).await.unwrap();

        assert_eq!(store.load(&record.id).await.unwrap(), None);
    }
}
