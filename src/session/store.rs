//! In-process session store with expiry deletion.
//!
//! # Design Decisions
//! - Records live in a `DashMap`; no lock is held across an await
//! - Every record is kept at most `max_lifetime` past its last save, even
//!   when the cookie itself lasts for the browser session
//! - Expired records are removed by `delete_expired`, which the server runs
//!   on a fixed interval

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use time::{Duration, OffsetDateTime};
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, ExpiredDeletion, SessionStore};

#[derive(Debug, Clone)]
pub struct GateSessionStore {
    records: Arc<DashMap<Id, Record>>,
    max_lifetime: Duration,
}

impl GateSessionStore {
    pub fn new(max_lifetime: Duration) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            max_lifetime,
        }
    }

    /// Number of records currently held, expired or not.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn clamp(&self, record: &Record, now: OffsetDateTime) -> Record {
        let mut record = record.clone();
        record.expiry_date = record
            .expiry_date
            .min(now.saturating_add(self.max_lifetime));
        record
    }

    fn delete_expired_at(&self, now: OffsetDateTime) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| record.expiry_date > now);
        before.saturating_sub(self.records.len())
    }
}

#[async_trait]
impl SessionStore for GateSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let now = OffsetDateTime::now_utc();
        loop {
            match self.records.entry(record.id) {
                dashmap::Entry::Occupied(_) => record.id = Id::default(),
                dashmap::Entry::Vacant(slot) => {
                    slot.insert(self.clamp(record, now));
                    return Ok(());
                }
            }
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let record = self.clamp(record, OffsetDateTime::now_utc());
        self.records.insert(record.id, record);
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .records
            .get(session_id)
            .filter(|record| record.expiry_date > now)
            .map(|record| record.value().clone()))
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for GateSessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let removed = self.delete_expired_at(OffsetDateTime::now_utc());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.records.len(), "Deleted expired sessions");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expires_in: Duration) -> Record {
        Record {
            id: Id::default(),
            data: Default::default(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn lifetime_is_capped() {
        let store = GateSessionStore::new(Duration::minutes(5));
        let mut long_lived = record(Duration::weeks(2));
        store.create(&mut long_lived).await.unwrap();

        let stored = store.load(&long_lived.id).await.unwrap().unwrap();
        assert!(stored.expiry_date <= OffsetDateTime::now_utc() + Duration::minutes(5));
    }

    #[tokio::test]
    async fn expired_records_are_deleted() {
        let store = GateSessionStore::new(Duration::hours(1));
        let mut stale = record(Duration::minutes(10));
        let mut fresh = record(Duration::minutes(50));
        store.create(&mut stale).await.unwrap();
        store.create(&mut fresh).await.unwrap();
        assert_eq!(store.len(), 2);

        let later = OffsetDateTime::now_utc() + Duration::minutes(30);
        assert_eq!(store.delete_expired_at(later), 1);
        assert_eq!(store.len(), 1);
        assert!(store.load(&fresh.id).await.unwrap().is_some());
        assert!(store.load(&stale.id).await.unwrap().is_none());

        let much_later = OffsetDateTime::now_utc() + Duration::hours(2);
        assert_eq!(store.delete_expired_at(much_later), 1);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_expired_keeps_live_records() {
        let store = GateSessionStore::new(Duration::hours(1));
        let mut live = record(Duration::minutes(10));
        store.create(&mut live).await.unwrap();

        store.delete_expired().await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn create_avoids_id_collisions() {
        let store = GateSessionStore::new(Duration::hours(1));
        let mut first = record(Duration::minutes(10));
        store.create(&mut first).await.unwrap();

        let mut second = record(Duration::minutes(10));
        second.id = first.id;
        store.create(&mut second).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn deleted_records_do_not_load() {
        let store = GateSessionStore::new(Duration::hours(1));
        let mut rec = record(Duration::minutes(10));
        store.create(&mut rec).await.unwrap();

        store.delete(&rec.id).await.unwrap();
        assert!(store.load(&rec.id).await.unwrap().is_none());
    }
}
