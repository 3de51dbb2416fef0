//! Subscriber records and the store they live in.
//!
//! The store is an opaque external collaborator behind the [`SubscriberStore`]
//! trait so handlers can be tested with an in-memory fake. The Redis-backed
//! implementation performs plain read-modify-write with last-write-wins
//! semantics; concurrent grants for the same email can interleave arbitrarily.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, ErrorDetails};

const SUBSCRIBER_KEY_PREFIX: &str = "subscriber:";
const SUBSCRIBER_EMAIL_KEY_PREFIX: &str = "subscriber:email:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriberRecord {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_pro: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pro_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entitlement {
    Active,
    Inactive,
    Expired,
}

impl SubscriberRecord {
    /// Evaluate the entitlement at `now`.
    ///
    /// A record with `is_pro = true` and no expiry, or an expiry in the
    /// future, is entitled. An expiry strictly in the past makes the record
    /// unentitled even while `is_pro` remains true: the flag is never
    /// auto-cleared (lazy deactivation).
    pub fn entitlement_at(&self, now: DateTime<Utc>) -> Entitlement {
        if !self.is_pro {
            return Entitlement::Inactive;
        }
        match self.pro_expires_at {
            Some(expires_at) if expires_at < now => Entitlement::Expired,
            _ => Entitlement::Active,
        }
    }
}

#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<SubscriberRecord>, Error>;
    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberRecord>, Error>;
    async fn upsert(&self, record: SubscriberRecord) -> Result<(), Error>;
}

/// Grant (or re-arm) a Pro entitlement for `email`.
///
/// Creates the record on first grant and updates the same record on every
/// subsequent one; the expiry is always extended from the current call time.
/// Records are never deleted.
pub async fn grant_pro(
    store: &dyn SubscriberStore,
    email: &str,
    name: Option<String>,
    pro_days: i64,
    now: DateTime<Utc>,
) -> Result<SubscriberRecord, Error> {
    let mut record = match store.find_by_email(email).await? {
        Some(existing) => existing,
        None => SubscriberRecord {
            id: Uuid::now_v7().to_string(),
            email: email.to_string(),
            name: None,
            is_pro: false,
            pro_expires_at: None,
            created_at: now,
            updated_at: now,
        },
    };

    if name.is_some() {
        record.name = name;
    }
    record.is_pro = true;
    record.pro_expires_at = Some(now + chrono::Duration::days(pro_days));
    record.updated_at = now;

    store.upsert(record.clone()).await?;
    Ok(record)
}

/// Process-local store used by tests and when no database URL is configured.
/// Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySubscriberStore {
    by_id: DashMap<String, SubscriberRecord>,
    email_index: DashMap<String, String>,
}

impl InMemorySubscriberStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriberStore for InMemorySubscriberStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<SubscriberRecord>, Error> {
        Ok(self.by_id.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberRecord>, Error> {
        match self.email_index.get(email) {
            Some(id) => self.find_by_id(id.value()).await,
            None => Ok(None),
        }
    }

    async fn upsert(&self, record: SubscriberRecord) -> Result<(), Error> {
        self.email_index
            .insert(record.email.clone(), record.id.clone());
        self.by_id.insert(record.id.clone(), record);
        Ok(())
    }
}

/// Redis-backed store: one JSON document per record at `subscriber:{id}` and
/// an email index at `subscriber:email:{email}`.
pub struct RedisSubscriberStore {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisSubscriberStore {
    pub async fn new(url: &str) -> Result<Self, Error> {
        let client = redis::Client::open(url).map_err(|e| {
            Error::new(ErrorDetails::Config {
                message: format!("Failed to create Redis client: {e}"),
            })
        })?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                Error::new(ErrorDetails::Config {
                    message: format!("Failed to get Redis connection: {e}"),
                })
            })?;
        Ok(Self { conn })
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, Error> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(|e| {
            Error::new(ErrorDetails::SubscriberStore {
                message: format!("Failed to read `{key}`: {e}"),
            })
        })
    }
}

#[async_trait]
impl SubscriberStore for RedisSubscriberStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<SubscriberRecord>, Error> {
        let key = format!("{SUBSCRIBER_KEY_PREFIX}{id}");
        let raw = self.get_raw(&key).await?;
        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| {
                Error::new(ErrorDetails::SubscriberStore {
                    message: format!("Failed to parse subscriber record `{key}`: {e}"),
                })
            })
        })
        .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberRecord>, Error> {
        let index_key = format!("{SUBSCRIBER_EMAIL_KEY_PREFIX}{email}");
        match self.get_raw(&index_key).await? {
            Some(id) => self.find_by_id(&id).await,
            None => Ok(None),
        }
    }

    async fn upsert(&self, record: SubscriberRecord) -> Result<(), Error> {
        let json = serde_json::to_string(&record).map_err(|e| {
            Error::new(ErrorDetails::Serialization {
                message: format!("Failed to serialize subscriber record: {e}"),
            })
        })?;
        let record_key = format!("{SUBSCRIBER_KEY_PREFIX}{}", record.id);
        let index_key = format!("{SUBSCRIBER_EMAIL_KEY_PREFIX}{}", record.email);

        // Two plain SETs, no transaction: last write wins by design of the
        // grant operation.
        let mut conn = self.conn.clone();
        let _: () = conn.set(&record_key, json).await.map_err(|e| {
            Error::new(ErrorDetails::SubscriberStore {
                message: format!("Failed to write `{record_key}`: {e}"),
            })
        })?;
        let _: () = conn.set(&index_key, &record.id).await.map_err(|e| {
            Error::new(ErrorDetails::SubscriberStore {
                message: format!("Failed to write `{index_key}`: {e}"),
            })
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(is_pro: bool, expires_at: Option<DateTime<Utc>>) -> SubscriberRecord {
        let now = Utc::now();
        SubscriberRecord {
            id: "01890000-0000-7000-8000-000000000001".to_string(),
            email: "pilgrim@example.com".to_string(),
            name: None,
            is_pro,
            pro_expires_at: expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_entitlement_inactive_when_flag_is_false() {
        let now = Utc::now();
        let record = record(false, Some(now + Duration::days(30)));
        assert_eq!(record.entitlement_at(now), Entitlement::Inactive);
    }

    #[test]
    fn test_entitlement_active_without_expiry() {
        let now = Utc::now();
        assert_eq!(record(true, None).entitlement_at(now), Entitlement::Active);
    }

    #[test]
    fn test_entitlement_boundary_one_second_each_way() {
        let now = Utc::now();
        let expired = record(true, Some(now - Duration::seconds(1)));
        assert_eq!(expired.entitlement_at(now), Entitlement::Expired);

        let active = record(true, Some(now + Duration::seconds(1)));
        assert_eq!(active.entitlement_at(now), Entitlement::Active);
    }

    #[test]
    fn test_expired_record_keeps_stale_pro_flag() {
        let now = Utc::now();
        let expired = record(true, Some(now - Duration::days(1)));
        assert_eq!(expired.entitlement_at(now), Entitlement::Expired);
        // Lazy deactivation: the flag itself is untouched
        assert!(expired.is_pro);
    }

    #[tokio::test]
    async fn test_grant_creates_then_updates_single_record() {
        let store = InMemorySubscriberStore::new();
        let first_call = Utc::now();

        let created = grant_pro(&store, "pilgrim@example.com", None, 30, first_call)
            .await
            .expect("first grant should succeed");
        assert!(created.is_pro);
        assert_eq!(
            created.pro_expires_at,
            Some(first_call + Duration::days(30))
        );

        // Second grant for the same email updates the same record and extends
        // the expiry from the new call time
        let second_call = first_call + Duration::days(10);
        let updated = grant_pro(
            &store,
            "pilgrim@example.com",
            Some("Aisha".to_string()),
            7,
            second_call,
        )
        .await
        .expect("second grant should succeed");
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name.as_deref(), Some("Aisha"));
        assert_eq!(updated.pro_expires_at, Some(second_call + Duration::days(7)));

        let stored = store
            .find_by_email("pilgrim@example.com")
            .await
            .expect("lookup should succeed")
            .expect("record should exist");
        assert_eq!(stored, updated);
        assert_eq!(stored.created_at, first_call);
    }

    #[tokio::test]
    async fn test_in_memory_store_round_trip() {
        let store = InMemorySubscriberStore::new();
        let record = record(true, None);
        store
            .upsert(record.clone())
            .await
            .expect("upsert should succeed");

        let by_id = store
            .find_by_id(&record.id)
            .await
            .expect("lookup should succeed");
        assert_eq!(by_id, Some(record.clone()));

        let by_email = store
            .find_by_email(&record.email)
            .await
            .expect("lookup should succeed");
        assert_eq!(by_email, Some(record));

        assert_eq!(
            store
                .find_by_id("missing")
                .await
                .expect("lookup should succeed"),
            None
        );
    }
}
