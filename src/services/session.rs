//! Session state: per-session visit counters

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use redis::Client;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};

/// Storage for per-session state, keyed by session id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Increment the visit counter of a session and return its value before the increment
    async fn record_visit(&self, session_id: &str) -> AppResult<i64>;
}

fn visits_key(session_id: &str) -> String {
    format!("session:{}:num_visits", session_id)
}

/// Session store backed by Redis
#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    /// Create a new Redis session store
    pub async fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client, ttl_seconds })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn record_visit(&self, session_id: &str) -> AppResult<i64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let key = visits_key(session_id);
        let (visits,): (i64,) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&key)
            .cmd("EXPIRE")
            .arg(&key)
            .arg(self.ttl_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(visits - 1)
    }
}

/// Session store kept in process memory. Sessions idle for longer than the
/// TTL are dropped on the next write, like the Redis keys expire.
pub struct MemorySessionStore {
    ttl: Duration,
    visits: Mutex<HashMap<String, (i64, Instant)>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            visits: Mutex::new(HashMap::new()),
        }
    }

    /// Current counter of a session, 0 if it was never seen or has expired
    pub async fn visits(&self, session_id: &str) -> i64 {
        match self.visits.lock().await.get(session_id) {
            Some((count, last_seen)) if last_seen.elapsed() < self.ttl => *count,
            _ => 0,
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn record_visit(&self, session_id: &str) -> AppResult<i64> {
        let now = Instant::now();
        let mut visits = self.visits.lock().await;
        visits.retain(|_, (_, last_seen)| now.duration_since(*last_seen) < self.ttl);

        let (counter, last_seen) = visits
            .entry(session_id.to_string())
            .or_insert((0, now));
        let before = *counter;
        *counter += 1;
        *last_seen = now;
        Ok(before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemorySessionStore {
        MemorySessionStore::new(Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn first_visit_reports_zero_and_leaves_one() {
        let store = store();
        assert_eq!(store.record_visit("abc").await.unwrap(), 0);
        assert_eq!(store.visits("abc").await, 1);
    }

    #[tokio::test]
    async fn nth_visit_reports_n_minus_one() {
        let store = store();
        for n in 1..=5 {
            assert_eq!(store.record_visit("abc").await.unwrap(), n - 1);
            assert_eq!(store.visits("abc").await, n);
        }
        assert_eq!(store.record_visit("other").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn idle_sessions_expire_and_are_purged() {
        let store = MemorySessionStore::new(Duration::from_millis(50));
        store.record_visit("old").await.unwrap();
        store.record_visit("old").await.unwrap();
        assert_eq!(store.visits("old").await, 2);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.visits("old").await, 0);

        assert_eq!(store.record_visit("new").await.unwrap(), 0);
        let sessions = store.visits.lock().await;
        assert_eq!(sessions.len(), 1);
        assert!(sessions.contains_key("new"));
    }

    #[tokio::test]
    async fn expired_session_starts_over() {
        let store = MemorySessionStore::new(Duration::from_millis(50));
        store.record_visit("abc").await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.record_visit("abc").await.unwrap(), 0);
        assert_eq!(store.visits("abc").await, 1);
    }

    #[test]
    fn keys_are_namespaced_by_session() {
        assert_eq!(visits_key("s1"), "session:s1:num_visits");
    }
}
