//! L2 cache -- Redis
//!
//! Optional second layer shared across processes. Every failure path
//! degrades to a miss (get) or a swallowed error (put); the cache is never
//! allowed to fail a request.

use arcana_core::EngineError;
use redis::AsyncCommands;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::warn;

/// Redis-backed cache layer.
pub struct L2Cache {
    client: redis::Client,
    connection: OnceCell<redis::aio::MultiplexedConnection>,
}

impl L2Cache {
    pub fn new(redis_url: &str) -> Result<Self, EngineError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| EngineError::CacheError(format!("invalid Redis URL: {}", e)))?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    async fn conn(&self) -> Result<redis::aio::MultiplexedConnection, EngineError> {
        let conn = self
            .connection
            .get_or_try_init(|| async {
                self.client
                    .get_multiplexed_tokio_connection()
                    .await
                    .map_err(|e| EngineError::CacheError(format!("Redis connect failed: {}", e)))
            })
            .await?;
        Ok(conn.clone())
    }

    /// Fetch a value. Backend or decode failure reads as a miss.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let mut conn = match self.conn().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "L2 get degraded to miss");
                return None;
            }
        };
        let raw: Option<String> = match conn.get(key).await {
            Ok(v) => v,
            Err(e) => {
                warn!(key, error = %e, "L2 get failed, treating as miss");
                return None;
            }
        };
        raw.and_then(|s| serde_json::from_str(&s).ok())
    }

    /// Store a value with a TTL.
    pub async fn put(&self, key: &str, value: &Value, ttl: Duration) -> Result<(), EngineError> {
        let mut conn = self.conn().await?;
        let serialised = serde_json::to_string(value)
            .map_err(|e| EngineError::CacheError(format!("serialise failed: {}", e)))?;
        conn.set_ex::<_, _, ()>(key, serialised, ttl.as_secs())
            .await
            .map_err(|e| EngineError::CacheError(format!("Redis SETEX failed: {}", e)))
    }

    pub async fn invalidate(&self, key: &str) -> Result<(), EngineError> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| EngineError::CacheError(format!("Redis DEL failed: {}", e)))
    }
}
