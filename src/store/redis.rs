//! Redis-backed list store.
//!
//! Maps the [`ListStore`] contract onto Redis list primitives: `LPUSH`,
//! `LTRIM`, `EXPIRE` and `LRANGE`. Batches run as a `MULTI`/`EXEC`
//! pipeline, which gives the all-or-nothing visibility the buffer's
//! push/trim/expire discipline relies on. Connection construction and
//! pooling are the caller's concern; this type only wraps an established
//! [`ConnectionManager`].

use std::{future::Future, pin::Pin};

use redis::{aio::ConnectionManager, AsyncCommands, Value};

use crate::{
    error::{BufferError, Result},
    key::BufferKey,
    store::{CommandReply, ListCommand, ListStore},
};

/// [`ListStore`] implementation over a Redis connection.
#[derive(Clone)]
pub struct RedisListStore {
    conn: ConnectionManager,
}

impl RedisListStore {
    /// Wraps an established connection manager.
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

impl ListStore for RedisListStore {
    fn execute(
        &self,
        batch: Vec<ListCommand>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<CommandReply>>> + Send + '_>> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let mut pipe = redis::pipe();
            pipe.atomic();
            for command in &batch {
                match command {
                    ListCommand::PushFront { key, value } => {
                        pipe.lpush(key.as_str(), value);
                    },
                    ListCommand::Trim { key, start, stop } => {
                        pipe.ltrim(key.as_str(), *start, *stop);
                    },
                    ListCommand::Expire { key, ttl } => {
                        let seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
                        pipe.expire(key.as_str(), seconds);
                    },
                    ListCommand::Range { key, start, stop } => {
                        pipe.lrange(key.as_str(), *start, *stop);
                    },
                }
            }

            let raw: Vec<Value> = pipe.query_async(&mut conn).await?;
            if raw.len() != batch.len() {
                return Err(BufferError::store(format!(
                    "batch reply count mismatch: sent {}, got {}",
                    batch.len(),
                    raw.len()
                )));
            }

            batch
                .iter()
                .zip(raw)
                .map(|(command, value)| match command {
                    ListCommand::Range { .. } => {
                        let values: Vec<String> = redis::from_redis_value(&value)?;
                        Ok(CommandReply::Values(values))
                    },
                    _ => Ok(CommandReply::Done),
                })
                .collect()
        })
    }

    fn range(
        &self,
        key: BufferKey,
        start: isize,
        stop: isize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + '_>> {
        let mut conn = self.conn.clone();
        Box::pin(async move {
            let values: Vec<String> = conn.lrange(key.as_str(), start, stop).await?;
            Ok(values)
        })
    }
}
