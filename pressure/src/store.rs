use std::fmt;

use async_trait::async_trait;
use redis::{
    AsyncCommands, ConnectionAddr, ConnectionInfo, ErrorKind, RedisConnectionInfo,
    aio::MultiplexedConnection,
};

use crate::error::StoreError;

/// The three store operations a run needs.
///
/// Implementations must tolerate concurrent calls from every worker.
#[async_trait]
pub trait Store: Send + Sync {
    /// `Ok(None)` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `value` under `key` with no expiry.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Raw text of `INFO <section>`.
    async fn info(&self, section: &str) -> Result<String, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreAddress {
    pub host: String,
    pub port: u16,
    pub pass: String,
    pub db: i64,
}

impl StoreAddress {
    pub fn connection_info(&self) -> ConnectionInfo {
        let password = if self.pass.is_empty() {
            None
        } else {
            Some(self.pass.clone())
        };

        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                db: self.db,
                password,
                ..Default::default()
            },
        }
    }
}

impl Default for StoreAddress {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            pass: String::new(),
            db: 0,
        }
    }
}

impl fmt::Display for StoreAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.db)
    }
}

/// A Redis-compatible store reached over one multiplexed connection.
///
/// Every call works on a clone of the connection handle; requests from all
/// workers are pipelined over the same socket.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    /// Connects eagerly so a bad address fails before any worker starts.
    pub async fn connect(address: &StoreAddress) -> Result<Self, StoreError> {
        let client = redis::Client::open(address.connection_info())?;
        let connection = client.get_multiplexed_async_connection().await?;
        log::debug!("Connected to store at {}", address);

        Ok(Self { connection })
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut connection = self.connection.clone();
        let value: Option<Vec<u8>> = connection.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let _: () = connection.set(key, value).await?;
        Ok(())
    }

    async fn info(&self, section: &str) -> Result<String, StoreError> {
        let mut connection = self.connection.clone();
        let reply: Result<String, redis::RedisError> = redis::cmd("INFO")
            .arg(section)
            .query_async(&mut connection)
            .await;

        reply.map_err(|e| match e.kind() {
            ErrorKind::TypeError => StoreError::UnexpectedReply(format!("INFO {}: {}", section, e)),
            _ => StoreError::Redis(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_info_without_password() {
        let address = StoreAddress {
            host: "cache.internal".to_string(),
            port: 6380,
            pass: String::new(),
            db: 3,
        };

        let info = address.connection_info();
        assert!(matches!(
            info.addr,
            ConnectionAddr::Tcp(ref host, 6380) if host == "cache.internal"
        ));
        assert_eq!(info.redis.db, 3);
        assert_eq!(info.redis.password, None);
        assert_eq!(info.redis.username, None);
    }

    #[test]
    fn test_connection_info_with_password() {
        let address = StoreAddress {
            pass: "hunter2".to_string(),
            ..StoreAddress::default()
        };

        let info = address.connection_info();
        assert!(matches!(
            info.addr,
            ConnectionAddr::Tcp(ref host, 6379) if host == "localhost"
        ));
        assert_eq!(info.redis.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_display_omits_password() {
        let address = StoreAddress {
            pass: "hunter2".to_string(),
            ..StoreAddress::default()
        };

        assert_eq!(address.to_string(), "localhost:6379/0");
    }

    #[tokio::test]
    async fn test_connect_refused_is_store_error() {
        // Port 1 on loopback is not expected to run a store.
        let address = StoreAddress {
            host: "127.0.0.1".to_string(),
            port: 1,
            ..StoreAddress::default()
        };

        let result = RedisStore::connect(&address).await;
        assert!(matches!(result, Err(StoreError::Redis(_))));
    }
}
