//! Scripted in-memory `Store` for exercising workers without a server.

use std::sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use redis::{ErrorKind, RedisError};

use crate::{error::StoreError, store::Store};

pub(crate) fn injected(operation: &str, call: u64) -> StoreError {
    StoreError::Redis(RedisError::from((
        ErrorKind::IoError,
        "injected failure",
        format!("{} call {}", operation, call),
    )))
}

#[derive(Debug, Default)]
pub(crate) struct MockStoreBuilder {
    base_memory: u64,
    info_growth: u64,
    set_growth: u64,
    info_reply: Option<String>,
    info_not_text: bool,
    get_value: Option<Vec<u8>>,
    fail_info_call: Option<u64>,
    fail_get_call: Option<u64>,
    fail_set_call: Option<u64>,
}

impl MockStoreBuilder {
    pub fn base_memory(mut self, bytes: u64) -> Self {
        self.base_memory = bytes;
        self
    }

    /// Memory grows by `bytes` after every INFO.
    pub fn info_growth(mut self, bytes: u64) -> Self {
        self.info_growth = bytes;
        self
    }

    /// Memory grows by `bytes` after every successful SET.
    pub fn set_growth(mut self, bytes: u64) -> Self {
        self.set_growth = bytes;
        self
    }

    pub fn info_reply(mut self, reply: &str) -> Self {
        self.info_reply = Some(reply.to_string());
        self
    }

    pub fn info_not_text(mut self) -> Self {
        self.info_not_text = true;
        self
    }

    pub fn get_value(mut self, value: &[u8]) -> Self {
        self.get_value = Some(value.to_vec());
        self
    }

    /// The `call`-th INFO (1-based) fails.
    pub fn fail_info_call(mut self, call: u64) -> Self {
        self.fail_info_call = Some(call);
        self
    }

    pub fn fail_get_call(mut self, call: u64) -> Self {
        self.fail_get_call = Some(call);
        self
    }

    pub fn fail_set_call(mut self, call: u64) -> Self {
        self.fail_set_call = Some(call);
        self
    }

    pub fn build(self) -> MockStore {
        MockStore {
            memory: AtomicU64::new(self.base_memory),
            info_calls: AtomicU64::new(0),
            get_calls: AtomicU64::new(0),
            set_calls: AtomicU64::new(0),
            keys: Mutex::new(Vec::new()),
            last_info_section: Mutex::new(None),
            config: self,
        }
    }
}

#[derive(Debug)]
pub(crate) struct MockStore {
    config: MockStoreBuilder,
    memory: AtomicU64,
    info_calls: AtomicU64,
    get_calls: AtomicU64,
    set_calls: AtomicU64,
    keys: Mutex<Vec<String>>,
    last_info_section: Mutex<Option<String>>,
}

impl MockStore {
    pub fn builder() -> MockStoreBuilder {
        MockStoreBuilder::default()
    }

    pub fn info_calls(&self) -> u64 {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> u64 {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> u64 {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub fn memory(&self) -> u64 {
        self.memory.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    pub fn last_info_section(&self) -> Option<String> {
        self.last_info_section.lock().unwrap().clone()
    }
}

#[async_trait]
impl Store for MockStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let call = self.get_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.config.fail_get_call == Some(call) {
            return Err(injected("get", call));
        }

        tokio::task::yield_now().await;
        Ok(self.config.get_value.clone())
    }

    async fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
        let call = self.set_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.config.fail_set_call == Some(call) {
            return Err(injected("set", call));
        }

        self.keys.lock().unwrap().push(key.to_string());
        self.memory
            .fetch_add(self.config.set_growth, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn info(&self, section: &str) -> Result<String, StoreError> {
        let call = self.info_calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_info_section.lock().unwrap() = Some(section.to_string());
        if self.config.fail_info_call == Some(call) {
            return Err(injected("info", call));
        }
        if self.config.info_not_text {
            return Err(StoreError::UnexpectedReply(format!(
                "INFO {}: reply is not text",
                section
            )));
        }

        let used = self
            .memory
            .fetch_add(self.config.info_growth, Ordering::SeqCst);
        tokio::task::yield_now().await;

        Ok(match &self.config.info_reply {
            Some(reply) => reply.clone(),
            None => format!(
                "# Memory\r\nused_memory:{}\r\nused_memory_human:{}M\r\nmaxmemory:0\r\n",
                used,
                used / 1_000_000
            ),
        })
    }
}
