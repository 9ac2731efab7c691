//! Event log storage
//!
//! Topics are 32-byte hashes used to index events:
//! - First topic: event signature hash (keccak256("EventName(type,type)"))
//! - Remaining topics: indexed parameters (up to 3)

use crate::error::{LedgerError, LedgerResult};
use faucet_common::types::{Address, Hash};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Maximum topics a log may carry (LOG0..LOG4)
pub const MAX_TOPICS: usize = 4;

/// Event log emitted by a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    /// Contract address that emitted the log
    pub address: Address,

    /// Log topics (0-4 topics)
    pub topics: Vec<Hash>,

    /// Log data (non-indexed parameters)
    pub data: Vec<u8>,
}

impl EventLog {
    pub fn new(address: Address, topics: Vec<Hash>, data: Vec<u8>) -> Self {
        Self {
            address,
            topics,
            data,
        }
    }

    /// Validate the log (max 4 topics)
    pub fn validate(&self) -> LedgerResult<()> {
        if self.topics.len() > MAX_TOPICS {
            return Err(LedgerError::TooManyTopics(self.topics.len()));
        }
        Ok(())
    }
}

#[derive(Default)]
struct LogIndex {
    logs: Vec<EventLog>,
    by_address: HashMap<Address, Vec<usize>>,
    by_topic: HashMap<Hash, Vec<usize>>,
}

impl LogIndex {
    fn push(&mut self, log: EventLog) -> usize {
        let index = self.logs.len();
        self.by_address.entry(log.address).or_default().push(index);
        for topic in &log.topics {
            self.by_topic.entry(*topic).or_default().push(index);
        }
        self.logs.push(log);
        index
    }

    fn truncate(&mut self, len: usize) {
        if len >= self.logs.len() {
            return;
        }
        self.logs.truncate(len);
        for indices in self.by_address.values_mut() {
            indices.retain(|i| *i < len);
        }
        for indices in self.by_topic.values_mut() {
            indices.retain(|i| *i < len);
        }
        self.by_address.retain(|_, v| !v.is_empty());
        self.by_topic.retain(|_, v| !v.is_empty());
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<EventLog> {
        indices
            .map(|ids| ids.iter().map(|&i| self.logs[i].clone()).collect())
            .unwrap_or_default()
    }
}

/// Event log manager
///
/// Append-only log store indexed by emitting address and by topic. Logs are
/// only ever removed from the tail, when a transaction reverts.
pub struct LogManager {
    inner: Arc<RwLock<LogIndex>>,
}

impl LogManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(LogIndex::default())),
        }
    }

    /// Emit a log, returning its global index
    pub async fn emit(&self, log: EventLog) -> LedgerResult<usize> {
        log.validate()?;

        let topics = log.topics.len();
        let data_len = log.data.len();
        let address = log.address;
        let index = self.inner.write().await.push(log);

        info!(
            "Emitted event: address={}, topics={}, data_len={}",
            address, topics, data_len
        );
        Ok(index)
    }

    pub async fn get_all_logs(&self) -> Vec<EventLog> {
        self.inner.read().await.logs.clone()
    }

    /// Logs starting at a global index (used to slice one transaction's logs)
    pub async fn logs_since(&self, start: usize) -> Vec<EventLog> {
        let inner = self.inner.read().await;
        inner.logs.get(start..).map(|s| s.to_vec()).unwrap_or_default()
    }

    pub async fn get_logs_by_address(&self, address: &Address) -> Vec<EventLog> {
        let inner = self.inner.read().await;
        inner.collect(inner.by_address.get(address))
    }

    pub async fn get_logs_by_topic(&self, topic: &Hash) -> Vec<EventLog> {
        let inner = self.inner.read().await;
        inner.collect(inner.by_topic.get(topic))
    }

    /// Filter logs by address and positional topics (`None` matches anything)
    pub async fn filter_logs(
        &self,
        address: Option<&Address>,
        topics: &[Option<Hash>],
    ) -> Vec<EventLog> {
        let mut logs = match address {
            Some(addr) => self.get_logs_by_address(addr).await,
            None => self.get_all_logs().await,
        };

        for (i, topic_opt) in topics.iter().enumerate() {
            if let Some(topic) = topic_opt {
                logs.retain(|log| log.topics.get(i) == Some(topic));
            }
        }

        logs
    }

    /// Drop every log at or after `len`
    pub async fn truncate(&self, len: usize) {
        self.inner.write().await.truncate(len);
        debug!("Truncated event logs to {}", len);
    }

    pub async fn log_count(&self) -> usize {
        self.inner.read().await.logs.len()
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_address(byte: u8) -> Address {
        Address([byte; 20])
    }

    fn create_test_hash(byte: u8) -> Hash {
        Hash([byte; 32])
    }

    #[test]
    fn test_log_validation() {
        let addr = create_test_address(1);
        let topic0 = create_test_hash(10);

        let ok = EventLog::new(addr, vec![topic0; 4], vec![]);
        assert!(ok.validate().is_ok());

        let invalid = EventLog::new(addr, vec![topic0; 5], vec![1, 2, 3]);
        assert_eq!(invalid.validate(), Err(LedgerError::TooManyTopics(5)));
    }

    #[tokio::test]
    async fn test_log_manager_emit() {
        let manager = LogManager::new();
        let addr = create_test_address(1);
        let topic0 = create_test_hash(10);

        let idx = manager
            .emit(EventLog::new(addr, vec![topic0], vec![1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(idx, 0);

        let idx = manager
            .emit(EventLog::new(create_test_address(2), vec![], vec![4, 5]))
            .await
            .unwrap();
        assert_eq!(idx, 1);
        assert_eq!(manager.log_count().await, 2);
    }

    #[tokio::test]
    async fn test_filter_by_address_and_topic() {
        let manager = LogManager::new();
        let addr1 = create_test_address(1);
        let addr2 = create_test_address(2);
        let topic0 = create_test_hash(10);
        let topic1 = create_test_hash(11);

        manager.emit(EventLog::new(addr1, vec![topic0], vec![])).await.unwrap();
        manager.emit(EventLog::new(addr2, vec![topic0, topic1], vec![])).await.unwrap();
        manager.emit(EventLog::new(addr1, vec![topic1], vec![])).await.unwrap();

        assert_eq!(manager.get_logs_by_address(&addr1).await.len(), 2);
        assert_eq!(manager.get_logs_by_address(&addr2).await.len(), 1);
        assert_eq!(manager.get_logs_by_topic(&topic0).await.len(), 2);

        // topic1 in position 1 only matches the second log
        let positional = manager.filter_logs(None, &[None, Some(topic1)]).await;
        assert_eq!(positional.len(), 1);
        assert_eq!(positional[0].address, addr2);

        let scoped = manager.filter_logs(Some(&addr1), &[Some(topic1)]).await;
        assert_eq!(scoped.len(), 1);
    }

    #[tokio::test]
    async fn test_truncate_drops_tail_and_indexes() {
        let manager = LogManager::new();
        let addr = create_test_address(1);
        let topic0 = create_test_hash(10);
        let topic1 = create_test_hash(11);

        manager.emit(EventLog::new(addr, vec![topic0], vec![])).await.unwrap();
        manager.emit(EventLog::new(addr, vec![topic1], vec![])).await.unwrap();

        manager.truncate(1).await;
        assert_eq!(manager.log_count().await, 1);
        assert!(manager.get_logs_by_topic(&topic1).await.is_empty());
        assert_eq!(manager.get_logs_by_address(&addr).await.len(), 1);
        assert_eq!(manager.logs_since(0).await.len(), 1);
        assert!(manager.logs_since(5).await.is_empty());
    }
}
