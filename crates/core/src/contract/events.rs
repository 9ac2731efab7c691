//! Events emitted by the faucet

use crate::abi::{ABI, WORD_SIZE};
use crate::error::{AbiError, AbiResult};
use crate::ledger::EventLog;
use faucet_common::types::{Address, Hash};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Canonical signature of the fallback notification
pub const FALLBACK_CALLED_SIGNATURE: &str = "FallbackCalled(address,uint256,bytes)";

/// `FallbackCalled(address indexed sender, uint256 value, bytes data)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackCalled {
    pub sender: Address,
    pub value: BigUint,
    pub data: Vec<u8>,
}

impl FallbackCalled {
    /// Event topic0
    pub fn topic() -> Hash {
        ABI::event_signature_hash(FALLBACK_CALLED_SIGNATURE)
    }

    /// Encode as a log emitted by `contract`
    pub fn to_log(&self, contract: Address) -> AbiResult<EventLog> {
        let sender_topic = Hash(ABI::encode_address(&self.sender));

        let mut data = Vec::with_capacity(3 * WORD_SIZE + self.data.len());
        data.extend_from_slice(&ABI::encode_uint(&self.value)?);
        // Offset of the dynamic `bytes` tail, past the two head words
        data.extend_from_slice(&ABI::encode_uint(&BigUint::from(2 * WORD_SIZE))?);
        data.extend_from_slice(&ABI::encode_bytes(&self.data));

        Ok(EventLog::new(contract, vec![Self::topic(), sender_topic], data))
    }

    /// Parse a log back into the event; `None` when the log is another event
    pub fn decode_log(log: &EventLog) -> AbiResult<Option<Self>> {
        if log.topics.first() != Some(&Self::topic()) {
            return Ok(None);
        }
        let sender_topic = log
            .topics
            .get(1)
            .ok_or_else(|| AbiError::Invalid("missing indexed sender".to_string()))?;

        let sender = ABI::decode_address(&sender_topic.0, 0)?;
        let value = ABI::decode_uint(&log.data, 0)?;
        let offset = ABI::decode_usize(&log.data, WORD_SIZE)?;
        let data = ABI::decode_bytes(&log.data, offset)?;

        Ok(Some(Self {
            sender,
            value,
            data,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_layout() {
        let event = FallbackCalled {
            sender: Address([0x22; 20]),
            value: BigUint::from(7u32),
            data: vec![0xf0, 0x28],
        };
        let log = event.to_log(Address([0x11; 20])).unwrap();

        assert_eq!(log.address, Address([0x11; 20]));
        assert_eq!(log.topics.len(), 2);
        assert_eq!(log.topics[0], FallbackCalled::topic());
        // value, offset, length, one padded word of data
        assert_eq!(log.data.len(), 4 * WORD_SIZE);
        assert_eq!(log.data[WORD_SIZE * 2 - 1], 0x40);

        assert_eq!(FallbackCalled::decode_log(&log).unwrap(), Some(event));
    }

    #[test]
    fn test_decode_ignores_other_events() {
        let log = EventLog::new(Address([1; 20]), vec![Hash([9; 32])], vec![]);
        assert_eq!(FallbackCalled::decode_log(&log).unwrap(), None);
    }

    #[test]
    fn test_decode_rejects_truncated_data() {
        let log = EventLog::new(
            Address([1; 20]),
            vec![FallbackCalled::topic(), Hash(ABI::encode_address(&Address([2; 20])))],
            vec![0u8; 16],
        );
        assert!(FallbackCalled::decode_log(&log).is_err());
    }
}
