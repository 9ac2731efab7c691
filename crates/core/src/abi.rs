//! Minimal Ethereum ABI support
//!
//! Only what the faucet interface needs: function selectors, event topics and
//! the static 32-byte word encodings for `uint256`, `address` and `bytes`.

use crate::error::{AbiError, AbiResult};
use faucet_common::types::{Address, Hash, ADDRESS_LENGTH};
use num_bigint::BigUint;

/// Size of one ABI word
pub const WORD_SIZE: usize = 32;

/// Size of a function selector
pub const SELECTOR_SIZE: usize = 4;

/// ABI encoder/decoder
pub struct ABI;

impl ABI {
    /// Calculate function selector (first 4 bytes of signature hash)
    pub fn function_selector(signature: &str) -> [u8; SELECTOR_SIZE] {
        let hash = Self::keccak256(signature.as_bytes());
        let mut selector = [0u8; SELECTOR_SIZE];
        selector.copy_from_slice(&hash[0..SELECTOR_SIZE]);
        selector
    }

    /// Calculate event signature hash (topic0)
    pub fn event_signature_hash(signature: &str) -> Hash {
        Hash(Self::keccak256(signature.as_bytes()))
    }

    /// Build calldata from a signature and already-encoded arguments
    pub fn encode_function_call(signature: &str, args: &[[u8; WORD_SIZE]]) -> Vec<u8> {
        let mut result = Vec::with_capacity(SELECTOR_SIZE + args.len() * WORD_SIZE);
        result.extend_from_slice(&Self::function_selector(signature));
        for word in args {
            result.extend_from_slice(word);
        }
        result
    }

    /// Encode an unsigned integer as a big-endian word
    pub fn encode_uint(value: &BigUint) -> AbiResult<[u8; WORD_SIZE]> {
        let bytes = value.to_bytes_be();
        if bytes.len() > WORD_SIZE {
            return Err(AbiError::Overflow);
        }
        let mut word = [0u8; WORD_SIZE];
        word[WORD_SIZE - bytes.len()..].copy_from_slice(&bytes);
        Ok(word)
    }

    /// Decode the word at `offset` as an unsigned integer
    pub fn decode_uint(data: &[u8], offset: usize) -> AbiResult<BigUint> {
        let word = Self::word_at(data, offset)?;
        Ok(BigUint::from_bytes_be(word))
    }

    /// Encode an address left-padded to one word
    pub fn encode_address(address: &Address) -> [u8; WORD_SIZE] {
        let mut word = [0u8; WORD_SIZE];
        word[WORD_SIZE - ADDRESS_LENGTH..].copy_from_slice(&address.0);
        word
    }

    /// Decode the word at `offset` as an address; the high 12 bytes must be zero
    pub fn decode_address(data: &[u8], offset: usize) -> AbiResult<Address> {
        let word = Self::word_at(data, offset)?;
        if word[..WORD_SIZE - ADDRESS_LENGTH].iter().any(|b| *b != 0) {
            return Err(AbiError::Invalid("address word has dirty high bytes".to_string()));
        }
        let mut addr = [0u8; ADDRESS_LENGTH];
        addr.copy_from_slice(&word[WORD_SIZE - ADDRESS_LENGTH..]);
        Ok(Address(addr))
    }

    /// Encode the tail of a dynamic `bytes` value: length word plus padded data
    pub fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
        let padded_len = bytes.len().div_ceil(WORD_SIZE) * WORD_SIZE;
        let mut result = Vec::with_capacity(WORD_SIZE + padded_len);
        let mut len_word = [0u8; WORD_SIZE];
        len_word[WORD_SIZE - 8..].copy_from_slice(&(bytes.len() as u64).to_be_bytes());
        result.extend_from_slice(&len_word);
        result.extend_from_slice(bytes);
        result.resize(WORD_SIZE + padded_len, 0);
        result
    }

    /// Decode a dynamic `bytes` value whose tail starts at `offset`
    pub fn decode_bytes(data: &[u8], offset: usize) -> AbiResult<Vec<u8>> {
        let len = Self::decode_usize(data, offset)?;
        let start = offset + WORD_SIZE;
        let end = start.checked_add(len).ok_or(AbiError::Overflow)?;
        if end > data.len() {
            return Err(AbiError::DataTooShort {
                offset: start,
                needed: len,
                available: data.len().saturating_sub(start),
            });
        }
        Ok(data[start..end].to_vec())
    }

    /// Decode a word that must fit in a `usize` (lengths and offsets)
    pub fn decode_usize(data: &[u8], offset: usize) -> AbiResult<usize> {
        let word = Self::word_at(data, offset)?;
        if word[..WORD_SIZE - 8].iter().any(|b| *b != 0) {
            return Err(AbiError::Overflow);
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&word[WORD_SIZE - 8..]);
        usize::try_from(u64::from_be_bytes(buf)).map_err(|_| AbiError::Overflow)
    }

    fn word_at(data: &[u8], offset: usize) -> AbiResult<&[u8]> {
        let end = offset.checked_add(WORD_SIZE).ok_or(AbiError::Overflow)?;
        if end > data.len() {
            return Err(AbiError::DataTooShort {
                offset,
                needed: WORD_SIZE,
                available: data.len().saturating_sub(offset),
            });
        }
        Ok(&data[offset..end])
    }

    /// Compute Keccak256 hash
    pub fn keccak256(data: &[u8]) -> [u8; 32] {
        use tiny_keccak::{Hasher, Keccak};
        let mut hasher = Keccak::v256();
        let mut output = [0u8; 32];
        hasher.update(data);
        hasher.finalize(&mut output);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_selector() {
        // Well-known ERC-20 selector
        let selector = ABI::function_selector("transfer(address,uint256)");
        assert_eq!(selector, [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn test_event_signature_hash() {
        let topic = ABI::event_signature_hash("Transfer(address,address,uint256)");
        assert_eq!(
            topic.to_string(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_encode_uint() {
        let word = ABI::encode_uint(&BigUint::from(0x0102u32)).unwrap();
        assert_eq!(word[30], 0x01);
        assert_eq!(word[31], 0x02);
        assert!(word[..30].iter().all(|b| *b == 0));
        assert_eq!(ABI::decode_uint(&word, 0).unwrap(), BigUint::from(0x0102u32));
    }

    #[test]
    fn test_encode_uint_overflow() {
        let too_big = BigUint::from_bytes_be(&[1u8; 33]);
        assert_eq!(ABI::encode_uint(&too_big), Err(AbiError::Overflow));
    }

    #[test]
    fn test_encode_address() {
        let addr = Address([0x11; 20]);
        let word = ABI::encode_address(&addr);
        assert!(word[..12].iter().all(|b| *b == 0));
        assert_eq!(ABI::decode_address(&word, 0).unwrap(), addr);

        let mut dirty = word;
        dirty[0] = 1;
        assert!(ABI::decode_address(&dirty, 0).is_err());
    }

    #[test]
    fn test_bytes_encoding_pads_to_word() {
        let data = vec![0xaa; 33];
        let encoded = ABI::encode_bytes(&data);
        assert_eq!(encoded.len(), 32 + 64);
        assert_eq!(ABI::decode_bytes(&encoded, 0).unwrap(), data);

        let empty = ABI::encode_bytes(&[]);
        assert_eq!(empty.len(), 32);
        assert!(ABI::decode_bytes(&empty, 0).unwrap().is_empty());
    }

    #[test]
    fn test_decode_short_data() {
        let err = ABI::decode_uint(&[0u8; 10], 0).unwrap_err();
        assert_eq!(
            err,
            AbiError::DataTooShort {
                offset: 0,
                needed: 32,
                available: 10
            }
        );
    }

    #[test]
    fn test_encode_function_call() {
        let arg = ABI::encode_uint(&BigUint::from(1u32)).unwrap();
        let data = ABI::encode_function_call("withdraw(uint256)", &[arg]);
        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &ABI::function_selector("withdraw(uint256)"));
    }
}
