//! Minimal ABI encoding for the factory calls.
//!
//! Only the parameter kinds the suite factory uses are supported. Every parameter
//! occupies a single head word; dynamic values are referenced by offset and appended
//! to the tail.

use alloy_core::primitives::{Address, B256, Bytes, U256, keccak256};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("return data too short: expected at least 32 bytes, got {0}")]
    ShortReturnData(usize),

    #[error("return data is not a left-padded address: 0x{0}")]
    DirtyAddressPadding(String),
}

/// A single ABI-encodable call parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    FixedBytes(B256),
    Uint(U256),
    String(String),
    UintArray(Vec<U256>),
    AddressArray(Vec<Address>),
}

impl Token {
    /// Head word of a static token, `None` for dynamic tokens.
    fn static_word(&self) -> Option<B256> {
        match self {
            Token::Address(addr) => Some(address_word(addr)),
            Token::FixedBytes(word) => Some(*word),
            Token::Uint(value) => Some(uint_word(*value)),
            Token::String(_) | Token::UintArray(_) | Token::AddressArray(_) => None,
        }
    }

    /// Tail encoding of a dynamic token.
    fn tail(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Token::String(text) => {
                let bytes = text.as_bytes();
                out.extend_from_slice(uint_word(U256::from(bytes.len())).as_slice());
                out.extend_from_slice(bytes);
                out.resize(32 + bytes.len().div_ceil(32) * 32, 0);
            }
            Token::UintArray(values) => {
                out.extend_from_slice(uint_word(U256::from(values.len())).as_slice());
                for value in values {
                    out.extend_from_slice(uint_word(*value).as_slice());
                }
            }
            Token::AddressArray(addrs) => {
                out.extend_from_slice(uint_word(U256::from(addrs.len())).as_slice());
                for addr in addrs {
                    out.extend_from_slice(address_word(addr).as_slice());
                }
            }
            Token::Address(_) | Token::FixedBytes(_) | Token::Uint(_) => {}
        }
        out
    }
}

fn uint_word(value: U256) -> B256 {
    B256::from(value.to_be_bytes::<32>())
}

fn address_word(addr: &Address) -> B256 {
    B256::left_padding_from(addr.as_slice())
}

/// The 4-byte selector of a canonical function signature, e.g. `getToken(bytes32)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// ABI-encode a call: selector followed by the head/tail encoded parameters.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Bytes {
    let head_len = tokens.len() * 32;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token.static_word() {
            Some(word) => head.extend_from_slice(word.as_slice()),
            None => {
                let offset = U256::from(head_len + tail.len());
                head.extend_from_slice(uint_word(offset).as_slice());
                tail.extend(token.tail());
            }
        }
    }

    let mut calldata = Vec::with_capacity(4 + head.len() + tail.len());
    calldata.extend_from_slice(&selector(signature));
    calldata.extend(head);
    calldata.extend(tail);
    calldata.into()
}

/// Decode a function return value consisting of a single `address`.
pub fn decode_address(data: &[u8]) -> Result<Address, AbiError> {
    if data.len() < 32 {
        return Err(AbiError::ShortReturnData(data.len()));
    }
    if data[..12].iter().any(|b| *b != 0) {
        return Err(AbiError::DirtyAddressPadding(hex::encode(&data[..32])));
    }
    Ok(Address::from_slice(&data[12..32]))
}
