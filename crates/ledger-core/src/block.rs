use crate::constants::HASH_HEX_SIZE;
use crate::error::{LedgerError, Result};
use crate::hasher;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A 64-character seal hash. Construction is the only place the width is checked.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SealHash(String);

impl SealHash {
    /// All-zero placeholder carried by a block until it is sealed.
    pub fn pending() -> Self {
        Self("0".repeat(HASH_HEX_SIZE))
    }

    pub fn is_pending(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SealHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SealHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SealHash {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SealHash {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl TryFrom<String> for SealHash {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self> {
        let length = value.chars().count();
        if length != HASH_HEX_SIZE {
            return Err(LedgerError::InvalidSealLength { length });
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for SealHash {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self> {
        Self::try_from(value.to_owned())
    }
}

impl TryFrom<&String> for SealHash {
    type Error = LedgerError;

    fn try_from(value: &String) -> Result<Self> {
        Self::try_from(value.clone())
    }
}

/// Dynamically typed input, e.g. a hash field decoded from JSON.
impl TryFrom<serde_json::Value> for SealHash {
    type Error = LedgerError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        use serde_json::Value;
        match value {
            Value::String(s) => Self::try_from(s),
            other => Err(LedgerError::InvalidSealType {
                found: json_type_name(&other),
            }),
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Serialize for SealHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SealHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        SealHash::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn now_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    transactions: Vec<String>,
    timestamp: f64,
    previous_hash: String,
    nonce: u64,
    hash: SealHash,
}

impl Block {
    pub fn new(
        index: u64,
        transactions: Vec<String>,
        timestamp: f64,
        previous_hash: impl Into<String>,
    ) -> Self {
        Self::with_nonce(index, transactions, timestamp, previous_hash, 0)
    }

    pub fn with_nonce(
        index: u64,
        transactions: Vec<String>,
        timestamp: f64,
        previous_hash: impl Into<String>,
        nonce: u64,
    ) -> Self {
        Self {
            index,
            transactions,
            timestamp,
            previous_hash: previous_hash.into(),
            nonce,
            hash: SealHash::pending(),
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn transactions(&self) -> &[String] {
        &self.transactions
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Only the proof-of-work search moves the nonce.
    pub(crate) fn set_nonce(&mut self, nonce: u64) {
        self.nonce = nonce;
    }

    pub fn seal_hash(&self) -> &SealHash {
        &self.hash
    }

    /// Stores `value` as the seal hash after checking its type and width.
    ///
    /// Whether the value is a valid proof for this block is the ledger's concern.
    pub fn set_seal_hash<V>(&mut self, value: V) -> Result<()>
    where
        V: TryInto<SealHash, Error = LedgerError>,
    {
        self.hash = value.try_into()?;
        Ok(())
    }

    pub fn canonical_bytes(&self) -> Vec<u8> {
        hasher::canonical_bytes(
            self.index,
            &self.transactions,
            self.timestamp,
            &self.previous_hash,
            self.nonce,
        )
    }

    /// Digest of the committed fields as lowercase hex. Never includes the seal hash.
    pub fn compute_hash(&self) -> String {
        hasher::digest_hex(&self.canonical_bytes())
    }

    pub fn summary(&self) -> String {
        self.to_string()
    }

    #[cfg(test)]
    pub(crate) fn transactions_mut(&mut self) -> &mut Vec<String> {
        &mut self.transactions
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block #{} -> data {:?}", self.index, self.transactions)
    }
}
