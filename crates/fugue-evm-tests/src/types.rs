//! JSON fixture format

use fugue_evm::Revision;
use fugue_primitives::{Address, H256, U256};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

fn hex_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let s: String = Deserialize::deserialize(deserializer)?;
    Ok(s.strip_prefix("0x").unwrap_or(&s).to_string())
}

/// Hex-encoded bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = hex_str(deserializer)?;
        hex::decode(s).map(HexBytes).map_err(serde::de::Error::custom)
    }
}

/// Hex-encoded word; odd lengths and an empty string are accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct HexU256(pub U256);

impl<'de> Deserialize<'de> for HexU256 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = hex_str(deserializer)?;
        if s.is_empty() {
            return Ok(HexU256(U256::zero()));
        }
        U256::from_str_radix(&s, 16)
            .map(HexU256)
            .map_err(|e| serde::de::Error::custom(format!("invalid word {s}: {e:?}")))
    }
}

/// Hex-encoded u64
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HexU64(pub u64);

impl<'de> Deserialize<'de> for HexU64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = hex_str(deserializer)?;
        if s.is_empty() {
            return Ok(HexU64(0));
        }
        u64::from_str_radix(&s, 16)
            .map(HexU64)
            .map_err(serde::de::Error::custom)
    }
}

/// Fixture file: test name to case
pub type VmTestFile = BTreeMap<String, VmTestCase>;

/// One interpreter fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VmTestCase {
    /// Block values
    #[serde(default)]
    pub env: VmEnv,
    /// Message to run
    pub exec: VmExec,
    /// Rules to run under; the runner's default when absent
    pub revision: Option<Revision>,
    /// Expected outcome; success is expected when `post` is given
    pub success: Option<bool>,
    /// Expected gas remaining after refunds
    pub gas: Option<HexU64>,
    /// Expected number of logs
    pub logs: Option<usize>,
    /// Expected output
    pub out: Option<HexBytes>,
    /// Accounts before execution
    #[serde(default)]
    pub pre: BTreeMap<Address, FixtureAccount>,
    /// Expected accounts after execution; only the fields given are checked
    pub post: Option<BTreeMap<Address, FixtureAccount>>,
}

impl VmTestCase {
    /// Whether the fixture expects the message to succeed
    pub fn expects_success(&self) -> bool {
        self.success.unwrap_or(self.post.is_some())
    }
}

/// Block values
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VmEnv {
    /// COINBASE
    pub current_coinbase: Address,
    /// NUMBER
    pub current_number: HexU64,
    /// TIMESTAMP
    pub current_timestamp: HexU64,
    /// GASLIMIT; 30M when absent
    pub current_gas_limit: Option<HexU64>,
    /// BASEFEE
    pub current_base_fee: HexU256,
    /// PREVRANDAO
    pub current_random: H256,
    /// CHAINID; 1 when absent
    pub chain_id: Option<HexU64>,
}

/// Message parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmExec {
    /// Account the code runs as
    pub address: Address,
    /// CALLER
    pub caller: Address,
    /// ORIGIN; the caller when absent
    pub origin: Option<Address>,
    /// Code installed at `address` before the run
    pub code: HexBytes,
    /// Call data
    #[serde(default)]
    pub data: HexBytes,
    /// Gas limit
    pub gas: HexU64,
    /// GASPRICE
    #[serde(default)]
    pub gas_price: HexU256,
    /// Value moved from caller to address
    #[serde(default)]
    pub value: HexU256,
}

/// Account in `pre` or `post`
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixtureAccount {
    /// Balance
    pub balance: Option<HexU256>,
    /// Nonce
    pub nonce: Option<HexU64>,
    /// Code
    pub code: Option<HexBytes>,
    /// Non-zero storage slots
    pub storage: Option<BTreeMap<HexU256, HexU256>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_bytes_deserialize() {
        let bytes: HexBytes = serde_json::from_str(r#""0x1234""#).unwrap();
        assert_eq!(bytes.0, vec![0x12, 0x34]);

        let bytes: HexBytes = serde_json::from_str(r#""0x""#).unwrap();
        assert!(bytes.0.is_empty());
    }

    #[test]
    fn test_hex_word_deserialize() {
        let value: HexU256 = serde_json::from_str(r#""0x1""#).unwrap();
        assert_eq!(value.0, U256::one());

        let value: HexU256 = serde_json::from_str(r#""ff00""#).unwrap();
        assert_eq!(value.0, U256::from(0xff00u64));

        assert!(serde_json::from_str::<HexU256>(r#""0xzz""#).is_err());
    }

    #[test]
    fn test_hex_u64_deserialize() {
        let value: HexU64 = serde_json::from_str(r#""0x100""#).unwrap();
        assert_eq!(value.0, 256);
    }

    #[test]
    fn test_case_deserialize() {
        let json = r#"{
            "revision": "Berlin",
            "exec": {
                "address": "0x0f572e5295c57f15886f9b263e2f6d2d6c7b5ec6",
                "caller": "0xcd1722f3947def4cf144679da39c4c32bdc35681",
                "code": "0x00",
                "gas": "0x0186a0"
            },
            "pre": {
                "0xcd1722f3947def4cf144679da39c4c32bdc35681": { "balance": "0x0de0b6b3a7640000" }
            },
            "post": {
                "0x0f572e5295c57f15886f9b263e2f6d2d6c7b5ec6": { "storage": { "0x00": "0x01" } }
            }
        }"#;
        let case: VmTestCase = serde_json::from_str(json).unwrap();
        assert_eq!(case.revision, Some(Revision::Berlin));
        assert_eq!(case.exec.gas.0, 100_000);
        assert!(case.exec.origin.is_none());
        assert!(case.expects_success());
        assert_eq!(case.env.current_number.0, 0);

        let post = case.post.unwrap();
        let account = post.values().next().unwrap();
        assert!(account.balance.is_none());
        assert_eq!(account.storage.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_case_field_rejected() {
        let json = r#"{
            "exec": {
                "address": "0x0f572e5295c57f15886f9b263e2f6d2d6c7b5ec6",
                "caller": "0xcd1722f3947def4cf144679da39c4c32bdc35681",
                "code": "0x00",
                "gas": "0x01"
            },
            "expect": {}
        }"#;
        assert!(serde_json::from_str::<VmTestCase>(json).is_err());
    }
}
