//! Protocol revisions and interpreter configuration

use crate::gas::cost;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Protocol upgrade whose rules the interpreter follows.
///
/// Ordered by activation, so `revision >= Revision::Berlin` reads as "Berlin
/// rules are active".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Revision {
    /// Launch rules
    Frontier,
    /// DELEGATECALL, failing code deposit
    Homestead,
    /// 63/64 call gas, repriced state access
    TangerineWhistle,
    /// Code size limit, EXP repricing, blank-account rules
    SpuriousDragon,
    /// REVERT, STATICCALL, return data
    Byzantium,
    /// Shifts, CREATE2, EXTCODEHASH
    Constantinople,
    /// Constantinople without net storage metering
    Petersburg,
    /// CHAINID, SELFBALANCE, repricing
    Istanbul,
    /// Cold access costs
    Berlin,
    /// BASEFEE, smaller refunds, 0xEF code rejection
    London,
    /// PUSH0, init code limit
    Shanghai,
    /// Transient storage, MCOPY, restricted SELFDESTRUCT
    #[default]
    Cancun,
}

impl Revision {
    /// Every revision in activation order
    pub const ALL: [Revision; 12] = [
        Revision::Frontier,
        Revision::Homestead,
        Revision::TangerineWhistle,
        Revision::SpuriousDragon,
        Revision::Byzantium,
        Revision::Constantinople,
        Revision::Petersburg,
        Revision::Istanbul,
        Revision::Berlin,
        Revision::London,
        Revision::Shanghai,
        Revision::Cancun,
    ];

    /// Canonical name
    pub fn name(self) -> &'static str {
        match self {
            Revision::Frontier => "Frontier",
            Revision::Homestead => "Homestead",
            Revision::TangerineWhistle => "TangerineWhistle",
            Revision::SpuriousDragon => "SpuriousDragon",
            Revision::Byzantium => "Byzantium",
            Revision::Constantinople => "Constantinople",
            Revision::Petersburg => "Petersburg",
            Revision::Istanbul => "Istanbul",
            Revision::Berlin => "Berlin",
            Revision::London => "London",
            Revision::Shanghai => "Shanghai",
            Revision::Cancun => "Cancun",
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognised revision name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown revision: {0}")]
pub struct UnknownRevision(pub String);

impl FromStr for Revision {
    type Err = UnknownRevision;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Revision::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownRevision(s.to_string()))
    }
}

/// How SELFDESTRUCT disposes of the executing account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfDestructPolicy {
    /// Move the balance to the beneficiary and delete the account at
    /// transaction end. A self-beneficiary burns the balance.
    DeferredDelete,
    /// Move the balance; delete only accounts created in the same transaction.
    SameTransactionOnly,
}

/// Interpreter configuration, fixed for the lifetime of a call tree.
///
/// Deserializing requires only `revision`; every other field defaults to the
/// value that revision implies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ConfigOverrides")]
pub struct VmConfig {
    /// Active protocol rules
    pub revision: Revision,
    /// Deepest allowed call frame
    pub max_call_depth: usize,
    /// Deployed code limit
    pub max_code_size: Option<usize>,
    /// Init code limit
    pub max_initcode_size: Option<usize>,
    /// Refunds are capped at `gas_used / refund_quotient`
    pub refund_quotient: u64,
    /// SELFDESTRUCT semantics
    pub selfdestruct: SelfDestructPolicy,
}

impl VmConfig {
    /// Configuration implied by a revision
    pub fn new(revision: Revision) -> Self {
        Self {
            revision,
            max_call_depth: cost::MAX_CALL_DEPTH,
            max_code_size: (revision >= Revision::SpuriousDragon).then_some(cost::MAX_CODE_SIZE),
            max_initcode_size: (revision >= Revision::Shanghai)
                .then_some(cost::MAX_INITCODE_SIZE),
            refund_quotient: if revision >= Revision::London { 5 } else { 2 },
            selfdestruct: if revision >= Revision::Cancun {
                SelfDestructPolicy::SameTransactionOnly
            } else {
                SelfDestructPolicy::DeferredDelete
            },
        }
    }
}

impl Default for VmConfig {
    fn default() -> Self {
        Self::new(Revision::default())
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigOverrides {
    #[serde(default)]
    revision: Revision,
    max_call_depth: Option<usize>,
    max_code_size: Option<usize>,
    max_initcode_size: Option<usize>,
    refund_quotient: Option<u64>,
    selfdestruct: Option<SelfDestructPolicy>,
}

impl From<ConfigOverrides> for VmConfig {
    fn from(raw: ConfigOverrides) -> Self {
        let mut config = VmConfig::new(raw.revision);
        if let Some(depth) = raw.max_call_depth {
            config.max_call_depth = depth;
        }
        if raw.max_code_size.is_some() {
            config.max_code_size = raw.max_code_size;
        }
        if raw.max_initcode_size.is_some() {
            config.max_initcode_size = raw.max_initcode_size;
        }
        if let Some(quotient) = raw.refund_quotient {
            config.refund_quotient = quotient.max(1);
        }
        if let Some(policy) = raw.selfdestruct {
            config.selfdestruct = policy;
        }
        config
    }
}
