use crate::constants::INITIAL_ARBOS_VERSION;

/// Chain-level settings every precompile call sees.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct ArbitrumConfig {
    /// ArbOS version the chain is currently running.
    pub arbos_version: u64,
    pub chain_id: u64,
}

impl ArbitrumConfig {
    pub fn new(chain_id: u64, arbos_version: u64) -> Self {
        Self {
            arbos_version,
            chain_id,
        }
    }

    pub fn with_arbos_version(mut self, arbos_version: u64) -> Self {
        self.arbos_version = arbos_version;
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }
}

impl Default for ArbitrumConfig {
    fn default() -> Self {
        Self {
            arbos_version: INITIAL_ARBOS_VERSION,
            chain_id: 412_346,
        }
    }
}
