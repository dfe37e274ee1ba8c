//! Stylus program records and the cache manager set.
//!
//! Activation itself happens on the host; this module only reads and rewrites what activation
//! left behind, which is all the cache precompile needs.

use revm::{
    interpreter::gas::WARM_STORAGE_READ_COST,
    primitives::{B256, U256},
};

use crate::{
    constants::{
        ARBITRUM_START_TIME, ARBOS_VERSION_31, ARBOS_VERSION_40, INITIAL_CACHED_COST_SCALAR,
        INITIAL_EXPIRY_DAYS, INITIAL_FREE_PAGES, INITIAL_INIT_COST_SCALAR, INITIAL_INK_PRICE,
        INITIAL_KEEPALIVE_DAYS, INITIAL_MAX_STACK_DEPTH, INITIAL_MAX_WASM_SIZE,
        INITIAL_MIN_CACHED_GAS, INITIAL_MIN_INIT_GAS, INITIAL_PAGE_GAS, INITIAL_PAGE_LIMIT,
        INITIAL_RECENT_CACHE_SIZE, INITIAL_STYLUS_VERSION,
    },
    state::types::{ArbosStateError, Storage, StorageBacked, StorageBackedAddressSet, StorageWord},
    world_state::WorldState,
};

const PROGRAMS_PARAMS_KEY: &[u8] = &[0];
const PROGRAMS_DATA_KEY: &[u8] = &[1];
const PROGRAMS_CACHE_MANAGERS_KEY: &[u8] = &[4];

const SECONDS_PER_HOUR: u64 = 60 * 60;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
const MAX_U24: u64 = (1 << 24) - 1;

fn read_u16(bytes: &[u8; 32], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

fn read_u24(bytes: &[u8; 32], at: usize) -> u32 {
    u32::from_be_bytes([0, bytes[at], bytes[at + 1], bytes[at + 2]])
}

fn read_u32(bytes: &[u8; 32], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Chain-wide Stylus settings, packed left-aligned into one word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StylusParams {
    pub version: u16,
    pub ink_price: u32,
    pub max_stack_depth: u32,
    pub free_pages: u16,
    pub page_gas: u16,
    pub page_limit: u16,
    pub min_init_gas: u8,
    pub min_cached_init_gas: u8,
    pub init_cost_scalar: u8,
    pub cached_cost_scalar: u8,
    pub expiry_days: u16,
    pub keepalive_days: u16,
    pub block_cache_size: u16,
    /// Zero before ArbOS 40.
    pub max_wasm_size: u32,
}

impl StylusParams {
    /// Settings in force right after Stylus is switched on at `arbos_version`.
    pub fn initial(arbos_version: u64) -> Self {
        Self {
            version: if arbos_version >= ARBOS_VERSION_31 {
                2
            } else {
                INITIAL_STYLUS_VERSION
            },
            ink_price: INITIAL_INK_PRICE,
            max_stack_depth: INITIAL_MAX_STACK_DEPTH,
            free_pages: INITIAL_FREE_PAGES,
            page_gas: INITIAL_PAGE_GAS,
            page_limit: INITIAL_PAGE_LIMIT,
            min_init_gas: INITIAL_MIN_INIT_GAS,
            min_cached_init_gas: INITIAL_MIN_CACHED_GAS,
            init_cost_scalar: INITIAL_INIT_COST_SCALAR,
            cached_cost_scalar: INITIAL_CACHED_COST_SCALAR,
            expiry_days: INITIAL_EXPIRY_DAYS,
            keepalive_days: INITIAL_KEEPALIVE_DAYS,
            block_cache_size: INITIAL_RECENT_CACHE_SIZE,
            max_wasm_size: if arbos_version >= ARBOS_VERSION_40 {
                INITIAL_MAX_WASM_SIZE
            } else {
                0
            },
        }
    }

    #[inline]
    pub fn expiry_seconds(&self) -> u64 {
        u64::from(self.expiry_days) * SECONDS_PER_DAY
    }
}

impl StorageWord for StylusParams {
    fn from_word(word: U256) -> Self {
        let bytes = word.to_be_bytes::<32>();
        Self {
            version: read_u16(&bytes, 0),
            ink_price: read_u24(&bytes, 2),
            max_stack_depth: read_u32(&bytes, 5),
            free_pages: read_u16(&bytes, 9),
            page_gas: read_u16(&bytes, 11),
            page_limit: read_u16(&bytes, 13),
            min_init_gas: bytes[15],
            min_cached_init_gas: bytes[16],
            init_cost_scalar: bytes[17],
            cached_cost_scalar: bytes[18],
            expiry_days: read_u16(&bytes, 19),
            keepalive_days: read_u16(&bytes, 21),
            block_cache_size: read_u16(&bytes, 23),
            max_wasm_size: read_u32(&bytes, 25),
        }
    }

    fn into_word(self) -> U256 {
        let mut bytes = [0u8; 32];
        bytes[0..2].copy_from_slice(&self.version.to_be_bytes());
        bytes[2..5].copy_from_slice(&self.ink_price.to_be_bytes()[1..]);
        bytes[5..9].copy_from_slice(&self.max_stack_depth.to_be_bytes());
        bytes[9..11].copy_from_slice(&self.free_pages.to_be_bytes());
        bytes[11..13].copy_from_slice(&self.page_gas.to_be_bytes());
        bytes[13..15].copy_from_slice(&self.page_limit.to_be_bytes());
        bytes[15] = self.min_init_gas;
        bytes[16] = self.min_cached_init_gas;
        bytes[17] = self.init_cost_scalar;
        bytes[18] = self.cached_cost_scalar;
        bytes[19..21].copy_from_slice(&self.expiry_days.to_be_bytes());
        bytes[21..23].copy_from_slice(&self.keepalive_days.to_be_bytes());
        bytes[23..25].copy_from_slice(&self.block_cache_size.to_be_bytes());
        bytes[25..29].copy_from_slice(&self.max_wasm_size.to_be_bytes());
        U256::from_be_bytes(bytes)
    }
}

/// What activation recorded for one code hash. A zero word reads as version 0, i.e. never
/// activated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub version: u16,
    pub init_cost: u16,
    pub cached_cost: u16,
    pub footprint: u16,
    /// Hours since [`ARBITRUM_START_TIME`], 24 bits.
    pub activated_at: u32,
    pub asm_estimate_kb: u32,
    pub cached: bool,
}

impl Program {
    pub fn age_seconds(&self, timestamp: u64) -> u64 {
        let activated = ARBITRUM_START_TIME
            .saturating_add(u64::from(self.activated_at).saturating_mul(SECONDS_PER_HOUR));
        timestamp.saturating_sub(activated)
    }
}

/// Hours elapsed since [`ARBITRUM_START_TIME`], clamped to 24 bits.
pub fn hours_since_arbitrum(timestamp: u64) -> u32 {
    let hours = timestamp.saturating_sub(ARBITRUM_START_TIME) / SECONDS_PER_HOUR;
    hours.min(MAX_U24) as u32
}

impl StorageWord for Program {
    fn from_word(word: U256) -> Self {
        let bytes = word.to_be_bytes::<32>();
        Self {
            version: read_u16(&bytes, 0),
            init_cost: read_u16(&bytes, 2),
            cached_cost: read_u16(&bytes, 4),
            footprint: read_u16(&bytes, 6),
            activated_at: read_u24(&bytes, 8),
            asm_estimate_kb: read_u24(&bytes, 11),
            cached: bytes[14] != 0,
        }
    }

    fn into_word(self) -> U256 {
        let mut bytes = [0u8; 32];
        bytes[0..2].copy_from_slice(&self.version.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.init_cost.to_be_bytes());
        bytes[4..6].copy_from_slice(&self.cached_cost.to_be_bytes());
        bytes[6..8].copy_from_slice(&self.footprint.to_be_bytes());
        bytes[8..11].copy_from_slice(&self.activated_at.to_be_bytes()[1..]);
        bytes[11..14].copy_from_slice(&self.asm_estimate_kb.to_be_bytes()[1..]);
        bytes[14] = u8::from(self.cached);
        U256::from_be_bytes(bytes)
    }
}

pub struct Programs<'a, W> {
    storage: Storage<'a, W>,
}

impl<'a, W: WorldState> Programs<'a, W> {
    pub fn new(storage: Storage<'a, W>) -> Self {
        Self { storage }
    }

    pub fn initialize(&mut self, arbos_version: u64) -> Result<(), ArbosStateError> {
        self.set_params(StylusParams::initial(arbos_version))
    }

    /// Reads the params for a flat warm-read charge.
    pub fn params(&mut self) -> Result<StylusParams, ArbosStateError> {
        self.storage.burn(WARM_STORAGE_READ_COST)?;
        self.storage
            .open(PROGRAMS_PARAMS_KEY)
            .at_unmetered::<StylusParams>(0)
            .get()
    }

    pub fn set_params(&mut self, params: StylusParams) -> Result<(), ArbosStateError> {
        self.storage
            .open(PROGRAMS_PARAMS_KEY)
            .at::<StylusParams>(0)
            .set(params)
    }

    pub fn program(&mut self, code_hash: B256) -> StorageBacked<'_, W, Program> {
        self.storage.open(PROGRAMS_DATA_KEY).at_key_owned(code_hash)
    }

    pub fn cache_managers(&mut self) -> StorageBackedAddressSet<'_, W> {
        StorageBackedAddressSet::new(self.storage.open(PROGRAMS_CACHE_MANAGERS_KEY))
    }
}
