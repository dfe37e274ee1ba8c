use revm::primitives::{Address, address};

/// Account whose storage holds every piece of ArbOS state.
pub const ARBOS_STATE_ADDRESS: Address = address!("0xA4B05FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF");
/// Pool collecting L1 data fees before they are recognized as available.
pub const ARBOS_L1_PRICER_FUNDS_ADDRESS: Address =
    address!("0xA4B00000000000000000000000000000000000f6");
/// Default batch poster ("sequencer") address.
pub const ARBOS_BATCH_POSTER_ADDRESS: Address =
    address!("0xA4B000000000000000000073657175656e636572");

pub const ARB_SYS_ADDRESS: Address = address!("0x0000000000000000000000000000000000000064");
pub const ARB_INFO_ADDRESS: Address = address!("0x0000000000000000000000000000000000000065");
pub const ARB_ADDRESS_TABLE_ADDRESS: Address =
    address!("0x0000000000000000000000000000000000000066");
pub const ARBOS_TEST_ADDRESS: Address = address!("0x0000000000000000000000000000000000000069");
pub const ARB_OWNER_PUBLIC_ADDRESS: Address =
    address!("0x000000000000000000000000000000000000006b");
pub const ARB_GAS_INFO_ADDRESS: Address = address!("0x000000000000000000000000000000000000006c");
pub const ARB_AGGREGATOR_ADDRESS: Address = address!("0x000000000000000000000000000000000000006d");
pub const ARB_RETRYABLE_TX_ADDRESS: Address =
    address!("0x000000000000000000000000000000000000006e");
pub const ARB_STATISTICS_ADDRESS: Address =
    address!("0x000000000000000000000000000000000000006f");
pub const ARB_OWNER_ADDRESS: Address = address!("0x0000000000000000000000000000000000000070");
pub const ARB_WASM_CACHE_ADDRESS: Address =
    address!("0x0000000000000000000000000000000000000072");

pub const INITIAL_ARBOS_VERSION: u64 = 6;

// ArbOS versions at which behaviour changes.
pub const ARBOS_VERSION_3: u64 = 3;
pub const ARBOS_VERSION_4: u64 = 4;
pub const ARBOS_VERSION_5: u64 = 5;
pub const ARBOS_VERSION_6: u64 = 6;
pub const ARBOS_VERSION_10: u64 = 10;
pub const ARBOS_VERSION_11: u64 = 11;
pub const ARBOS_VERSION_20: u64 = 20;
/// Stylus.
pub const ARBOS_VERSION_30: u64 = 30;
pub const ARBOS_VERSION_31: u64 = 31;
pub const ARBOS_VERSION_40: u64 = 40;
pub const ARBOS_VERSION_41: u64 = 41;
pub const ARBOS_VERSION_50: u64 = 50;

/// Calldata bytes assumed for a simple transaction when quoting per-tx L1 cost.
pub const ASSUMED_SIMPLE_TX_SIZE: u64 = 140;
/// L1 gas charged per non-zero calldata byte.
pub const TX_DATA_NON_ZERO_GAS_EIP2028: u64 = 16;
/// L2 gas an SSTORE to a fresh slot costs.
pub const STORAGE_WRITE_COST: u64 = 20_000;
/// Plain value transfer intrinsic gas.
pub const TX_GAS: u64 = 21_000;

pub const RETRYABLE_LIFETIME_SECONDS: u64 = 7 * 24 * 60 * 60;
/// Gas reserved for reaping one expired retryable.
pub const RETRYABLE_REAP_PRICE: u64 = 58_000;
/// Domain prefix of a retryable's escrow account derivation.
pub const RETRYABLE_ESCROW_PREFIX: &[u8] = b"retryable escrow";

pub const ARBITRUM_UNSIGNED_TX_TYPE: u8 = 0x65;
pub const ARBITRUM_CONTRACT_TX_TYPE: u8 = 0x66;
pub const ARBITRUM_RETRY_TX_TYPE: u8 = 0x68;

/// Added to an L1 contract address to get its L2 alias.
pub const ADDRESS_ALIAS_OFFSET: Address = address!("0x1111000000000000000000000000000000001111");
/// ArbSys reports ArbOS versions shifted by this much.
pub const ARBOS_VERSION_REPORTING_OFFSET: u64 = 55;

/// Friday, January 16, 2015 6:00:00 AM GMT. Program activation times count hours from here.
pub const ARBITRUM_START_TIME: u64 = 1_421_388_000;

/// Delay before a scheduled native token management window may open.
pub const NATIVE_TOKEN_ENABLE_DELAY: u64 = 7 * 24 * 60 * 60;
pub const MAX_BROTLI_COMPRESSION_LEVEL: u64 = 11;

// L1 pricing genesis values.
pub const INITIAL_L1_INERTIA: u64 = 10;
pub const INITIAL_L1_PER_UNIT_REWARD: u64 = 10;
pub const INITIAL_PER_BATCH_GAS_COST_V6: u64 = 100_000;
pub const INITIAL_PER_BATCH_GAS_COST_V12: u64 = 210_000;
pub const INITIAL_EQUILIBRATION_UNITS_V6: u64 = TX_DATA_NON_ZERO_GAS_EIP2028 * 10_000_000;
pub const INITIAL_L1_PRICE_PER_UNIT: u64 = 50 * 1_000_000_000;

// L2 pricing genesis values.
pub const INITIAL_SPEED_LIMIT_PER_SECOND_V6: u64 = 7_000_000;
pub const INITIAL_PER_BLOCK_GAS_LIMIT_V6: u64 = 32_000_000;
pub const INITIAL_PER_TX_GAS_LIMIT: u64 = 32_000_000;
pub const INITIAL_MINIMUM_BASE_FEE_WEI: u64 = 100_000_000;
pub const INITIAL_BASE_FEE_WEI: u64 = INITIAL_MINIMUM_BASE_FEE_WEI;
pub const INITIAL_PRICING_INERTIA: u64 = 102;
pub const INITIAL_BACKLOG_TOLERANCE: u64 = 10;

// Stylus parameters written when programs are first initialized.
pub const INITIAL_STYLUS_VERSION: u16 = 1;
pub const INITIAL_INK_PRICE: u32 = 10_000;
pub const INITIAL_MAX_STACK_DEPTH: u32 = 4 * 65_536;
pub const INITIAL_FREE_PAGES: u16 = 2;
pub const INITIAL_PAGE_GAS: u16 = 1_000;
pub const INITIAL_PAGE_LIMIT: u16 = 128;
pub const INITIAL_MIN_INIT_GAS: u8 = 72;
pub const INITIAL_MIN_CACHED_GAS: u8 = 11;
pub const INITIAL_INIT_COST_SCALAR: u8 = 50;
pub const INITIAL_CACHED_COST_SCALAR: u8 = 50;
pub const INITIAL_EXPIRY_DAYS: u16 = 365;
pub const INITIAL_KEEPALIVE_DAYS: u16 = 31;
pub const INITIAL_RECENT_CACHE_SIZE: u16 = 32;
pub const INITIAL_MAX_WASM_SIZE: u32 = 128 * 1024;
