//! Fee quotes derived from L1 and L2 pricing state.
//!
//! These functions are pure: handlers read the stored inputs (and pay for the reads) before
//! calling in. Products saturate at `U256::MAX`, differences at zero, and the surplus is
//! computed on signed 256-bit values that saturate instead of wrapping.

use revm::primitives::{I256, U256};

use crate::constants::{
    ARBOS_VERSION_4, ASSUMED_SIMPLE_TX_SIZE, STORAGE_WRITE_COST, TX_DATA_NON_ZERO_GAS_EIP2028,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PricesInWei {
    pub per_l2_tx: U256,
    pub wei_for_l1_calldata: U256,
    pub wei_for_l2_storage: U256,
    pub per_arb_gas_base: U256,
    pub per_arb_gas_congestion: U256,
    pub per_arb_gas_total: U256,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PricesInArbGas {
    pub gas_per_l2_tx: U256,
    pub gas_for_l1_calldata: U256,
    pub gas_for_l2_storage: U256,
}

#[inline]
fn wei_for_l1_calldata(l1_price_per_unit: U256) -> U256 {
    l1_price_per_unit.saturating_mul(U256::from(TX_DATA_NON_ZERO_GAS_EIP2028))
}

pub fn prices_in_wei(
    l1_price_per_unit: U256,
    base_fee: U256,
    min_base_fee: U256,
    arbos_version: u64,
) -> PricesInWei {
    let wei_for_l1_calldata = wei_for_l1_calldata(l1_price_per_unit);
    let per_l2_tx = wei_for_l1_calldata.saturating_mul(U256::from(ASSUMED_SIMPLE_TX_SIZE));
    let wei_for_l2_storage = base_fee.saturating_mul(U256::from(STORAGE_WRITE_COST));

    let per_arb_gas_base = if arbos_version < ARBOS_VERSION_4 {
        base_fee
    } else {
        min_base_fee.min(base_fee)
    };

    PricesInWei {
        per_l2_tx,
        wei_for_l1_calldata,
        wei_for_l2_storage,
        per_arb_gas_base,
        per_arb_gas_congestion: base_fee.saturating_sub(per_arb_gas_base),
        per_arb_gas_total: base_fee,
    }
}

pub fn prices_in_arb_gas(
    l1_price_per_unit: U256,
    base_fee: U256,
    arbos_version: u64,
) -> PricesInArbGas {
    let wei_for_l1_calldata = wei_for_l1_calldata(l1_price_per_unit);
    let wei_per_l2_tx = wei_for_l1_calldata.saturating_mul(U256::from(ASSUMED_SIMPLE_TX_SIZE));

    let (gas_for_l1_calldata, gas_per_l2_tx) = if base_fee.is_zero() {
        (U256::ZERO, U256::ZERO)
    } else {
        (wei_for_l1_calldata / base_fee, wei_per_l2_tx / base_fee)
    };

    PricesInArbGas {
        gas_per_l2_tx: if arbos_version < ARBOS_VERSION_4 {
            U256::from(ASSUMED_SIMPLE_TX_SIZE)
        } else {
            gas_per_l2_tx
        },
        gas_for_l1_calldata,
        gas_for_l2_storage: U256::from(STORAGE_WRITE_COST),
    }
}

/// Funds on hand minus what is owed to batch posters and the reward recipient.
///
/// Saturates at the `I256` bounds; the sign never flips on overflow.
pub fn l1_pricing_surplus(
    funds_available: U256,
    total_funds_due: I256,
    funds_due_for_rewards: I256,
) -> I256 {
    let needed = total_funds_due.saturating_add(funds_due_for_rewards);
    saturating_i256(funds_available).saturating_sub(needed)
}

fn saturating_i256(value: U256) -> I256 {
    I256::try_from(value).unwrap_or(I256::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_follow_base_fee() {
        let prices = prices_in_wei(U256::from(100), U256::from(1_000), U256::from(1_001), 30);
        assert_eq!(prices.wei_for_l1_calldata, U256::from(1_600));
        assert_eq!(prices.per_l2_tx, U256::from(224_000));
        assert_eq!(prices.per_arb_gas_base, U256::from(1_000));
        assert_eq!(prices.per_arb_gas_congestion, U256::ZERO);
        assert_eq!(prices.per_arb_gas_total, U256::from(1_000));
        assert_eq!(prices.wei_for_l2_storage, U256::from(20_000_000));
    }

    #[test]
    fn congestion_is_the_excess_over_minimum() {
        let prices = prices_in_wei(U256::ZERO, U256::from(1_500), U256::from(1_000), 30);
        assert_eq!(prices.per_arb_gas_base, U256::from(1_000));
        assert_eq!(prices.per_arb_gas_congestion, U256::from(500));

        let legacy = prices_in_wei(U256::ZERO, U256::from(1_500), U256::from(1_000), 3);
        assert_eq!(legacy.per_arb_gas_base, U256::from(1_500));
        assert_eq!(legacy.per_arb_gas_congestion, U256::ZERO);
    }

    #[test]
    fn arb_gas_prices_handle_zero_base_fee() {
        let prices = prices_in_arb_gas(U256::from(100), U256::ZERO, 30);
        assert_eq!(prices.gas_per_l2_tx, U256::ZERO);
        assert_eq!(prices.gas_for_l1_calldata, U256::ZERO);
        assert_eq!(prices.gas_for_l2_storage, U256::from(STORAGE_WRITE_COST));

        let prices = prices_in_arb_gas(U256::from(100), U256::from(1_000), 30);
        assert_eq!(prices.gas_for_l1_calldata, U256::from(1));
        assert_eq!(prices.gas_per_l2_tx, U256::from(224));

        let legacy = prices_in_arb_gas(U256::from(100), U256::from(1_000), 3);
        assert_eq!(legacy.gas_per_l2_tx, U256::from(ASSUMED_SIMPLE_TX_SIZE));
    }

    #[test]
    fn products_saturate() {
        let prices = prices_in_wei(U256::MAX, U256::MAX, U256::ZERO, 30);
        assert_eq!(prices.wei_for_l1_calldata, U256::MAX);
        assert_eq!(prices.per_l2_tx, U256::MAX);
        assert_eq!(prices.wei_for_l2_storage, U256::MAX);
    }

    #[test]
    fn surplus_can_go_negative() {
        let due = I256::try_from(700i64).unwrap();
        let rewards = I256::try_from(400i64).unwrap();
        assert_eq!(
            l1_pricing_surplus(U256::from(1_000), due, rewards),
            I256::try_from(-100i64).unwrap()
        );
    }

    #[test]
    fn surplus_saturates_at_the_bounds() {
        assert_eq!(
            l1_pricing_surplus(U256::MAX, I256::ZERO, I256::ZERO),
            I256::MAX
        );
        assert_eq!(
            l1_pricing_surplus(U256::MAX, I256::MIN, I256::MIN),
            I256::MAX
        );
        // Dues summing past the bound stay at the bound instead of wrapping negative.
        assert_eq!(
            l1_pricing_surplus(U256::ZERO, I256::MAX, I256::MAX),
            I256::MIN + I256::ONE
        );
    }
}
