/// Raised when a charge exceeds the gas left. The meter is already drained when this is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("out of gas")]
pub struct OutOfGas;

/// Gas accounting for a single precompile invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasMeter {
    supplied: u64,
    left: u64,
}

impl GasMeter {
    pub fn new(supplied: u64) -> Self {
        Self {
            supplied,
            left: supplied,
        }
    }

    #[inline]
    pub fn supplied(&self) -> u64 {
        self.supplied
    }

    #[inline]
    pub fn left(&self) -> u64 {
        self.left
    }

    #[inline]
    pub fn burned(&self) -> u64 {
        self.supplied - self.left
    }

    /// Charges `amount`. An unaffordable charge drains the meter.
    pub fn burn(&mut self, amount: u64) -> Result<(), OutOfGas> {
        if self.left < amount {
            self.left = 0;
            return Err(OutOfGas);
        }
        self.left -= amount;
        Ok(())
    }

    /// Consumes everything that is left.
    pub fn burn_out(&mut self) {
        self.left = 0;
    }

    /// Hands back everything burned so far.
    pub fn refund_all(&mut self) {
        self.left = self.supplied;
    }
}
