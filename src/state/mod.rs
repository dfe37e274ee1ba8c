pub mod address_table;
pub mod arbos_state;
pub mod l1_pricing;
pub mod l2_pricing;
pub mod programs;
pub mod retryable;
pub mod types;

pub use arbos_state::{ArbState, ArbosStateParams};
pub use types::ArbosStateError;
