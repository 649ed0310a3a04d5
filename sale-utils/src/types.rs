use concordium_cis2::{TokenAmountU64, TokenIdUnit};
use concordium_std::*;

pub type ContractTokenId = TokenIdUnit;
pub type ContractTokenAmount = TokenAmountU64;
pub type MicroCcd = u64;
pub type GrantIndex = u32;

/// Derived lifecycle of the sale. Never stored; computed from the window,
/// the counters and the finalization latch.
#[derive(Debug, Serialize, SchemaType, Clone, PartialEq, Eq)]
pub enum SaleStage {
    /// Before the sale window opens.
    Pending,
    /// Window active, hardcap not reached.
    Open,
    /// Window elapsed or hardcap reached, not yet finalized.
    Closed,
    /// Unsold amount captured, sale latched.
    Finalized,
    /// Terminal: the captured unsold amount has left the contract.
    UnsoldWithdrawn,
}

/// Identifies which sale parameter an administrative operation changed.
#[derive(Debug, Serialize, SchemaType, Clone, PartialEq, Eq)]
pub enum ParamKind {
    StartTime,
    EndTime,
    UnitPrice,
    HardCap,
    MinPurchase,
    MaxPurchase,
    VestingConfigured,
    VestingDisabled,
    Paused,
    Unpaused,
}
