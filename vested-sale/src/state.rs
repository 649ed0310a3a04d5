use concordium_std::*;
pub use sale_utils::{
    error::{ContractError, ContractResult, CustomContractError},
    types::*,
};

use crate::vesting::VestingAccount;

/// The contract state
#[derive(Debug, Serial, DeserialWithState, StateClone)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// CIS2 contract of the asset being sold
    pub(crate) sale_token: ContractAddress,
    /// If `true`, purchases and administrative operations stop working.
    /// Releases keep working.
    pub(crate) paused: bool,
    /// Set while a mutating entry point is executing; nested entries reject
    pub(crate) locked: bool,
    /// Time range during which purchases are accepted
    pub(crate) window: SaleWindow,
    /// Price, caps and running counters
    pub(crate) pricing: SaleInfo,
    /// Applied to future purchases; `None` means direct transfer
    pub(crate) vesting: Option<VestingConfig>,
    /// Latched by finalizeSale, never reverts
    pub(crate) finalized: bool,
    /// Set once the captured unsold amount has been transferred out
    pub(crate) unsold_withdrawn: bool,
    /// Unsold sale-asset amount captured at finalization
    pub(crate) unsold_approved: ContractTokenAmount,
    /// Sale-asset amount sitting in vesting accounts, not yet released
    pub(crate) vested_custody: ContractTokenAmount,
    /// Purchasers holding vesting grants
    pub(crate) participants: StateMap<AccountAddress, PurchaserState, S>,
}

impl<S: HasStateApi> State<S> {
    pub(crate) fn new(
        state_builder: &mut StateBuilder<S>,
        sale_token: ContractAddress,
        window: SaleWindow,
        pricing: SaleInfo,
        vesting: Option<VestingConfig>,
    ) -> Self {
        State {
            sale_token,
            paused: false,
            locked: false,
            window,
            pricing,
            vesting,
            finalized: false,
            unsold_withdrawn: false,
            unsold_approved: 0u64.into(),
            vested_custody: 0u64.into(),
            participants: state_builder.new_map(),
        }
    }

    /// Entry latch against reentrant calls. Every mutating entry point
    /// takes it first; a nested call through an external transfer finds it
    /// set and rejects. A rejected operation rolls the flag back together
    /// with the rest of the state.
    pub(crate) fn begin_entry(&mut self) -> ContractResult<()> {
        ensure!(!self.locked, CustomContractError::ReentrantCall.into());
        self.locked = true;
        Ok(())
    }

    pub(crate) fn end_entry(&mut self) {
        self.locked = false;
    }

    pub(crate) fn is_open(&self, now: Timestamp) -> bool {
        self.window.contains(now) && !self.pricing.cap_reached() && !self.paused
    }

    pub(crate) fn stage(&self, now: Timestamp) -> SaleStage {
        if self.finalized {
            if self.unsold_withdrawn {
                SaleStage::UnsoldWithdrawn
            } else {
                SaleStage::Finalized
            }
        } else if now < self.window.start {
            SaleStage::Pending
        } else if self.window.contains(now) && !self.pricing.cap_reached() {
            SaleStage::Open
        } else {
            SaleStage::Closed
        }
    }

    /// Appends a freshly funded grant to the payer's ledger entry and moves
    /// its allocation into custody accounting. Returns the grant's index in
    /// the payer's array.
    pub(crate) fn add_grant(
        &mut self,
        payer: AccountAddress,
        account: VestingAccount,
        tokens: ContractTokenAmount,
    ) -> ContractResult<GrantIndex> {
        self.vested_custody = self
            .vested_custody
            .0
            .checked_add(tokens.0)
            .ok_or(ContractError::from(CustomContractError::OverflowError))?
            .into();

        self.participants
            .entry(payer)
            .or_insert_with(|| PurchaserState { grants: Vec::new() });
        let mut purchaser = self
            .participants
            .get_mut(&payer)
            .ok_or(ContractError::from(CustomContractError::MissingAccount))?;
        purchaser.grants.push(VestingGrant {
            account,
            initial_amount: tokens,
            ledger_released: 0u64.into(),
        });
        Ok((purchaser.grants.len() - 1) as GrantIndex)
    }

    /// Releases one grant of `user` and mirrors the increment into the
    /// ledger-side counter. All releases go through here, so the account
    /// books and the mirror cannot drift apart.
    pub(crate) fn release_grant(
        &mut self,
        user: &AccountAddress,
        index: GrantIndex,
        asset: &ContractAddress,
        now: Timestamp,
    ) -> ContractResult<ContractTokenAmount> {
        let mut purchaser = self
            .participants
            .get_mut(user)
            .ok_or(ContractError::from(CustomContractError::GrantIndexOutOfRange))?;
        let grant = purchaser
            .grants
            .get_mut(index as usize)
            .ok_or(ContractError::from(CustomContractError::GrantIndexOutOfRange))?;

        let amount = grant.account.release(asset, now)?;
        grant.ledger_released = grant
            .ledger_released
            .0
            .checked_add(amount.0)
            .ok_or(ContractError::from(CustomContractError::OverflowError))?
            .into();

        self.vested_custody = self
            .vested_custody
            .0
            .checked_sub(amount.0)
            .ok_or(ContractError::from(CustomContractError::OverflowError))?
            .into();
        Ok(amount)
    }

    /// Releases every grant of `user`. A user without grants releases
    /// nothing and succeeds. Returns the nonzero increments per grant.
    pub(crate) fn release_all_grants(
        &mut self,
        user: &AccountAddress,
        asset: &ContractAddress,
        now: Timestamp,
    ) -> ContractResult<Vec<(GrantIndex, ContractTokenAmount)>> {
        let count = match self.participants.get(user) {
            Some(purchaser) => purchaser.grants.len() as GrantIndex,
            None => return Ok(Vec::new()),
        };

        let mut increments = Vec::new();
        for index in 0..count {
            let amount = self.release_grant(user, index, asset, now)?;
            if amount.0 > 0 {
                increments.push((index, amount));
            }
        }
        Ok(increments)
    }

    pub(crate) fn releasable_total(
        &self,
        user: &AccountAddress,
        asset: &ContractAddress,
        now: Timestamp,
    ) -> ContractResult<ContractTokenAmount> {
        let mut total = 0u64;
        if let Some(purchaser) = self.participants.get(user) {
            for grant in purchaser.grants.iter() {
                let releasable = grant.account.releasable(asset, now)?;
                total = total
                    .checked_add(releasable.0)
                    .ok_or(ContractError::from(CustomContractError::OverflowError))?;
            }
        }
        Ok(total.into())
    }

    /// Runs `f` over one grant of `user`. The only failure is an
    /// out-of-range index (unknown users hold zero grants).
    pub(crate) fn with_grant<A>(
        &self,
        user: &AccountAddress,
        index: GrantIndex,
        f: impl FnOnce(&VestingGrant) -> ContractResult<A>,
    ) -> ContractResult<A> {
        let purchaser = self
            .participants
            .get(user)
            .ok_or(ContractError::from(CustomContractError::GrantIndexOutOfRange))?;
        let grant = purchaser
            .grants
            .get(index as usize)
            .ok_or(ContractError::from(CustomContractError::GrantIndexOutOfRange))?;
        f(grant)
    }
}

/// Time range during which purchases are accepted, both ends inclusive.
#[derive(Debug, Serialize, SchemaType, Clone, PartialEq, Eq)]
pub struct SaleWindow {
    pub(crate) start: Timestamp,
    pub(crate) end: Timestamp,
}

impl SaleWindow {
    pub fn new(now: Timestamp, start: Timestamp, end: Timestamp) -> Result<Self, CustomContractError> {
        ensure!(now < start, CustomContractError::InvalidTime);
        ensure!(start < end, CustomContractError::InvalidTime);
        Ok(SaleWindow { start, end })
    }

    pub(crate) fn contains(&self, now: Timestamp) -> bool {
        self.start <= now && now <= self.end
    }

    pub(crate) fn is_closed(&self, now: Timestamp) -> bool {
        self.end < now
    }
}

/// Pricing and volume bookkeeping of the sale.
#[derive(Debug, Serialize, SchemaType, Clone, PartialEq, Eq)]
pub struct SaleInfo {
    /// Price in µCCD per sale-asset token
    pub(crate) unit_price: MicroCcd,
    /// Maximum cumulative tokens sellable
    pub(crate) hard_cap: ContractTokenAmount,
    /// Smallest accepted payment
    pub(crate) min_purchase: Amount,
    /// Largest accepted payment
    pub(crate) max_purchase: Amount,
    /// Tokens granted so far
    pub(crate) total_sold: ContractTokenAmount,
    /// Payments accepted so far
    pub(crate) total_raised: Amount,
}

impl SaleInfo {
    pub fn new(
        unit_price: MicroCcd,
        hard_cap: ContractTokenAmount,
        min_purchase: Amount,
        max_purchase: Amount,
    ) -> Result<Self, CustomContractError> {
        ensure!(unit_price > 0, CustomContractError::InvalidPrice);
        ensure!(
            min_purchase <= max_purchase,
            CustomContractError::InvalidLimits
        );
        Ok(SaleInfo {
            unit_price,
            hard_cap,
            min_purchase,
            max_purchase,
            total_sold: 0u64.into(),
            total_raised: Amount::zero(),
        })
    }

    /// Whole tokens a payment buys. The fractional remainder stays with
    /// the sale.
    pub(crate) fn token_amount(&self, payment: Amount) -> ContractTokenAmount {
        ContractTokenAmount::from(payment.micro_ccd / self.unit_price)
    }

    pub(crate) fn cap_reached(&self) -> bool {
        self.hard_cap.0 <= self.total_sold.0
    }

    /// Books a settled purchase. Counters only move when the hardcap still
    /// holds afterwards.
    pub(crate) fn record(
        &mut self,
        payment: Amount,
        tokens: ContractTokenAmount,
    ) -> ContractResult<()> {
        let sold = self
            .total_sold
            .0
            .checked_add(tokens.0)
            .ok_or(ContractError::from(CustomContractError::OverflowError))?;
        ensure!(
            sold <= self.hard_cap.0,
            CustomContractError::HardCapReached.into()
        );
        let raised = self
            .total_raised
            .micro_ccd
            .checked_add(payment.micro_ccd)
            .ok_or(ContractError::from(CustomContractError::OverflowError))?;

        self.total_sold = sold.into();
        self.total_raised = Amount::from_micro_ccd(raised);
        Ok(())
    }
}

/// Vesting timing applied to future purchases. Existing accounts keep the
/// parameters they were created with.
#[derive(Debug, Serialize, SchemaType, Clone, PartialEq, Eq)]
pub struct VestingConfig {
    pub(crate) duration: Duration,
    pub(crate) cliff: Duration,
    pub(crate) interval: Duration,
}

impl VestingConfig {
    pub fn new(
        duration: Duration,
        cliff: Duration,
        interval: Duration,
    ) -> Result<Self, CustomContractError> {
        ensure!(cliff <= duration, CustomContractError::InvalidSchedule);
        ensure!(
            Duration::from_millis(0) < interval && interval <= duration,
            CustomContractError::InvalidSchedule
        );
        Ok(VestingConfig {
            duration,
            cliff,
            interval,
        })
    }
}

/// One purchase event that went into vesting. The account keeps the
/// authoritative books; `ledger_released` mirrors them on the ledger side.
#[derive(Debug, Serialize, SchemaType, Clone, PartialEq, Eq)]
pub struct VestingGrant {
    pub(crate) account: VestingAccount,
    /// Tokens placed into the account by the purchase that created it
    pub(crate) initial_amount: ContractTokenAmount,
    pub(crate) ledger_released: ContractTokenAmount,
}

/// Ledger entry of one purchaser: one grant per vesting purchase.
#[derive(Debug, Serialize, SchemaType, Clone, PartialEq, Eq)]
pub struct PurchaserState {
    pub(crate) grants: Vec<VestingGrant>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use concordium_std::test_infrastructure::*;

    const SALE_TOKEN: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const BUYER: AccountAddress = AccountAddress([10u8; 32]);

    fn ts(millis: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(millis)
    }

    fn default_state<S: HasStateApi>(state_builder: &mut StateBuilder<S>) -> State<S> {
        let window = SaleWindow::new(ts(1), ts(10), ts(30)).unwrap();
        let pricing = SaleInfo::new(
            5,
            1000.into(),
            Amount::from_micro_ccd(10),
            Amount::from_micro_ccd(2_000),
        )
        .unwrap();
        State::new(state_builder, SALE_TOKEN, window, pricing, None)
    }

    fn grant_account(total: u64) -> VestingAccount {
        let mut account = VestingAccount::open(
            BUYER,
            ts(0),
            Duration::from_millis(100),
            Duration::from_millis(10),
            Duration::from_millis(30),
        )
        .unwrap();
        account.deposit(SALE_TOKEN, total.into()).unwrap();
        account
    }

    #[test]
    fn test_window_validation() {
        assert_eq!(
            SaleWindow::new(ts(10), ts(10), ts(30)),
            Err(CustomContractError::InvalidTime)
        );
        assert_eq!(
            SaleWindow::new(ts(1), ts(30), ts(30)),
            Err(CustomContractError::InvalidTime)
        );
        let window = SaleWindow::new(ts(1), ts(10), ts(30)).unwrap();
        assert!(window.contains(ts(10)));
        assert!(window.contains(ts(30)));
        assert!(!window.contains(ts(31)));
        assert!(window.is_closed(ts(31)));
    }

    #[test]
    fn test_sale_info_validation() {
        assert_eq!(
            SaleInfo::new(0, 1000.into(), Amount::zero(), Amount::zero()),
            Err(CustomContractError::InvalidPrice)
        );
        assert_eq!(
            SaleInfo::new(
                5,
                1000.into(),
                Amount::from_micro_ccd(100),
                Amount::from_micro_ccd(10)
            ),
            Err(CustomContractError::InvalidLimits)
        );
    }

    #[test]
    fn test_vesting_config_validation() {
        let cfg = |duration: u64, cliff: u64, interval: u64| {
            VestingConfig::new(
                Duration::from_millis(duration),
                Duration::from_millis(cliff),
                Duration::from_millis(interval),
            )
        };
        assert_eq!(cfg(100, 101, 10), Err(CustomContractError::InvalidSchedule));
        assert_eq!(cfg(100, 10, 0), Err(CustomContractError::InvalidSchedule));
        assert_eq!(cfg(100, 10, 101), Err(CustomContractError::InvalidSchedule));
        assert!(cfg(100, 0, 100).is_ok());
    }

    #[test]
    fn test_token_amount_floors() {
        let pricing = SaleInfo::new(
            100,
            1000.into(),
            Amount::zero(),
            Amount::from_micro_ccd(10_000),
        )
        .unwrap();
        claim_eq!(pricing.token_amount(Amount::from_micro_ccd(1_999)).0, 19);
        claim_eq!(pricing.token_amount(Amount::from_micro_ccd(99)).0, 0);
    }

    #[test]
    fn test_record_respects_hardcap() {
        let mut pricing = SaleInfo::new(
            5,
            100.into(),
            Amount::zero(),
            Amount::from_micro_ccd(10_000),
        )
        .unwrap();
        pricing
            .record(Amount::from_micro_ccd(300), 60.into())
            .unwrap();
        let err = pricing.record(Amount::from_micro_ccd(300), 60.into());
        claim_eq!(
            err,
            Err(ContractError::from(CustomContractError::HardCapReached))
        );
        // failed booking leaves the counters untouched
        claim_eq!(pricing.total_sold.0, 60);
        claim_eq!(pricing.total_raised, Amount::from_micro_ccd(300));

        pricing
            .record(Amount::from_micro_ccd(200), 40.into())
            .unwrap();
        claim_eq!(pricing.total_sold.0, 100);
        assert!(pricing.cap_reached());
    }

    #[test]
    fn test_entry_latch() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = default_state(&mut state_builder);
        state.begin_entry().unwrap();
        claim_eq!(
            state.begin_entry(),
            Err(ContractError::from(CustomContractError::ReentrantCall))
        );
        state.end_entry();
        assert!(state.begin_entry().is_ok());
    }

    #[test]
    fn test_stage_machine() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = default_state(&mut state_builder);
        claim_eq!(state.stage(ts(5)), SaleStage::Pending);
        claim_eq!(state.stage(ts(15)), SaleStage::Open);
        claim_eq!(state.stage(ts(31)), SaleStage::Closed);

        state.finalized = true;
        claim_eq!(state.stage(ts(31)), SaleStage::Finalized);
        state.unsold_withdrawn = true;
        claim_eq!(state.stage(ts(31)), SaleStage::UnsoldWithdrawn);
    }

    #[test]
    fn test_grant_release_keeps_mirror_in_sync() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = default_state(&mut state_builder);

        state.add_grant(BUYER, grant_account(1000), 1000.into()).unwrap();
        claim_eq!(state.vested_custody.0, 1000);

        let amount = state
            .release_grant(&BUYER, 0, &SALE_TOKEN, ts(40))
            .unwrap();
        claim_eq!(amount.0, 500);
        claim_eq!(state.vested_custody.0, 500);

        let purchaser = state.participants.get(&BUYER).unwrap();
        let grant = &purchaser.grants[0];
        claim_eq!(grant.ledger_released.0, 500);
        claim_eq!(grant.account.released_of(&SALE_TOKEN), 500);
    }

    #[test]
    fn test_release_all_covers_every_grant() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = default_state(&mut state_builder);

        state.add_grant(BUYER, grant_account(1000), 1000.into()).unwrap();
        state.add_grant(BUYER, grant_account(400), 400.into()).unwrap();

        let increments = state
            .release_all_grants(&BUYER, &SALE_TOKEN, ts(40))
            .unwrap();
        claim_eq!(increments.len(), 2);
        claim_eq!(increments[0], (0, ContractTokenAmount::from(500)));
        claim_eq!(increments[1], (1, ContractTokenAmount::from(200)));
        claim_eq!(state.vested_custody.0, 700);

        // nothing left at the same instant
        let again = state
            .release_all_grants(&BUYER, &SALE_TOKEN, ts(40))
            .unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn test_release_unknown_user_and_bad_index() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = default_state(&mut state_builder);

        let increments = state
            .release_all_grants(&BUYER, &SALE_TOKEN, ts(40))
            .unwrap();
        assert!(increments.is_empty());

        claim_eq!(
            state.release_grant(&BUYER, 0, &SALE_TOKEN, ts(40)),
            Err(ContractError::from(CustomContractError::GrantIndexOutOfRange))
        );
    }

    #[test]
    fn test_releasable_total_sums_grants() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = default_state(&mut state_builder);

        state.add_grant(BUYER, grant_account(1000), 1000.into()).unwrap();
        state.add_grant(BUYER, grant_account(400), 400.into()).unwrap();

        claim_eq!(
            state.releasable_total(&BUYER, &SALE_TOKEN, ts(40)).unwrap().0,
            700
        );
        claim_eq!(
            state.releasable_total(&BUYER, &SALE_TOKEN, ts(5)).unwrap().0,
            0
        );
        let unknown = AccountAddress([99u8; 32]);
        claim_eq!(
            state.releasable_total(&unknown, &SALE_TOKEN, ts(40)).unwrap().0,
            0
        );
    }
}
