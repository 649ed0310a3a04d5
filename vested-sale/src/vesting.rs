use concordium_std::{collections::BTreeMap, *};
pub use sale_utils::{
    error::{ContractResult, CustomContractError},
    types::*,
};

pub(crate) const ZERO_ACCOUNT: AccountAddress = AccountAddress([0u8; 32]);

/// One vesting position. Timing parameters and the release schedule are
/// fixed at creation; only the per-asset books move afterwards.
#[derive(Debug, Serialize, SchemaType, Clone, PartialEq, Eq)]
pub struct VestingAccount {
    /// Receiver of everything this account ever releases
    pub(crate) beneficiary: AccountAddress,
    /// Anchor of the schedule, normally the purchase time
    pub(crate) start: Timestamp,
    pub(crate) duration: Duration,
    pub(crate) cliff: Duration,
    pub(crate) interval: Duration,
    /// Precomputed release points, strictly increasing, last one is `start + duration`
    pub(crate) release_times: Vec<Timestamp>,
    /// Asset amounts held by this account and not yet released
    pub(crate) held: BTreeMap<ContractAddress, ContractTokenAmount>,
    /// Asset amounts already released to the beneficiary
    pub(crate) released: BTreeMap<ContractAddress, ContractTokenAmount>,
}

impl VestingAccount {
    /// Opens a fresh account with an immutable schedule. This is the only
    /// way to construct one, so every live account carries a valid
    /// non-empty schedule ending exactly at `start + duration`.
    ///
    /// Reject if:
    /// - The beneficiary is the all-zero account
    /// - `cliff > duration`, `interval == 0` or `interval > duration`
    /// - The schedule does not fit into the timestamp range
    pub fn open(
        beneficiary: AccountAddress,
        start: Timestamp,
        duration: Duration,
        cliff: Duration,
        interval: Duration,
    ) -> Result<Self, CustomContractError> {
        ensure!(
            beneficiary != ZERO_ACCOUNT,
            CustomContractError::ZeroBeneficiary
        );
        ensure!(cliff <= duration, CustomContractError::InvalidSchedule);
        ensure!(
            Duration::from_millis(0) < interval && interval <= duration,
            CustomContractError::InvalidSchedule
        );

        let release_times = build_release_times(start, duration, cliff, interval)?;

        Ok(VestingAccount {
            beneficiary,
            start,
            duration,
            cliff,
            interval,
            release_times,
            held: BTreeMap::new(),
            released: BTreeMap::new(),
        })
    }

    /// Credits `amount` of `asset` to this account. Anything deposited
    /// counts towards the vesting entitlement from that moment on.
    pub fn deposit(
        &mut self,
        asset: ContractAddress,
        amount: ContractTokenAmount,
    ) -> Result<(), CustomContractError> {
        let held = self.held.entry(asset).or_insert_with(|| 0u64.into());
        held.0 = held
            .0
            .checked_add(amount.0)
            .ok_or(CustomContractError::OverflowError)?;
        Ok(())
    }

    pub(crate) fn end(&self) -> Timestamp {
        // schedule is non-empty by construction
        *self.release_times.last().unwrap_abort()
    }

    pub(crate) fn held_of(&self, asset: &ContractAddress) -> u64 {
        self.held.get(asset).map(|a| a.0).unwrap_or(0)
    }

    pub(crate) fn released_of(&self, asset: &ContractAddress) -> u64 {
        self.released.get(asset).map(|a| a.0).unwrap_or(0)
    }

    /// Total historical allocation: what is still here plus what already
    /// left. Recomputed from the live books rather than stored, so later
    /// deposits grow the entitlement.
    fn total_allocation(&self, asset: &ContractAddress) -> Result<u64, CustomContractError> {
        self.held_of(asset)
            .checked_add(self.released_of(asset))
            .ok_or(CustomContractError::OverflowError)
    }

    /// Cumulative entitlement earned by `now`. A step function over the
    /// release points: zero before the cliff, the full allocation from
    /// `start + duration` onwards, and `floor(total * n / len)` in between
    /// where `n` counts the release points that have passed.
    pub fn vested_amount(
        &self,
        asset: &ContractAddress,
        now: Timestamp,
    ) -> Result<ContractTokenAmount, CustomContractError> {
        let total = self.total_allocation(asset)?;

        let cliff_at = self
            .start
            .checked_add(self.cliff)
            .ok_or(CustomContractError::InvalidSchedule)?;
        if now < cliff_at {
            return Ok(0u64.into());
        }
        if now >= self.end() {
            return Ok(total.into());
        }

        let passed = self.release_times.iter().filter(|t| **t <= now).count() as u64;
        if passed == 0 {
            return Ok(0u64.into());
        }

        let steps = self.release_times.len() as u64;
        let vested: u128 = (total as u128)
            .checked_mul(passed as u128)
            .ok_or(CustomContractError::OverflowError)?
            / steps as u128;

        // passed < steps here, so vested < total fits in u64
        Ok(ContractTokenAmount::from(vested as u64))
    }

    /// Entitlement not yet withdrawn.
    pub fn releasable(
        &self,
        asset: &ContractAddress,
        now: Timestamp,
    ) -> Result<ContractTokenAmount, CustomContractError> {
        let vested = self.vested_amount(asset, now)?;
        let releasable = vested
            .0
            .checked_sub(self.released_of(asset))
            .ok_or(CustomContractError::OverflowError)?;
        Ok(releasable.into())
    }

    /// Moves the currently releasable amount from `held` to `released` and
    /// returns it. The books are updated before the caller performs the
    /// outgoing transfer. Releasing when nothing is due returns 0 and is
    /// not an error.
    pub fn release(
        &mut self,
        asset: &ContractAddress,
        now: Timestamp,
    ) -> Result<ContractTokenAmount, CustomContractError> {
        let amount = self.releasable(asset, now)?;
        if amount.0 == 0 {
            return Ok(amount);
        }

        let released = self.released.entry(*asset).or_insert_with(|| 0u64.into());
        released.0 = released
            .0
            .checked_add(amount.0)
            .ok_or(CustomContractError::OverflowError)?;

        let held = self.held.entry(*asset).or_insert_with(|| 0u64.into());
        held.0 = held
            .0
            .checked_sub(amount.0)
            .ok_or(CustomContractError::OverflowError)?;

        Ok(amount)
    }
}

/// Walks `start + cliff`, `+interval`, ... while inside the vesting span,
/// then closes the schedule at `start + duration` when the last step did
/// not land there. Yields at least one entry for every valid parameter set,
/// even when `interval` does not divide `duration - cliff`.
fn build_release_times(
    start: Timestamp,
    duration: Duration,
    cliff: Duration,
    interval: Duration,
) -> Result<Vec<Timestamp>, CustomContractError> {
    let end = start
        .checked_add(duration)
        .ok_or(CustomContractError::InvalidSchedule)?;
    let mut t = start
        .checked_add(cliff)
        .ok_or(CustomContractError::InvalidSchedule)?;

    let mut times = Vec::new();
    while t <= end {
        times.push(t);
        match t.checked_add(interval) {
            Some(next) => t = next,
            None => break,
        }
    }
    if times.last() != Some(&end) {
        times.push(end);
    }
    Ok(times)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BENEFICIARY: AccountAddress = AccountAddress([7u8; 32]);
    const ASSET: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };

    fn ts(millis: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(millis)
    }

    fn account(duration: u64, cliff: u64, interval: u64) -> VestingAccount {
        VestingAccount::open(
            BENEFICIARY,
            ts(0),
            Duration::from_millis(duration),
            Duration::from_millis(cliff),
            Duration::from_millis(interval),
        )
        .unwrap()
    }

    #[test]
    fn test_schedule_cliff_then_steps() {
        let acc = account(100, 10, 30);
        assert_eq!(acc.release_times, vec![ts(10), ts(40), ts(70), ts(100)]);
    }

    #[test]
    fn test_schedule_uneven_interval_closes_at_end() {
        let acc = account(100, 0, 40);
        assert_eq!(acc.release_times, vec![ts(0), ts(40), ts(80), ts(100)]);
    }

    #[test]
    fn test_schedule_cliff_equals_duration() {
        let acc = account(50, 50, 20);
        assert_eq!(acc.release_times, vec![ts(50)]);
    }

    #[test]
    fn test_open_rejects_bad_params() {
        let open = |duration: u64, cliff: u64, interval: u64| {
            VestingAccount::open(
                BENEFICIARY,
                ts(0),
                Duration::from_millis(duration),
                Duration::from_millis(cliff),
                Duration::from_millis(interval),
            )
        };
        assert_eq!(open(100, 101, 10), Err(CustomContractError::InvalidSchedule));
        assert_eq!(open(100, 10, 0), Err(CustomContractError::InvalidSchedule));
        assert_eq!(open(100, 10, 101), Err(CustomContractError::InvalidSchedule));
        assert_eq!(
            VestingAccount::open(
                ZERO_ACCOUNT,
                ts(0),
                Duration::from_millis(100),
                Duration::from_millis(10),
                Duration::from_millis(30),
            ),
            Err(CustomContractError::ZeroBeneficiary)
        );
    }

    #[test]
    fn test_vested_step_function() {
        let mut acc = account(100, 10, 30);
        acc.deposit(ASSET, 1000.into()).unwrap();

        // nothing before the cliff
        claim_eq!(acc.vested_amount(&ASSET, ts(9)).unwrap().0, 0);
        // one step passed
        claim_eq!(acc.vested_amount(&ASSET, ts(10)).unwrap().0, 250);
        claim_eq!(acc.vested_amount(&ASSET, ts(39)).unwrap().0, 250);
        // entitlement jumps exactly at the boundary
        claim_eq!(acc.vested_amount(&ASSET, ts(40)).unwrap().0, 500);
        claim_eq!(acc.vested_amount(&ASSET, ts(99)).unwrap().0, 750);
        // end branch pays the full allocation, no rounding loss
        claim_eq!(acc.vested_amount(&ASSET, ts(100)).unwrap().0, 1000);
        claim_eq!(acc.vested_amount(&ASSET, ts(5000)).unwrap().0, 1000);
    }

    #[test]
    fn test_vested_no_rounding_loss_at_end() {
        let mut acc = account(100, 0, 30);
        // 7 does not divide over the 5 steps [0, 30, 60, 90, 100]
        acc.deposit(ASSET, 7.into()).unwrap();
        claim_eq!(acc.vested_amount(&ASSET, ts(90)).unwrap().0, 7 * 4 / 5);
        claim_eq!(acc.vested_amount(&ASSET, ts(100)).unwrap().0, 7);
    }

    #[test]
    fn test_vested_monotone() {
        let mut acc = account(100, 10, 30);
        acc.deposit(ASSET, 997.into()).unwrap();
        let mut prev = 0u64;
        for now in 0..=110 {
            let vested = acc.vested_amount(&ASSET, ts(now)).unwrap().0;
            assert!(vested >= prev, "vested decreased at t={}", now);
            prev = vested;
        }
        assert_eq!(prev, 997);
    }

    #[test]
    fn test_release_moves_books_once() {
        let mut acc = account(100, 10, 30);
        acc.deposit(ASSET, 1000.into()).unwrap();

        let first = acc.release(&ASSET, ts(40)).unwrap();
        claim_eq!(first.0, 500);
        claim_eq!(acc.released_of(&ASSET), 500);
        claim_eq!(acc.held_of(&ASSET), 500);

        // immediate second call is a successful no-op
        let second = acc.release(&ASSET, ts(40)).unwrap();
        claim_eq!(second.0, 0);
        claim_eq!(acc.released_of(&ASSET), 500);

        let last = acc.release(&ASSET, ts(100)).unwrap();
        claim_eq!(last.0, 500);
        claim_eq!(acc.held_of(&ASSET), 0);
    }

    #[test]
    fn test_release_before_cliff_is_noop() {
        let mut acc = account(100, 10, 30);
        acc.deposit(ASSET, 1000.into()).unwrap();
        claim_eq!(acc.release(&ASSET, ts(9)).unwrap().0, 0);
        claim_eq!(acc.held_of(&ASSET), 1000);
    }

    #[test]
    fn test_topup_inflates_entitlement() {
        let mut acc = account(100, 10, 30);
        acc.deposit(ASSET, 1000.into()).unwrap();
        claim_eq!(acc.release(&ASSET, ts(40)).unwrap().0, 500);

        // a later deposit grows the total allocation retroactively
        acc.deposit(ASSET, 1000.into()).unwrap();
        claim_eq!(acc.vested_amount(&ASSET, ts(40)).unwrap().0, 1000);
        claim_eq!(acc.release(&ASSET, ts(40)).unwrap().0, 500);
        claim_eq!(acc.released_of(&ASSET), 1000);
        claim_eq!(acc.held_of(&ASSET), 1000);
    }
}
