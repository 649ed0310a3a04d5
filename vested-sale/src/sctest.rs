use crate::{state::*, vesting::VestingAccount, *};
use concordium_cis2::BalanceOfQueryResponse;
use concordium_std::test_infrastructure::*;
use std::sync::atomic::{AtomicU8, Ordering};

static ADDRESS_COUNTER: AtomicU8 = AtomicU8::new(10);
pub(crate) const OWNER_ACC: AccountAddress = AccountAddress([0u8; 32]);
pub(crate) const SELF_ADDRESS: ContractAddress = ContractAddress {
    index: 0,
    subindex: 0,
};
pub(crate) const SALE_TOKEN: ContractAddress = ContractAddress {
    index: 1,
    subindex: 0,
};

pub(crate) fn ts(millis: u64) -> Timestamp {
    Timestamp::from_timestamp_millis(millis)
}

pub(crate) fn new_account() -> AccountAddress {
    let account = AccountAddress([ADDRESS_COUNTER.load(Ordering::SeqCst); 32]);
    ADDRESS_COUNTER.fetch_add(1, Ordering::SeqCst);
    account
}

pub(crate) fn default_vesting() -> VestingConfig {
    VestingConfig::new(
        Duration::from_millis(100),
        Duration::from_millis(10),
        Duration::from_millis(30),
    )
    .unwrap_abort()
}

pub(crate) fn init_params(vesting: Option<VestingParams>) -> InitParams {
    InitParams {
        sale_token: SALE_TOKEN,
        window_start: ts(10),
        window_end: ts(30),
        unit_price: 5,
        hard_cap: 1000.into(),
        min_purchase: Amount::from_micro_ccd(10),
        max_purchase: Amount::from_micro_ccd(2_000),
        vesting,
    }
}

/// Ledger over a 10..=30 window, 5 µCCD per token, hardcap 1000.
pub(crate) fn initial_state<S: HasStateApi>(
    state_builder: &mut StateBuilder<S>,
    vesting: Option<VestingConfig>,
) -> State<S> {
    let window = SaleWindow::new(ts(1), ts(10), ts(30)).unwrap_abort();
    let pricing = SaleInfo::new(
        5,
        1000.into(),
        Amount::from_micro_ccd(10),
        Amount::from_micro_ccd(2_000),
    )
    .unwrap_abort();
    State::new(state_builder, SALE_TOKEN, window, pricing, vesting)
}

/// A vesting position anchored at t=0 over [10, 40, 70, 100], already
/// holding `total` of the sale asset.
pub(crate) fn funded_account(beneficiary: AccountAddress, total: u64) -> VestingAccount {
    let mut account = VestingAccount::open(
        beneficiary,
        ts(0),
        Duration::from_millis(100),
        Duration::from_millis(10),
        Duration::from_millis(30),
    )
    .unwrap_abort();
    account.deposit(SALE_TOKEN, total.into()).unwrap_abort();
    account
}

pub(crate) fn mock_balance_of(host: &mut TestHost<State<TestStateApi>>, balance: u64) {
    host.setup_mock_entrypoint(
        SALE_TOKEN,
        OwnedEntrypointName::new_unchecked("balanceOf".into()),
        MockFn::new_v1(move |_parameter, _amount, _balance, _state| {
            Ok::<_, concordium_std::CallContractError<BalanceOfQueryResponse<ContractTokenAmount>>>((
                false,
                BalanceOfQueryResponse::from(vec![ContractTokenAmount::from(balance)]),
            ))
        }),
    );
}

pub(crate) fn mock_transfer_ok(host: &mut TestHost<State<TestStateApi>>) {
    host.setup_mock_entrypoint(
        SALE_TOKEN,
        OwnedEntrypointName::new_unchecked("transfer".into()),
        MockFn::returning_ok(()),
    );
}

pub(crate) fn receive_context<'a>(
    sender: AccountAddress,
    slot_time: Timestamp,
) -> TestReceiveContext<'a> {
    let mut ctx = TestReceiveContext::empty();
    ctx.set_self_address(SELF_ADDRESS);
    ctx.set_owner(OWNER_ACC);
    ctx.set_sender(Address::from(sender));
    ctx.set_metadata_slot_time(slot_time);
    ctx
}

mod admin;
mod beneficiary;
mod purchaser;

#[concordium_cfg_test]
mod test_init {
    use super::*;

    #[concordium_test]
    fn test_init_builds_validated_state() {
        let mut ctx = TestInitContext::empty();
        ctx.set_metadata_slot_time(ts(1));
        let params = init_params(Some(VestingParams {
            duration: Duration::from_millis(100),
            cliff: Duration::from_millis(10),
            interval: Duration::from_millis(30),
        }));
        let parameter_bytes = to_bytes(&params);
        ctx.set_parameter(&parameter_bytes);

        let mut state_builder = TestStateBuilder::new();
        let state = contract_init(&ctx, &mut state_builder).expect_report("init failed");

        claim_eq!(state.sale_token, SALE_TOKEN);
        claim_eq!(state.window, SaleWindow { start: ts(10), end: ts(30) });
        claim_eq!(state.pricing.unit_price, 5);
        claim_eq!(state.pricing.total_sold.0, 0);
        claim_eq!(state.vesting, Some(default_vesting()));
        claim!(!state.paused);
        claim!(!state.finalized);
    }

    #[concordium_test]
    fn test_init_rejects_inverted_window() {
        let mut ctx = TestInitContext::empty();
        ctx.set_metadata_slot_time(ts(1));
        let mut params = init_params(None);
        params.window_end = params.window_start;
        let parameter_bytes = to_bytes(&params);
        ctx.set_parameter(&parameter_bytes);

        let mut state_builder = TestStateBuilder::new();
        let result = contract_init(&ctx, &mut state_builder);
        claim!(result.is_err(), "inverted window must be rejected");
    }

    #[concordium_test]
    fn test_init_rejects_bad_vesting() {
        let mut ctx = TestInitContext::empty();
        ctx.set_metadata_slot_time(ts(1));
        let params = init_params(Some(VestingParams {
            duration: Duration::from_millis(100),
            cliff: Duration::from_millis(200),
            interval: Duration::from_millis(30),
        }));
        let parameter_bytes = to_bytes(&params);
        ctx.set_parameter(&parameter_bytes);

        let mut state_builder = TestStateBuilder::new();
        let result = contract_init(&ctx, &mut state_builder);
        claim!(result.is_err(), "cliff beyond duration must be rejected");
    }
}
