//! Fixed-price token sale settling against a CIS2 sale asset, with optional
//! interval-based vesting: purchased allocations can be routed into
//! per-purchaser vesting accounts that release on a cliff-then-stepped
//! schedule instead of transferring immediately.
#[cfg(any(feature = "wasm-test", test))]
mod sctest;
mod state;
mod vesting;
mod view;

use concordium_cis2::{
    AdditionalData, BalanceOfQuery, BalanceOfQueryParams, BalanceOfQueryResponse, Receiver,
    TokenIdUnit, Transfer, TransferParams,
};
use concordium_std::*;
use sale_utils::{
    FinalizeEvent, ParamChangeEvent, PurchaseEvent, ReleaseEvent, SaleEvent, UnsoldWithdrawEvent,
};
use state::{State, *};
use vesting::VestingAccount;

/// The parameter schema for `init` function.
#[derive(Debug, Serialize, SchemaType)]
pub struct InitParams {
    /// CIS2 contract of the asset being sold
    pub sale_token: ContractAddress,
    /// Sale window opening time
    pub window_start: Timestamp,
    /// Sale window closing time (inclusive)
    pub window_end: Timestamp,
    /// Price in µCCD per sale-asset token
    pub unit_price: MicroCcd,
    /// Maximum cumulative tokens sellable
    pub hard_cap: ContractTokenAmount,
    /// Smallest accepted payment
    pub min_purchase: Amount,
    /// Largest accepted payment
    pub max_purchase: Amount,
    /// When present, purchases vest on this schedule instead of
    /// transferring directly
    pub vesting: Option<VestingParams>,
}

/// Vesting timing parameters, as given to `init` and `configureVesting`.
#[derive(Debug, Serialize, SchemaType)]
pub struct VestingParams {
    pub duration: Duration,
    pub cliff: Duration,
    pub interval: Duration,
}

/// # Init Function
/// Validates the window, pricing and optional vesting parameters and sets
/// up an empty ledger. The account creating the instance becomes the owner
/// of every administrative entry point.
#[init(contract = "vested_sale", parameter = "InitParams")]
fn contract_init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    let params: InitParams = ctx.parameter_cursor().get()?;

    let window = SaleWindow::new(
        ctx.metadata().slot_time(),
        params.window_start,
        params.window_end,
    )?;

    let pricing = SaleInfo::new(
        params.unit_price,
        params.hard_cap,
        params.min_purchase,
        params.max_purchase,
    )?;

    let vesting = match params.vesting {
        Some(v) => Some(VestingConfig::new(v.duration, v.cliff, v.interval)?),
        None => None,
    };

    Ok(State::new(
        state_builder,
        params.sale_token,
        window,
        pricing,
        vesting,
    ))
}

/// Queries the sale-asset balance of `owner` on the CIS2 contract.
fn contract_token_balance<S: HasStateApi>(
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    token: &ContractAddress,
    owner: ContractAddress,
) -> ContractResult<ContractTokenAmount> {
    let query = BalanceOfQueryParams {
        queries: vec![BalanceOfQuery {
            token_id: TokenIdUnit(),
            address: Address::from(owner),
        }],
    };

    let (_, response) = host.invoke_contract(
        token,
        &query,
        EntrypointName::new_unchecked("balanceOf"),
        Amount::zero(),
    )?;
    let mut response =
        response.ok_or(ContractError::from(CustomContractError::InvokeContractError))?;
    let BalanceOfQueryResponse(amounts): BalanceOfQueryResponse<ContractTokenAmount> =
        response.get()?;

    amounts
        .first()
        .copied()
        .ok_or(ContractError::from(CustomContractError::InvokeContractError))
}

/// Transfers `amount` of the sale asset out of this contract.
fn transfer_sale_token<S: HasStateApi>(
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    token: &ContractAddress,
    from: ContractAddress,
    to: AccountAddress,
    amount: ContractTokenAmount,
) -> ContractResult<()> {
    let transfer = Transfer {
        from: Address::from(from),
        to: Receiver::from_account(to),
        token_id: TokenIdUnit(),
        amount,
        data: AdditionalData::empty(),
    };

    let _ = host.invoke_contract(
        token,
        &TransferParams::from(vec![transfer]),
        EntrypointName::new_unchecked("transfer"),
        Amount::zero(),
    )?;
    Ok(())
}

// ==============================================
// For purchasers
// ==========================================

/// Buys tokens at the fixed unit price with the attached CCD. The token
/// amount is the payment divided by the unit price, rounded down; the
/// remainder stays with the sale. With vesting enabled the allocation goes
/// into a fresh vesting account anchored at the purchase time, otherwise it
/// transfers straight to the payer.
///
/// Caller: any account
/// Reject if:
/// - Contract is paused
/// - Now is outside the sale window
/// - The hardcap has been reached, or this purchase would exceed it
/// - The payment is below the minimum or above the maximum
/// - A guarded entry point is already executing
/// - The contract does not hold enough of the sale asset
#[receive(
    contract = "vested_sale",
    name = "purchase",
    error = "ContractError",
    enable_logger,
    mutable,
    payable,
    return_value = "ContractTokenAmount"
)]
fn contract_purchase<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ContractResult<ContractTokenAmount> {
    let payer = match ctx.sender() {
        Address::Account(account) => account,
        _ => bail!(CustomContractError::AccountOnly.into()),
    };
    let now = ctx.metadata().slot_time();

    // admission ladder, first failure aborts before anything moves
    let state = host.state();
    ensure!(!state.paused, CustomContractError::ContractPaused.into());
    ensure!(
        state.window.contains(now),
        CustomContractError::SaleNotOpen.into()
    );
    ensure!(
        !state.pricing.cap_reached(),
        CustomContractError::HardCapReached.into()
    );
    ensure!(
        amount >= state.pricing.min_purchase,
        CustomContractError::BelowMinPurchase.into()
    );
    ensure!(
        amount <= state.pricing.max_purchase,
        CustomContractError::AboveMaxPurchase.into()
    );

    let tokens = state.pricing.token_amount(amount);
    let projected = state
        .pricing
        .total_sold
        .0
        .checked_add(tokens.0)
        .ok_or(ContractError::from(CustomContractError::OverflowError))?;
    ensure!(
        projected <= state.pricing.hard_cap.0,
        CustomContractError::HardCapReached.into()
    );

    let sale_token = state.sale_token;
    let vesting = state.vesting.clone();
    let required = tokens
        .0
        .checked_add(state.vested_custody.0)
        .ok_or(ContractError::from(CustomContractError::OverflowError))?;

    // latched before the first external call
    host.state_mut().begin_entry()?;

    // what is already promised to vesting accounts cannot back this sale
    let held = contract_token_balance(host, &sale_token, ctx.self_address())?;
    ensure!(
        held.0 >= required,
        CustomContractError::InsufficientSaleAsset.into()
    );

    // bookkeeping strictly before any outgoing transfer
    let state = host.state_mut();
    state.pricing.record(amount, tokens)?;

    let grant = match vesting {
        Some(cfg) => {
            let mut account =
                VestingAccount::open(payer, now, cfg.duration, cfg.cliff, cfg.interval)?;
            account.deposit(sale_token, tokens)?;
            Some(state.add_grant(payer, account, tokens)?)
        }
        None => None,
    };

    if grant.is_none() && tokens.0 > 0 {
        transfer_sale_token(host, &sale_token, ctx.self_address(), payer, tokens)?;
    }

    host.state_mut().end_entry();

    logger.log(&SaleEvent::Purchase(PurchaseEvent {
        payer,
        payment: amount,
        tokens,
        grant,
    }))?;

    Ok(tokens)
}

// ==============================================
// For beneficiaries
// ==========================================

/// Releases whatever has vested on one grant of the sender and transfers it
/// to them. Releasing when nothing is due succeeds and moves nothing.
/// Available regardless of pause state.
///
/// Caller: the grant's beneficiary
/// Reject if:
/// - The index does not name a grant of the sender
/// - A guarded entry point is already executing
/// - The sale-asset transfer fails
#[receive(
    contract = "vested_sale",
    name = "release",
    parameter = "GrantIndex",
    error = "ContractError",
    enable_logger,
    mutable,
    return_value = "ContractTokenAmount"
)]
fn contract_release<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<ContractTokenAmount> {
    let beneficiary = match ctx.sender() {
        Address::Account(account) => account,
        _ => bail!(CustomContractError::AccountOnly.into()),
    };
    let index: GrantIndex = ctx.parameter_cursor().get()?;
    let now = ctx.metadata().slot_time();

    // the grant must exist before anything is latched
    host.state().with_grant(&beneficiary, index, |_| Ok(()))?;

    let state = host.state_mut();
    state.begin_entry()?;
    let sale_token = state.sale_token;

    // books move before the asset does
    let amount = state.release_grant(&beneficiary, index, &sale_token, now)?;
    if amount.0 > 0 {
        transfer_sale_token(host, &sale_token, ctx.self_address(), beneficiary, amount)?;
    }

    host.state_mut().end_entry();

    if amount.0 > 0 {
        logger.log(&SaleEvent::Release(ReleaseEvent {
            beneficiary,
            grant_index: index,
            amount,
        }))?;
    }

    Ok(amount)
}

/// Releases every grant of the sender, one transfer per grant with
/// something due. A sender without grants releases nothing and succeeds.
///
/// Caller: any account
/// Reject if:
/// - A guarded entry point is already executing
/// - Any sale-asset transfer fails
#[receive(
    contract = "vested_sale",
    name = "releaseAll",
    error = "ContractError",
    enable_logger,
    mutable,
    return_value = "ContractTokenAmount"
)]
fn contract_release_all<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<ContractTokenAmount> {
    let beneficiary = match ctx.sender() {
        Address::Account(account) => account,
        _ => bail!(CustomContractError::AccountOnly.into()),
    };
    let now = ctx.metadata().slot_time();

    let state = host.state_mut();
    state.begin_entry()?;
    let sale_token = state.sale_token;

    let increments = state.release_all_grants(&beneficiary, &sale_token, now)?;

    let mut total = 0u64;
    for (_, amount) in increments.iter() {
        total = total
            .checked_add(amount.0)
            .ok_or(ContractError::from(CustomContractError::OverflowError))?;
    }
    for (_, amount) in increments.iter() {
        transfer_sale_token(host, &sale_token, ctx.self_address(), beneficiary, *amount)?;
    }

    host.state_mut().end_entry();

    for (index, amount) in increments {
        logger.log(&SaleEvent::Release(ReleaseEvent {
            beneficiary,
            grant_index: index,
            amount,
        }))?;
    }

    Ok(total.into())
}

// ==============================================
// For the owner
// ==========================================

/// Enables vesting for future purchases, overwriting the timing parameters.
/// Accounts created by earlier purchases keep their original schedule.
///
/// Caller: contract instance owner only
/// Reject if:
/// - The sender is not the contract owner
/// - Contract is paused
/// - `cliff > duration`, `interval == 0` or `interval > duration`
#[receive(
    contract = "vested_sale",
    name = "configureVesting",
    parameter = "VestingParams",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_configure_vesting<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&ctx.owner()),
        ContractError::Unauthorized
    );
    let params: VestingParams = ctx.parameter_cursor().get()?;
    ensure!(
        !host.state().paused,
        CustomContractError::ContractPaused.into()
    );
    let config = VestingConfig::new(params.duration, params.cliff, params.interval)?;

    let state = host.state_mut();
    state.begin_entry()?;
    state.vesting = Some(config);
    state.end_entry();

    logger.log(&SaleEvent::ParamChange(ParamChangeEvent {
        kind: ParamKind::VestingConfigured,
        value: params.duration.millis(),
    }))?;

    Ok(())
}

/// Future purchases become direct transfers. Existing accounts keep
/// releasing per their original schedule.
///
/// Caller: contract instance owner only
/// Reject if:
/// - The sender is not the contract owner
/// - Contract is paused
#[receive(
    contract = "vested_sale",
    name = "disableVesting",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_disable_vesting<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&ctx.owner()),
        ContractError::Unauthorized
    );
    ensure!(
        !host.state().paused,
        CustomContractError::ContractPaused.into()
    );

    let state = host.state_mut();
    state.begin_entry()?;
    state.vesting = None;
    state.end_entry();

    logger.log(&SaleEvent::ParamChange(ParamChangeEvent {
        kind: ParamKind::VestingDisabled,
        value: 0,
    }))?;

    Ok(())
}

/// Moves the window opening time.
///
/// Caller: contract instance owner only
/// Reject if:
/// - The sender is not the contract owner
/// - Contract is paused
/// - The new start is not in the future, or not before the end
#[receive(
    contract = "vested_sale",
    name = "setStartTime",
    parameter = "Timestamp",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_set_start_time<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&ctx.owner()),
        ContractError::Unauthorized
    );
    let start: Timestamp = ctx.parameter_cursor().get()?;
    let now = ctx.metadata().slot_time();

    let state = host.state();
    ensure!(!state.paused, CustomContractError::ContractPaused.into());
    ensure!(now < start, CustomContractError::InvalidTime.into());
    ensure!(
        start < state.window.end,
        CustomContractError::InvalidTime.into()
    );

    let state = host.state_mut();
    state.begin_entry()?;
    state.window.start = start;
    state.end_entry();

    logger.log(&SaleEvent::ParamChange(ParamChangeEvent {
        kind: ParamKind::StartTime,
        value: start.timestamp_millis(),
    }))?;

    Ok(())
}

/// Moves the window closing time.
///
/// Caller: contract instance owner only
/// Reject if:
/// - The sender is not the contract owner
/// - Contract is paused
/// - The new end is not in the future, or not after the start
#[receive(
    contract = "vested_sale",
    name = "setEndTime",
    parameter = "Timestamp",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_set_end_time<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&ctx.owner()),
        ContractError::Unauthorized
    );
    let end: Timestamp = ctx.parameter_cursor().get()?;
    let now = ctx.metadata().slot_time();

    let state = host.state();
    ensure!(!state.paused, CustomContractError::ContractPaused.into());
    ensure!(now < end, CustomContractError::InvalidTime.into());
    ensure!(
        state.window.start < end,
        CustomContractError::InvalidTime.into()
    );

    let state = host.state_mut();
    state.begin_entry()?;
    state.window.end = end;
    state.end_entry();

    logger.log(&SaleEvent::ParamChange(ParamChangeEvent {
        kind: ParamKind::EndTime,
        value: end.timestamp_millis(),
    }))?;

    Ok(())
}

/// Sets the price in µCCD per token for future purchases.
///
/// Caller: contract instance owner only
/// Reject if:
/// - The sender is not the contract owner
/// - Contract is paused
/// - The price is zero
#[receive(
    contract = "vested_sale",
    name = "setUnitPrice",
    parameter = "MicroCcd",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_set_unit_price<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&ctx.owner()),
        ContractError::Unauthorized
    );
    let price: MicroCcd = ctx.parameter_cursor().get()?;
    ensure!(
        !host.state().paused,
        CustomContractError::ContractPaused.into()
    );
    ensure!(price > 0, CustomContractError::InvalidPrice.into());

    let state = host.state_mut();
    state.begin_entry()?;
    state.pricing.unit_price = price;
    state.end_entry();

    logger.log(&SaleEvent::ParamChange(ParamChangeEvent {
        kind: ParamKind::UnitPrice,
        value: price,
    }))?;

    Ok(())
}

/// Changes the hardcap. Lowering it below what is already sold is not
/// possible; raising it re-opens room for future purchases.
///
/// Caller: contract instance owner only
/// Reject if:
/// - The sender is not the contract owner
/// - Contract is paused
/// - The new cap is below the tokens already sold
#[receive(
    contract = "vested_sale",
    name = "setHardCap",
    parameter = "ContractTokenAmount",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_set_hard_cap<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&ctx.owner()),
        ContractError::Unauthorized
    );
    let cap: ContractTokenAmount = ctx.parameter_cursor().get()?;
    let state = host.state();
    ensure!(!state.paused, CustomContractError::ContractPaused.into());
    ensure!(
        state.pricing.total_sold.0 <= cap.0,
        CustomContractError::InvalidCap.into()
    );

    let state = host.state_mut();
    state.begin_entry()?;
    state.pricing.hard_cap = cap;
    state.end_entry();

    logger.log(&SaleEvent::ParamChange(ParamChangeEvent {
        kind: ParamKind::HardCap,
        value: cap.0,
    }))?;

    Ok(())
}

/// The parameter type for `setPurchaseLimits`.
#[derive(Debug, Serialize, SchemaType)]
pub struct PurchaseLimitParams {
    pub min_purchase: Amount,
    pub max_purchase: Amount,
}

/// Sets the accepted payment range per purchase.
///
/// Caller: contract instance owner only
/// Reject if:
/// - The sender is not the contract owner
/// - Contract is paused
/// - min exceeds max
#[receive(
    contract = "vested_sale",
    name = "setPurchaseLimits",
    parameter = "PurchaseLimitParams",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_set_purchase_limits<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&ctx.owner()),
        ContractError::Unauthorized
    );
    let params: PurchaseLimitParams = ctx.parameter_cursor().get()?;
    ensure!(
        !host.state().paused,
        CustomContractError::ContractPaused.into()
    );
    ensure!(
        params.min_purchase <= params.max_purchase,
        CustomContractError::InvalidLimits.into()
    );

    let state = host.state_mut();
    state.begin_entry()?;
    state.pricing.min_purchase = params.min_purchase;
    state.pricing.max_purchase = params.max_purchase;
    state.end_entry();

    logger.log(&SaleEvent::ParamChange(ParamChangeEvent {
        kind: ParamKind::MinPurchase,
        value: params.min_purchase.micro_ccd,
    }))?;
    logger.log(&SaleEvent::ParamChange(ParamChangeEvent {
        kind: ParamKind::MaxPurchase,
        value: params.max_purchase.micro_ccd,
    }))?;

    Ok(())
}

/// Purchases and administrative operations stop working while paused.
/// Vesting releases are not affected.
///
/// Caller: contract instance owner only
/// Reject if:
/// - The sender is not the contract owner
#[receive(
    contract = "vested_sale",
    name = "pause",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_pause<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&ctx.owner()),
        ContractError::Unauthorized
    );

    let state = host.state_mut();
    state.begin_entry()?;
    state.paused = true;
    state.end_entry();

    logger.log(&SaleEvent::ParamChange(ParamChangeEvent {
        kind: ParamKind::Paused,
        value: 1,
    }))?;

    Ok(())
}

/// The contract is unpaused.
///
/// Caller: contract instance owner only
/// Reject if:
/// - The sender is not the contract owner
#[receive(
    contract = "vested_sale",
    name = "unpause",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_unpause<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&ctx.owner()),
        ContractError::Unauthorized
    );

    let state = host.state_mut();
    state.begin_entry()?;
    state.paused = false;
    state.end_entry();

    logger.log(&SaleEvent::ParamChange(ParamChangeEvent {
        kind: ParamKind::Unpaused,
        value: 0,
    }))?;

    Ok(())
}

/// Closes the books once the window has elapsed or the hardcap is reached.
/// Captures the sale-asset balance not promised to vesting accounts as the
/// unsold amount and latches the sale; the latch never reverts.
///
/// Caller: contract instance owner only
/// Reject if:
/// - The sender is not the contract owner
/// - Contract is paused
/// - Already finalized
/// - The window is still open and the hardcap not reached
#[receive(
    contract = "vested_sale",
    name = "finalizeSale",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_finalize_sale<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&ctx.owner()),
        ContractError::Unauthorized
    );
    let now = ctx.metadata().slot_time();

    let state = host.state();
    ensure!(!state.paused, CustomContractError::ContractPaused.into());
    ensure!(
        !state.finalized,
        CustomContractError::AlreadyFinalized.into()
    );
    ensure!(
        state.window.is_closed(now) || state.pricing.cap_reached(),
        CustomContractError::SaleStillOpen.into()
    );

    let sale_token = state.sale_token;
    let custody = state.vested_custody;

    host.state_mut().begin_entry()?;

    let held = contract_token_balance(host, &sale_token, ctx.self_address())?;
    // allocations still sitting in vesting accounts are not unsold
    let unsold = ContractTokenAmount::from(held.0.saturating_sub(custody.0));

    let state = host.state_mut();
    state.unsold_approved = unsold;
    state.finalized = true;
    state.end_entry();

    logger.log(&SaleEvent::Finalize(FinalizeEvent { unsold }))?;

    Ok(())
}

/// Transfers the unsold amount captured at finalization to `destination`.
/// The approval is zeroed before the transfer, so it can only happen once.
///
/// Caller: contract instance owner only
/// Reject if:
/// - The sender is not the contract owner
/// - Contract is paused
/// - Not finalized, or nothing was captured
/// - The sale-asset transfer fails
#[receive(
    contract = "vested_sale",
    name = "withdrawUnsold",
    parameter = "AccountAddress",
    error = "ContractError",
    enable_logger,
    mutable
)]
fn contract_withdraw_unsold<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&ctx.owner()),
        ContractError::Unauthorized
    );
    let destination: AccountAddress = ctx.parameter_cursor().get()?;

    let state = host.state();
    ensure!(!state.paused, CustomContractError::ContractPaused.into());
    ensure!(state.finalized, CustomContractError::NotFinalized.into());
    ensure!(
        state.unsold_approved.0 > 0,
        CustomContractError::NothingToWithdraw.into()
    );

    let state = host.state_mut();
    state.begin_entry()?;
    let amount = state.unsold_approved;
    let sale_token = state.sale_token;
    // zeroed before the transfer leaves the contract
    state.unsold_approved = 0u64.into();
    state.unsold_withdrawn = true;

    transfer_sale_token(host, &sale_token, ctx.self_address(), destination, amount)?;

    host.state_mut().end_entry();

    logger.log(&SaleEvent::UnsoldWithdraw(UnsoldWithdrawEvent {
        to: destination,
        amount,
    }))?;

    Ok(())
}

/// Transfers the whole CCD balance raised by the sale to `destination`.
///
/// Caller: contract instance owner only
/// Reject if:
/// - The sender is not the contract owner
/// - Contract is paused
/// - Not finalized
/// - The CCD transfer fails
#[receive(
    contract = "vested_sale",
    name = "withdrawRaisedFunds",
    parameter = "AccountAddress",
    error = "ContractError",
    mutable
)]
fn contract_withdraw_raised_funds<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&ctx.owner()),
        ContractError::Unauthorized
    );
    let destination: AccountAddress = ctx.parameter_cursor().get()?;

    let state = host.state();
    ensure!(!state.paused, CustomContractError::ContractPaused.into());
    ensure!(state.finalized, CustomContractError::NotFinalized.into());

    host.state_mut().begin_entry()?;

    let balance = host.self_balance();
    let transfer_result = host.invoke_transfer(&destination, balance);
    ensure!(
        transfer_result.is_ok(),
        CustomContractError::TransferError.into()
    );

    host.state_mut().end_entry();

    Ok(())
}
