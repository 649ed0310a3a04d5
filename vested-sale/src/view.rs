use crate::state::{State, *};
use concordium_std::*;

#[derive(Debug, Serialize, SchemaType)]
struct ViewResponse {
    sale_token: ContractAddress,
    stage: SaleStage,
    paused: bool,
    finalized: bool,
    window: SaleWindow,
    pricing: SaleInfo,
    vesting: Option<VestingConfig>,
    unsold_approved: ContractTokenAmount,
    vested_custody: ContractTokenAmount,
}

#[receive(
    contract = "vested_sale",
    name = "view",
    return_value = "ViewResponse"
)]
pub(crate) fn contract_view<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<ViewResponse> {
    let state = host.state();
    let now = ctx.metadata().slot_time();

    Ok(ViewResponse {
        sale_token: state.sale_token,
        stage: state.stage(now),
        paused: state.paused,
        finalized: state.finalized,
        window: state.window.clone(),
        pricing: state.pricing.clone(),
        vesting: state.vesting.clone(),
        unsold_approved: state.unsold_approved,
        vested_custody: state.vested_custody,
    })
}

// ------------------------------------------

/// Whether a purchase would currently pass the window, cap and pause gates.
#[receive(contract = "vested_sale", name = "isOpen", return_value = "bool")]
pub(crate) fn contract_is_open<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<bool> {
    Ok(host.state().is_open(ctx.metadata().slot_time()))
}

/// Tokens a given payment would buy at the current unit price.
#[receive(
    contract = "vested_sale",
    name = "calculateTokenAmount",
    parameter = "Amount",
    error = "ContractError",
    return_value = "ContractTokenAmount"
)]
pub(crate) fn contract_calculate_token_amount<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ContractTokenAmount> {
    let payment: Amount = ctx.parameter_cursor().get()?;
    Ok(host.state().pricing.token_amount(payment))
}

// ------------------------------------------

/// Names one grant of one purchaser.
#[derive(Debug, Serialize, SchemaType)]
pub struct GrantRef {
    pub owner: AccountAddress,
    pub index: GrantIndex,
}

/// Summary of one vesting grant.
#[derive(Debug, Serialize, SchemaType)]
pub struct GrantView {
    pub initial_amount: ContractTokenAmount,
    pub released: ContractTokenAmount,
    pub releasable: ContractTokenAmount,
    pub start: Timestamp,
    pub end: Timestamp,
    pub schedule_len: u32,
}

type VestingAccountsResponse = Vec<GrantView>;

/// All grants of a purchaser. Unknown users simply hold none.
#[receive(
    contract = "vested_sale",
    name = "vestingAccountsOf",
    parameter = "AccountAddress",
    error = "ContractError",
    return_value = "VestingAccountsResponse"
)]
pub(crate) fn contract_vesting_accounts_of<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<VestingAccountsResponse> {
    let owner: AccountAddress = ctx.parameter_cursor().get()?;
    let state = host.state();
    let now = ctx.metadata().slot_time();

    let mut ret = Vec::new();
    if let Some(purchaser) = state.participants.get(&owner) {
        for grant in purchaser.grants.iter() {
            ret.push(GrantView {
                initial_amount: grant.initial_amount,
                released: grant.account.released_of(&state.sale_token).into(),
                releasable: grant.account.releasable(&state.sale_token, now)?,
                start: grant.account.start,
                end: grant.account.end(),
                schedule_len: grant.account.release_times.len() as u32,
            });
        }
    }

    Ok(ret)
}

/// Releasable amount summed over every grant of a purchaser; 0 for unknown
/// users.
#[receive(
    contract = "vested_sale",
    name = "releasableTotal",
    parameter = "AccountAddress",
    error = "ContractError",
    return_value = "ContractTokenAmount"
)]
pub(crate) fn contract_releasable_total<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ContractTokenAmount> {
    let owner: AccountAddress = ctx.parameter_cursor().get()?;
    let state = host.state();
    state.releasable_total(&owner, &state.sale_token, ctx.metadata().slot_time())
}

/// Releasable amount of a single grant.
///
/// Reject if:
/// - The index does not name a grant of the owner
#[receive(
    contract = "vested_sale",
    name = "releasableForAccount",
    parameter = "GrantRef",
    error = "ContractError",
    return_value = "ContractTokenAmount"
)]
pub(crate) fn contract_releasable_for_account<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ContractTokenAmount> {
    let grant_ref: GrantRef = ctx.parameter_cursor().get()?;
    let state = host.state();
    let now = ctx.metadata().slot_time();

    state.with_grant(&grant_ref.owner, grant_ref.index, |grant| {
        grant
            .account
            .releasable(&state.sale_token, now)
            .map_err(ContractError::from)
    })
}

type ScheduleForResponse = Vec<Timestamp>;

/// The precomputed release points of a single grant.
///
/// Reject if:
/// - The index does not name a grant of the owner
#[receive(
    contract = "vested_sale",
    name = "scheduleFor",
    parameter = "GrantRef",
    error = "ContractError",
    return_value = "ScheduleForResponse"
)]
pub(crate) fn contract_schedule_for<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ScheduleForResponse> {
    let grant_ref: GrantRef = ctx.parameter_cursor().get()?;
    let state = host.state();

    state.with_grant(&grant_ref.owner, grant_ref.index, |grant| {
        Ok(grant.account.release_times.clone())
    })
}

// ------------------------------------------

/// Per-purchaser rollup of the vesting ledger.
#[derive(Debug, Serialize, SchemaType)]
pub struct ParticipantView {
    pub grant_count: u32,
    pub total_initial: ContractTokenAmount,
    pub total_released: ContractTokenAmount,
}

type ViewParticipantsResponse = Vec<(AccountAddress, ParticipantView)>;

#[receive(
    contract = "vested_sale",
    name = "viewParticipants",
    error = "ContractError",
    return_value = "ViewParticipantsResponse"
)]
pub(crate) fn contract_view_participants<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<ViewParticipantsResponse> {
    let state = host.state();

    let mut ret: Vec<(AccountAddress, ParticipantView)> = Vec::new();
    for (addr, purchaser) in state.participants.iter() {
        let mut total_initial = 0u64;
        let mut total_released = 0u64;
        for grant in purchaser.grants.iter() {
            total_initial = total_initial
                .checked_add(grant.initial_amount.0)
                .ok_or(ContractError::from(CustomContractError::OverflowError))?;
            total_released = total_released
                .checked_add(grant.ledger_released.0)
                .ok_or(ContractError::from(CustomContractError::OverflowError))?;
        }
        ret.push((
            *addr,
            ParticipantView {
                grant_count: purchaser.grants.len() as u32,
                total_initial: total_initial.into(),
                total_released: total_released.into(),
            },
        ));
    }

    Ok(ret)
}
