use concordium_std::concordium_cfg_test;

#[concordium_cfg_test]
mod tests {
    use crate::sctest::*;
    use crate::view::{
        contract_releasable_for_account, contract_releasable_total, contract_schedule_for,
        contract_vesting_accounts_of, GrantRef, GrantView,
    };
    use crate::*;
    use concordium_std::test_infrastructure::*;

    /// One purchaser with a single 1000-token grant over [10, 40, 70, 100].
    fn host_with_grant(
        beneficiary: AccountAddress,
        total: u64,
    ) -> TestHost<State<TestStateApi>> {
        let mut state_builder = TestStateBuilder::new();
        let mut state = initial_state(&mut state_builder, Some(default_vesting()));
        state
            .add_grant(beneficiary, funded_account(beneficiary, total), total.into())
            .unwrap_abort();
        TestHost::new(state, state_builder)
    }

    #[concordium_test]
    fn test_release_steps_until_end() {
        let beneficiary = new_account();
        let mut host = host_with_grant(beneficiary, 1000);
        let mut logger = TestLogger::init();
        mock_transfer_ok(&mut host);

        let parameter_bytes = to_bytes(&0u32);

        // one schedule point passed
        let mut ctx = receive_context(beneficiary, ts(39));
        ctx.set_parameter(&parameter_bytes);
        let amount = contract_release(&ctx, &mut host, &mut logger).expect_report("release failed");
        claim_eq!(amount.0, 250);

        // the next point unlocks the next quarter
        let mut ctx = receive_context(beneficiary, ts(40));
        ctx.set_parameter(&parameter_bytes);
        let amount = contract_release(&ctx, &mut host, &mut logger).expect_report("release failed");
        claim_eq!(amount.0, 250);

        // the end pays out the remainder exactly
        let mut ctx = receive_context(beneficiary, ts(100));
        ctx.set_parameter(&parameter_bytes);
        let amount = contract_release(&ctx, &mut host, &mut logger).expect_report("release failed");
        claim_eq!(amount.0, 500);

        let state = host.state();
        claim_eq!(state.vested_custody.0, 0);
        let purchaser = state.participants.get(&beneficiary).unwrap_abort();
        claim_eq!(purchaser.grants[0].ledger_released.0, 1000);
        claim_eq!(
            purchaser.grants[0].account.released_of(&SALE_TOKEN),
            1000,
            "ledger mirror and account books must agree"
        );
    }

    #[concordium_test]
    fn test_release_twice_moves_once() {
        let beneficiary = new_account();
        let mut host = host_with_grant(beneficiary, 1000);
        let mut logger = TestLogger::init();
        mock_transfer_ok(&mut host);

        let parameter_bytes = to_bytes(&0u32);
        let mut ctx = receive_context(beneficiary, ts(40));
        ctx.set_parameter(&parameter_bytes);

        let first = contract_release(&ctx, &mut host, &mut logger).expect_report("release failed");
        claim_eq!(first.0, 500);

        // immediate second call transfers nothing and does not error
        let second = contract_release(&ctx, &mut host, &mut logger).expect_report("release failed");
        claim_eq!(second.0, 0);
        claim_eq!(logger.logs.len(), 1, "a zero release is not signalled");

        let state = host.state();
        let purchaser = state.participants.get(&beneficiary).unwrap_abort();
        claim_eq!(purchaser.grants[0].ledger_released.0, 500);
    }

    #[concordium_test]
    fn test_release_before_cliff_is_noop() {
        let beneficiary = new_account();
        // no transfer mock: a zero release must not touch the token contract
        let mut host = host_with_grant(beneficiary, 1000);
        let mut logger = TestLogger::init();

        let parameter_bytes = to_bytes(&0u32);
        let mut ctx = receive_context(beneficiary, ts(5));
        ctx.set_parameter(&parameter_bytes);

        let amount = contract_release(&ctx, &mut host, &mut logger).expect_report("release failed");
        claim_eq!(amount.0, 0);
        claim_eq!(host.state().vested_custody.0, 1000);
    }

    #[concordium_test]
    fn test_release_bad_index() {
        let beneficiary = new_account();
        let mut host = host_with_grant(beneficiary, 1000);
        let mut logger = TestLogger::init();

        let parameter_bytes = to_bytes(&1u32);
        let mut ctx = receive_context(beneficiary, ts(40));
        ctx.set_parameter(&parameter_bytes);
        let ret = contract_release(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(
                CustomContractError::GrantIndexOutOfRange
            ))
        );

        // a stranger without grants has no index 0 either
        let stranger = new_account();
        let parameter_bytes = to_bytes(&0u32);
        let mut ctx = receive_context(stranger, ts(40));
        ctx.set_parameter(&parameter_bytes);
        let ret = contract_release(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(
                CustomContractError::GrantIndexOutOfRange
            ))
        );
    }

    #[concordium_test]
    fn test_release_all_sweeps_grants() {
        let beneficiary = new_account();
        let mut state_builder = TestStateBuilder::new();
        let mut state = initial_state(&mut state_builder, Some(default_vesting()));
        state
            .add_grant(beneficiary, funded_account(beneficiary, 1000), 1000.into())
            .unwrap_abort();
        state
            .add_grant(beneficiary, funded_account(beneficiary, 400), 400.into())
            .unwrap_abort();
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();
        mock_transfer_ok(&mut host);

        let ctx = receive_context(beneficiary, ts(40));
        let total =
            contract_release_all(&ctx, &mut host, &mut logger).expect_report("release failed");
        claim_eq!(total.0, 700);
        claim_eq!(host.state().vested_custody.0, 700);
        claim_eq!(logger.logs.len(), 2, "one signal per swept grant");

        // sweeping again at the same instant moves nothing
        let total =
            contract_release_all(&ctx, &mut host, &mut logger).expect_report("release failed");
        claim_eq!(total.0, 0);

        // a sender without grants sweeps nothing and succeeds
        let stranger = new_account();
        let ctx = receive_context(stranger, ts(40));
        let total =
            contract_release_all(&ctx, &mut host, &mut logger).expect_report("release failed");
        claim_eq!(total.0, 0);
    }

    #[concordium_test]
    fn test_release_available_while_paused() {
        let beneficiary = new_account();
        let mut host = host_with_grant(beneficiary, 1000);
        host.state_mut().paused = true;
        let mut logger = TestLogger::init();
        mock_transfer_ok(&mut host);

        let parameter_bytes = to_bytes(&0u32);
        let mut ctx = receive_context(beneficiary, ts(40));
        ctx.set_parameter(&parameter_bytes);
        let amount = contract_release(&ctx, &mut host, &mut logger).expect_report("release failed");
        claim_eq!(amount.0, 500, "pause must not block vesting releases");
    }

    #[concordium_test]
    fn test_release_transfer_failure_aborts() {
        let beneficiary = new_account();
        let mut host = host_with_grant(beneficiary, 1000);
        let mut logger = TestLogger::init();
        host.setup_mock_entrypoint(
            SALE_TOKEN,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            MockFn::returning_err::<()>(CallContractError::Trap),
        );

        let parameter_bytes = to_bytes(&0u32);
        let mut ctx = receive_context(beneficiary, ts(40));
        ctx.set_parameter(&parameter_bytes);
        let ret = contract_release(&ctx, &mut host, &mut logger);
        claim_eq!(ret, Err(ContractError::from(CustomContractError::Trap)));
        claim_eq!(logger.logs.len(), 0, "a failed release signals nothing");
    }

    #[concordium_test]
    fn test_reentrant_release_rejected() {
        let beneficiary = new_account();
        let mut host = host_with_grant(beneficiary, 1000);
        host.state_mut().locked = true;
        let mut logger = TestLogger::init();

        let parameter_bytes = to_bytes(&0u32);
        let mut ctx = receive_context(beneficiary, ts(40));
        ctx.set_parameter(&parameter_bytes);
        let ret = contract_release(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::ReentrantCall))
        );
    }

    #[concordium_test]
    fn test_vesting_views() {
        let beneficiary = new_account();
        let mut host = host_with_grant(beneficiary, 1000);
        let mut logger = TestLogger::init();
        mock_transfer_ok(&mut host);

        // releasableTotal over the only grant
        let owner_bytes = to_bytes(&beneficiary);
        let mut ctx = receive_context(beneficiary, ts(40));
        ctx.set_parameter(&owner_bytes);
        let total = contract_releasable_total(&ctx, &host).unwrap_abort();
        claim_eq!(total.0, 500);

        // an unknown user is simply empty, never an error
        let stranger_bytes = to_bytes(&new_account());
        let mut ctx = receive_context(beneficiary, ts(40));
        ctx.set_parameter(&stranger_bytes);
        let total = contract_releasable_total(&ctx, &host).unwrap_abort();
        claim_eq!(total.0, 0);

        // per-grant view and the schedule itself
        let grant_ref_bytes = to_bytes(&GrantRef {
            owner: beneficiary,
            index: 0,
        });
        let mut ctx = receive_context(beneficiary, ts(40));
        ctx.set_parameter(&grant_ref_bytes);
        let releasable = contract_releasable_for_account(&ctx, &host).unwrap_abort();
        claim_eq!(releasable.0, 500);
        let schedule = contract_schedule_for(&ctx, &host).unwrap_abort();
        claim_eq!(schedule, vec![ts(10), ts(40), ts(70), ts(100)]);

        let bad_ref_bytes = to_bytes(&GrantRef {
            owner: beneficiary,
            index: 7,
        });
        let mut ctx = receive_context(beneficiary, ts(40));
        ctx.set_parameter(&bad_ref_bytes);
        let ret = contract_releasable_for_account(&ctx, &host);
        claim_eq!(
            ret,
            Err(ContractError::from(
                CustomContractError::GrantIndexOutOfRange
            ))
        );

        // grant summaries move with the release
        let parameter_bytes = to_bytes(&0u32);
        let mut ctx = receive_context(beneficiary, ts(40));
        ctx.set_parameter(&parameter_bytes);
        contract_release(&ctx, &mut host, &mut logger).expect_report("release failed");

        let mut ctx = receive_context(beneficiary, ts(40));
        ctx.set_parameter(&owner_bytes);
        let grants: Vec<GrantView> = contract_vesting_accounts_of(&ctx, &host).unwrap_abort();
        claim_eq!(grants.len(), 1);
        claim_eq!(grants[0].initial_amount.0, 1000);
        claim_eq!(grants[0].released.0, 500);
        claim_eq!(grants[0].releasable.0, 0);
        claim_eq!(grants[0].start, ts(0));
        claim_eq!(grants[0].end, ts(100));
        claim_eq!(grants[0].schedule_len, 4);
    }
}
