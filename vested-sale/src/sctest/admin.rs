use concordium_std::concordium_cfg_test;

#[concordium_cfg_test]
mod tests {
    use crate::sctest::*;
    use crate::*;
    use concordium_std::test_infrastructure::*;

    #[concordium_test]
    fn test_owner_only_gates() {
        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();

        let stranger = new_account();
        let ctx = receive_context(stranger, ts(5));

        let ret = contract_pause(&ctx, &mut host, &mut logger);
        claim_eq!(ret, Err(ContractError::Unauthorized));
        let ret = contract_finalize_sale(&ctx, &mut host, &mut logger);
        claim_eq!(ret, Err(ContractError::Unauthorized));
        let ret = contract_disable_vesting(&ctx, &mut host, &mut logger);
        claim_eq!(ret, Err(ContractError::Unauthorized));
        claim!(!host.state().paused);
    }

    #[concordium_test]
    fn test_pause_unpause() {
        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();

        let ctx = receive_context(OWNER_ACC, ts(5));
        contract_pause(&ctx, &mut host, &mut logger).expect_report("pause failed");
        claim!(host.state().paused);

        // paused blocks administrative mutation
        let parameter_bytes = to_bytes(&7u64);
        let mut set_ctx = receive_context(OWNER_ACC, ts(5));
        set_ctx.set_parameter(&parameter_bytes);
        let ret = contract_set_unit_price(&set_ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::ContractPaused))
        );

        contract_unpause(&ctx, &mut host, &mut logger).expect_report("unpause failed");
        claim!(!host.state().paused);
        contract_set_unit_price(&set_ctx, &mut host, &mut logger).expect_report("set failed");
        claim_eq!(host.state().pricing.unit_price, 7);
    }

    #[concordium_test]
    fn test_set_unit_price_validation() {
        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();

        let parameter_bytes = to_bytes(&0u64);
        let mut ctx = receive_context(OWNER_ACC, ts(5));
        ctx.set_parameter(&parameter_bytes);
        let ret = contract_set_unit_price(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::InvalidPrice))
        );
        claim_eq!(host.state().pricing.unit_price, 5);
    }

    #[concordium_test]
    fn test_set_times_validation() {
        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();

        // start must be in the future
        let past = to_bytes(&ts(3));
        let mut ctx = receive_context(OWNER_ACC, ts(5));
        ctx.set_parameter(&past);
        let ret = contract_set_start_time(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::InvalidTime))
        );

        // start must stay before the end
        let beyond_end = to_bytes(&ts(30));
        let mut ctx = receive_context(OWNER_ACC, ts(5));
        ctx.set_parameter(&beyond_end);
        let ret = contract_set_start_time(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::InvalidTime))
        );

        let fine = to_bytes(&ts(15));
        let mut ctx = receive_context(OWNER_ACC, ts(5));
        ctx.set_parameter(&fine);
        contract_set_start_time(&ctx, &mut host, &mut logger).expect_report("set start failed");
        claim_eq!(host.state().window.start, ts(15));

        // end must stay after the start
        let before_start = to_bytes(&ts(12));
        let mut ctx = receive_context(OWNER_ACC, ts(5));
        ctx.set_parameter(&before_start);
        let ret = contract_set_end_time(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::InvalidTime))
        );

        let fine = to_bytes(&ts(60));
        let mut ctx = receive_context(OWNER_ACC, ts(5));
        ctx.set_parameter(&fine);
        contract_set_end_time(&ctx, &mut host, &mut logger).expect_report("set end failed");
        claim_eq!(host.state().window.end, ts(60));
    }

    #[concordium_test]
    fn test_set_hard_cap_bounds() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = initial_state(&mut state_builder, None);
        state.pricing.total_sold = 100.into();
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();

        // cannot go below what is already sold
        let too_low = to_bytes(&ContractTokenAmount::from(50));
        let mut ctx = receive_context(OWNER_ACC, ts(5));
        ctx.set_parameter(&too_low);
        let ret = contract_set_hard_cap(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::InvalidCap))
        );
        claim_eq!(host.state().pricing.hard_cap.0, 1000);

        let higher = to_bytes(&ContractTokenAmount::from(2000));
        let mut ctx = receive_context(OWNER_ACC, ts(5));
        ctx.set_parameter(&higher);
        contract_set_hard_cap(&ctx, &mut host, &mut logger).expect_report("set cap failed");
        claim_eq!(host.state().pricing.hard_cap.0, 2000);
    }

    #[concordium_test]
    fn test_set_purchase_limits() {
        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();

        let inverted = to_bytes(&PurchaseLimitParams {
            min_purchase: Amount::from_micro_ccd(100),
            max_purchase: Amount::from_micro_ccd(50),
        });
        let mut ctx = receive_context(OWNER_ACC, ts(5));
        ctx.set_parameter(&inverted);
        let ret = contract_set_purchase_limits(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::InvalidLimits))
        );

        let fine = to_bytes(&PurchaseLimitParams {
            min_purchase: Amount::from_micro_ccd(50),
            max_purchase: Amount::from_micro_ccd(5_000),
        });
        let mut ctx = receive_context(OWNER_ACC, ts(5));
        ctx.set_parameter(&fine);
        contract_set_purchase_limits(&ctx, &mut host, &mut logger).expect_report("set failed");
        claim_eq!(
            host.state().pricing.min_purchase,
            Amount::from_micro_ccd(50)
        );
        claim_eq!(
            host.state().pricing.max_purchase,
            Amount::from_micro_ccd(5_000)
        );
        // one signal per changed limit
        claim_eq!(logger.logs.len(), 2);
    }

    #[concordium_test]
    fn test_configure_and_disable_vesting() {
        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();

        let bad = to_bytes(&VestingParams {
            duration: Duration::from_millis(100),
            cliff: Duration::from_millis(200),
            interval: Duration::from_millis(30),
        });
        let mut ctx = receive_context(OWNER_ACC, ts(5));
        ctx.set_parameter(&bad);
        let ret = contract_configure_vesting(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::InvalidSchedule))
        );
        claim_eq!(host.state().vesting, None);

        let fine = to_bytes(&VestingParams {
            duration: Duration::from_millis(100),
            cliff: Duration::from_millis(10),
            interval: Duration::from_millis(30),
        });
        let mut ctx = receive_context(OWNER_ACC, ts(5));
        ctx.set_parameter(&fine);
        contract_configure_vesting(&ctx, &mut host, &mut logger).expect_report("configure failed");
        claim_eq!(host.state().vesting, Some(default_vesting()));

        let ctx = receive_context(OWNER_ACC, ts(5));
        contract_disable_vesting(&ctx, &mut host, &mut logger).expect_report("disable failed");
        claim_eq!(host.state().vesting, None);
    }

    #[concordium_test]
    fn test_finalize_captures_unsold_once() {
        let buyer = new_account();
        let mut state_builder = TestStateBuilder::new();
        let mut state = initial_state(&mut state_builder, None);
        // 300 tokens promised to a vesting account, still in custody
        state
            .add_grant(buyer, funded_account(buyer, 300), 300.into())
            .unwrap_abort();
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();
        mock_balance_of(&mut host, 800);

        // window still open, cap not reached
        let ctx = receive_context(OWNER_ACC, ts(20));
        let ret = contract_finalize_sale(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::SaleStillOpen))
        );

        let ctx = receive_context(OWNER_ACC, ts(31));
        contract_finalize_sale(&ctx, &mut host, &mut logger).expect_report("finalize failed");
        claim!(host.state().finalized);
        claim_eq!(host.state().unsold_approved.0, 500);

        // frozen at the captured value even if the balance later changes
        mock_balance_of(&mut host, 9_999);
        let ret = contract_finalize_sale(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::AlreadyFinalized))
        );
        claim_eq!(host.state().unsold_approved.0, 500);
    }

    #[concordium_test]
    fn test_finalize_on_hardcap() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = initial_state(&mut state_builder, None);
        state.pricing.total_sold = 1000.into();
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();
        mock_balance_of(&mut host, 0);

        // hardcap reached inside the window is enough to close the books
        let ctx = receive_context(OWNER_ACC, ts(20));
        contract_finalize_sale(&ctx, &mut host, &mut logger).expect_report("finalize failed");
        claim!(host.state().finalized);
        claim_eq!(host.state().unsold_approved.0, 0);
    }

    #[concordium_test]
    fn test_withdraw_unsold() {
        let destination = new_account();
        let parameter_bytes = to_bytes(&destination);

        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();
        mock_transfer_ok(&mut host);

        let mut ctx = receive_context(OWNER_ACC, ts(40));
        ctx.set_parameter(&parameter_bytes);
        let ret = contract_withdraw_unsold(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::NotFinalized))
        );

        host.state_mut().finalized = true;
        let ret = contract_withdraw_unsold(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::NothingToWithdraw))
        );

        host.state_mut().unsold_approved = 500.into();
        contract_withdraw_unsold(&ctx, &mut host, &mut logger).expect_report("withdraw failed");
        claim_eq!(host.state().unsold_approved.0, 0);
        claim!(host.state().unsold_withdrawn);
        claim_eq!(host.state().stage(ts(40)), SaleStage::UnsoldWithdrawn);

        // the approval is spent
        let ret = contract_withdraw_unsold(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::NothingToWithdraw))
        );
    }

    #[concordium_test]
    fn test_withdraw_raised_funds() {
        let destination = new_account();
        let parameter_bytes = to_bytes(&destination);

        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let mut host = TestHost::new(state, state_builder);

        let mut ctx = receive_context(OWNER_ACC, ts(40));
        ctx.set_parameter(&parameter_bytes);
        let ret = contract_withdraw_raised_funds(&ctx, &mut host);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::NotFinalized))
        );

        host.state_mut().finalized = true;
        host.set_self_balance(Amount::from_micro_ccd(5_000));
        contract_withdraw_raised_funds(&ctx, &mut host).expect_report("withdraw failed");
    }

    #[concordium_test]
    fn test_reentrant_admin_call_rejected() {
        let mut state_builder = TestStateBuilder::new();
        let mut state = initial_state(&mut state_builder, None);
        state.locked = true;
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();

        let ctx = receive_context(OWNER_ACC, ts(5));
        let ret = contract_pause(&ctx, &mut host, &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::ReentrantCall))
        );
    }
}
