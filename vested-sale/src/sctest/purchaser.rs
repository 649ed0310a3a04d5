use concordium_std::concordium_cfg_test;

#[concordium_cfg_test]
mod tests {
    use crate::sctest::*;
    use crate::view::{contract_calculate_token_amount, contract_is_open};
    use crate::*;
    use concordium_std::test_infrastructure::*;

    #[concordium_test]
    fn test_direct_purchase() {
        let buyer = new_account();
        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();
        mock_balance_of(&mut host, 100_000);
        mock_transfer_ok(&mut host);

        let ctx = receive_context(buyer, ts(15));
        let tokens = contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(500), &mut logger)
            .expect_report("purchase failed");

        claim_eq!(tokens.0, 100, "500 µCCD at 5 µCCD each buys 100 tokens");
        claim_eq!(host.state().pricing.total_sold.0, 100);
        claim_eq!(
            host.state().pricing.total_raised,
            Amount::from_micro_ccd(500)
        );
        // direct sale leaves no vesting ledger entry behind
        claim_eq!(host.state().participants.iter().count(), 0);
        claim_eq!(host.state().vested_custody.0, 0);
        claim_eq!(logger.logs.len(), 1);
        claim!(!host.state().locked, "entry latch must be clear afterwards");
    }

    #[concordium_test]
    fn test_purchase_floors_fractional_tokens() {
        let buyer = new_account();
        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();
        mock_balance_of(&mut host, 100_000);
        mock_transfer_ok(&mut host);

        let ctx = receive_context(buyer, ts(15));
        // 499 / 5 = 99, the remainder stays with the sale
        let tokens = contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(499), &mut logger)
            .expect_report("purchase failed");
        claim_eq!(tokens.0, 99);
        claim_eq!(
            host.state().pricing.total_raised,
            Amount::from_micro_ccd(499)
        );
    }

    #[concordium_test]
    fn test_purchase_outside_window() {
        let buyer = new_account();
        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();

        let ctx = receive_context(buyer, ts(5));
        let ret = contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(500), &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::SaleNotOpen))
        );

        let ctx = receive_context(buyer, ts(31));
        let ret = contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(500), &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::SaleNotOpen))
        );
        claim_eq!(host.state().pricing.total_sold.0, 0);
        claim_eq!(host.state().pricing.total_raised, Amount::zero());
    }

    #[concordium_test]
    fn test_purchase_limits() {
        let buyer = new_account();
        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();

        let ctx = receive_context(buyer, ts(15));
        let ret = contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(9), &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::BelowMinPurchase))
        );

        let ret = contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(2_001), &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::AboveMaxPurchase))
        );

        // rejected purchases leave the counters untouched
        claim_eq!(host.state().pricing.total_sold.0, 0);
        claim_eq!(host.state().pricing.total_raised, Amount::zero());
    }

    #[concordium_test]
    fn test_purchase_while_paused() {
        let buyer = new_account();
        let mut state_builder = TestStateBuilder::new();
        let mut state = initial_state(&mut state_builder, None);
        state.paused = true;
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();

        let ctx = receive_context(buyer, ts(15));
        let ret = contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(500), &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::ContractPaused))
        );
    }

    #[concordium_test]
    fn test_purchase_insufficient_backing() {
        let buyer = new_account();
        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();
        // the contract only holds 50 of the 100 tokens it would promise
        mock_balance_of(&mut host, 50);

        let ctx = receive_context(buyer, ts(15));
        let ret = contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(500), &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(
                CustomContractError::InsufficientSaleAsset
            ))
        );
        claim_eq!(host.state().pricing.total_sold.0, 0);
    }

    #[concordium_test]
    fn test_purchase_hardcap_boundary() {
        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();
        mock_balance_of(&mut host, 100_000);
        mock_transfer_ok(&mut host);

        // 2 x 400 tokens fit under the 1000 cap
        for _ in 0..2 {
            let ctx = receive_context(new_account(), ts(15));
            contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(2_000), &mut logger)
                .expect_report("purchase failed");
        }
        claim_eq!(host.state().pricing.total_sold.0, 800);

        // another 400 would overshoot
        let ctx = receive_context(new_account(), ts(15));
        let ret = contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(2_000), &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::HardCapReached))
        );
        claim_eq!(host.state().pricing.total_sold.0, 800);

        // an exact fill is fine
        let ctx = receive_context(new_account(), ts(15));
        contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(1_000), &mut logger)
            .expect_report("purchase failed");
        claim_eq!(host.state().pricing.total_sold.0, 1000);

        // and from then on the sale is closed
        let ctx = receive_context(new_account(), ts(15));
        let ret = contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(500), &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::HardCapReached))
        );
    }

    #[concordium_test]
    fn test_vesting_purchase_opens_account_per_purchase() {
        let buyer = new_account();
        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, Some(default_vesting()));
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();
        // no transfer mock: a vesting purchase must not move the sale asset
        mock_balance_of(&mut host, 100_000);

        let ctx = receive_context(buyer, ts(15));
        let tokens = contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(500), &mut logger)
            .expect_report("purchase failed");
        claim_eq!(tokens.0, 100);
        claim_eq!(host.state().vested_custody.0, 100);

        let ctx = receive_context(buyer, ts(20));
        contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(250), &mut logger)
            .expect_report("purchase failed");

        let state = host.state();
        let purchaser = state.participants.get(&buyer).unwrap_abort();
        claim_eq!(purchaser.grants.len(), 2, "one account per purchase");
        claim_eq!(purchaser.grants[0].initial_amount.0, 100);
        claim_eq!(purchaser.grants[1].initial_amount.0, 50);
        // each schedule is anchored at its own purchase time
        claim_eq!(purchaser.grants[0].account.start, ts(15));
        claim_eq!(purchaser.grants[1].account.start, ts(20));
        claim_eq!(
            state.pricing.total_sold.0,
            purchaser.grants[0].initial_amount.0 + purchaser.grants[1].initial_amount.0
        );
        claim_eq!(state.vested_custody.0, 150);
    }

    #[concordium_test]
    fn test_reentrant_purchase_rejected() {
        let buyer = new_account();
        let mut state_builder = TestStateBuilder::new();
        let mut state = initial_state(&mut state_builder, None);
        state.locked = true;
        let mut host = TestHost::new(state, state_builder);
        let mut logger = TestLogger::init();

        let ctx = receive_context(buyer, ts(15));
        let ret = contract_purchase(&ctx, &mut host, Amount::from_micro_ccd(500), &mut logger);
        claim_eq!(
            ret,
            Err(ContractError::from(CustomContractError::ReentrantCall))
        );
    }

    #[concordium_test]
    fn test_sale_views() {
        let mut state_builder = TestStateBuilder::new();
        let state = initial_state(&mut state_builder, None);
        let host = TestHost::new(state, state_builder);

        let ctx = receive_context(new_account(), ts(15));
        claim!(contract_is_open(&ctx, &host).unwrap());
        let ctx = receive_context(new_account(), ts(5));
        claim!(!contract_is_open(&ctx, &host).unwrap());

        let parameter_bytes = to_bytes(&Amount::from_micro_ccd(1_999));
        let mut ctx = receive_context(new_account(), ts(15));
        ctx.set_parameter(&parameter_bytes);
        let tokens = contract_calculate_token_amount(&ctx, &host).unwrap();
        claim_eq!(tokens.0, 399);
    }
}
