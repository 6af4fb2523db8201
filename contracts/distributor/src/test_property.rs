#![allow(clippy::unwrap_used, clippy::expect_used, clippy::arithmetic_side_effects)]
//! Property-based tests for the distributor.
//!
//! Invariants tested:
//! - Packing then unpacking a config is lossless for every in-range field set
//! - The reward split always sums to the distributed balance and never gives
//!   the collector or protocol more than their factor allows
//! - The staked balance always equals the full deposits of the live units,
//!   whatever the order of stakes and unwinds
//! - Withdrawal requests never lose or invent tokens

extern crate std;

use proptest::prelude::*;
use std::vec::Vec as StdVec;

use crate::config::{unwrap, wrap, MAX_REWARD_FACTOR};
use crate::rewards::split_rewards;
use crate::testutils::Harness;
use crate::StakingProxyConfig;

// ── proptest! blocks ──────────────────────────────────────────────────────────

proptest! {
    /// `unwrap(wrap(x)) == x` for every field set that fits the layout.
    #[test]
    fn prop_codec_is_lossless(
        collector in 0u32..=0xFFFF,
        protocol in 0u32..=0xFFFF,
        curating_agent in 0u32..=0xFFFF,
        staking_type in 0u32..=0xFF,
    ) {
        let packed = wrap(collector, protocol, curating_agent, staking_type).unwrap();
        prop_assert!(packed < (1u64 << 56));
        prop_assert_eq!(
            unwrap(packed),
            StakingProxyConfig {
                collector_factor: collector,
                protocol_factor: protocol,
                curating_agent_factor: curating_agent,
                staking_type,
            }
        );
    }

    /// The three shares always add up to the balance.
    #[test]
    fn prop_split_is_exact(
        balance in 0i128..=1_000_000_000_000i128,
        collector in 1u32..=MAX_REWARD_FACTOR,
        protocol_seed in 0u32..=MAX_REWARD_FACTOR,
    ) {
        let protocol = protocol_seed % (MAX_REWARD_FACTOR - collector + 1);
        let factors = StakingProxyConfig {
            collector_factor: collector,
            protocol_factor: protocol,
            curating_agent_factor: MAX_REWARD_FACTOR - collector - protocol,
            staking_type: 0,
        };
        prop_assert!(factors.validate().is_ok());

        let split = split_rewards(balance, &factors);
        prop_assert_eq!(split.total(), balance);
        prop_assert!(split.collector_amount * i128::from(MAX_REWARD_FACTOR)
            <= balance * i128::from(collector));
        prop_assert!(split.protocol_amount * i128::from(MAX_REWARD_FACTOR)
            <= balance * i128::from(protocol));
        prop_assert!(split.curating_agent_amount >= 0);
    }

    /// No balance is too large to split.
    #[test]
    fn prop_split_never_overflows(
        balance in 0i128..=i128::MAX,
        collector in 0u32..=MAX_REWARD_FACTOR,
    ) {
        let factors = StakingProxyConfig {
            collector_factor: collector,
            protocol_factor: MAX_REWARD_FACTOR - collector,
            curating_agent_factor: 0,
            staking_type: 0,
        };

        let split = split_rewards(balance, &factors);
        prop_assert_eq!(split.total(), balance);
        prop_assert!(split.collector_amount <= balance);
        prop_assert!(split.curating_agent_amount >= 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// `true` stakes a fresh unit, `false` unwinds the oldest live one.
    #[test]
    fn prop_staked_balance_tracks_live_units(
        steps in prop::collection::vec(any::<bool>(), 1..10),
        min_deposit in 1i128..=1_000i128,
    ) {
        let h = Harness::new(min_deposit);
        let agent = h.managing_agent();
        let full_deposit = min_deposit * 2;
        let mut live: StdVec<u32> = StdVec::new();

        for stake in steps {
            if stake {
                h.fund(full_deposit);
                live.push(h.stake_new(&agent, &h.proxy));
            } else if !live.is_empty() {
                let service_id = live.remove(0);
                h.client.unstake_and_withdraw(
                    &h.admin,
                    &Some(h.proxy.clone()),
                    &service_id,
                    &h.operation(0),
                );
            }

            prop_assert_eq!(
                h.client.get_staked_balance(),
                full_deposit * live.len() as i128
            );
            for service_id in live.iter() {
                prop_assert!(h.client.get_service_record(service_id).is_some());
            }
        }
    }

    /// Forwarded plus queued always equals the requested amount.
    #[test]
    fn prop_withdrawal_conserves_amount(
        liquid in 0i128..=1_000i128,
        amount in 1i128..=1_000i128,
    ) {
        let h = Harness::new(500);
        let agent = h.managing_agent();
        h.fund(1_000);
        h.stake_new(&agent, &h.proxy);
        if liquid > 0 {
            h.fund(liquid);
        }

        let op = h.operation(7);
        let outcome = h.client.withdraw_and_request_unstake(&h.relayer, &amount, &op);

        prop_assert_eq!(outcome.forwarded + outcome.pending, amount);
        prop_assert_eq!(outcome.forwarded, amount.min(liquid));
        prop_assert_eq!(h.collector_client().received(&op), outcome.forwarded);
        prop_assert_eq!(h.client.get_liquid_balance(), liquid - outcome.forwarded);
        prop_assert_eq!(h.client.get_staked_balance(), 1_000);
    }
}
