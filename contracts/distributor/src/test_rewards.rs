extern crate std;

use soroban_sdk::{vec, Address, Vec};

use crate::rewards::reward_operation;
use crate::testutils::{Harness, DEFAULT_CONFIG};
use crate::{ContractError, StakingProxyConfig};

fn wallet_of(h: &Harness, service_id: u32) -> Address {
    h.client
        .get_service_record(&service_id)
        .unwrap()
        .custody_wallet
}

// ── Claim and distribute ──────────────────────────────────────────────────────

#[test]
fn test_claim_splits_rewards() {
    let h = Harness::new(100);
    let agent = h.managing_agent();
    h.fund(200);
    let service_id = h.stake_new(&agent, &h.proxy);
    h.queue_reward(&h.proxy, service_id, 1_000);

    let rewards = h
        .client
        .claim(&vec![&h.env, h.proxy.clone()], &vec![&h.env, service_id]);

    assert_eq!(rewards, vec![&h.env, 1_000i128]);
    assert_eq!(h.collector_client().received(&reward_operation(&h.env)), 100);
    assert_eq!(h.collector_client().protocol_received(), 50);
    assert_eq!(h.balance(&h.collector), 150);
    assert_eq!(h.balance(&agent), 850);
    assert_eq!(h.balance(&wallet_of(&h, service_id)), 0);

    // Rewards never touch the pooled balances.
    assert_eq!(h.client.get_staked_balance(), 200);
    assert_eq!(h.client.get_liquid_balance(), 0);
}

#[test]
fn test_claim_rounding_favours_curating_agent() {
    let h = Harness::new(100);
    let agent = h.managing_agent();
    h.fund(200);
    let service_id = h.stake_new(&agent, &h.proxy);
    h.queue_reward(&h.proxy, service_id, 999);

    h.client
        .claim(&vec![&h.env, h.proxy.clone()], &vec![&h.env, service_id]);

    assert_eq!(h.collector_client().received(&reward_operation(&h.env)), 99);
    assert_eq!(h.collector_client().protocol_received(), 49);
    assert_eq!(h.balance(&agent), 851);
}

#[test]
fn test_claim_without_protocol_share() {
    let h = Harness::new(100);
    let proxy = h.add_proxy(
        100,
        StakingProxyConfig {
            collector_factor: 2_000,
            protocol_factor: 0,
            curating_agent_factor: 8_000,
            staking_type: 0,
        },
    );
    let agent = h.managing_agent();
    h.fund(200);
    let service_id = h.stake_new(&agent, &proxy);
    h.queue_reward(&proxy, service_id, 500);

    h.client
        .claim(&vec![&h.env, proxy.clone()], &vec![&h.env, service_id]);

    assert_eq!(h.collector_client().received(&reward_operation(&h.env)), 100);
    assert_eq!(h.collector_client().protocol_received(), 0);
    assert_eq!(h.balance(&agent), 400);
}

#[test]
fn test_claim_uses_config_at_distribution_time() {
    let h = Harness::new(100);
    let agent = h.managing_agent();
    h.fund(200);
    let service_id = h.stake_new(&agent, &h.proxy);
    h.queue_reward(&h.proxy, service_id, 1_000);

    h.client.set_staking_proxy_configs(
        &h.admin,
        &vec![&h.env, h.proxy.clone()],
        &vec![
            &h.env,
            StakingProxyConfig {
                collector_factor: 10_000,
                protocol_factor: 0,
                curating_agent_factor: 0,
                staking_type: 1,
            },
        ],
    );

    h.client
        .claim(&vec![&h.env, h.proxy.clone()], &vec![&h.env, service_id]);

    assert_eq!(h.collector_client().received(&reward_operation(&h.env)), 1_000);
    assert_eq!(h.balance(&agent), 0);
}

#[test]
fn test_claim_with_empty_wallet_is_noop() {
    let h = Harness::new(100);
    let agent = h.managing_agent();
    h.fund(200);
    let service_id = h.stake_new(&agent, &h.proxy);

    let rewards = h
        .client
        .claim(&vec![&h.env, h.proxy.clone()], &vec![&h.env, service_id]);

    assert_eq!(rewards, vec![&h.env, 0i128]);
    assert_eq!(h.balance(&h.collector), 0);
    assert_eq!(h.balance(&agent), 0);
}

#[test]
fn test_claim_batch_over_two_proxies() {
    let h = Harness::new(100);
    let second = h.add_proxy(50, DEFAULT_CONFIG);
    let agent_a = h.managing_agent();
    let agent_b = h.managing_agent();
    h.fund(300);

    let id_a = h.stake_new(&agent_a, &h.proxy);
    let id_b = h.stake_new(&agent_b, &second);
    h.queue_reward(&h.proxy, id_a, 1_000);
    h.queue_reward(&second, id_b, 2_000);

    let rewards = h.client.claim(
        &vec![&h.env, h.proxy.clone(), second.clone()],
        &vec![&h.env, id_a, id_b],
    );

    assert_eq!(rewards, vec![&h.env, 1_000i128, 2_000i128]);
    assert_eq!(h.balance(&agent_a), 850);
    assert_eq!(h.balance(&agent_b), 1_700);
    assert_eq!(h.collector_client().received(&reward_operation(&h.env)), 300);
    assert_eq!(h.collector_client().protocol_received(), 150);
}

#[test]
fn test_failed_claim_aborts_whole_batch() {
    let h = Harness::new(100);
    let second = h.add_proxy(100, DEFAULT_CONFIG);
    let agent = h.managing_agent();
    h.fund(400);

    let id_a = h.stake_new(&agent, &h.proxy);
    let id_b = h.stake_new(&agent, &second);
    h.queue_reward(&h.proxy, id_a, 1_000);
    h.queue_reward(&second, id_b, 1_000);
    h.proxy_client(&second).set_claim_failure(&id_b, &true);

    let result = h.client.try_claim(
        &vec![&h.env, h.proxy.clone(), second.clone()],
        &vec![&h.env, id_a, id_b],
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::ClaimFailed),
        _ => unreachable!("Expected ClaimFailed error"),
    }

    // Neither pair was distributed, and the first claim was undone.
    assert_eq!(h.balance(&h.collector), 0);
    assert_eq!(h.balance(&agent), 0);
    assert_eq!(h.balance(&wallet_of(&h, id_a)), 0);
    assert_eq!(h.balance(&h.proxy), 200 + 1_000);
}

#[test]
fn test_claim_validates_pairs() {
    let h = Harness::new(100);
    let second = h.add_proxy(100, DEFAULT_CONFIG);
    let agent = h.managing_agent();
    h.fund(200);
    let service_id = h.stake_new(&agent, &h.proxy);

    assert_eq!(
        h.client.try_claim(&Vec::new(&h.env), &Vec::new(&h.env)),
        Err(Ok(ContractError::WrongArrayLength))
    );
    assert_eq!(
        h.client.try_claim(
            &vec![&h.env, h.proxy.clone()],
            &vec![&h.env, service_id, service_id]
        ),
        Err(Ok(ContractError::WrongArrayLength))
    );
    assert_eq!(
        h.client
            .try_claim(&vec![&h.env, second.clone()], &vec![&h.env, service_id]),
        Err(Ok(ContractError::WrongStakingProxy))
    );
    assert_eq!(
        h.client
            .try_claim(&vec![&h.env, h.proxy.clone()], &vec![&h.env, 42u32]),
        Err(Ok(ContractError::ServiceNotFound))
    );
}

#[test]
fn test_claim_is_permissionless() {
    let h = Harness::new(100);
    let agent = h.managing_agent();
    h.fund(200);
    let service_id = h.stake_new(&agent, &h.proxy);
    h.queue_reward(&h.proxy, service_id, 100);

    // No caller is recorded; any account may trigger the batch.
    h.client
        .claim(&vec![&h.env, h.proxy.clone()], &vec![&h.env, service_id]);

    assert_eq!(h.balance(&agent), 85);
}
