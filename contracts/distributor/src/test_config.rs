extern crate std;

use soroban_sdk::{testutils::Address as _, vec, Address, Vec};

use crate::testutils::{Harness, DEFAULT_CONFIG};
use crate::{ContractError, StakingProxyConfig};

fn split(collector: u32, protocol: u32, curating_agent: u32) -> StakingProxyConfig {
    StakingProxyConfig {
        collector_factor: collector,
        protocol_factor: protocol,
        curating_agent_factor: curating_agent,
        staking_type: 2,
    }
}

// ── Proxy configs ─────────────────────────────────────────────────────────────

#[test]
fn test_set_and_read_proxy_configs() {
    let h = Harness::new(100);
    let a = Address::generate(&h.env);
    let b = Address::generate(&h.env);

    h.client.set_staking_proxy_configs(
        &h.admin,
        &vec![&h.env, a.clone(), b.clone()],
        &vec![&h.env, split(2_000, 0, 8_000), split(10_000, 0, 0)],
    );

    assert_eq!(h.client.get_staking_proxy_config(&a), Some(split(2_000, 0, 8_000)));
    assert_eq!(h.client.get_staking_proxy_config(&b), Some(split(10_000, 0, 0)));
    assert_eq!(h.client.get_staking_proxy_config(&h.proxy), Some(DEFAULT_CONFIG));
}

#[test]
fn test_unknown_proxy_has_no_config() {
    let h = Harness::new(100);
    let unknown = Address::generate(&h.env);
    assert_eq!(h.client.get_staking_proxy_config(&unknown), None);
}

#[test]
fn test_config_replacement_overwrites() {
    let h = Harness::new(100);

    h.client.set_staking_proxy_configs(
        &h.admin,
        &vec![&h.env, h.proxy.clone()],
        &vec![&h.env, split(3_000, 1_000, 6_000)],
    );

    assert_eq!(h.client.get_reward_factors(&h.proxy), (3_000, 1_000, 6_000));
}

#[test]
fn test_set_configs_requires_admin() {
    let h = Harness::new(100);
    let stranger = Address::generate(&h.env);

    let result = h.client.try_set_staking_proxy_configs(
        &stranger,
        &vec![&h.env, h.proxy.clone()],
        &vec![&h.env, split(3_000, 0, 7_000)],
    );
    match result {
        Err(Ok(e)) => assert_eq!(e, ContractError::Unauthorized),
        _ => unreachable!("Expected Unauthorized error"),
    }
    assert_eq!(h.client.get_staking_proxy_config(&h.proxy), Some(DEFAULT_CONFIG));
}

#[test]
fn test_set_configs_array_lengths() {
    let h = Harness::new(100);
    let a = Address::generate(&h.env);

    assert_eq!(
        h.client.try_set_staking_proxy_configs(
            &h.admin,
            &Vec::new(&h.env),
            &Vec::new(&h.env)
        ),
        Err(Ok(ContractError::WrongArrayLength))
    );
    assert_eq!(
        h.client.try_set_staking_proxy_configs(
            &h.admin,
            &vec![&h.env, a.clone()],
            &vec![&h.env, split(1_000, 0, 0), split(1_000, 0, 0)]
        ),
        Err(Ok(ContractError::WrongArrayLength))
    );
}

#[test]
fn test_invalid_entry_rejects_whole_batch() {
    let h = Harness::new(100);
    let a = Address::generate(&h.env);
    let b = Address::generate(&h.env);

    let result = h.client.try_set_staking_proxy_configs(
        &h.admin,
        &vec![&h.env, a.clone(), b.clone()],
        &vec![&h.env, split(1_000, 0, 9_000), split(0, 5_000, 5_000)],
    );
    assert_eq!(result, Err(Ok(ContractError::ZeroCollectorFactor)));

    assert_eq!(h.client.get_staking_proxy_config(&a), None);
    assert_eq!(h.client.get_staking_proxy_config(&b), None);
}

#[test]
fn test_config_validation_errors() {
    let h = Harness::new(100);
    let a = Address::generate(&h.env);

    let cases = [
        (StakingProxyConfig::default(), ContractError::ZeroConfig),
        (split(6_000, 4_000, 1), ContractError::FactorsOverflow),
        (
            StakingProxyConfig {
                staking_type: 256,
                ..split(1_000, 0, 0)
            },
            ContractError::FieldOutOfRange,
        ),
    ];

    for (config, expected) in cases {
        assert_eq!(
            h.client.try_set_staking_proxy_configs(
                &h.admin,
                &vec![&h.env, a.clone()],
                &vec![&h.env, config]
            ),
            Err(Ok(expected))
        );
    }
}

#[test]
fn test_factors_may_sum_below_basis() {
    let h = Harness::new(100);
    let a = Address::generate(&h.env);

    h.client.set_staking_proxy_configs(
        &h.admin,
        &vec![&h.env, a.clone()],
        &vec![&h.env, split(500, 0, 0)],
    );

    assert_eq!(h.client.get_reward_factors(&a), (500, 0, 0));
}

// ── Managing agents ───────────────────────────────────────────────────────────

#[test]
fn test_managing_agent_toggle() {
    let h = Harness::new(100);
    let a = Address::generate(&h.env);
    let b = Address::generate(&h.env);

    h.client.set_managing_agents(
        &h.admin,
        &vec![&h.env, a.clone(), b.clone()],
        &vec![&h.env, true, true],
    );
    assert!(h.client.is_managing_agent(&a));
    assert!(h.client.is_managing_agent(&b));

    h.client
        .set_managing_agents(&h.admin, &vec![&h.env, a.clone()], &vec![&h.env, false]);
    assert!(!h.client.is_managing_agent(&a));
    assert!(h.client.is_managing_agent(&b));
}

#[test]
fn test_managing_agents_validation() {
    let h = Harness::new(100);
    let a = Address::generate(&h.env);

    assert_eq!(
        h.client.try_set_managing_agents(
            &h.admin,
            &vec![&h.env, a.clone()],
            &vec![&h.env, true, false]
        ),
        Err(Ok(ContractError::WrongArrayLength))
    );

    let stranger = Address::generate(&h.env);
    assert_eq!(
        h.client
            .try_set_managing_agents(&stranger, &vec![&h.env, a.clone()], &vec![&h.env, true]),
        Err(Ok(ContractError::Unauthorized))
    );
    assert!(!h.client.is_managing_agent(&a));
}
