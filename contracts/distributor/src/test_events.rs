extern crate std;

use soroban_sdk::testutils::Events;
use soroban_sdk::xdr::{ContractEventBody, ScVal};
use soroban_sdk::{symbol_short, vec, Env, Symbol, TryFromVal};

use crate::events::{RewardsDistributedEvent, StakedEvent, UnstakedEvent, WithdrawRequestedEvent};
use crate::testutils::Harness;

/// Payload of the latest distributor event whose first topic is `topic`.
///
/// Must be read straight after the invocation that published it.
fn last_event<T: TryFromVal<Env, ScVal>>(h: &Harness, topic: Symbol) -> T {
    let events = h.env.events().all().filter_by_contract(&h.contract_id);
    let data = events
        .events()
        .iter()
        .rev()
        .find_map(|event| {
            let ContractEventBody::V0(body) = &event.body;
            let first = body.topics.first()?;
            (Symbol::try_from_val(&h.env, first).ok()? == topic).then(|| body.data.clone())
        })
        .expect("event not published");
    T::try_from_val(&h.env, &data)
        .ok()
        .expect("payload does not decode")
}

#[test]
fn test_stake_event_reports_deposit_and_balance() {
    let h = Harness::new(100);
    let agent = h.managing_agent();
    h.fund(500);

    let service_id = h.stake_new(&agent, &h.proxy);
    let event: StakedEvent = last_event(&h, symbol_short!("STAKED"));

    assert_eq!(event.curating_agent, agent);
    assert_eq!(event.staking_proxy, h.proxy);
    assert_eq!(event.service_id, service_id);
    assert_eq!(event.agent_id, 1);
    assert_eq!(event.config_hash, h.config_hash());
    assert_eq!(event.full_deposit, 200);
    assert_eq!(event.staked_balance, 200);
}

#[test]
fn test_withdraw_event_reports_forwarded_and_pending() {
    let h = Harness::new(150);
    let agent = h.managing_agent();
    h.fund(400);
    h.stake_new(&agent, &h.proxy);
    let op = h.operation(0xA1);

    h.client.withdraw_and_request_unstake(&h.relayer, &250, &op);
    let event: WithdrawRequestedEvent = last_event(&h, symbol_short!("WD_REQ"));

    assert_eq!(event.operation, op);
    assert_eq!(event.requested, 250);
    assert_eq!(event.forwarded, 100);
    assert_eq!(event.pending, 150);
}

#[test]
fn test_unwind_events_report_drain_and_split() {
    let h = Harness::new(150);
    let agent = h.managing_agent();
    h.fund(400);
    let service_id = h.stake_new(&agent, &h.proxy);
    let op = h.operation(0xA1);
    h.client.withdraw_and_request_unstake(&h.relayer, &250, &op);
    h.queue_reward(&h.proxy, service_id, 2_000);

    h.client
        .unstake_and_withdraw(&h.admin, &Some(h.proxy.clone()), &service_id, &op);
    let unstaked: UnstakedEvent = last_event(&h, symbol_short!("UNSTAKED"));
    let distributed: RewardsDistributedEvent = last_event(&h, symbol_short!("DISTRIB"));

    assert_eq!(unstaked.caller, h.admin);
    assert_eq!(unstaked.service_id, service_id);
    assert_eq!(unstaked.operation, op);
    assert_eq!(unstaked.full_deposit, 300);
    assert_eq!(unstaked.staked_balance, 0);
    assert_eq!(unstaked.drained, 2_000);
    assert_eq!(unstaked.pending, 0);

    assert_eq!(distributed.service_id, service_id);
    assert_eq!(distributed.curating_agent, agent);
    assert_eq!(distributed.collector_amount, 200);
    assert_eq!(distributed.protocol_amount, 100);
    assert_eq!(distributed.curating_agent_amount, 1_700);
}

#[test]
fn test_claim_event_reports_every_share() {
    let h = Harness::new(100);
    let agent = h.managing_agent();
    h.fund(200);
    let service_id = h.stake_new(&agent, &h.proxy);
    let wallet = h.client.get_service_record(&service_id).unwrap().custody_wallet;
    h.queue_reward(&h.proxy, service_id, 999);

    h.client
        .claim(&vec![&h.env, h.proxy.clone()], &vec![&h.env, service_id]);
    let event: RewardsDistributedEvent = last_event(&h, symbol_short!("DISTRIB"));

    assert_eq!(event.service_id, service_id);
    assert_eq!(event.custody_wallet, wallet);
    assert_eq!(event.curating_agent, agent);
    assert_eq!(event.collector_amount, 99);
    assert_eq!(event.protocol_amount, 49);
    assert_eq!(event.curating_agent_amount, 851);
}
