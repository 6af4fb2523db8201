#![no_main]

use arbitrary::Arbitrary;
use distributor::testutils::Harness;
use libfuzzer_sys::fuzz_target;
use soroban_sdk::{testutils::Address as _, Address};

#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Fund { amount: u16 },
    Stake,
    Unwind { slot: u8, operation: u8 },
    Withdraw { amount: u16, operation: u8 },
    ServiceQueue { operation: u8 },
    Reward { slot: u8, amount: u16 },
    Claim { slot: u8 },
}

fuzz_target!(|actions: Vec<FuzzAction>| {
    let h = Harness::new(50);
    let agent = h.managing_agent();
    let mut live: Vec<u32> = Vec::new();

    // Looking for panics outside the two fatal invariant paths, and for any
    // drift between the staked balance and the live units.
    for action in actions {
        match action {
            FuzzAction::Fund { amount } => {
                if amount > 0 {
                    h.fund(i128::from(amount));
                }
            }
            FuzzAction::Stake => {
                h.queue_wallet();
                let instance = Address::generate(&h.env);
                if let Ok(Ok(id)) =
                    h.client
                        .try_stake(&agent, &h.proxy, &0, &1, &h.config_hash(), &instance)
                {
                    live.push(id);
                }
            }
            FuzzAction::Unwind { slot, operation } => {
                if live.is_empty() {
                    continue;
                }
                let index = usize::from(slot) % live.len();
                let result = h.client.try_unstake_and_withdraw(
                    &h.admin,
                    &Some(h.proxy.clone()),
                    &live[index],
                    &h.operation(operation),
                );
                if result.is_ok() {
                    live.remove(index);
                }
            }
            FuzzAction::Withdraw { amount, operation } => {
                let requested = i128::from(amount);
                let custody = h.liquid() + h.client.get_staked_balance();
                if requested > custody {
                    continue;
                }
                let _ = h.client.try_withdraw_and_request_unstake(
                    &h.relayer,
                    &requested,
                    &h.operation(operation),
                );
            }
            FuzzAction::ServiceQueue { operation } => {
                let _ =
                    h.client
                        .try_unstake_and_withdraw(&h.admin, &None, &0, &h.operation(operation));
            }
            FuzzAction::Reward { slot, amount } => {
                if live.is_empty() || amount == 0 {
                    continue;
                }
                let id = live[usize::from(slot) % live.len()];
                h.queue_reward(&h.proxy, id, i128::from(amount));
            }
            FuzzAction::Claim { slot } => {
                if live.is_empty() {
                    continue;
                }
                let id = live[usize::from(slot) % live.len()];
                let _ = h.client.try_claim(
                    &soroban_sdk::vec![&h.env, h.proxy.clone()],
                    &soroban_sdk::vec![&h.env, id],
                );
            }
        }

        assert_eq!(h.client.get_staked_balance(), 100 * live.len() as i128);
    }
});
