//! Reward split and payout from custody wallets.

use soroban_sdk::{
    contracttype, symbol_short, token, vec, Address, Bytes, BytesN, Env, IntoVal, Symbol, Vec,
};

use crate::config::{self, StakingProxyConfig, MAX_REWARD_FACTOR};
use crate::events;
use crate::guard;
use crate::interfaces::{approval_expiry, settle, CustodyWalletClient, StakingProxyClient, WalletOp};
use crate::ledger;
use crate::{load_config, ContractError, DistributorConfig};

/// How one custody-wallet balance is divided.
#[contracttype]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RewardSplit {
    pub collector_amount: i128,
    pub protocol_amount: i128,
    pub curating_agent_amount: i128,
}

impl RewardSplit {
    pub fn total(&self) -> i128 {
        self.collector_amount + self.protocol_amount + self.curating_agent_amount
    }
}

/// Split `balance` by the config's factors.
///
/// Collector and protocol shares round toward zero; the curating agent takes
/// the remainder, so the three parts always sum to `balance`. Each share is
/// computed as `(b / 10_000) * f + (b % 10_000) * f / 10_000`, which equals
/// `b * f / 10_000` without ever forming the full product.
pub fn split_rewards(balance: i128, factors: &StakingProxyConfig) -> RewardSplit {
    let basis = i128::from(MAX_REWARD_FACTOR);
    let whole = balance / basis;
    let rest = balance % basis;
    let share = |factor: u32| {
        let factor = i128::from(factor);
        whole * factor + rest * factor / basis
    };

    let collector_amount = share(factors.collector_factor);
    let protocol_amount = share(factors.protocol_factor);
    let curating_agent_amount = balance - collector_amount - protocol_amount;

    RewardSplit {
        collector_amount,
        protocol_amount,
        curating_agent_amount,
    }
}

/// Operation tag attached to reward top-ups: SHA-256 of `"REWARD"`.
pub fn reward_operation(env: &Env) -> BytesN<32> {
    env.crypto()
        .sha256(&Bytes::from_slice(env, b"REWARD"))
        .to_bytes()
}

/// Pay out the whole token balance of a service's custody wallet.
///
/// Runs as one module-authorised wallet batch. Returns the amount split; an
/// empty wallet is a no-op.
pub(crate) fn distribute_rewards(
    env: &Env,
    cfg: &DistributorConfig,
    service_id: u32,
) -> Result<i128, ContractError> {
    let record = ledger::service_record(env, service_id).ok_or(ContractError::ServiceNotFound)?;
    let factors = config::active_config(env, &record.staking_proxy)?;

    let wallet = record.custody_wallet;
    let balance = token::Client::new(env, &cfg.token).balance(&wallet);
    if balance <= 0 {
        return Ok(0);
    }

    let split = split_rewards(balance, &factors);
    let ops = payout_ops(env, cfg, &wallet, &record.curating_agent, &split);

    settle(
        CustodyWalletClient::new(env, &wallet)
            .try_exec_from_module(&env.current_contract_address(), &ops),
        ContractError::DistributionFailed,
    )?;

    events::publish_rewards_distributed(
        env,
        service_id,
        wallet,
        record.curating_agent,
        split.collector_amount,
        split.protocol_amount,
        split.curating_agent_amount,
    );

    Ok(balance)
}

fn payout_ops(
    env: &Env,
    cfg: &DistributorConfig,
    wallet: &Address,
    curating_agent: &Address,
    split: &RewardSplit,
) -> Vec<WalletOp> {
    let collector_total = split.collector_amount + split.protocol_amount;

    let mut ops = vec![
        env,
        WalletOp::Invoke(
            cfg.token.clone(),
            symbol_short!("approve"),
            vec![
                env,
                wallet.into_val(env),
                cfg.collector.into_val(env),
                collector_total.into_val(env),
                approval_expiry(env).into_val(env),
            ],
        ),
        WalletOp::Invoke(
            cfg.collector.clone(),
            Symbol::new(env, "top_up_balance"),
            vec![
                env,
                wallet.into_val(env),
                split.collector_amount.into_val(env),
                reward_operation(env).into_val(env),
            ],
        ),
    ];

    if split.protocol_amount > 0 {
        ops.push_back(WalletOp::Invoke(
            cfg.collector.clone(),
            Symbol::new(env, "top_up_protocol"),
            vec![
                env,
                wallet.into_val(env),
                split.protocol_amount.into_val(env),
            ],
        ));
    }

    if split.curating_agent_amount > 0 {
        ops.push_back(WalletOp::Invoke(
            cfg.token.clone(),
            symbol_short!("transfer"),
            vec![
                env,
                wallet.into_val(env),
                curating_agent.into_val(env),
                split.curating_agent_amount.into_val(env),
            ],
        ));
    }

    ops
}

/// Claim every `(proxy, service)` pair, then distribute every service.
///
/// All claims complete before the first distribution; a single failed claim
/// fails the whole call.
pub(crate) fn claim(
    env: &Env,
    staking_proxies: Vec<Address>,
    service_ids: Vec<u32>,
) -> Result<Vec<i128>, ContractError> {
    let cfg = load_config(env)?;

    guard::non_reentrant(env, || {
        if staking_proxies.is_empty() || staking_proxies.len() != service_ids.len() {
            return Err(ContractError::WrongArrayLength);
        }

        for (proxy, service_id) in staking_proxies.iter().zip(service_ids.iter()) {
            let record =
                ledger::service_record(env, service_id).ok_or(ContractError::ServiceNotFound)?;
            if record.staking_proxy != proxy {
                return Err(ContractError::WrongStakingProxy);
            }
        }

        let this = env.current_contract_address();
        let mut rewards = Vec::new(env);
        for (proxy, service_id) in staking_proxies.iter().zip(service_ids.iter()) {
            let reward = settle(
                StakingProxyClient::new(env, &proxy).try_claim(&this, &service_id),
                ContractError::ClaimFailed,
            )?;
            rewards.push_back(reward);
        }

        for service_id in service_ids.iter() {
            distribute_rewards(env, &cfg, service_id)?;
        }

        events::publish_batch_claimed(env, staking_proxies.clone(), service_ids.clone(), rewards.clone());

        Ok(rewards)
    })
}
