//! Unit unwinding and the liquidity-constrained withdrawal queue.

use soroban_sdk::{contracttype, log, panic_with_error, token, Address, BytesN, Env};

use crate::events;
use crate::guard;
use crate::interfaces::{
    approval_expiry, settle, CollectorClient, ServiceRegistryClient, StakingProxyClient,
};
use crate::ledger;
use crate::lifecycle::{full_deposit, min_staking_deposit};
use crate::rewards::distribute_rewards;
use crate::{deposit_open, load_admin, load_config, ContractError, DistributorConfig};

/// Result of `unstake_and_withdraw`.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UnstakeOutcome {
    /// Deposit released by the unwind, 0 when no unit was unwound.
    pub full_deposit: i128,
    /// Custody-wallet balance split during the unwind.
    pub drained: i128,
    /// Amount forwarded to the collector from the withdrawal queue.
    pub serviced: i128,
    /// Amount still owed for the operation.
    pub pending: i128,
    pub staked_balance: i128,
}

/// Result of `withdraw_and_request_unstake`.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WithdrawalOutcome {
    pub forwarded: i128,
    pub pending: i128,
}

pub(crate) fn unstake_and_withdraw(
    env: &Env,
    caller: Address,
    staking_proxy: Option<Address>,
    service_id: u32,
    operation: BytesN<32>,
) -> Result<UnstakeOutcome, ContractError> {
    let cfg = load_config(env)?;
    caller.require_auth();

    guard::non_reentrant(env, || {
        authorize_unstake(env, &caller, service_id)?;

        let unwind_proxy = staking_proxy.filter(|_| service_id > 0);
        let has_pending = ledger::pending_unstake(env, &operation) > 0;
        if unwind_proxy.is_none() && !has_pending {
            return Err(ContractError::NothingToProcess);
        }

        let mut outcome = UnstakeOutcome::default();

        if let Some(proxy) = &unwind_proxy {
            let (deposit, drained) = unwind_unit(env, &cfg, proxy, service_id)?;
            outcome.full_deposit = deposit;
            outcome.drained = drained;
        }

        let pending = ledger::pending_unstake(env, &operation);
        outcome.pending = pending;
        if pending > 0 {
            let (serviced, remaining) = service_pending(env, &cfg, &operation, pending)?;
            outcome.serviced = serviced;
            outcome.pending = remaining;
        }

        outcome.staked_balance = ledger::staked_balance(env);

        if let Some(proxy) = unwind_proxy {
            events::publish_unstaked(
                env,
                caller.clone(),
                proxy,
                service_id,
                operation.clone(),
                outcome.full_deposit,
                outcome.staked_balance,
                outcome.drained,
                outcome.pending,
            );
        }

        Ok(outcome)
    })
}

/// Admin may always unstake; the curating agent only its own unit.
fn authorize_unstake(env: &Env, caller: &Address, service_id: u32) -> Result<(), ContractError> {
    if *caller == load_admin(env)? {
        return Ok(());
    }
    if service_id == 0 {
        return Err(ContractError::Unauthorized);
    }
    match ledger::service_record(env, service_id) {
        Some(record) if record.curating_agent == *caller => Ok(()),
        _ => Err(ContractError::NotCuratingAgent),
    }
}

/// Release a staked unit. Returns `(full_deposit, drained)`.
fn unwind_unit(
    env: &Env,
    cfg: &DistributorConfig,
    staking_proxy: &Address,
    service_id: u32,
) -> Result<(i128, i128), ContractError> {
    let record = ledger::service_record(env, service_id).ok_or(ContractError::ServiceNotFound)?;
    if record.staking_proxy != *staking_proxy {
        return Err(ContractError::WrongStakingProxy);
    }

    let deposit = full_deposit(min_staking_deposit(env, staking_proxy)?)?;
    ledger::decrease_staked(env, deposit);

    let this = env.current_contract_address();
    settle(
        StakingProxyClient::new(env, staking_proxy).try_unstake(&this, &service_id),
        ContractError::StakingCallFailed,
    )?;

    let registry = ServiceRegistryClient::new(env, &cfg.service_registry);
    settle(
        registry.try_terminate(&this, &service_id),
        ContractError::RegistryCallFailed,
    )?;
    settle(
        registry.try_unbond(&this, &service_id),
        ContractError::RegistryCallFailed,
    )?;

    let drained = distribute_rewards(env, cfg, service_id)?;
    ledger::remove_service_record(env, service_id);

    Ok((deposit, drained))
}

/// Forward as much of `pending` as liquidity allows. Returns
/// `(serviced, remaining)`.
fn service_pending(
    env: &Env,
    cfg: &DistributorConfig,
    operation: &BytesN<32>,
    pending: i128,
) -> Result<(i128, i128), ContractError> {
    let liquid = token::Client::new(env, &cfg.token).balance(&env.current_contract_address());
    if liquid <= 0 {
        return Err(ContractError::NoLiquidity);
    }

    let serviced = liquid.min(pending);
    let remaining = ledger::settle_pending_unstake(env, operation, serviced);
    forward_to_collector(env, cfg, serviced, operation)?;

    events::publish_withdrawal_serviced(env, operation.clone(), serviced, remaining);

    Ok((serviced, remaining))
}

pub(crate) fn withdraw_and_request_unstake(
    env: &Env,
    caller: Address,
    amount: i128,
    operation: BytesN<32>,
) -> Result<WithdrawalOutcome, ContractError> {
    let cfg = load_config(env)?;
    caller.require_auth();

    guard::non_reentrant(env, || {
        if caller != cfg.relayer {
            return Err(ContractError::NotRelayer);
        }
        if amount <= 0 {
            return Err(ContractError::InvalidInput);
        }

        let liquid = token::Client::new(env, &cfg.token).balance(&env.current_contract_address());
        let staked = ledger::staked_balance(env);
        let total = liquid
            .checked_add(staked)
            .ok_or(ContractError::ArithmeticOverflow)?;
        if amount > total {
            // The upstream ledger never asks for more than total custody.
            log!(env, "withdrawal exceeds custody", amount, total);
            panic_with_error!(env, ContractError::CustodyDesync);
        }

        let outcome = if amount > liquid {
            let pending = ledger::add_pending_unstake(env, &operation, amount - liquid)?;
            WithdrawalOutcome {
                forwarded: liquid,
                pending,
            }
        } else {
            WithdrawalOutcome {
                forwarded: amount,
                pending: ledger::pending_unstake(env, &operation),
            }
        };

        forward_to_collector(env, &cfg, outcome.forwarded, &operation)?;

        events::publish_withdraw_requested(
            env,
            operation.clone(),
            amount,
            outcome.forwarded,
            outcome.pending,
        );

        Ok(outcome)
    })
}

pub(crate) fn deposit(
    env: &Env,
    caller: Address,
    amount: i128,
    operation: BytesN<32>,
) -> Result<i128, ContractError> {
    let cfg = load_config(env)?;
    caller.require_auth();

    guard::non_reentrant(env, || {
        if !deposit_open(env) && caller != cfg.relayer {
            return Err(ContractError::NotRelayer);
        }
        if amount <= 0 {
            return Err(ContractError::InvalidInput);
        }

        let this = env.current_contract_address();
        let token = token::Client::new(env, &cfg.token);
        settle(
            token.try_transfer(&caller, &this, &amount),
            ContractError::DepositFailed,
        )?;
        let liquid_balance = token.balance(&this);

        events::publish_deposited(env, caller.clone(), operation.clone(), amount, liquid_balance);

        Ok(liquid_balance)
    })
}

/// Hand `amount` to the collector tagged with `operation`.
fn forward_to_collector(
    env: &Env,
    cfg: &DistributorConfig,
    amount: i128,
    operation: &BytesN<32>,
) -> Result<(), ContractError> {
    if amount <= 0 {
        return Ok(());
    }
    let this = env.current_contract_address();
    settle(
        token::Client::new(env, &cfg.token).try_approve(
            &this,
            &cfg.collector,
            &amount,
            &approval_expiry(env),
        ),
        ContractError::CollectorCallFailed,
    )?;
    settle(
        CollectorClient::new(env, &cfg.collector).try_top_up_balance(&this, &amount, operation),
        ContractError::CollectorCallFailed,
    )
}
