//! Aggregate accounting state: the staked balance, the pending-withdrawal
//! ledger and the per-service records.
//!
//! Only the stake lifecycle and the withdrawal coordinator write through this
//! module, which keeps the staked-balance invariant auditable in one place.

use soroban_sdk::{contracttype, log, panic_with_error, symbol_short, Address, BytesN, Env, Symbol};

use crate::ContractError;

// ── Storage key constants ────────────────────────────────────────────────────

const STAKED_BALANCE: Symbol = symbol_short!("STK_BAL");

// Persistent entries use tuple keys: (prefix, id)
const SERVICE: Symbol = symbol_short!("SERVICE");
const UNSTAKE_REQUEST: Symbol = symbol_short!("UNSTK_REQ");

const TTL_THRESHOLD: u32 = 17_280; // ~1 day
const TTL_EXTEND_TO: u32 = 518_400; // ~30 days

// ── Types ───────────────────────────────────────────────────────────────────

/// A service unit currently staked by the distributor.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceRecord {
    pub service_id: u32,
    /// Proxy holding the unit; its config drives the reward split.
    pub staking_proxy: Address,
    /// Operator credited with the stake.
    pub curating_agent: Address,
    pub custody_wallet: Address,
}

fn service_key(service_id: u32) -> (Symbol, u32) {
    (SERVICE, service_id)
}

fn request_key(operation: &BytesN<32>) -> (Symbol, BytesN<32>) {
    (UNSTAKE_REQUEST, operation.clone())
}

// ── Staked balance ───────────────────────────────────────────────────────────

pub fn staked_balance(env: &Env) -> i128 {
    env.storage().instance().get(&STAKED_BALANCE).unwrap_or(0)
}

pub(crate) fn increase_staked(env: &Env, amount: i128) -> Result<i128, ContractError> {
    let next = staked_balance(env)
        .checked_add(amount)
        .ok_or(ContractError::ArithmeticOverflow)?;
    env.storage().instance().set(&STAKED_BALANCE, &next);
    Ok(next)
}

/// Subtract an unwound deposit.
///
/// Asking for more than is staked means the accounting is already broken, so
/// the invocation aborts instead of returning a recoverable error.
pub(crate) fn decrease_staked(env: &Env, amount: i128) -> i128 {
    let current = staked_balance(env);
    if amount > current {
        log!(env, "staked balance underflow", amount, current);
        panic_with_error!(env, ContractError::StakedBalanceUnderflow);
    }
    let next = current - amount;
    env.storage().instance().set(&STAKED_BALANCE, &next);
    next
}

// ── Service records ──────────────────────────────────────────────────────────

pub fn service_record(env: &Env, service_id: u32) -> Option<ServiceRecord> {
    let key = service_key(service_id);
    let record: Option<ServiceRecord> = env.storage().persistent().get(&key);
    if record.is_some() {
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    record
}

pub(crate) fn store_service_record(env: &Env, record: &ServiceRecord) {
    let key = service_key(record.service_id);
    env.storage().persistent().set(&key, record);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub(crate) fn remove_service_record(env: &Env, service_id: u32) {
    env.storage().persistent().remove(&service_key(service_id));
}

// ── Pending withdrawals ──────────────────────────────────────────────────────

pub fn pending_unstake(env: &Env, operation: &BytesN<32>) -> i128 {
    env.storage()
        .persistent()
        .get(&request_key(operation))
        .unwrap_or(0)
}

/// Add `shortfall` to the amount owed for `operation`; returns the new total.
pub(crate) fn add_pending_unstake(
    env: &Env,
    operation: &BytesN<32>,
    shortfall: i128,
) -> Result<i128, ContractError> {
    let key = request_key(operation);
    let next = pending_unstake(env, operation)
        .checked_add(shortfall)
        .ok_or(ContractError::ArithmeticOverflow)?;
    env.storage().persistent().set(&key, &next);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    Ok(next)
}

/// Record `serviced` as paid against `operation`; returns what is still owed.
/// The entry is removed once nothing is owed.
pub(crate) fn settle_pending_unstake(env: &Env, operation: &BytesN<32>, serviced: i128) -> i128 {
    let key = request_key(operation);
    let remaining = pending_unstake(env, operation)
        .saturating_sub(serviced)
        .max(0);
    if remaining == 0 {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, &remaining);
        env.storage()
            .persistent()
            .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    remaining
}
