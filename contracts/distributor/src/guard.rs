//! Reentrancy guard for balance-mutating entry points.

use soroban_sdk::{symbol_short, Env, Symbol};

use crate::ContractError;

const LOCKED: Symbol = symbol_short!("LOCKED");

pub fn is_locked(env: &Env) -> bool {
    env.storage().instance().has(&LOCKED)
}

/// Run `body` with the lock held.
///
/// Fails with `ReentrancyGuard` without running `body` if the lock is already
/// held. The lock is released whether `body` succeeds or returns an error; a
/// panic inside `body` aborts the invocation and the host discards the lock
/// write together with every other write.
pub fn non_reentrant<T>(
    env: &Env,
    body: impl FnOnce() -> Result<T, ContractError>,
) -> Result<T, ContractError> {
    if is_locked(env) {
        return Err(ContractError::ReentrancyGuard);
    }
    env.storage().instance().set(&LOCKED, &true);

    let result = body();

    env.storage().instance().remove(&LOCKED);
    result
}
