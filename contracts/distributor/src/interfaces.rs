//! Cross-contract interfaces of the distributor's collaborators.
//!
//! Each trait only describes the boundary the distributor relies on; the
//! generated `*Client` types are what the rest of the crate calls. The token
//! itself is reached through `soroban_sdk::token::Client`.

use soroban_sdk::{contractclient, contracttype, Address, Bytes, BytesN, Env, Symbol, Val, Vec};

use crate::ContractError;

// ── Shared types ─────────────────────────────────────────────────────────────

/// Registry-side view of a service unit.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegistryService {
    pub owner: Address,
    pub config_hash: BytesN<32>,
    pub agent_id: u32,
    pub bond: i128,
    pub threshold: u32,
    /// Custody wallet bound by the last `deploy`, if any.
    pub multisig: Option<Address>,
    pub state: ServiceState,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ServiceState {
    PreRegistration = 1,
    ActiveRegistration = 2,
    FinishedRegistration = 3,
    Deployed = 4,
    TerminatedBonded = 5,
}

/// One step of a custody-wallet batch.
///
/// The wallet executes a whole `Vec<WalletOp>` inside a single invocation, so
/// either every step lands or none does.
#[contracttype]
#[derive(Clone, Debug)]
pub enum WalletOp {
    /// Enable a persistent module on the wallet.
    EnableModule(Address),
    /// Replace `old` with `new` in the owner set.
    SwapOwner(Address, Address),
    /// Call `function` on `target` with the wallet as the invoker.
    Invoke(Address, Symbol, Vec<Val>),
}

// ── Clients ──────────────────────────────────────────────────────────────────

#[contractclient(name = "StakingProxyClient")]
pub trait StakingProxy {
    fn min_staking_deposit(env: Env) -> i128;
    fn stake(env: Env, owner: Address, service_id: u32);
    fn unstake(env: Env, owner: Address, service_id: u32) -> i128;
    fn claim(env: Env, owner: Address, service_id: u32) -> i128;
}

#[contractclient(name = "ServiceRegistryClient")]
pub trait ServiceRegistry {
    fn create(
        env: Env,
        owner: Address,
        config_hash: BytesN<32>,
        agent_id: u32,
        bond: i128,
        threshold: u32,
    ) -> u32;
    fn update(
        env: Env,
        owner: Address,
        service_id: u32,
        config_hash: BytesN<32>,
        agent_id: u32,
        bond: i128,
        threshold: u32,
    );
    fn activate_registration(env: Env, owner: Address, service_id: u32);
    fn register_agents(
        env: Env,
        owner: Address,
        service_id: u32,
        agent_instance: Address,
        agent_id: u32,
    );
    fn deploy(env: Env, owner: Address, service_id: u32, wallet: Address) -> Address;
    fn terminate(env: Env, owner: Address, service_id: u32);
    fn unbond(env: Env, owner: Address, service_id: u32);
    fn get_service(env: Env, service_id: u32) -> RegistryService;
}

#[contractclient(name = "WalletFactoryClient")]
pub trait WalletFactory {
    fn create(env: Env, owners: Vec<Address>, threshold: u32, init_data: Bytes) -> Address;
}

#[contractclient(name = "CustodyWalletClient")]
pub trait CustodyWallet {
    fn exec_batch(env: Env, caller: Address, ops: Vec<WalletOp>);
    fn exec_from_module(env: Env, module: Address, ops: Vec<WalletOp>);
    fn get_owners(env: Env) -> Vec<Address>;
    fn is_module_enabled(env: Env, module: Address) -> bool;
}

#[contractclient(name = "CollectorClient")]
pub trait Collector {
    fn top_up_balance(env: Env, from: Address, amount: i128, operation: BytesN<32>);
    fn top_up_protocol(env: Env, from: Address, amount: i128);
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Ledgers a token approval granted by the distributor stays live.
const APPROVAL_LEDGERS: u32 = 100;

/// Expiration ledger for an allowance consumed within the current invocation.
pub(crate) fn approval_expiry(env: &Env) -> u32 {
    env.ledger().sequence().saturating_add(APPROVAL_LEDGERS)
}

/// Collapse the nested result of a generated `try_*` call into `err` on any
/// failure: a collaborator error, a host error or an undecodable return value.
pub(crate) fn settle<T, C, I>(
    result: Result<Result<T, C>, Result<I, soroban_sdk::InvokeError>>,
    err: ContractError,
) -> Result<T, ContractError> {
    match result {
        Ok(Ok(value)) => Ok(value),
        _ => Err(err),
    }
}
