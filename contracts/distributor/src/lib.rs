#![no_std]

pub mod config;
pub mod events;
pub mod guard;
pub mod interfaces;
pub mod ledger;
mod lifecycle;
pub mod rewards;
mod withdrawal;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

#[cfg(test)]
extern crate std;

use soroban_sdk::{
    contract, contractimpl, contracttype, symbol_short, token, Address, BytesN, Env, Symbol, Vec,
};

pub use config::StakingProxyConfig;
pub use ledger::ServiceRecord;
pub use rewards::RewardSplit;
pub use withdrawal::{UnstakeOutcome, WithdrawalOutcome};

// ── Storage key constants ────────────────────────────────────────────────────

const ADMIN: Symbol = symbol_short!("ADMIN");
const PENDING_ADMIN: Symbol = symbol_short!("PEND_ADM");
const CONFIG: Symbol = symbol_short!("CONFIG");
const DEPOSIT_OPEN: Symbol = symbol_short!("DEP_OPEN");

/// Agent instances registered per service unit.
pub const NUM_AGENT_INSTANCES: i128 = 1;

// ── Contract errors ──────────────────────────────────────────────────────────

/// Every failure the distributor reports.
///
/// # Code ranges
/// | Range   | Class                          |
/// |---------|--------------------------------|
/// | 1 – 9   | Lifecycle / initialisation     |
/// | 10 – 19 | Authorisation                  |
/// | 20 – 39 | Validation / input             |
/// | 40 – 49 | Contract state                 |
/// | 50 – 59 | Balance / liquidity            |
/// | 60 – 69 | Collaborator execution         |
#[soroban_sdk::contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    NotInitialized = 1,
    AlreadyInitialized = 2,

    Unauthorized = 10,
    NotManagingAgent = 11,
    NotRelayer = 12,
    NotCuratingAgent = 13,

    InvalidInput = 20,
    WrongArrayLength = 21,
    ZeroConfig = 22,
    ZeroCollectorFactor = 23,
    FactorsOverflow = 24,
    FieldOutOfRange = 25,
    ProxyNotConfigured = 26,
    ServiceNotFound = 27,
    WrongStakingProxy = 28,
    ServiceNotOwned = 29,
    WalletNotDeployed = 30,
    NothingToProcess = 31,

    ReentrancyGuard = 40,
    AlreadyStaked = 41,
    /// An unwind asked for more than the aggregate staked balance. Fatal.
    StakedBalanceUnderflow = 42,
    /// The upstream layer requested more than total custody. Fatal.
    CustodyDesync = 43,
    ArithmeticOverflow = 44,

    InsufficientBalance = 50,
    NoLiquidity = 51,
    /// The token refused to move the deposit from the caller.
    DepositFailed = 52,

    RegistryCallFailed = 60,
    WalletSetupFailed = 61,
    StakingCallFailed = 62,
    ClaimFailed = 63,
    DistributionFailed = 64,
    CollectorCallFailed = 65,
}

/// Coarse classification of a [`ContractError`] for off-chain monitoring.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Lifecycle,
    Authorization,
    Validation,
    State,
    Balance,
    Execution,
}

impl ContractError {
    pub fn class(&self) -> ErrorClass {
        match *self as u32 {
            0..=9 => ErrorClass::Lifecycle,
            10..=19 => ErrorClass::Authorization,
            20..=39 => ErrorClass::Validation,
            40..=49 => ErrorClass::State,
            50..=59 => ErrorClass::Balance,
            _ => ErrorClass::Execution,
        }
    }

    /// Invariant breaches that abort via `panic_with_error!` rather than an
    /// `Err` return.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ContractError::StakedBalanceUnderflow | ContractError::CustodyDesync
        )
    }
}

// ── Configuration ────────────────────────────────────────────────────────────

/// Collaborator addresses fixed at initialisation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributorConfig {
    /// Token pooled, staked and distributed.
    pub token: Address,
    /// Receives forwarded withdrawals and the collector/protocol reward shares.
    pub collector: Address,
    /// Relaying operator bridging upstream deposit and withdrawal requests.
    pub relayer: Address,
    pub service_registry: Address,
    pub wallet_factory: Address,
}

pub(crate) fn load_config(env: &Env) -> Result<DistributorConfig, ContractError> {
    env.storage()
        .instance()
        .get(&CONFIG)
        .ok_or(ContractError::NotInitialized)
}

pub(crate) fn load_admin(env: &Env) -> Result<Address, ContractError> {
    env.storage()
        .instance()
        .get(&ADMIN)
        .ok_or(ContractError::NotInitialized)
}

/// Guard: revert if `caller` is not the stored admin.
pub(crate) fn require_admin(env: &Env, caller: &Address) -> Result<(), ContractError> {
    if *caller != load_admin(env)? {
        return Err(ContractError::Unauthorized);
    }
    Ok(())
}

pub(crate) fn deposit_open(env: &Env) -> bool {
    env.storage().instance().get(&DEPOSIT_OPEN).unwrap_or(false)
}

// ── Contract ─────────────────────────────────────────────────────────────────

#[contract]
pub struct DistributorContract;

#[contractimpl]
impl DistributorContract {
    // ── Initialisation ──────────────────────────────────────────────────────

    /// Bootstrap the distributor.
    ///
    /// * `token`            – token pooled and staked by the distributor.
    /// * `collector`        – destination of forwarded withdrawals and reward shares.
    /// * `relayer`          – the only caller allowed to bridge upstream requests.
    /// * `service_registry` – registry owning the service units.
    /// * `wallet_factory`   – factory provisioning custody wallets.
    pub fn initialize(
        env: Env,
        admin: Address,
        token: Address,
        collector: Address,
        relayer: Address,
        service_registry: Address,
        wallet_factory: Address,
    ) -> Result<(), ContractError> {
        if env.storage().instance().has(&CONFIG) {
            return Err(ContractError::AlreadyInitialized);
        }
        admin.require_auth();

        let config = DistributorConfig {
            token,
            collector,
            relayer,
            service_registry,
            wallet_factory,
        };
        env.storage().instance().set(&ADMIN, &admin);
        env.storage().instance().set(&CONFIG, &config);

        events::publish_initialized(&env, admin, config);

        Ok(())
    }

    pub fn is_initialized(env: Env) -> bool {
        env.storage().instance().has(&CONFIG)
    }

    pub fn get_config(env: Env) -> Result<DistributorConfig, ContractError> {
        load_config(&env)
    }

    pub fn get_admin(env: Env) -> Result<Address, ContractError> {
        load_admin(&env)
    }

    // ── Config registry ─────────────────────────────────────────────────────

    /// Install or replace the reward-split configs of staking proxies.
    ///
    /// Every entry is validated before any is written.
    pub fn set_staking_proxy_configs(
        env: Env,
        caller: Address,
        proxies: Vec<Address>,
        configs: Vec<StakingProxyConfig>,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        require_admin(&env, &caller)?;

        config::set_staking_proxy_configs(&env, &proxies, &configs)?;

        events::publish_proxy_configs_set(&env, proxies, configs);

        Ok(())
    }

    /// Toggle allowlist membership of managing agents.
    pub fn set_managing_agents(
        env: Env,
        caller: Address,
        agents: Vec<Address>,
        flags: Vec<bool>,
    ) -> Result<(), ContractError> {
        caller.require_auth();
        require_admin(&env, &caller)?;

        config::set_managing_agents(&env, &agents, &flags)?;

        events::publish_managing_agents_set(&env, agents, flags);

        Ok(())
    }

    pub fn get_staking_proxy_config(env: Env, staking_proxy: Address) -> Option<StakingProxyConfig> {
        config::staking_proxy_config(&env, &staking_proxy)
    }

    /// Return `(collector, protocol, curating_agent)` factors in basis points.
    pub fn get_reward_factors(
        env: Env,
        staking_proxy: Address,
    ) -> Result<(u32, u32, u32), ContractError> {
        let cfg = config::active_config(&env, &staking_proxy)?;
        Ok((
            cfg.collector_factor,
            cfg.protocol_factor,
            cfg.curating_agent_factor,
        ))
    }

    pub fn is_managing_agent(env: Env, agent: Address) -> bool {
        config::is_managing_agent(&env, &agent)
    }

    // ── Stake lifecycle ─────────────────────────────────────────────────────

    /// Stake a service unit into `staking_proxy`.
    ///
    /// `service_id == 0` mints a fresh unit with its own custody wallet;
    /// otherwise the given distributor-owned unit is reused. Returns the final
    /// service id.
    pub fn stake(
        env: Env,
        caller: Address,
        staking_proxy: Address,
        service_id: u32,
        agent_id: u32,
        config_hash: BytesN<32>,
        agent_instance: Address,
    ) -> Result<u32, ContractError> {
        lifecycle::stake(
            &env,
            caller,
            staking_proxy,
            service_id,
            agent_id,
            config_hash,
            agent_instance,
        )
    }

    // ── Unstake & withdrawal ────────────────────────────────────────────────

    /// Unwind a staked unit and/or service the pending withdrawal recorded for
    /// `operation`.
    pub fn unstake_and_withdraw(
        env: Env,
        caller: Address,
        staking_proxy: Option<Address>,
        service_id: u32,
        operation: BytesN<32>,
    ) -> Result<UnstakeOutcome, ContractError> {
        withdrawal::unstake_and_withdraw(&env, caller, staking_proxy, service_id, operation)
    }

    /// Forward `amount` to the collector, queueing whatever liquidity cannot
    /// cover yet.
    pub fn withdraw_and_request_unstake(
        env: Env,
        caller: Address,
        amount: i128,
        operation: BytesN<32>,
    ) -> Result<WithdrawalOutcome, ContractError> {
        withdrawal::withdraw_and_request_unstake(&env, caller, amount, operation)
    }

    /// Pull `amount` tokens from `caller` into liquid balance.
    pub fn deposit(
        env: Env,
        caller: Address,
        amount: i128,
        operation: BytesN<32>,
    ) -> Result<i128, ContractError> {
        withdrawal::deposit(&env, caller, amount, operation)
    }

    // ── Rewards ─────────────────────────────────────────────────────────────

    /// Claim every `(proxy, service)` pair, then distribute each service's
    /// custody-wallet balance.
    pub fn claim(
        env: Env,
        staking_proxies: Vec<Address>,
        service_ids: Vec<u32>,
    ) -> Result<Vec<i128>, ContractError> {
        rewards::claim(&env, staking_proxies, service_ids)
    }

    // ── View functions ───────────────────────────────────────────────────────

    pub fn get_staked_balance(env: Env) -> i128 {
        ledger::staked_balance(&env)
    }

    /// Tokens held by the distributor itself.
    pub fn get_liquid_balance(env: Env) -> Result<i128, ContractError> {
        let cfg = load_config(&env)?;
        Ok(token::Client::new(&env, &cfg.token).balance(&env.current_contract_address()))
    }

    pub fn get_pending_unstake(env: Env, operation: BytesN<32>) -> i128 {
        ledger::pending_unstake(&env, &operation)
    }

    pub fn get_service_record(env: Env, service_id: u32) -> Option<ServiceRecord> {
        ledger::service_record(&env, service_id)
    }

    pub fn is_deposit_open(env: Env) -> bool {
        deposit_open(&env)
    }

    // ── Admin functions ──────────────────────────────────────────────────────

    /// Replace the relaying operator.
    pub fn change_relayer(env: Env, caller: Address, relayer: Address) -> Result<(), ContractError> {
        caller.require_auth();
        require_admin(&env, &caller)?;

        let mut cfg = load_config(&env)?;
        let old_relayer = cfg.relayer.clone();
        cfg.relayer = relayer.clone();
        env.storage().instance().set(&CONFIG, &cfg);

        events::publish_relayer_changed(&env, old_relayer, relayer);

        Ok(())
    }

    /// Open `deposit` to any caller (`true`) or restrict it to the relayer.
    pub fn set_deposit_policy(env: Env, caller: Address, open: bool) -> Result<(), ContractError> {
        caller.require_auth();
        require_admin(&env, &caller)?;

        env.storage().instance().set(&DEPOSIT_OPEN, &open);

        events::publish_deposit_policy_set(&env, open);

        Ok(())
    }

    // ── Admin transfer (two-step) ──────────────────────────────────────────

    /// Propose a new admin address. Only the current admin can call this.
    /// The new admin must call `accept_admin` to complete the transfer.
    pub fn propose_admin(
        env: Env,
        current_admin: Address,
        new_admin: Address,
    ) -> Result<(), ContractError> {
        current_admin.require_auth();
        require_admin(&env, &current_admin)?;

        env.storage().instance().set(&PENDING_ADMIN, &new_admin);

        events::publish_admin_transfer_proposed(&env, current_admin, new_admin);

        Ok(())
    }

    /// Accept the pending admin transfer. Only the proposed new admin can call this.
    pub fn accept_admin(env: Env, new_admin: Address) -> Result<(), ContractError> {
        new_admin.require_auth();

        let pending: Address = env
            .storage()
            .instance()
            .get(&PENDING_ADMIN)
            .ok_or(ContractError::InvalidInput)?;
        if new_admin != pending {
            return Err(ContractError::Unauthorized);
        }

        let old_admin = load_admin(&env)?;
        env.storage().instance().set(&ADMIN, &new_admin);
        env.storage().instance().remove(&PENDING_ADMIN);

        events::publish_admin_transfer_accepted(&env, old_admin, new_admin);

        Ok(())
    }

    /// Cancel a pending admin transfer. Only the current admin can call this.
    pub fn cancel_admin_transfer(env: Env, current_admin: Address) -> Result<(), ContractError> {
        current_admin.require_auth();
        require_admin(&env, &current_admin)?;

        let pending: Address = env
            .storage()
            .instance()
            .get(&PENDING_ADMIN)
            .ok_or(ContractError::InvalidInput)?;
        env.storage().instance().remove(&PENDING_ADMIN);

        events::publish_admin_transfer_cancelled(&env, current_admin, pending);

        Ok(())
    }

    pub fn get_pending_admin(env: Env) -> Option<Address> {
        env.storage().instance().get(&PENDING_ADMIN)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod test_config;

#[cfg(test)]
mod test_events;

#[cfg(test)]
mod test_property;

#[cfg(test)]
mod test_rewards;
