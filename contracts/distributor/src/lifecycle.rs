//! Stake lifecycle: minting or reusing a service unit, provisioning its
//! custody wallet and depositing it into a staking proxy.

use soroban_sdk::{token, vec, Address, Bytes, BytesN, Env};

use crate::config;
use crate::events;
use crate::guard;
use crate::interfaces::{
    approval_expiry, settle, CustodyWalletClient, ServiceRegistryClient, ServiceState,
    StakingProxyClient, WalletFactoryClient, WalletOp,
};
use crate::ledger::{self, ServiceRecord};
use crate::{load_config, ContractError, DistributorConfig, NUM_AGENT_INSTANCES};

/// Signature threshold of every custody wallet the distributor provisions.
const WALLET_THRESHOLD: u32 = 1;

/// Deposit locked per unit: the security deposit plus one bond per agent
/// instance, each equal to the proxy's minimum.
pub(crate) fn full_deposit(min_deposit: i128) -> Result<i128, ContractError> {
    min_deposit
        .checked_mul(1 + NUM_AGENT_INSTANCES)
        .ok_or(ContractError::ArithmeticOverflow)
}

pub(crate) fn min_staking_deposit(env: &Env, staking_proxy: &Address) -> Result<i128, ContractError> {
    let min_deposit = settle(
        StakingProxyClient::new(env, staking_proxy).try_min_staking_deposit(),
        ContractError::StakingCallFailed,
    )?;
    if min_deposit <= 0 {
        return Err(ContractError::InvalidInput);
    }
    Ok(min_deposit)
}

pub(crate) fn stake(
    env: &Env,
    caller: Address,
    staking_proxy: Address,
    service_id: u32,
    agent_id: u32,
    config_hash: BytesN<32>,
    agent_instance: Address,
) -> Result<u32, ContractError> {
    let cfg = load_config(env)?;
    caller.require_auth();

    guard::non_reentrant(env, || {
        if !config::is_managing_agent(env, &caller) {
            return Err(ContractError::NotManagingAgent);
        }
        config::active_config(env, &staking_proxy)?;
        if agent_id == 0 || config_hash == BytesN::from_array(env, &[0u8; 32]) {
            return Err(ContractError::InvalidInput);
        }

        let min_deposit = min_staking_deposit(env, &staking_proxy)?;
        let full_deposit = full_deposit(min_deposit)?;

        let this = env.current_contract_address();
        let token = token::Client::new(env, &cfg.token);
        if token.balance(&this) < full_deposit {
            return Err(ContractError::InsufficientBalance);
        }

        // Account for the deposit before any collaborator sees control.
        let staked_balance = ledger::increase_staked(env, full_deposit)?;

        let unit = UnitParams {
            config_hash: config_hash.clone(),
            agent_id,
            bond: min_deposit,
            agent_instance,
        };
        let (service_id, custody_wallet) = if service_id == 0 {
            create_unit(env, &cfg, &this, &unit)?
        } else {
            reuse_unit(env, &cfg, &this, service_id, &unit)?
        };

        settle(
            token.try_approve(&this, &staking_proxy, &full_deposit, &approval_expiry(env)),
            ContractError::StakingCallFailed,
        )?;
        settle(
            StakingProxyClient::new(env, &staking_proxy).try_stake(&this, &service_id),
            ContractError::StakingCallFailed,
        )?;

        ledger::store_service_record(
            env,
            &ServiceRecord {
                service_id,
                staking_proxy: staking_proxy.clone(),
                curating_agent: caller.clone(),
                custody_wallet,
            },
        );

        events::publish_staked(
            env,
            caller.clone(),
            staking_proxy.clone(),
            service_id,
            agent_id,
            config_hash.clone(),
            full_deposit,
            staked_balance,
        );

        Ok(service_id)
    })
}

struct UnitParams {
    config_hash: BytesN<32>,
    agent_id: u32,
    bond: i128,
    agent_instance: Address,
}

/// Mint a unit, register the agent instance and bind a fresh custody wallet.
fn create_unit(
    env: &Env,
    cfg: &DistributorConfig,
    this: &Address,
    unit: &UnitParams,
) -> Result<(u32, Address), ContractError> {
    let registry = ServiceRegistryClient::new(env, &cfg.service_registry);
    let service_id = settle(
        registry.try_create(
            this,
            &unit.config_hash,
            &unit.agent_id,
            &unit.bond,
            &WALLET_THRESHOLD,
        ),
        ContractError::RegistryCallFailed,
    )?;

    register_agent(&registry, this, service_id, unit)?;

    let wallet = provision_wallet(env, cfg, this, &unit.agent_instance)?;
    let wallet = settle(
        registry.try_deploy(this, &service_id, &wallet),
        ContractError::RegistryCallFailed,
    )?;

    Ok((service_id, wallet))
}

/// Re-register an unwound distributor-owned unit against its bound wallet.
fn reuse_unit(
    env: &Env,
    cfg: &DistributorConfig,
    this: &Address,
    service_id: u32,
    unit: &UnitParams,
) -> Result<(u32, Address), ContractError> {
    if ledger::service_record(env, service_id).is_some() {
        return Err(ContractError::AlreadyStaked);
    }

    let registry = ServiceRegistryClient::new(env, &cfg.service_registry);
    let service = settle(
        registry.try_get_service(&service_id),
        ContractError::RegistryCallFailed,
    )?;
    if service.owner != *this {
        return Err(ContractError::ServiceNotOwned);
    }
    if service.state != ServiceState::PreRegistration {
        return Err(ContractError::AlreadyStaked);
    }
    let wallet = service.multisig.ok_or(ContractError::WalletNotDeployed)?;

    settle(
        registry.try_update(
            this,
            &service_id,
            &unit.config_hash,
            &unit.agent_id,
            &unit.bond,
            &WALLET_THRESHOLD,
        ),
        ContractError::RegistryCallFailed,
    )?;

    register_agent(&registry, this, service_id, unit)?;

    let wallet = settle(
        registry.try_deploy(this, &service_id, &wallet),
        ContractError::RegistryCallFailed,
    )?;

    Ok((service_id, wallet))
}

fn register_agent(
    registry: &ServiceRegistryClient,
    this: &Address,
    service_id: u32,
    unit: &UnitParams,
) -> Result<(), ContractError> {
    settle(
        registry.try_activate_registration(this, &service_id),
        ContractError::RegistryCallFailed,
    )?;
    settle(
        registry.try_register_agents(this, &service_id, &unit.agent_instance, &unit.agent_id),
        ContractError::RegistryCallFailed,
    )
}

/// Create a wallet controlled by the distributor alone, then in one batch
/// enable the distributor as a module and hand controllership to
/// `agent_instance`.
fn provision_wallet(
    env: &Env,
    cfg: &DistributorConfig,
    this: &Address,
    agent_instance: &Address,
) -> Result<Address, ContractError> {
    let factory = WalletFactoryClient::new(env, &cfg.wallet_factory);
    let wallet = settle(
        factory.try_create(&vec![env, this.clone()], &WALLET_THRESHOLD, &Bytes::new(env)),
        ContractError::WalletSetupFailed,
    )?;

    let ops = vec![
        env,
        WalletOp::EnableModule(this.clone()),
        WalletOp::SwapOwner(this.clone(), agent_instance.clone()),
    ];
    let custody = CustodyWalletClient::new(env, &wallet);
    settle(
        custody.try_exec_batch(this, &ops),
        ContractError::WalletSetupFailed,
    )?;

    // The wallet must now answer to this contract as module and to the
    // agent instance alone as owner.
    let module_enabled = settle(
        custody.try_is_module_enabled(this),
        ContractError::WalletSetupFailed,
    )?;
    let owners = settle(custody.try_get_owners(), ContractError::WalletSetupFailed)?;
    if !module_enabled || owners != vec![env, agent_instance.clone()] {
        return Err(ContractError::WalletSetupFailed);
    }

    Ok(wallet)
}
