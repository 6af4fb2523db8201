#![allow(deprecated)] // events().publish; #[contractevent] structs not adopted yet

use soroban_sdk::{symbol_short, Address, BytesN, Env, Vec};

use crate::{DistributorConfig, StakingProxyConfig};

// ── Event payloads ──────────────────────────────────────────────────────────

/// Fired once when the contract is bootstrapped.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitializedEvent {
    pub admin: Address,
    pub config: DistributorConfig,
    pub timestamp: u64,
}

/// Fired when the admin installs or replaces staking-proxy configs.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProxyConfigsSetEvent {
    pub staking_proxies: Vec<Address>,
    pub configs: Vec<StakingProxyConfig>,
    pub timestamp: u64,
}

/// Fired when the managing-agent allowlist changes.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ManagingAgentsSetEvent {
    pub agents: Vec<Address>,
    pub flags: Vec<bool>,
    pub timestamp: u64,
}

/// Fired when a service unit is staked.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakedEvent {
    pub curating_agent: Address,
    pub staking_proxy: Address,
    pub service_id: u32,
    pub agent_id: u32,
    pub config_hash: BytesN<32>,
    pub full_deposit: i128,
    pub staked_balance: i128,
    pub timestamp: u64,
}

/// Fired when a staked unit is unwound.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnstakedEvent {
    pub caller: Address,
    pub staking_proxy: Address,
    pub service_id: u32,
    pub operation: BytesN<32>,
    pub full_deposit: i128,
    pub staked_balance: i128,
    /// Custody-wallet balance split on the way out.
    pub drained: i128,
    /// Amount still owed for `operation` after this call.
    pub pending: i128,
    pub timestamp: u64,
}

/// Fired when queued liquidity is forwarded for an operation.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawalServicedEvent {
    pub operation: BytesN<32>,
    pub amount: i128,
    pub pending: i128,
    pub timestamp: u64,
}

/// Fired when the relayer requests a withdrawal.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WithdrawRequestedEvent {
    pub operation: BytesN<32>,
    pub requested: i128,
    pub forwarded: i128,
    pub pending: i128,
    pub timestamp: u64,
}

/// Fired when tokens are deposited into liquid balance.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DepositedEvent {
    pub depositor: Address,
    pub operation: BytesN<32>,
    pub amount: i128,
    pub liquid_balance: i128,
    pub timestamp: u64,
}

/// Fired when a custody wallet's balance is split.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardsDistributedEvent {
    pub service_id: u32,
    pub custody_wallet: Address,
    pub curating_agent: Address,
    pub collector_amount: i128,
    pub protocol_amount: i128,
    pub curating_agent_amount: i128,
    pub timestamp: u64,
}

/// Fired after a batch claim has been distributed.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchClaimedEvent {
    pub staking_proxies: Vec<Address>,
    pub service_ids: Vec<u32>,
    pub rewards: Vec<i128>,
    pub timestamp: u64,
}

/// Fired when the relaying operator is replaced.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelayerChangedEvent {
    pub old_relayer: Address,
    pub new_relayer: Address,
    pub timestamp: u64,
}

/// Fired when an admin transfer is proposed.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminTransferProposedEvent {
    pub current_admin: Address,
    pub proposed_admin: Address,
    pub timestamp: u64,
}

/// Fired when an admin transfer is accepted.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminTransferAcceptedEvent {
    pub old_admin: Address,
    pub new_admin: Address,
    pub timestamp: u64,
}

/// Fired when a pending admin transfer is cancelled.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminTransferCancelledEvent {
    pub admin: Address,
    pub cancelled_proposed: Address,
    pub timestamp: u64,
}

// ── Publishers ──────────────────────────────────────────────────────────────

pub fn publish_initialized(env: &Env, admin: Address, config: DistributorConfig) {
    env.events().publish(
        (symbol_short!("INIT"),),
        InitializedEvent {
            admin,
            config,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_proxy_configs_set(
    env: &Env,
    staking_proxies: Vec<Address>,
    configs: Vec<StakingProxyConfig>,
) {
    env.events().publish(
        (symbol_short!("CFG_SET"),),
        ProxyConfigsSetEvent {
            staking_proxies,
            configs,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_managing_agents_set(env: &Env, agents: Vec<Address>, flags: Vec<bool>) {
    env.events().publish(
        (symbol_short!("AGENT_SET"),),
        ManagingAgentsSetEvent {
            agents,
            flags,
            timestamp: env.ledger().timestamp(),
        },
    );
}

#[allow(clippy::too_many_arguments)]
pub fn publish_staked(
    env: &Env,
    curating_agent: Address,
    staking_proxy: Address,
    service_id: u32,
    agent_id: u32,
    config_hash: BytesN<32>,
    full_deposit: i128,
    staked_balance: i128,
) {
    env.events().publish(
        (symbol_short!("STAKED"), curating_agent.clone()),
        StakedEvent {
            curating_agent,
            staking_proxy,
            service_id,
            agent_id,
            config_hash,
            full_deposit,
            staked_balance,
            timestamp: env.ledger().timestamp(),
        },
    );
}

#[allow(clippy::too_many_arguments)]
pub fn publish_unstaked(
    env: &Env,
    caller: Address,
    staking_proxy: Address,
    service_id: u32,
    operation: BytesN<32>,
    full_deposit: i128,
    staked_balance: i128,
    drained: i128,
    pending: i128,
) {
    env.events().publish(
        (symbol_short!("UNSTAKED"), service_id),
        UnstakedEvent {
            caller,
            staking_proxy,
            service_id,
            operation,
            full_deposit,
            staked_balance,
            drained,
            pending,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_withdrawal_serviced(env: &Env, operation: BytesN<32>, amount: i128, pending: i128) {
    env.events().publish(
        (symbol_short!("WD_SERV"), operation.clone()),
        WithdrawalServicedEvent {
            operation,
            amount,
            pending,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_withdraw_requested(
    env: &Env,
    operation: BytesN<32>,
    requested: i128,
    forwarded: i128,
    pending: i128,
) {
    env.events().publish(
        (symbol_short!("WD_REQ"), operation.clone()),
        WithdrawRequestedEvent {
            operation,
            requested,
            forwarded,
            pending,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_deposited(
    env: &Env,
    depositor: Address,
    operation: BytesN<32>,
    amount: i128,
    liquid_balance: i128,
) {
    env.events().publish(
        (symbol_short!("DEPOSIT"), depositor.clone()),
        DepositedEvent {
            depositor,
            operation,
            amount,
            liquid_balance,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_rewards_distributed(
    env: &Env,
    service_id: u32,
    custody_wallet: Address,
    curating_agent: Address,
    collector_amount: i128,
    protocol_amount: i128,
    curating_agent_amount: i128,
) {
    env.events().publish(
        (symbol_short!("DISTRIB"), service_id),
        RewardsDistributedEvent {
            service_id,
            custody_wallet,
            curating_agent,
            collector_amount,
            protocol_amount,
            curating_agent_amount,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_batch_claimed(
    env: &Env,
    staking_proxies: Vec<Address>,
    service_ids: Vec<u32>,
    rewards: Vec<i128>,
) {
    env.events().publish(
        (symbol_short!("CLAIMED"),),
        BatchClaimedEvent {
            staking_proxies,
            service_ids,
            rewards,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_relayer_changed(env: &Env, old_relayer: Address, new_relayer: Address) {
    env.events().publish(
        (symbol_short!("RELAYER"),),
        RelayerChangedEvent {
            old_relayer,
            new_relayer,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_deposit_policy_set(env: &Env, open: bool) {
    env.events().publish(
        (symbol_short!("DEP_POL"),),
        (open, env.ledger().timestamp()),
    );
}

pub fn publish_admin_transfer_proposed(env: &Env, current_admin: Address, proposed_admin: Address) {
    env.events().publish(
        (symbol_short!("ADM_PROP"), current_admin.clone()),
        AdminTransferProposedEvent {
            current_admin,
            proposed_admin,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_admin_transfer_accepted(env: &Env, old_admin: Address, new_admin: Address) {
    env.events().publish(
        (symbol_short!("ADM_ACPT"), new_admin.clone()),
        AdminTransferAcceptedEvent {
            old_admin,
            new_admin,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_admin_transfer_cancelled(env: &Env, admin: Address, cancelled_proposed: Address) {
    env.events().publish(
        (symbol_short!("ADM_CNCL"), admin.clone()),
        AdminTransferCancelledEvent {
            admin,
            cancelled_proposed,
            timestamp: env.ledger().timestamp(),
        },
    );
}
