use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol, Vec};

use crate::ContractError;

// ── Storage key constants ────────────────────────────────────────────────────

// Per-entry persistent storage uses tuple keys: (prefix, address)
const PROXY_CONFIG: Symbol = symbol_short!("PROXY_CFG");
const MANAGING_AGENT: Symbol = symbol_short!("MNG_AGENT");

const TTL_THRESHOLD: u32 = 17_280; // ~1 day
const TTL_EXTEND_TO: u32 = 518_400; // ~30 days

/// Basis-point denominator for reward factors.
pub const MAX_REWARD_FACTOR: u32 = 10_000;

// ── Packed codec ─────────────────────────────────────────────────────────────
//
// | bits   | field                  |
// |--------|------------------------|
// | 0–15   | collector_factor       |
// | 16–31  | protocol_factor        |
// | 32–47  | curating_agent_factor  |
// | 48–55  | staking_type           |

const FACTOR_MASK: u64 = 0xFFFF;
const STAKING_TYPE_MASK: u64 = 0xFF;
const PROTOCOL_SHIFT: u32 = 16;
const CURATING_AGENT_SHIFT: u32 = 32;
const STAKING_TYPE_SHIFT: u32 = 48;

/// Reward-split configuration of one staking proxy.
#[contracttype]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StakingProxyConfig {
    /// Share of rewards topped up to the collector, in basis points.
    pub collector_factor: u32,
    /// Share of rewards topped up to the protocol, in basis points.
    pub protocol_factor: u32,
    /// Nominal share of the curating agent. The agent actually receives the
    /// remainder after the other two shares, rounding included.
    pub curating_agent_factor: u32,
    pub staking_type: u32,
}

impl StakingProxyConfig {
    pub fn is_zero(&self) -> bool {
        *self == StakingProxyConfig::default()
    }

    /// Check the reward-split invariants and return the packed word.
    pub fn validate(&self) -> Result<u64, ContractError> {
        if self.is_zero() {
            return Err(ContractError::ZeroConfig);
        }
        if self.collector_factor == 0 {
            return Err(ContractError::ZeroCollectorFactor);
        }
        let total = u64::from(self.collector_factor)
            + u64::from(self.protocol_factor)
            + u64::from(self.curating_agent_factor);
        if total > u64::from(MAX_REWARD_FACTOR) {
            return Err(ContractError::FactorsOverflow);
        }
        wrap(
            self.collector_factor,
            self.protocol_factor,
            self.curating_agent_factor,
            self.staking_type,
        )
    }
}

/// Pack a config into one storage word.
///
/// Fails with `FieldOutOfRange` when a factor exceeds 16 bits or the staking
/// type exceeds 8 bits.
pub fn wrap(
    collector_factor: u32,
    protocol_factor: u32,
    curating_agent_factor: u32,
    staking_type: u32,
) -> Result<u64, ContractError> {
    let collector = u64::from(collector_factor);
    let protocol = u64::from(protocol_factor);
    let curating_agent = u64::from(curating_agent_factor);
    let staking_type = u64::from(staking_type);

    if collector > FACTOR_MASK
        || protocol > FACTOR_MASK
        || curating_agent > FACTOR_MASK
        || staking_type > STAKING_TYPE_MASK
    {
        return Err(ContractError::FieldOutOfRange);
    }

    Ok(collector
        | (protocol << PROTOCOL_SHIFT)
        | (curating_agent << CURATING_AGENT_SHIFT)
        | (staking_type << STAKING_TYPE_SHIFT))
}

/// Inverse of [`wrap`]. Bits above the staking-type field are ignored.
pub fn unwrap(packed: u64) -> StakingProxyConfig {
    StakingProxyConfig {
        collector_factor: (packed & FACTOR_MASK) as u32,
        protocol_factor: ((packed >> PROTOCOL_SHIFT) & FACTOR_MASK) as u32,
        curating_agent_factor: ((packed >> CURATING_AGENT_SHIFT) & FACTOR_MASK) as u32,
        staking_type: ((packed >> STAKING_TYPE_SHIFT) & STAKING_TYPE_MASK) as u32,
    }
}

// ── Registry storage ─────────────────────────────────────────────────────────

fn proxy_key(proxy: &Address) -> (Symbol, Address) {
    (PROXY_CONFIG, proxy.clone())
}

fn agent_key(agent: &Address) -> (Symbol, Address) {
    (MANAGING_AGENT, agent.clone())
}

fn extend_ttl(env: &Env, key: &(Symbol, Address)) {
    env.storage()
        .persistent()
        .extend_ttl(key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

/// Validate and store proxy configs. Last write wins for repeated proxies.
pub fn set_staking_proxy_configs(
    env: &Env,
    proxies: &Vec<Address>,
    configs: &Vec<StakingProxyConfig>,
) -> Result<(), ContractError> {
    if proxies.is_empty() || proxies.len() != configs.len() {
        return Err(ContractError::WrongArrayLength);
    }

    let mut packed = Vec::new(env);
    for config in configs.iter() {
        packed.push_back(config.validate()?);
    }

    for (proxy, word) in proxies.iter().zip(packed.iter()) {
        let key = proxy_key(&proxy);
        env.storage().persistent().set(&key, &word);
        extend_ttl(env, &key);
    }

    Ok(())
}

/// Stored config of `proxy`, `None` when absent or inactive.
pub fn staking_proxy_config(env: &Env, proxy: &Address) -> Option<StakingProxyConfig> {
    let key = proxy_key(proxy);
    let packed: u64 = env.storage().persistent().get(&key)?;
    extend_ttl(env, &key);
    let config = unwrap(packed);
    if config.is_zero() {
        return None;
    }
    Some(config)
}

pub fn active_config(env: &Env, proxy: &Address) -> Result<StakingProxyConfig, ContractError> {
    staking_proxy_config(env, proxy).ok_or(ContractError::ProxyNotConfigured)
}

pub fn set_managing_agents(
    env: &Env,
    agents: &Vec<Address>,
    flags: &Vec<bool>,
) -> Result<(), ContractError> {
    if agents.is_empty() || agents.len() != flags.len() {
        return Err(ContractError::WrongArrayLength);
    }

    for (agent, allowed) in agents.iter().zip(flags.iter()) {
        let key = agent_key(&agent);
        if allowed {
            env.storage().persistent().set(&key, &true);
            extend_ttl(env, &key);
        } else {
            env.storage().persistent().remove(&key);
        }
    }

    Ok(())
}

pub fn is_managing_agent(env: &Env, agent: &Address) -> bool {
    let key = agent_key(agent);
    let allowed = env.storage().persistent().get(&key).unwrap_or(false);
    if allowed {
        extend_ttl(env, &key);
    }
    allowed
}
