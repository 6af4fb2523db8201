//! Test doubles for the distributor's collaborators and a harness wiring them
//! to a deployed distributor.
//!
//! Each mock lives in its own module so the generated contract items never
//! collide.

use soroban_sdk::{
    testutils::Address as _,
    token::{Client as TokenClient, StellarAssetClient},
    vec, Address, BytesN, Env,
};

use crate::{DistributorContract, DistributorContractClient, StakingProxyConfig};

pub use collector::{MockCollector, MockCollectorClient};
pub use proxy::{MockStakingProxy, MockStakingProxyClient};
pub use registry::{MockServiceRegistry, MockServiceRegistryClient};
pub use wallet::{MockCustodyWallet, MockCustodyWalletClient, MockWalletFactory, MockWalletFactoryClient};

pub mod proxy {
    use soroban_sdk::{contract, contractimpl, symbol_short, token, Address, Env, Symbol};

    const TOKEN: Symbol = symbol_short!("TOKEN");
    const MIN_DEPOSIT: Symbol = symbol_short!("MIN_DEP");
    const DEPOSIT: Symbol = symbol_short!("DEPOSIT");
    const REWARD: Symbol = symbol_short!("REWARD");
    const FAIL_CLAIM: Symbol = symbol_short!("FAIL_CLM");
    const FAIL_STAKE: Symbol = symbol_short!("FAIL_STK");

    /// Staking proxy that pulls whatever the owner approved and pays rewards
    /// it was pre-funded with into the service's wallet.
    #[contract]
    pub struct MockStakingProxy;

    #[contractimpl]
    impl MockStakingProxy {
        pub fn init(env: Env, token: Address, min_deposit: i128) {
            env.storage().instance().set(&TOKEN, &token);
            env.storage().instance().set(&MIN_DEPOSIT, &min_deposit);
        }

        pub fn set_min_deposit(env: Env, min_deposit: i128) {
            env.storage().instance().set(&MIN_DEPOSIT, &min_deposit);
        }

        /// Queue `amount` (already held by the proxy) for `wallet`.
        pub fn set_reward(env: Env, service_id: u32, wallet: Address, amount: i128) {
            env.storage()
                .persistent()
                .set(&(REWARD, service_id), &(wallet, amount));
        }

        pub fn set_claim_failure(env: Env, service_id: u32, fail: bool) {
            env.storage().persistent().set(&(FAIL_CLAIM, service_id), &fail);
        }

        pub fn set_stake_failure(env: Env, fail: bool) {
            env.storage().instance().set(&FAIL_STAKE, &fail);
        }

        pub fn deposit_of(env: Env, service_id: u32) -> i128 {
            env.storage()
                .persistent()
                .get(&(DEPOSIT, service_id))
                .unwrap_or(0)
        }

        pub fn min_staking_deposit(env: Env) -> i128 {
            env.storage().instance().get(&MIN_DEPOSIT).unwrap_or(0)
        }

        pub fn stake(env: Env, owner: Address, service_id: u32) {
            if env.storage().instance().get(&FAIL_STAKE).unwrap_or(false) {
                panic!("stake rejected");
            }
            let this = env.current_contract_address();
            let token = token::Client::new(&env, &token_of(&env));
            let amount = token.allowance(&owner, &this);
            token.transfer_from(&this, &owner, &this, &amount);
            env.storage().persistent().set(&(DEPOSIT, service_id), &amount);
        }

        pub fn unstake(env: Env, owner: Address, service_id: u32) -> i128 {
            let deposit: i128 = env
                .storage()
                .persistent()
                .get(&(DEPOSIT, service_id))
                .unwrap_or_else(|| panic!("service not staked"));
            env.storage().persistent().remove(&(DEPOSIT, service_id));

            let token = token::Client::new(&env, &token_of(&env));
            let this = env.current_contract_address();
            token.transfer(&this, &owner, &deposit);
            pay_reward(&env, service_id);
            deposit
        }

        pub fn claim(env: Env, _owner: Address, service_id: u32) -> i128 {
            let fail: bool = env
                .storage()
                .persistent()
                .get(&(FAIL_CLAIM, service_id))
                .unwrap_or(false);
            if fail {
                panic!("claim rejected");
            }
            pay_reward(&env, service_id)
        }
    }

    fn token_of(env: &Env) -> Address {
        env.storage()
            .instance()
            .get(&TOKEN)
            .unwrap_or_else(|| panic!("not initialised"))
    }

    fn pay_reward(env: &Env, service_id: u32) -> i128 {
        let key = (REWARD, service_id);
        let pending: Option<(Address, i128)> = env.storage().persistent().get(&key);
        let Some((wallet, amount)) = pending else {
            return 0;
        };
        env.storage().persistent().remove(&key);
        token::Client::new(env, &token_of(env)).transfer(
            &env.current_contract_address(),
            &wallet,
            &amount,
        );
        amount
    }
}

pub mod registry {
    use soroban_sdk::{contract, contractimpl, symbol_short, Address, BytesN, Env, Symbol};

    use crate::interfaces::{RegistryService, ServiceState};

    const COUNTER: Symbol = symbol_short!("SVC_CTR");
    const SERVICE: Symbol = symbol_short!("SVC");
    const INSTANCE: Symbol = symbol_short!("INSTANCE");

    /// Service registry enforcing the unit state machine.
    #[contract]
    pub struct MockServiceRegistry;

    #[contractimpl]
    impl MockServiceRegistry {
        pub fn create(
            env: Env,
            owner: Address,
            config_hash: BytesN<32>,
            agent_id: u32,
            bond: i128,
            threshold: u32,
        ) -> u32 {
            let id = env
                .storage()
                .instance()
                .get::<_, u32>(&COUNTER)
                .unwrap_or(0)
                + 1;
            env.storage().instance().set(&COUNTER, &id);
            store(
                &env,
                id,
                &RegistryService {
                    owner,
                    config_hash,
                    agent_id,
                    bond,
                    threshold,
                    multisig: None,
                    state: ServiceState::PreRegistration,
                },
            );
            id
        }

        pub fn update(
            env: Env,
            owner: Address,
            service_id: u32,
            config_hash: BytesN<32>,
            agent_id: u32,
            bond: i128,
            threshold: u32,
        ) {
            let mut service = owned(&env, &owner, service_id);
            expect_state(&service, ServiceState::PreRegistration);
            service.config_hash = config_hash;
            service.agent_id = agent_id;
            service.bond = bond;
            service.threshold = threshold;
            store(&env, service_id, &service);
        }

        pub fn activate_registration(env: Env, owner: Address, service_id: u32) {
            let mut service = owned(&env, &owner, service_id);
            expect_state(&service, ServiceState::PreRegistration);
            service.state = ServiceState::ActiveRegistration;
            store(&env, service_id, &service);
        }

        pub fn register_agents(
            env: Env,
            owner: Address,
            service_id: u32,
            agent_instance: Address,
            _agent_id: u32,
        ) {
            let mut service = owned(&env, &owner, service_id);
            expect_state(&service, ServiceState::ActiveRegistration);
            service.state = ServiceState::FinishedRegistration;
            store(&env, service_id, &service);
            env.storage()
                .persistent()
                .set(&(INSTANCE, service_id), &agent_instance);
        }

        pub fn deploy(env: Env, owner: Address, service_id: u32, wallet: Address) -> Address {
            let mut service = owned(&env, &owner, service_id);
            expect_state(&service, ServiceState::FinishedRegistration);
            if let Some(bound) = &service.multisig {
                if *bound != wallet {
                    panic!("wallet mismatch");
                }
            }
            service.multisig = Some(wallet.clone());
            service.state = ServiceState::Deployed;
            store(&env, service_id, &service);
            wallet
        }

        pub fn terminate(env: Env, owner: Address, service_id: u32) {
            let mut service = owned(&env, &owner, service_id);
            expect_state(&service, ServiceState::Deployed);
            service.state = ServiceState::TerminatedBonded;
            store(&env, service_id, &service);
        }

        pub fn unbond(env: Env, owner: Address, service_id: u32) {
            let mut service = owned(&env, &owner, service_id);
            expect_state(&service, ServiceState::TerminatedBonded);
            service.state = ServiceState::PreRegistration;
            store(&env, service_id, &service);
        }

        pub fn get_service(env: Env, service_id: u32) -> RegistryService {
            env.storage()
                .persistent()
                .get(&(SERVICE, service_id))
                .unwrap_or_else(|| panic!("unknown service"))
        }

        pub fn agent_instance(env: Env, service_id: u32) -> Option<Address> {
            env.storage().persistent().get(&(INSTANCE, service_id))
        }
    }

    fn owned(env: &Env, owner: &Address, service_id: u32) -> RegistryService {
        let service = MockServiceRegistry::get_service(env.clone(), service_id);
        if service.owner != *owner {
            panic!("not the service owner");
        }
        service
    }

    fn expect_state(service: &RegistryService, state: ServiceState) {
        if service.state != state {
            panic!("wrong service state");
        }
    }

    fn store(env: &Env, service_id: u32, service: &RegistryService) {
        env.storage().persistent().set(&(SERVICE, service_id), service);
    }
}

pub mod wallet {
    use soroban_sdk::{
        contract, contractimpl, symbol_short, Address, Bytes, Env, Symbol, Val, Vec,
    };

    use crate::interfaces::WalletOp;

    const OWNERS: Symbol = symbol_short!("OWNERS");
    const THRESHOLD: Symbol = symbol_short!("THRESHOLD");
    const MODULE: Symbol = symbol_short!("MODULE");
    const FAIL_SWAP: Symbol = symbol_short!("FAIL_SWAP");
    const NO_MODULE: Symbol = symbol_short!("NO_MODULE");
    const QUEUE: Symbol = symbol_short!("QUEUE");

    /// Custody wallet executing owner- or module-authorised batches in a
    /// single invocation.
    #[contract]
    pub struct MockCustodyWallet;

    #[contractimpl]
    impl MockCustodyWallet {
        pub fn setup(env: Env, owners: Vec<Address>, threshold: u32) {
            if env.storage().instance().has(&OWNERS) {
                panic!("already set up");
            }
            env.storage().instance().set(&OWNERS, &owners);
            env.storage().instance().set(&THRESHOLD, &threshold);
        }

        /// Make the next `SwapOwner` step fail.
        pub fn set_swap_failure(env: Env, fail: bool) {
            env.storage().instance().set(&FAIL_SWAP, &fail);
        }

        /// Accept `EnableModule` steps without enabling anything.
        pub fn set_module_ignored(env: Env, ignore: bool) {
            env.storage().instance().set(&NO_MODULE, &ignore);
        }

        pub fn exec_batch(env: Env, caller: Address, ops: Vec<WalletOp>) {
            caller.require_auth();
            if !Self::get_owners(env.clone()).contains(&caller) {
                panic!("caller is not an owner");
            }
            execute(&env, ops);
        }

        pub fn exec_from_module(env: Env, module: Address, ops: Vec<WalletOp>) {
            module.require_auth();
            if !Self::is_module_enabled(env.clone(), module) {
                panic!("module not enabled");
            }
            execute(&env, ops);
        }

        pub fn get_owners(env: Env) -> Vec<Address> {
            env.storage()
                .instance()
                .get(&OWNERS)
                .unwrap_or_else(|| Vec::new(&env))
        }

        pub fn get_threshold(env: Env) -> u32 {
            env.storage().instance().get(&THRESHOLD).unwrap_or(0)
        }

        pub fn is_module_enabled(env: Env, module: Address) -> bool {
            env.storage()
                .instance()
                .get(&(MODULE, module))
                .unwrap_or(false)
        }
    }

    fn execute(env: &Env, ops: Vec<WalletOp>) {
        for op in ops.iter() {
            match op {
                WalletOp::EnableModule(module) => {
                    if !env.storage().instance().get(&NO_MODULE).unwrap_or(false) {
                        env.storage().instance().set(&(MODULE, module), &true);
                    }
                }
                WalletOp::SwapOwner(old, new) => {
                    if env.storage().instance().get(&FAIL_SWAP).unwrap_or(false) {
                        panic!("swap rejected");
                    }
                    let mut owners = MockCustodyWallet::get_owners(env.clone());
                    let index = owners
                        .iter()
                        .position(|owner| owner == old)
                        .unwrap_or_else(|| panic!("old owner not found"));
                    owners.set(index as u32, new);
                    env.storage().instance().set(&OWNERS, &owners);
                }
                WalletOp::Invoke(target, function, args) => {
                    env.invoke_contract::<Val>(&target, &function, args);
                }
            }
        }
    }

    /// Factory handing out pre-registered wallets in FIFO order.
    #[contract]
    pub struct MockWalletFactory;

    #[contractimpl]
    impl MockWalletFactory {
        pub fn add_wallet(env: Env, wallet: Address) {
            let mut queue: Vec<Address> = env
                .storage()
                .instance()
                .get(&QUEUE)
                .unwrap_or_else(|| Vec::new(&env));
            queue.push_back(wallet);
            env.storage().instance().set(&QUEUE, &queue);
        }

        pub fn create(env: Env, owners: Vec<Address>, threshold: u32, _init_data: Bytes) -> Address {
            let mut queue: Vec<Address> = env
                .storage()
                .instance()
                .get(&QUEUE)
                .unwrap_or_else(|| Vec::new(&env));
            let wallet = queue
                .pop_front()
                .unwrap_or_else(|| panic!("no wallet available"));
            env.storage().instance().set(&QUEUE, &queue);

            MockCustodyWalletClient::new(&env, &wallet).setup(&owners, &threshold);
            wallet
        }
    }
}

pub mod collector {
    use soroban_sdk::{contract, contractimpl, symbol_short, token, Address, BytesN, Env, Symbol};

    const TOKEN: Symbol = symbol_short!("TOKEN");
    const OPERATION: Symbol = symbol_short!("OPERATION");
    const PROTOCOL: Symbol = symbol_short!("PROTOCOL");

    /// Collector pulling approved funds and tallying them per operation.
    #[contract]
    pub struct MockCollector;

    #[contractimpl]
    impl MockCollector {
        pub fn init(env: Env, token: Address) {
            env.storage().instance().set(&TOKEN, &token);
        }

        pub fn top_up_balance(env: Env, from: Address, amount: i128, operation: BytesN<32>) {
            pull(&env, &from, amount);
            let key = (OPERATION, operation);
            let total: i128 = env.storage().persistent().get(&key).unwrap_or(0);
            env.storage().persistent().set(&key, &(total + amount));
        }

        pub fn top_up_protocol(env: Env, from: Address, amount: i128) {
            pull(&env, &from, amount);
            let total: i128 = env.storage().instance().get(&PROTOCOL).unwrap_or(0);
            env.storage().instance().set(&PROTOCOL, &(total + amount));
        }

        pub fn received(env: Env, operation: BytesN<32>) -> i128 {
            env.storage()
                .persistent()
                .get(&(OPERATION, operation))
                .unwrap_or(0)
        }

        pub fn protocol_received(env: Env) -> i128 {
            env.storage().instance().get(&PROTOCOL).unwrap_or(0)
        }
    }

    fn pull(env: &Env, from: &Address, amount: i128) {
        if amount == 0 {
            return;
        }
        let token: Address = env
            .storage()
            .instance()
            .get(&TOKEN)
            .unwrap_or_else(|| panic!("not initialised"));
        let this = env.current_contract_address();
        token::Client::new(env, &token).transfer_from(&this, from, &this, &amount);
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

/// Reward split installed on every proxy added through the harness.
pub const DEFAULT_CONFIG: StakingProxyConfig = StakingProxyConfig {
    collector_factor: 1_000,
    protocol_factor: 500,
    curating_agent_factor: 8_500,
    staking_type: 1,
};

/// A distributor wired to mock collaborators and a Stellar asset token.
pub struct Harness {
    pub env: Env,
    pub client: DistributorContractClient<'static>,
    pub contract_id: Address,
    pub admin: Address,
    pub relayer: Address,
    pub token: Address,
    pub collector: Address,
    pub registry: Address,
    pub factory: Address,
    /// Proxy created by [`Harness::new`] with [`DEFAULT_CONFIG`].
    pub proxy: Address,
}

impl Harness {
    pub fn new(min_deposit: i128) -> Self {
        let env = Env::default();
        env.mock_all_auths();

        let token = env
            .register_stellar_asset_contract_v2(Address::generate(&env))
            .address();

        let collector = env.register(MockCollector, ());
        MockCollectorClient::new(&env, &collector).init(&token);
        let registry = env.register(MockServiceRegistry, ());
        let factory = env.register(MockWalletFactory, ());

        let contract_id = env.register(DistributorContract, ());
        let client = DistributorContractClient::new(&env, &contract_id);

        let admin = Address::generate(&env);
        let relayer = Address::generate(&env);
        client.initialize(&admin, &token, &collector, &relayer, &registry, &factory);

        let proxy = deploy_proxy(&env, &token, min_deposit);
        client.set_staking_proxy_configs(
            &admin,
            &vec![&env, proxy.clone()],
            &vec![&env, DEFAULT_CONFIG],
        );

        Harness {
            env,
            client,
            contract_id,
            admin,
            relayer,
            token,
            collector,
            registry,
            factory,
            proxy,
        }
    }

    /// Deploy a mock proxy and install `config` for it.
    pub fn add_proxy(&self, min_deposit: i128, config: StakingProxyConfig) -> Address {
        let proxy = deploy_proxy(&self.env, &self.token, min_deposit);
        self.client.set_staking_proxy_configs(
            &self.admin,
            &vec![&self.env, proxy.clone()],
            &vec![&self.env, config],
        );
        proxy
    }

    pub fn proxy_client(&self, proxy: &Address) -> MockStakingProxyClient<'static> {
        MockStakingProxyClient::new(&self.env, proxy)
    }

    pub fn collector_client(&self) -> MockCollectorClient<'static> {
        MockCollectorClient::new(&self.env, &self.collector)
    }

    pub fn registry_client(&self) -> MockServiceRegistryClient<'static> {
        MockServiceRegistryClient::new(&self.env, &self.registry)
    }

    /// Allowlist a fresh managing agent.
    pub fn managing_agent(&self) -> Address {
        let agent = Address::generate(&self.env);
        self.client.set_managing_agents(
            &self.admin,
            &vec![&self.env, agent.clone()],
            &vec![&self.env, true],
        );
        agent
    }

    /// Register a custody wallet and queue it in the factory.
    pub fn queue_wallet(&self) -> Address {
        let wallet = self.env.register(MockCustodyWallet, ());
        MockWalletFactoryClient::new(&self.env, &self.factory).add_wallet(&wallet);
        wallet
    }

    pub fn mint(&self, to: &Address, amount: i128) {
        StellarAssetClient::new(&self.env, &self.token).mint(to, &amount);
    }

    /// Credit the distributor's liquid balance directly.
    pub fn fund(&self, amount: i128) {
        self.mint(&self.contract_id, amount);
    }

    pub fn balance(&self, who: &Address) -> i128 {
        TokenClient::new(&self.env, &self.token).balance(who)
    }

    pub fn liquid(&self) -> i128 {
        self.balance(&self.contract_id)
    }

    pub fn config_hash(&self) -> BytesN<32> {
        BytesN::from_array(&self.env, &[7u8; 32])
    }

    pub fn operation(&self, tag: u8) -> BytesN<32> {
        BytesN::from_array(&self.env, &[tag; 32])
    }

    /// Stake a fresh unit through `proxy` as `agent`; returns the service id.
    pub fn stake_new(&self, agent: &Address, proxy: &Address) -> u32 {
        self.queue_wallet();
        let instance = Address::generate(&self.env);
        self.client
            .stake(agent, proxy, &0, &1, &self.config_hash(), &instance)
    }

    /// Pre-fund `proxy` so that its next payout for `service_id` sends
    /// `amount` into the unit's custody wallet.
    pub fn queue_reward(&self, proxy: &Address, service_id: u32, amount: i128) {
        let wallet = self
            .client
            .get_service_record(&service_id)
            .unwrap_or_else(|| panic!("service not staked"))
            .custody_wallet;
        self.mint(proxy, amount);
        self.proxy_client(proxy)
            .set_reward(&service_id, &wallet, &amount);
    }
}

fn deploy_proxy(env: &Env, token: &Address, min_deposit: i128) -> Address {
    let proxy = env.register(MockStakingProxy, ());
    MockStakingProxyClient::new(env, &proxy).init(token, &min_deposit);
    proxy
}
