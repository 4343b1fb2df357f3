//! Simulated validator network.
//!
//! Every node owns an enclave simulator, a publisher and a verifier with
//! private consensus stores. The block store, the state views and the clock
//! are shared, standing in for gossip and global time.

use std::sync::{Arc, Once};

use poet_consensus::adapters::{
    InMemoryBlockStore, InMemoryKeyValueStore, InMemoryRegistrationSubmitter, InMemoryStateView,
    InMemoryStateViewFactory,
};
use poet_consensus::{
    consensus_state_for_block_id, Block, BlockCache, BlockHeader, BlockPublisher, BlockVerifier,
    ConsensusDependencies, ConsensusResult, ConsensusState, ConsensusStateStore,
    PoetBlockPublisher, PoetBlockVerifier, PoetKeyStateStore, PopulationEstimateCache,
    SignupInfo, StateView, StateViewFactory, ValidatorInfo, ValidatorRegistryView,
    NULL_BLOCK_IDENTIFIER,
};
use poet_enclave::{EnclaveConfig, EnclaveSimulator, ManualTimeSource, TimeSource};
use shared_crypto::sha256_hex;

pub const GENESIS_ID: &str = "genesis";
pub const GENESIS_ROOT: &str = "root_genesis";

static TRACING: Once = Once::new();

/// Route consensus logs to the test writer; `RUST_LOG` filters them.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// State every node observes.
pub struct Chain {
    pub blocks: Arc<InMemoryBlockStore>,
    pub views: Arc<InMemoryStateViewFactory>,
    pub clock: ManualTimeSource,
}

impl Chain {
    /// A chain holding only genesis, with an empty registry.
    pub fn new(settings: &[(&str, &str)]) -> Self {
        init_tracing();
        let chain = Self {
            blocks: Arc::new(InMemoryBlockStore::new()),
            views: Arc::new(InMemoryStateViewFactory::new()),
            clock: ManualTimeSource::default(),
        };
        chain.views.insert(GENESIS_ROOT, view_with(settings, &[]));
        chain.blocks.insert(
            Block::new(
                GENESIS_ID,
                BlockHeader {
                    previous_block_id: NULL_BLOCK_IDENTIFIER.to_string(),
                    state_root_hash: GENESIS_ROOT.to_string(),
                    ..BlockHeader::default()
                },
            ),
            &[],
        );
        chain
    }

    pub fn block(&self, block_id: &str) -> Block {
        self.blocks.get_block(block_id).unwrap()
    }

    /// Append a non-PoET block committing `transaction_ids`.
    pub fn append_plain_block(
        &self,
        block_id: &str,
        previous: &Block,
        state_root_hash: &str,
        transaction_ids: &[&str],
    ) -> Block {
        let block = Block::new(
            block_id,
            BlockHeader {
                block_num: previous.block_num() + 1,
                previous_block_id: previous.block_id.clone(),
                state_root_hash: state_root_hash.to_string(),
                ..BlockHeader::default()
            },
        );
        self.blocks.insert(block.clone(), transaction_ids);
        block
    }

    pub fn validator_info(&self, state_root_hash: &str, validator_id: &str) -> ValidatorInfo {
        self.views
            .create_view(state_root_hash)
            .unwrap()
            .validator_registry()
            .get_validator_info(validator_id)
            .unwrap()
    }
}

pub fn view_with(settings: &[(&str, &str)], validators: &[ValidatorInfo]) -> InMemoryStateView {
    let mut view = InMemoryStateView::default();
    for (key, value) in settings {
        view = view.with_setting(key, value);
    }
    for info in validators {
        view = view.with_validator(info.clone());
    }
    view
}

/// One validator process.
pub struct Node {
    pub validator_id: String,
    pub enclave: Arc<EnclaveSimulator>,
    pub submitter: Arc<InMemoryRegistrationSubmitter>,
    pub key_states: Arc<PoetKeyStateStore>,
    pub consensus_state_store: Arc<ConsensusStateStore>,
    pub publisher: PoetBlockPublisher,
    pub verifier: PoetBlockVerifier,
    deps: ConsensusDependencies,
}

impl Node {
    pub fn new(chain: &Chain, name: &str) -> Self {
        let enclave = Arc::new(
            EnclaveSimulator::new(EnclaveConfig::default())
                .unwrap()
                .with_time_source(Box::new(chain.clock.clone())),
        );
        let consensus_state_store = Arc::new(ConsensusStateStore::new(Arc::new(
            InMemoryKeyValueStore::new(),
        )));
        let deps = ConsensusDependencies {
            block_cache: chain.blocks.clone(),
            block_store: chain.blocks.clone(),
            state_view_factory: chain.views.clone(),
            consensus_state_store: consensus_state_store.clone(),
            population_cache: Arc::new(PopulationEstimateCache::new()),
            enclave: enclave.clone(),
        };
        let key_states = Arc::new(PoetKeyStateStore::new());
        let submitter = Arc::new(InMemoryRegistrationSubmitter::new());
        let publisher = PoetBlockPublisher::new(deps.clone(), key_states.clone(), submitter.clone())
            .with_time_source(Box::new(chain.clock.clone()));
        let verifier = PoetBlockVerifier::new(deps.clone());

        Self {
            validator_id: sha256_hex(name.as_bytes()),
            enclave,
            submitter,
            key_states,
            consensus_state_store,
            publisher,
            verifier,
            deps,
        }
    }

    pub fn header_on(&self, head: &Block, state_root_hash: &str) -> BlockHeader {
        BlockHeader {
            block_num: head.block_num() + 1,
            previous_block_id: head.block_id.clone(),
            signer_public_key: self.validator_id.clone(),
            state_root_hash: state_root_hash.to_string(),
            batch_ids: vec![format!("batch-{}-{}", head.block_num() + 1, &self.validator_id[..8])],
            consensus: Vec::new(),
        }
    }

    /// Consensus state as this node sees it at `block_id`.
    pub fn state_at(&self, block_id: &str) -> ConsensusResult<ConsensusState> {
        consensus_state_for_block_id(
            block_id,
            self.deps.block_cache.as_ref(),
            self.deps.state_view_factory.as_ref(),
            &self.consensus_state_store,
        )
    }

    /// The most recent registration this node submitted, as the registry
    /// would record it under `transaction_id`.
    pub fn latest_registration(&self, transaction_id: &str) -> ValidatorInfo {
        let (id, signup_info): (String, SignupInfo) = self.submitter.submitted().pop().unwrap();
        ValidatorInfo {
            name: format!("validator-{}", &id[..8]),
            id,
            transaction_id: transaction_id.to_string(),
            signup_info,
        }
    }
}

/// Nodes sharing one chain, with the registry committed after genesis.
pub struct Network {
    pub chain: Chain,
    pub nodes: Vec<Node>,
    pub head: Block,
    pub state_root: String,
    settings: Vec<(String, String)>,
    registry: Vec<ValidatorInfo>,
}

impl Network {
    /// Sign up `size` validators and commit their registrations in block 1.
    pub fn bootstrap(size: usize, settings: &[(&str, &str)]) -> Self {
        let chain = Chain::new(settings);
        let nodes: Vec<Node> = (0..size)
            .map(|i| Node::new(&chain, &format!("validator-{i}")))
            .collect();
        let genesis = chain.block(GENESIS_ID);
        let mut network = Self {
            head: genesis.clone(),
            state_root: GENESIS_ROOT.to_string(),
            settings: settings
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            registry: Vec::new(),
            chain,
            nodes,
        };

        for node in &network.nodes {
            let header = node.header_on(&genesis, GENESIS_ROOT);
            assert!(!node.publisher.initialize_block(&header).unwrap());
        }
        let indices: Vec<usize> = (0..size).collect();
        network.commit_registrations(&indices);
        network
    }

    /// Commit each listed node's latest registration in a new non-PoET block.
    pub fn commit_registrations(&mut self, node_indices: &[usize]) -> Block {
        let height = self.head.block_num() + 1;
        let mut transaction_ids = Vec::new();
        for &index in node_indices {
            let transaction_id = format!("register-{height}-{index}");
            let info = self.nodes[index].latest_registration(&transaction_id);
            self.registry.retain(|existing| existing.id != info.id);
            self.registry.push(info);
            transaction_ids.push(transaction_id);
        }

        self.state_root = format!("root_registry_{height}");
        let settings: Vec<(&str, &str)> = self
            .settings
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        self.chain
            .views
            .insert(&self.state_root, view_with(&settings, &self.registry));

        let ids: Vec<&str> = transaction_ids.iter().map(String::as_str).collect();
        let block = self.chain.append_plain_block(
            &format!("registry-{height}"),
            &self.head,
            &self.state_root,
            &ids,
        );
        self.head = block.clone();
        block
    }

    /// Let every node try to claim the next block and return the winner's
    /// finalized block, unpublished. `None` when no node armed a timer.
    pub fn propose(&self) -> Option<(usize, Block)> {
        let mut armed = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            let header = node.header_on(&self.head, &self.state_root);
            if node.publisher.initialize_block(&header).unwrap() {
                let timer = node.publisher.wait_timer().unwrap();
                armed.push((index, header, timer.expires_at()));
            }
        }

        let (winner, mut header, expires_at) = armed
            .into_iter()
            .min_by(|a, b| a.2.total_cmp(&b.2))?;
        self.chain.clock.set(expires_at + 0.001);

        let publisher = &self.nodes[winner].publisher;
        assert!(publisher.check_publish_block(&header));
        assert!(publisher.finalize_block(&mut header).unwrap());
        let block_id = sha256_hex(&header.consensus);
        Some((winner, Block::new(block_id, header)))
    }

    /// Every node must accept `block` before it joins the chain.
    pub fn publish(&mut self, block: Block) {
        for node in &self.nodes {
            node.verifier.verify_block(&block).unwrap();
        }
        self.chain.blocks.insert(block.clone(), &[]);
        self.head = block;
    }

    /// Run one election round; returns the winning node index.
    pub fn round(&mut self) -> Option<usize> {
        let (winner, block) = self.propose()?;
        tracing::info!(
            winner,
            block_num = block.block_num(),
            now = self.chain.clock.now(),
            "Round won"
        );
        self.publish(block);
        Some(winner)
    }
}
