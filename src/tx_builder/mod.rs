pub mod fee;
pub mod xudt;

pub use fee::{FeeCalculator, FeePolicy, FixedFee};
pub use xudt::{
    build_xudt_type_script, parse_udt_amount, UnsignedTransfer, XudtTransferBuilder,
    XudtTransferRequest,
};

use anyhow::anyhow;
use ckb_types::{
    core::{Capacity, DepType},
    packed::{CellDep, CellOutput, OutPoint, Script},
    prelude::*,
    H256,
};
use thiserror::Error;

use crate::constants::{
    DEFAULT_DUST_THRESHOLD, DEFAULT_FEE_RATE, SIGHASH_DEP_GROUP_AGGRON, SIGHASH_DEP_GROUP_LINA,
    UDT_AMOUNT_SIZE, XUDT_CELL_DEP_MAINNET, XUDT_CELL_DEP_TESTNET, XUDT_CODE_HASH_MAINNET,
    XUDT_CODE_HASH_TESTNET,
};
use crate::traits::CellQueryError;
use crate::types::{NetworkInfo, NetworkType};

/// Why the inputs of a transfer could not be selected
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum InputSelectionError {
    #[error("no xudt cells found for the sender")]
    NoXudtCellsFound,

    #[error("insufficient xudt balance, required: {required}, available: {available}")]
    InsufficientXudtBalance { required: u128, available: u128 },

    #[error("no free capacity cells found for the sender")]
    NoFreeCapacityCellsFound,

    #[error("insufficient free capacity, required: {required}, available: {available}")]
    InsufficientFreeCapacity { required: u64, available: u64 },
}

/// Transaction builder errors
#[derive(Error, Debug)]
pub enum TxBuilderError {
    #[error("input selection error: `{0}`")]
    InputSelection(#[from] InputSelectionError),

    #[error("invalid request: `{0}`")]
    InvalidRequest(String),

    #[error("cell query error: `{0}`")]
    CellQuery(#[from] CellQueryError),

    #[error("other error: `{0}`")]
    Other(#[from] anyhow::Error),
}

/// Network, cell deps, fee policy and dust threshold used by the builders.
pub struct TransactionBuilderConfiguration {
    network: NetworkInfo,
    cell_deps: Vec<CellDep>,
    fee_policy: Box<dyn FeePolicy>,
    dust_threshold: u64,
}

impl TransactionBuilderConfiguration {
    pub fn new() -> Self {
        Self::new_with_network(NetworkInfo::mainnet())
    }
    pub fn new_testnet() -> Self {
        Self::new_with_network(NetworkInfo::testnet())
    }

    /// Dev chains have no well-known deployment, their cell deps must be
    /// added with [`add_cell_dep`](Self::add_cell_dep).
    pub fn new_with_network(network: NetworkInfo) -> Self {
        let cell_deps = default_cell_deps(network.network_type);
        Self {
            network,
            cell_deps,
            fee_policy: Box::new(FeeCalculator::new(DEFAULT_FEE_RATE)),
            dust_threshold: DEFAULT_DUST_THRESHOLD,
        }
    }

    #[inline]
    pub fn network_info(&self) -> &NetworkInfo {
        &self.network
    }

    #[inline]
    pub fn cell_deps(&self) -> &[CellDep] {
        &self.cell_deps
    }
    pub fn add_cell_dep(&mut self, cell_dep: CellDep) {
        if !self.cell_deps.contains(&cell_dep) {
            self.cell_deps.push(cell_dep);
        }
    }
    pub fn set_cell_deps(&mut self, cell_deps: Vec<CellDep>) {
        self.cell_deps = cell_deps;
    }

    #[inline]
    pub fn fee_policy(&self) -> &dyn FeePolicy {
        self.fee_policy.as_ref()
    }
    pub fn set_fee_policy<P: FeePolicy + 'static>(&mut self, fee_policy: P) {
        self.fee_policy = Box::new(fee_policy);
    }
    pub fn set_fee_rate(&mut self, fee_rate: u64) {
        self.set_fee_policy(FeeCalculator::new(fee_rate));
    }

    #[inline]
    pub fn dust_threshold(&self) -> u64 {
        self.dust_threshold
    }
    pub fn set_dust_threshold(&mut self, dust_threshold: u64) {
        self.dust_threshold = dust_threshold;
    }

    /// The xUDT code hash of the configured network, `None` for dev chains
    pub fn xudt_code_hash(&self) -> Option<H256> {
        xudt_code_hash(self.network.network_type)
    }
}

impl Default for TransactionBuilderConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

pub fn xudt_code_hash(network: NetworkType) -> Option<H256> {
    match network {
        NetworkType::Mainnet => Some(XUDT_CODE_HASH_MAINNET),
        NetworkType::Testnet => Some(XUDT_CODE_HASH_TESTNET),
        NetworkType::Dev => None,
    }
}

/// secp256k1 sighash dep group and xUDT code cell of a public network
pub fn default_cell_deps(network: NetworkType) -> Vec<CellDep> {
    let (sighash, xudt) = match network {
        NetworkType::Mainnet => (SIGHASH_DEP_GROUP_LINA, XUDT_CELL_DEP_MAINNET),
        NetworkType::Testnet => (SIGHASH_DEP_GROUP_AGGRON, XUDT_CELL_DEP_TESTNET),
        NetworkType::Dev => return Vec::new(),
    };
    vec![
        build_cell_dep(sighash, DepType::DepGroup),
        build_cell_dep(xudt, DepType::Code),
    ]
}

fn build_cell_dep((tx_hash, index): (H256, u32), dep_type: DepType) -> CellDep {
    CellDep::new_builder()
        .out_point(OutPoint::new(tx_hash.pack(), index))
        .dep_type(dep_type.into())
        .build()
}

/// The minimal capacity of a cell owned by `lock`. With `xudt_type` the cell
/// also carries the type script and a 16 bytes amount.
pub fn min_cell_capacity(lock: &Script, xudt_type: Option<&Script>) -> Result<u64, TxBuilderError> {
    let data_size = if xudt_type.is_some() {
        UDT_AMOUNT_SIZE
    } else {
        0
    };
    let output = CellOutput::new_builder()
        .lock(lock.clone())
        .type_(xudt_type.cloned().pack())
        .build();
    Capacity::bytes(data_size)
        .and_then(|data_capacity| output.occupied_capacity(data_capacity))
        .map(|capacity| capacity.as_u64())
        .map_err(|err| TxBuilderError::Other(anyhow!("occupied capacity overflow: {}", err)))
}
