mod rpc;

use ckb_types::{
    bytes::Bytes,
    core::{ScriptHashType, TransactionView},
    h160, h256,
    packed::{CellOutput, OutPoint, Script},
    prelude::*,
    H160, H256,
};

use crate::constants::{ONE_CKB, SIGHASH_TYPE_HASH, XUDT_CODE_HASH_TESTNET};
use crate::traits::LiveCell;
use crate::tx_builder::{build_xudt_type_script, parse_udt_amount, FixedFee};
use crate::TransactionBuilderConfiguration;

// ckt1qyq86vaa6e8tsruv5ngcd5tp7lcvcewxy7cquuksvj
const ACCOUNT0_KEY: H256 =
    h256!("0x8fdf1d6df54c6c9c0167a657c0f68a9bb3bf4304942ce487880e86ce6099191c");
const ACCOUNT0_ARG: H160 = h160!("0x7d33bdd64eb80f8ca4d186d161f7f0cc65c627b0");

// ckt1qyqfjslcvyaay029vvfxtn80rxnwmlma43xscrqn85
const ACCOUNT1_KEY: H256 =
    h256!("0xdbb62c0f0dd23088dba5ade3b4ed2279f733780de1985d344bf398c1c757ef49");
const ACCOUNT1_ARG: H160 = h160!("0x9943f8613bd23d45631265ccef19a6edff7dac4d");

// ckt1qyq9qaekmruccau7u3eff4wsv8v74gxmlptqj2lcte
const ACCOUNT2_ARG: H160 = h160!("0x507736d8f98c779ee47294d5d061d9eaa0dbf856");

const FIXED_FEE: u64 = 1000;

/// Minimal capacity of a sighash cell with xUDT type and amount
const XUDT_CELL_CAPACITY: u64 = 142 * ONE_CKB;

fn build_sighash_script(args: H160) -> Script {
    Script::new_builder()
        .code_hash(SIGHASH_TYPE_HASH.pack())
        .hash_type(ScriptHashType::Type.into())
        .args(Bytes::from(args.as_bytes().to_vec()).pack())
        .build()
}

/// The xUDT issued by ACCOUNT2
fn build_xudt_script() -> Script {
    build_xudt_type_script(
        XUDT_CODE_HASH_TESTNET,
        &build_sighash_script(ACCOUNT2_ARG),
    )
}

fn fixed_fee_configuration() -> TransactionBuilderConfiguration {
    let mut configuration = TransactionBuilderConfiguration::new_testnet();
    configuration.set_fee_policy(FixedFee(FIXED_FEE));
    configuration
}

fn out_point(seed: u8) -> OutPoint {
    OutPoint::new(H256::from([seed; 32]).pack(), u32::from(seed))
}

fn xudt_cell(seed: u8, lock: &Script, capacity: u64, amount: u128) -> LiveCell {
    LiveCell {
        output: CellOutput::new_builder()
            .lock(lock.clone())
            .type_(Some(build_xudt_script()).pack())
            .capacity(capacity.pack())
            .build(),
        output_data: Bytes::from(amount.to_le_bytes().to_vec()),
        out_point: out_point(seed),
        block_number: u64::from(seed),
        tx_index: 0,
    }
}

fn plain_cell(seed: u8, lock: &Script, capacity: u64) -> LiveCell {
    LiveCell {
        output: CellOutput::new_builder()
            .lock(lock.clone())
            .capacity(capacity.pack())
            .build(),
        output_data: Bytes::new(),
        out_point: out_point(seed),
        block_number: u64::from(seed),
        tx_index: 0,
    }
}

/// Sum the capacity of the transaction inputs, looked up in `cells`
fn inputs_capacity(tx: &TransactionView, cells: &[LiveCell]) -> u64 {
    tx.inputs()
        .into_iter()
        .map(|input| {
            let cell = cells
                .iter()
                .find(|cell| cell.out_point == input.previous_output())
                .expect("input cell");
            cell.capacity()
        })
        .sum()
}

fn outputs_capacity(tx: &TransactionView) -> u64 {
    tx.outputs()
        .into_iter()
        .map(|output| Unpack::<u64>::unpack(&output.capacity()))
        .sum()
}

/// Sum the xUDT amounts of the outputs carrying `xudt`
fn outputs_xudt_amount(tx: &TransactionView, xudt: &Script) -> u128 {
    tx.outputs_with_data_iter()
        .filter(|(output, _)| output.type_().to_opt().as_ref() == Some(xudt))
        .map(|(_, data)| parse_udt_amount(&data).expect("xudt amount"))
        .sum()
}
