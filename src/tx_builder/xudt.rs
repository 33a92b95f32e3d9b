use anyhow::anyhow;
use ckb_types::{
    bytes::Bytes,
    core::{ScriptHashType, TransactionView},
    packed::{self, CellInput, CellOutput, Script, WitnessArgs},
    prelude::*,
    H256,
};
use log::{debug, warn};

use super::{
    min_cell_capacity, InputSelectionError, TransactionBuilderConfiguration, TxBuilderError,
};
use crate::constants::{SECP_SIGNATURE_SIZE, UDT_AMOUNT_SIZE};
use crate::traits::{CellQuery, CellQueryOptions, LiveCell};
use crate::types::{ScriptGroup, TransactionWithScriptGroups};

/// Build the xUDT type script issued by `owner_lock`, the args is the owner
/// lock script hash.
pub fn build_xudt_type_script(code_hash: H256, owner_lock: &Script) -> Script {
    Script::new_builder()
        .code_hash(code_hash.pack())
        .hash_type(ScriptHashType::Type.into())
        .args(owner_lock.calc_script_hash().raw_data().pack())
        .build()
}

/// Read the little endian amount at the head of a UDT cell's data. Extension
/// data after the first 16 bytes is ignored.
pub fn parse_udt_amount(data: &[u8]) -> Option<u128> {
    data.get(0..UDT_AMOUNT_SIZE)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u128::from_le_bytes)
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct XudtTransferRequest {
    pub xudt_type_script: Script,
    pub sender_lock: Script,
    pub receiver_lock: Script,
    /// Token amount in the token's smallest unit
    pub xudt_amount: u128,
    /// Capacity in shannons put in a separate plain cell for the receiver
    pub ckb_amount: u64,
}

impl XudtTransferRequest {
    pub fn new(
        xudt_type_script: Script,
        sender_lock: Script,
        receiver_lock: Script,
        xudt_amount: u128,
        ckb_amount: u64,
    ) -> XudtTransferRequest {
        XudtTransferRequest {
            xudt_type_script,
            sender_lock,
            receiver_lock,
            xudt_amount,
            ckb_amount,
        }
    }
}

/// A balanced transaction waiting for the sender's signature
#[derive(Debug, Clone)]
pub struct UnsignedTransfer {
    pub tx_with_groups: TransactionWithScriptGroups,
    /// Capacity left for the miner, in shannons
    pub fee: u64,
}

impl UnsignedTransfer {
    pub fn tx_view(&self) -> &TransactionView {
        self.tx_with_groups.get_tx_view()
    }
}

/// Minimal capacities of the cells a transfer may create
struct CapacityFloors {
    receiver_xudt: u64,
    sender_xudt: u64,
    sender_plain: u64,
}

/// Builds xUDT transfers paying `xudt_amount` tokens and `ckb_amount`
/// capacity to a receiver.
///
/// Outputs are laid out as:
///
///   0. receiver xUDT cell, capacity is the cell's minimal capacity
///   1. receiver plain cell holding `ckb_amount` plus any folded change
///   2. sender xUDT change, only when the selected tokens exceed the amount
///   3. sender capacity change, only when the change is worth a cell
pub struct XudtTransferBuilder<'a> {
    configuration: &'a TransactionBuilderConfiguration,
}

impl<'a> XudtTransferBuilder<'a> {
    pub fn new(configuration: &'a TransactionBuilderConfiguration) -> Self {
        Self { configuration }
    }

    /// Build from already collected cells. Token cells are consumed in the
    /// given order, `plain_cells` are only used when the token cells can not
    /// pay for the outputs and the fee.
    pub fn build(
        &self,
        request: &XudtTransferRequest,
        token_cells: &[LiveCell],
        plain_cells: &[LiveCell],
    ) -> Result<UnsignedTransfer, TxBuilderError> {
        self.build_inner(request, token_cells, || Ok(plain_cells.to_vec()))
    }

    /// Build with cells from `cell_query`, plain cells are queried only when
    /// extra capacity is needed.
    pub fn build_with_query(
        &self,
        request: &XudtTransferRequest,
        cell_query: &dyn CellQuery,
    ) -> Result<UnsignedTransfer, TxBuilderError> {
        let token_query = CellQueryOptions::new_xudt(
            request.sender_lock.clone(),
            request.xudt_type_script.clone(),
        );
        let token_cells = cell_query.query_cells(&token_query)?;
        debug!("found {} xudt cells of the sender", token_cells.len());
        self.build_inner(request, &token_cells, || {
            let plain_query = CellQueryOptions::new_plain(request.sender_lock.clone());
            let plain_cells = cell_query.query_cells(&plain_query)?;
            debug!("found {} plain cells of the sender", plain_cells.len());
            Ok(plain_cells)
        })
    }

    fn build_inner<F>(
        &self,
        request: &XudtTransferRequest,
        token_cells: &[LiveCell],
        load_plain_cells: F,
    ) -> Result<UnsignedTransfer, TxBuilderError>
    where
        F: FnOnce() -> Result<Vec<LiveCell>, TxBuilderError>,
    {
        let floors = self.check_request(request)?;
        check_token_cells(request, token_cells)?;

        let (mut inputs, token_total) = select_token_cells(request, token_cells)?;
        let mut outputs = build_outputs(request, token_total, &floors)?;
        let required = sum_capacity(outputs.iter().map(|(output, _)| output))?;
        let mut inputs_capacity = sum_capacity(inputs.iter().map(|cell| &cell.output))?;
        let fee_policy = self.configuration.fee_policy();

        let draft = self.assemble(&inputs, &outputs, Some(floors.sender_plain));
        let fee = fee_policy.fee(&draft);
        debug!(
            "xudt inputs capacity: {}, required: {}, fee: {}",
            inputs_capacity, required, fee
        );

        let remainder = inputs_capacity
            .checked_sub(required)
            .and_then(|value| value.checked_sub(fee));
        if let Some(remainder) = remainder {
            if remainder > self.configuration.dust_threshold() && remainder >= floors.sender_plain
            {
                outputs.push(plain_output(&request.sender_lock, remainder));
                return Ok(self.finish(request, &inputs, &outputs, fee));
            }
        }

        // without the provisional change output the draft shrinks, so the
        // inputs may cover the smaller fee even when they miss the larger one
        let draft = self.assemble(&inputs, &outputs, None);
        let smaller_fee = fee_policy.fee(&draft);
        let folded = match inputs_capacity
            .checked_sub(required)
            .and_then(|value| value.checked_sub(smaller_fee))
        {
            Some(folded) => Some((smaller_fee, folded)),
            None => remainder.map(|remainder| (fee, remainder)),
        };
        if let Some((fee, remainder)) = folded {
            debug!("fold {} shannons of change into the receiver's cell", remainder);
            add_capacity(&mut outputs[1].0, remainder)?;
            return Ok(self.finish(request, &inputs, &outputs, fee));
        }

        let plain_query = CellQueryOptions::new_plain(request.sender_lock.clone());
        let plain_cells: Vec<LiveCell> = load_plain_cells()?
            .into_iter()
            .filter(|cell| plain_query.match_cell(cell))
            .collect();
        if plain_cells.is_empty() {
            return Err(InputSelectionError::NoFreeCapacityCellsFound.into());
        }

        let mut target = required;
        for cell in plain_cells {
            inputs_capacity = inputs_capacity
                .checked_add(cell.capacity())
                .ok_or_else(|| anyhow!("inputs capacity overflow"))?;
            inputs.push(cell);
            let draft = self.assemble(&inputs, &outputs, Some(floors.sender_plain));
            let fee = fee_policy.fee(&draft);
            target = required
                .checked_add(fee)
                .and_then(|value| value.checked_add(floors.sender_plain))
                .ok_or_else(|| anyhow!("required capacity overflow"))?;
            if inputs_capacity >= target {
                let change = inputs_capacity - required - fee;
                debug!(
                    "{} plain inputs added, change: {}, fee: {}",
                    inputs.len(),
                    change,
                    fee
                );
                outputs.push(plain_output(&request.sender_lock, change));
                return Ok(self.finish(request, &inputs, &outputs, fee));
            }
        }
        Err(InputSelectionError::InsufficientFreeCapacity {
            required: target,
            available: inputs_capacity,
        }
        .into())
    }

    fn check_request(&self, request: &XudtTransferRequest) -> Result<CapacityFloors, TxBuilderError> {
        if request.xudt_amount == 0 {
            return Err(TxBuilderError::InvalidRequest(
                "xudt amount must be greater than 0".to_string(),
            ));
        }
        let xudt_type = &request.xudt_type_script;
        let receiver_plain = min_cell_capacity(&request.receiver_lock, None)?;
        if request.ckb_amount < receiver_plain {
            return Err(TxBuilderError::InvalidRequest(format!(
                "ckb amount {} is less than the receiver's minimal cell capacity {}",
                request.ckb_amount, receiver_plain
            )));
        }
        Ok(CapacityFloors {
            receiver_xudt: min_cell_capacity(&request.receiver_lock, Some(xudt_type))?,
            sender_xudt: min_cell_capacity(&request.sender_lock, Some(xudt_type))?,
            sender_plain: min_cell_capacity(&request.sender_lock, None)?,
        })
    }

    /// Lay out the transaction. `provisional_change` adds a sender change
    /// output of that capacity so the draft has its largest possible size.
    fn assemble(
        &self,
        inputs: &[LiveCell],
        outputs: &[(CellOutput, Bytes)],
        provisional_change: Option<u64>,
    ) -> TransactionView {
        let sender_lock = inputs.first().map(|cell| cell.output.lock());
        let change = provisional_change
            .zip(sender_lock)
            .map(|(capacity, lock)| plain_output(&lock, capacity));

        let witnesses = (0..inputs.len()).map(|index| {
            if index == 0 {
                WitnessArgs::new_builder()
                    .lock(Some(Bytes::from(vec![0u8; SECP_SIGNATURE_SIZE])).pack())
                    .build()
                    .as_bytes()
                    .pack()
            } else {
                packed::Bytes::default()
            }
        });
        TransactionView::new_advanced_builder()
            .cell_deps(self.configuration.cell_deps().to_vec())
            .inputs(
                inputs
                    .iter()
                    .map(|cell| CellInput::new(cell.out_point.clone(), 0)),
            )
            .outputs(outputs.iter().chain(change.iter()).map(|(o, _)| o.clone()))
            .outputs_data(
                outputs
                    .iter()
                    .chain(change.iter())
                    .map(|(_, data)| data.pack()),
            )
            .witnesses(witnesses)
            .build()
    }

    fn finish(
        &self,
        request: &XudtTransferRequest,
        inputs: &[LiveCell],
        outputs: &[(CellOutput, Bytes)],
        fee: u64,
    ) -> UnsignedTransfer {
        let tx = self.assemble(inputs, outputs, None);
        let xudt_type = Some(request.xudt_type_script.clone());

        let mut lock_group = ScriptGroup::from_lock_script(&request.sender_lock);
        lock_group.input_indices = (0..inputs.len()).collect();
        let mut type_group = ScriptGroup::from_type_script(&request.xudt_type_script);
        type_group.input_indices = inputs
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.output.type_().to_opt() == xudt_type)
            .map(|(index, _)| index)
            .collect();
        type_group.output_indices = outputs
            .iter()
            .enumerate()
            .filter(|(_, (output, _))| output.type_().to_opt() == xudt_type)
            .map(|(index, _)| index)
            .collect();

        UnsignedTransfer {
            tx_with_groups: TransactionWithScriptGroups::new(tx, vec![lock_group, type_group]),
            fee,
        }
    }
}

fn check_token_cells(
    request: &XudtTransferRequest,
    token_cells: &[LiveCell],
) -> Result<(), TxBuilderError> {
    let xudt_type = Some(request.xudt_type_script.clone());
    for cell in token_cells {
        if cell.output.lock() != request.sender_lock || cell.output.type_().to_opt() != xudt_type
        {
            return Err(TxBuilderError::InvalidRequest(format!(
                "cell {} is not an xudt cell of the sender",
                cell.out_point
            )));
        }
    }
    Ok(())
}

/// Take token cells in order until the requested amount is covered
fn select_token_cells(
    request: &XudtTransferRequest,
    token_cells: &[LiveCell],
) -> Result<(Vec<LiveCell>, u128), TxBuilderError> {
    let mut selected = Vec::new();
    let mut total: u128 = 0;
    for cell in token_cells {
        let amount = match parse_udt_amount(&cell.output_data) {
            Some(amount) => amount,
            None => {
                warn!(
                    "skip xudt cell {}, data too short: 0x{}",
                    cell.out_point,
                    hex::encode(&cell.output_data)
                );
                continue;
            }
        };
        selected.push(cell.clone());
        total = total
            .checked_add(amount)
            .ok_or_else(|| anyhow!("xudt amount overflow"))?;
        if total >= request.xudt_amount {
            debug!(
                "selected {} xudt cells, total amount: {}",
                selected.len(),
                total
            );
            return Ok((selected, total));
        }
    }
    if selected.is_empty() {
        return Err(InputSelectionError::NoXudtCellsFound.into());
    }
    Err(InputSelectionError::InsufficientXudtBalance {
        required: request.xudt_amount,
        available: total,
    }
    .into())
}

fn build_outputs(
    request: &XudtTransferRequest,
    token_total: u128,
    floors: &CapacityFloors,
) -> Result<Vec<(CellOutput, Bytes)>, TxBuilderError> {
    let mut outputs = vec![
        xudt_output(
            &request.receiver_lock,
            &request.xudt_type_script,
            floors.receiver_xudt,
            request.xudt_amount,
        ),
        plain_output(&request.receiver_lock, request.ckb_amount),
    ];
    let token_change = token_total
        .checked_sub(request.xudt_amount)
        .ok_or_else(|| anyhow!("selected xudt amount is less than requested"))?;
    if token_change > 0 {
        outputs.push(xudt_output(
            &request.sender_lock,
            &request.xudt_type_script,
            floors.sender_xudt,
            token_change,
        ));
    }
    Ok(outputs)
}

fn xudt_output(lock: &Script, xudt_type: &Script, capacity: u64, amount: u128) -> (CellOutput, Bytes) {
    let output = CellOutput::new_builder()
        .lock(lock.clone())
        .type_(Some(xudt_type.clone()).pack())
        .capacity(capacity.pack())
        .build();
    (output, Bytes::from(amount.to_le_bytes().to_vec()))
}

fn plain_output(lock: &Script, capacity: u64) -> (CellOutput, Bytes) {
    let output = CellOutput::new_builder()
        .lock(lock.clone())
        .capacity(capacity.pack())
        .build();
    (output, Bytes::new())
}

fn sum_capacity<'b>(
    mut outputs: impl Iterator<Item = &'b CellOutput>,
) -> Result<u64, TxBuilderError> {
    outputs.try_fold(0u64, |total, output| {
        let capacity: u64 = output.capacity().unpack();
        total
            .checked_add(capacity)
            .ok_or_else(|| TxBuilderError::Other(anyhow!("capacity overflow")))
    })
}

fn add_capacity(output: &mut CellOutput, extra: u64) -> Result<(), TxBuilderError> {
    let capacity: u64 = output.capacity().unpack();
    let capacity = capacity
        .checked_add(extra)
        .ok_or_else(|| anyhow!("capacity overflow"))?;
    *output = output.clone().as_builder().capacity(capacity.pack()).build();
    Ok(())
}
