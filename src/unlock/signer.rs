use ckb_hash::new_blake2b;
use ckb_types::{
    bytes::Bytes,
    core::{ScriptHashType, TransactionView},
    error::VerificationError,
    packed::{self, WitnessArgs},
    prelude::*,
    H256,
};
use log::debug;
use thiserror::Error;

use crate::constants::{SECP_SIGNATURE_SIZE, SIGHASH_TYPE_HASH};
use crate::traits::{SecpCkbRawKeySigner, Signer, SignerError};
use crate::types::{ScriptGroup, TransactionWithScriptGroups};

#[derive(Error, Debug)]
pub enum ScriptSignError {
    #[error("signer error: `{0}`")]
    Signer(#[from] SignerError),

    #[error("witness count in current transaction not enough to cover current script group")]
    WitnessNotEnough,

    #[error("the witness is not empty and not WitnessArgs format: `{0}`")]
    InvalidWitnessArgs(#[from] VerificationError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum SignError {
    #[error("script sign error: `{0}`")]
    ScriptSign(#[from] ScriptSignError),

    #[error("lock script group `{0:#x}` can not be signed")]
    Unsigned(H256),
}

/// Script signer logic:
///   * Generate message to sign
///   * Sign the message by wallet
///   * Put the signature into tx.witnesses
pub trait ScriptSigner {
    fn match_args(&self, args: &[u8]) -> bool;

    /// Add signature information to witnesses
    fn sign_tx(
        &self,
        tx: &TransactionView,
        script_group: &ScriptGroup,
    ) -> Result<TransactionView, ScriptSignError>;
}

/// Signer for secp256k1 sighash all lock script
pub struct SecpSighashScriptSigner {
    signer: Box<dyn Signer>,
}

impl SecpSighashScriptSigner {
    pub fn new(signer: Box<dyn Signer>) -> SecpSighashScriptSigner {
        SecpSighashScriptSigner { signer }
    }

    pub fn new_with_secret_keys(keys: Vec<H256>) -> Result<SecpSighashScriptSigner, SignerError> {
        let signer = SecpCkbRawKeySigner::new_with_secret_keys(keys)?;
        Ok(SecpSighashScriptSigner::new(Box::new(signer)))
    }

    pub fn signer(&self) -> &dyn Signer {
        self.signer.as_ref()
    }

    fn sign_tx_with_owner_id(
        &self,
        owner_id: &[u8],
        tx: &TransactionView,
        script_group: &ScriptGroup,
    ) -> Result<TransactionView, ScriptSignError> {
        let witness_idx = *script_group
            .input_indices
            .first()
            .ok_or(ScriptSignError::WitnessNotEnough)?;
        let mut witnesses: Vec<packed::Bytes> = tx.witnesses().into_iter().collect();
        while witnesses.len() <= witness_idx {
            witnesses.push(Default::default());
        }
        let tx_new = tx
            .as_advanced_builder()
            .set_witnesses(witnesses.clone())
            .build();

        let zero_lock = Bytes::from(vec![0u8; SECP_SIGNATURE_SIZE]);
        let message = generate_message(&tx_new, script_group, zero_lock)?;

        let signature = self.signer.sign(owner_id, message.as_ref(), tx)?;

        // Put signature into witness
        let witness_data = witnesses[witness_idx].raw_data();
        let mut current_witness: WitnessArgs = if witness_data.is_empty() {
            WitnessArgs::default()
        } else {
            WitnessArgs::from_slice(witness_data.as_ref())?
        };
        current_witness = current_witness
            .as_builder()
            .lock(Some(signature).pack())
            .build();
        witnesses[witness_idx] = current_witness.as_bytes().pack();
        Ok(tx.as_advanced_builder().set_witnesses(witnesses).build())
    }

    /// Sign every lock script group of the transaction, returns the indices
    /// of the signed groups. Type script groups need no signature and are
    /// skipped, any lock group this signer can not sign is an error.
    pub fn sign_transaction(
        &self,
        transaction: &mut TransactionWithScriptGroups,
    ) -> Result<Vec<usize>, SignError> {
        let mut signed_groups_indices = vec![];
        let mut tx = transaction.get_tx_view().clone();
        for (idx, script_group) in transaction.get_script_groups().iter().enumerate() {
            if script_group.group_type != crate::types::ScriptGroupType::Lock {
                continue;
            }
            let args = script_group.script.args().raw_data();
            if !is_sighash_script(&script_group.script) || !self.match_args(args.as_ref()) {
                return Err(SignError::Unsigned(
                    script_group.script.calc_script_hash().unpack(),
                ));
            }
            tx = self.sign_tx(&tx, script_group)?;
            signed_groups_indices.push(idx);
        }
        debug!("signed {} lock script groups", signed_groups_indices.len());
        transaction.set_tx_view(tx);
        Ok(signed_groups_indices)
    }
}

impl ScriptSigner for SecpSighashScriptSigner {
    fn match_args(&self, args: &[u8]) -> bool {
        args.len() == 20 && self.signer.match_id(args)
    }

    fn sign_tx(
        &self,
        tx: &TransactionView,
        script_group: &ScriptGroup,
    ) -> Result<TransactionView, ScriptSignError> {
        let args = script_group.script.args().raw_data();
        self.sign_tx_with_owner_id(args.as_ref(), tx, script_group)
    }
}

fn is_sighash_script(script: &packed::Script) -> bool {
    let code_hash: H256 = script.code_hash().unpack();
    let hash_type: packed::Byte = ScriptHashType::Type.into();
    code_hash == SIGHASH_TYPE_HASH && script.hash_type() == hash_type
}

/// The sighash all message of a script group:
///
/// `blake2b(tx_hash, len(first_witness), first_witness, (len, witness) of the
/// other group inputs, (len, witness) beyond the inputs)` where the lock of
/// the first witness is replaced by `zero_lock`.
pub fn generate_message(
    tx: &TransactionView,
    script_group: &ScriptGroup,
    zero_lock: Bytes,
) -> Result<Bytes, ScriptSignError> {
    let first_idx = *script_group
        .input_indices
        .first()
        .ok_or(ScriptSignError::WitnessNotEnough)?;
    if tx.witnesses().item_count() <= first_idx {
        return Err(ScriptSignError::WitnessNotEnough);
    }

    let witnesses: Vec<packed::Bytes> = tx.witnesses().into_iter().collect();
    let witness_data = witnesses[first_idx].raw_data();
    let mut init_witness = if witness_data.is_empty() {
        WitnessArgs::default()
    } else {
        WitnessArgs::from_slice(witness_data.as_ref())?
    };
    init_witness = init_witness
        .as_builder()
        .lock(Some(zero_lock).pack())
        .build();
    // Other witnesses in current script group
    let other_witnesses = script_group
        .input_indices
        .iter()
        .skip(1)
        .filter_map(|idx| witnesses.get(*idx));
    // The witnesses not covered by any inputs
    let outter_witnesses = witnesses.iter().skip(tx.inputs().len());

    let mut blake2b = new_blake2b();
    blake2b.update(tx.hash().as_slice());
    blake2b.update(&(init_witness.as_bytes().len() as u64).to_le_bytes());
    blake2b.update(&init_witness.as_bytes());
    for witness in other_witnesses.chain(outter_witnesses) {
        blake2b.update(&(witness.item_count() as u64).to_le_bytes());
        blake2b.update(&witness.raw_data());
    }
    let mut message = vec![0u8; 32];
    blake2b.finalize(&mut message);
    Ok(Bytes::from(message))
}
