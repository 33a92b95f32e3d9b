use ckb_types::H256;
use log::info;

use crate::error::Error;
use crate::traits::{CellQuery, TransactionSender};
use crate::tx_builder::{TransactionBuilderConfiguration, XudtTransferBuilder, XudtTransferRequest};
use crate::unlock::SecpSighashScriptSigner;

/// Build, sign and send an xUDT transfer, returns the transaction hash.
pub fn transfer_xudt(
    configuration: &TransactionBuilderConfiguration,
    request: &XudtTransferRequest,
    cell_query: &dyn CellQuery,
    signer: &SecpSighashScriptSigner,
    tx_sender: &dyn TransactionSender,
) -> Result<H256, Error> {
    let builder = XudtTransferBuilder::new(configuration);
    let mut unsigned = builder.build_with_query(request, cell_query)?;
    signer.sign_transaction(&mut unsigned.tx_with_groups)?;
    let tx = unsigned.tx_with_groups.get_tx_view();
    let tx_hash = tx_sender.send(tx).map_err(Error::Send)?;
    info!(
        "xudt transfer sent, tx hash: {:#x}, fee: {} shannons",
        tx_hash, unsigned.fee
    );
    Ok(tx_hash)
}
