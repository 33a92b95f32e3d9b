use ckb_jsonrpc_types::{BlockNumber, JsonBytes, OutputsValidator, Transaction, Uint32};
use ckb_types::{core::TransactionView, H256};

use super::ckb_indexer::{Cell, Order, Pagination, SearchKey, Tip};
use crate::traits::TransactionSender;

crate::jsonrpc!(pub struct CkbRpcClient {
    // Chain
    pub fn get_tip_block_number(&self) -> BlockNumber;

    // Pool
    pub fn send_transaction(&self, tx: Transaction, outputs_validator: Option<OutputsValidator>) -> H256;

    // Indexer
    pub fn get_indexer_tip(&self) -> Option<Tip>;
    pub fn get_cells(&self, search_key: SearchKey, order: Order, limit: Uint32, after: Option<JsonBytes>) -> Pagination<Cell>;
});

impl TransactionSender for CkbRpcClient {
    fn send(&self, tx: &TransactionView) -> Result<H256, anyhow::Error> {
        // Outputs of an xUDT transfer carry type scripts the well-known
        // validator rejects, so the node is asked to skip it.
        let tx_hash = self.send_transaction(
            tx.data().into(),
            Some(OutputsValidator::Passthrough),
        )?;
        Ok(tx_hash)
    }
}
