use thiserror::Error;

use crate::rpc::RpcError;
use crate::traits::{CellQueryError, SignerError};
use crate::tx_builder::TxBuilderError;
use crate::unlock::SignError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("transaction builder error: `{0}`")]
    TxBuilder(#[from] TxBuilderError),
    #[error("cell query error: `{0}`")]
    CellQuery(#[from] CellQueryError),
    #[error("rpc error: `{0}`")]
    Rpc(#[from] RpcError),
    #[error("sign error: `{0}`")]
    Sign(#[from] SignError),
    #[error("signer error: `{0}`")]
    Signer(#[from] SignerError),
    #[error("invalid address: `{0}`")]
    Address(String),
    #[error("send transaction error: `{0}`")]
    Send(anyhow::Error),
}
