//! Build, sign and send xUDT (extensible user defined token) transfers on
//! Nervos CKB.
//!
//! [`XudtTransferBuilder`] selects the sender's token cells, adds plain
//! capacity cells when the token cells can not pay for the outputs and the
//! fee, and returns a balanced transaction together with its script groups.
//! [`transfer_xudt`] signs it with a [`SecpSighashScriptSigner`] and submits
//! it through a [`TransactionSender`](traits::TransactionSender).

pub mod constants;
pub mod error;
pub mod rpc;
pub mod traits;
pub mod transfer;
pub mod tx_builder;
pub mod types;
pub mod unlock;

#[cfg(test)]
mod tests;

pub use error::Error;
pub use rpc::{CkbRpcClient, RpcError};
pub use transfer::transfer_xudt;
pub use tx_builder::{
    TransactionBuilderConfiguration, TxBuilderError, UnsignedTransfer, XudtTransferBuilder,
    XudtTransferRequest,
};
pub use types::{
    Address, AddressPayload, AddressType, CodeHashIndex, HumanAmount, HumanCapacity, NetworkInfo,
    NetworkType, ScriptGroup, ScriptGroupType, TransactionWithScriptGroups,
};
pub use unlock::SecpSighashScriptSigner;
