//! The traits defined here describe what the transfer flow needs from the
//! outside world: live cells, a signer and a way to submit transactions.

pub mod default_impls;
pub mod offchain_impls;

pub use default_impls::{DefaultCellQuery, SecpCkbRawKeySigner};
pub use offchain_impls::OffchainCellQuery;

use thiserror::Error;

use ckb_types::{
    bytes::Bytes,
    core::TransactionView,
    packed::{CellOutput, OutPoint, Script},
    prelude::*,
    H256,
};

/// Signer errors
#[derive(Error, Debug)]
pub enum SignerError {
    #[error("the id is not found in the signer")]
    IdNotFound,

    #[error("invalid message, reason: `{0}`")]
    InvalidMessage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A signer abstraction over secret key storage.
pub trait Signer {
    /// typical id is blake160(pubkey)
    fn match_id(&self, id: &[u8]) -> bool;

    /// Sign a 32 bytes message, the result is a 65 bytes recoverable signature.
    fn sign(&self, id: &[u8], message: &[u8], tx: &TransactionView)
        -> Result<Bytes, SignerError>;
}

/// Cell query errors
#[derive(Error, Debug)]
pub enum CellQueryError {
    #[error(transparent)]
    Internal(anyhow::Error),

    #[error(transparent)]
    Other(anyhow::Error),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LiveCell {
    pub output: CellOutput,
    pub output_data: Bytes,
    pub out_point: OutPoint,
    pub block_number: u64,
    pub tx_index: u32,
}

impl LiveCell {
    pub fn capacity(&self) -> u64 {
        self.output.capacity().unpack()
    }
}

/// The value range option: `start <= value < end`
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ValueRangeOption {
    pub start: u64,
    pub end: u64,
}
impl ValueRangeOption {
    pub fn new(start: u64, end: u64) -> ValueRangeOption {
        ValueRangeOption { start, end }
    }
    pub fn new_exact(value: u64) -> ValueRangeOption {
        ValueRangeOption::new(value, value + 1)
    }
    pub fn match_value(&self, value: u64) -> bool {
        self.start <= value && value < self.end
    }
}

/// Live cells owned by `lock_script`.
///
///   * `type_script = Some(..)`: the cell must carry exactly that type script
///   * `type_script = None`: the cell must not have a type script
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CellQueryOptions {
    pub lock_script: Script,
    pub type_script: Option<Script>,
    pub data_len_range: Option<ValueRangeOption>,
}

impl CellQueryOptions {
    /// Cells holding the xUDT identified by `type_script`
    pub fn new_xudt(lock_script: Script, type_script: Script) -> CellQueryOptions {
        CellQueryOptions {
            lock_script,
            type_script: Some(type_script),
            data_len_range: None,
        }
    }

    /// Cells holding only capacity: no type script and empty data
    pub fn new_plain(lock_script: Script) -> CellQueryOptions {
        CellQueryOptions {
            lock_script,
            type_script: None,
            data_len_range: Some(ValueRangeOption::new_exact(0)),
        }
    }

    pub fn match_cell(&self, cell: &LiveCell) -> bool {
        if cell.output.lock() != self.lock_script {
            return false;
        }
        if cell.output.type_().to_opt() != self.type_script {
            return false;
        }
        if let Some(range) = self.data_len_range {
            if !range.match_value(cell.output_data.len() as u64) {
                return false;
            }
        }
        true
    }
}

/// Read-only access to live cells. The returned order must be stable within
/// one call, cell selection walks it front to back.
pub trait CellQuery {
    fn query_cells(&self, query: &CellQueryOptions) -> Result<Vec<LiveCell>, CellQueryError>;
}

/// Submit a signed transaction, returns the transaction hash
pub trait TransactionSender {
    fn send(&self, tx: &TransactionView) -> Result<H256, anyhow::Error>;
}

// test cases make sure new added exception won't breadk `anyhow!(e_variable)` usage,
#[cfg(test)]
mod anyhow_tests {
    use anyhow::anyhow;
    #[test]
    fn test_signer_error() {
        use super::SignerError;
        let error = anyhow!(SignerError::IdNotFound);
        assert_eq!("the id is not found in the signer", error.to_string());
        let error = anyhow!(SignerError::InvalidMessage("InvalidMessage".to_string()));
        assert_eq!(
            "invalid message, reason: `InvalidMessage`",
            error.to_string()
        );
        let error = anyhow!(SignerError::Other(anyhow::anyhow!("Other")));
        assert_eq!("Other", error.to_string());
    }

    #[test]
    fn test_cell_query_error() {
        use super::CellQueryError;
        let error = CellQueryError::Internal(anyhow!("Internel"));
        let error = anyhow!(error);
        assert_eq!("Internel", error.to_string());

        let error = CellQueryError::Other(anyhow!("Other"));
        let error = anyhow!(error);
        assert_eq!("Other", error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ckb_types::packed::CellOutput;

    fn cell(lock: &Script, type_script: Option<Script>, data: Vec<u8>) -> LiveCell {
        LiveCell {
            output: CellOutput::new_builder()
                .lock(lock.clone())
                .type_(type_script.pack())
                .capacity(100u64.pack())
                .build(),
            output_data: Bytes::from(data),
            out_point: OutPoint::default(),
            block_number: 0,
            tx_index: 0,
        }
    }

    #[test]
    fn test_match_cell() {
        let lock = Script::new_builder().args(vec![1u8; 20].pack()).build();
        let other_lock = Script::new_builder().args(vec![3u8; 20].pack()).build();
        let xudt = Script::new_builder().args(vec![2u8; 32].pack()).build();

        let plain = CellQueryOptions::new_plain(lock.clone());
        assert!(plain.match_cell(&cell(&lock, None, vec![])));
        assert!(!plain.match_cell(&cell(&lock, None, vec![0])));
        assert!(!plain.match_cell(&cell(&lock, Some(xudt.clone()), vec![])));
        assert!(!plain.match_cell(&cell(&other_lock, None, vec![])));

        let token = CellQueryOptions::new_xudt(lock.clone(), xudt.clone());
        assert!(token.match_cell(&cell(&lock, Some(xudt.clone()), vec![0; 16])));
        assert!(!token.match_cell(&cell(&lock, None, vec![0; 16])));
        assert!(!token.match_cell(&cell(&other_lock, Some(xudt), vec![0; 16])));
        assert_eq!(cell(&lock, None, vec![]).capacity(), 100);
    }

    #[test]
    fn test_value_range() {
        let range = ValueRangeOption::new(16, 32);
        assert!(!range.match_value(15));
        assert!(range.match_value(16));
        assert!(range.match_value(31));
        assert!(!range.match_value(32));
        assert_eq!(ValueRangeOption::new_exact(0), ValueRangeOption::new(0, 1));

        let lock = Script::new_builder().args(vec![1u8; 20].pack()).build();
        let xudt = Script::new_builder().args(vec![2u8; 32].pack()).build();
        let mut token = CellQueryOptions::new_xudt(lock.clone(), xudt.clone());
        token.data_len_range = Some(ValueRangeOption::new(16, u64::MAX));
        assert!(token.match_cell(&cell(&lock, Some(xudt.clone()), vec![0; 24])));
        assert!(!token.match_cell(&cell(&lock, Some(xudt), vec![0; 8])));
    }
}
