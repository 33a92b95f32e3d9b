use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use ckb_crypto::secp::Privkey;
use ckb_hash::blake2b_256;
use ckb_types::{bytes::Bytes, core::TransactionView, H160, H256};
use log::debug;

use super::{CellQuery, CellQueryError, CellQueryOptions, LiveCell, Signer, SignerError};
use crate::rpc::{
    ckb_indexer::{Order, SearchKey, Tip},
    CkbRpcClient,
};

const MAX_LIMIT: u32 = 4096;

/// A cell query use the ckb node's built-in indexer as backend
#[derive(Clone)]
pub struct DefaultCellQuery {
    ckb_client: CkbRpcClient,
    acceptable_indexer_leftbehind: u64,
}

impl DefaultCellQuery {
    pub fn new(ckb_client: CkbRpcClient) -> DefaultCellQuery {
        DefaultCellQuery {
            ckb_client,
            acceptable_indexer_leftbehind: 1,
        }
    }

    pub fn new_with_url(url: &str) -> Result<DefaultCellQuery, CellQueryError> {
        let ckb_client =
            CkbRpcClient::new(url).map_err(|err| CellQueryError::Other(anyhow!(err)))?;
        Ok(DefaultCellQuery::new(ckb_client))
    }

    /// The acceptable indexer leftbehind block number (default = 1)
    pub fn acceptable_indexer_leftbehind(&self) -> u64 {
        self.acceptable_indexer_leftbehind
    }
    pub fn set_acceptable_indexer_leftbehind(&mut self, value: u64) {
        self.acceptable_indexer_leftbehind = value;
    }

    /// Check if the indexer synced with the ckb node. This will check every
    /// 50ms for 100 times.
    pub fn check_ckb_chain(&self) -> Result<(), CellQueryError> {
        let tip_number = self
            .ckb_client
            .get_tip_block_number()
            .map_err(|err| CellQueryError::Internal(err.into()))?;

        for _ in 0..100 {
            match self
                .ckb_client
                .get_indexer_tip()
                .map_err(|err| CellQueryError::Internal(err.into()))?
            {
                Some(Tip { block_number, .. }) => {
                    if tip_number.value()
                        > block_number.value() + self.acceptable_indexer_leftbehind
                    {
                        thread::sleep(Duration::from_millis(50));
                    } else {
                        return Ok(());
                    }
                }
                None => {
                    return Err(CellQueryError::Other(anyhow!(
                        "ckb indexer not synced"
                    )));
                }
            }
        }
        Err(CellQueryError::Other(anyhow!(
            "ckb indexer inconsistent with currently connected ckb node or not synced!"
        )))
    }
}

impl CellQuery for DefaultCellQuery {
    fn query_cells(&self, query: &CellQueryOptions) -> Result<Vec<LiveCell>, CellQueryError> {
        self.check_ckb_chain()?;
        let search_key = SearchKey::from(query);
        let mut cells = Vec::new();
        let mut limit: u32 = 16;
        let mut last_cursor = None;
        loop {
            let page = self
                .ckb_client
                .get_cells(search_key.clone(), Order::Asc, limit.into(), last_cursor)
                .map_err(|err| CellQueryError::Internal(err.into()))?;
            if page.objects.is_empty() {
                break;
            }
            cells.extend(
                page.objects
                    .into_iter()
                    .map(LiveCell::from)
                    .filter(|cell| query.match_cell(cell)),
            );
            last_cursor = Some(page.last_cursor);
            if limit < MAX_LIMIT {
                limit *= 2;
            }
        }
        debug!(
            "collected {} live cells for lock {}",
            cells.len(),
            query.lock_script
        );
        Ok(cells)
    }
}

/// A signer use secp256k1 raw key, the id is `blake160(pubkey)`.
#[derive(Default)]
pub struct SecpCkbRawKeySigner {
    keys: HashMap<H160, Privkey>,
}

impl SecpCkbRawKeySigner {
    pub fn new(keys: HashMap<H160, Privkey>) -> SecpCkbRawKeySigner {
        SecpCkbRawKeySigner { keys }
    }
    pub fn new_with_secret_keys(keys: Vec<H256>) -> Result<SecpCkbRawKeySigner, SignerError> {
        let mut signer = SecpCkbRawKeySigner::default();
        for key in keys {
            signer.add_secret_key(key)?;
        }
        Ok(signer)
    }
    /// Add a secret key, returns the `blake160(pubkey)` it is registered under
    pub fn add_secret_key(&mut self, key: H256) -> Result<H160, SignerError> {
        let privkey = Privkey::from(key);
        let pubkey = privkey
            .pubkey()
            .map_err(|err| SignerError::Other(anyhow!("invalid secret key: {}", err)))?;
        let hash160 = H160::from_slice(&blake2b_256(pubkey.serialize())[0..20])
            .map_err(|err| SignerError::Other(anyhow!("{:?}", err)))?;
        self.keys.insert(hash160.clone(), privkey);
        Ok(hash160)
    }
    fn get_key(&self, id: &[u8]) -> Option<&Privkey> {
        if id.len() != 20 {
            return None;
        }
        H160::from_slice(id)
            .ok()
            .and_then(|hash160| self.keys.get(&hash160))
    }
}

impl Signer for SecpCkbRawKeySigner {
    fn match_id(&self, id: &[u8]) -> bool {
        self.get_key(id).is_some()
    }

    fn sign(
        &self,
        id: &[u8],
        message: &[u8],
        _tx: &TransactionView,
    ) -> Result<Bytes, SignerError> {
        let key = self.get_key(id).ok_or(SignerError::IdNotFound)?;
        if message.len() != 32 {
            return Err(SignerError::InvalidMessage(format!(
                "expected length: 32, got: {}",
                message.len()
            )));
        }
        let msg = H256::from_slice(message)
            .map_err(|err| SignerError::InvalidMessage(format!("{:?}", err)))?;
        let sig = key
            .sign_recoverable(&msg)
            .map_err(|err| SignerError::Other(anyhow!(err)))?;
        Ok(Bytes::from(sig.serialize()))
    }
}
