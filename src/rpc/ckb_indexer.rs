//! Request and response types of the indexer rpc methods built into the ckb node
use ckb_jsonrpc_types::{BlockNumber, CellOutput, JsonBytes, OutPoint, Script, Uint32, Uint64};
use ckb_types::H256;
use serde::{Deserialize, Serialize};

use crate::traits::{CellQueryOptions, LiveCell};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SearchKey {
    pub script: Script,
    pub script_type: ScriptType,
    pub script_search_mode: Option<SearchMode>,
    pub filter: Option<SearchKeyFilter>,
    pub with_data: Option<bool>,
    pub group_by_transaction: Option<bool>,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq)]
pub struct SearchKeyFilter {
    pub script: Option<Script>,
    pub script_len_range: Option<[Uint64; 2]>,
    pub output_data_len_range: Option<[Uint64; 2]>,
    pub output_capacity_range: Option<[Uint64; 2]>,
    pub block_range: Option<[BlockNumber; 2]>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptType {
    Lock,
    Type,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Prefix,
    Exact,
    Partial,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    Desc,
    Asc,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Tip {
    pub block_hash: H256,
    pub block_number: BlockNumber,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Cell {
    pub output: CellOutput,
    pub output_data: Option<JsonBytes>,
    pub out_point: OutPoint,
    pub block_number: BlockNumber,
    pub tx_index: Uint32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Pagination<T> {
    pub objects: Vec<T>,
    pub last_cursor: JsonBytes,
}

impl From<Cell> for LiveCell {
    fn from(cell: Cell) -> LiveCell {
        LiveCell {
            output: cell.output.into(),
            output_data: cell
                .output_data
                .map(JsonBytes::into_bytes)
                .unwrap_or_default(),
            out_point: cell.out_point.into(),
            block_number: cell.block_number.value(),
            tx_index: cell.tx_index.value(),
        }
    }
}

impl From<&CellQueryOptions> for SearchKey {
    fn from(query: &CellQueryOptions) -> SearchKey {
        let mut filter = SearchKeyFilter::default();
        match &query.type_script {
            Some(type_script) => filter.script = Some(type_script.clone().into()),
            // a zero length type script means the cell has no type
            None => filter.script_len_range = Some([0u64.into(), 1u64.into()]),
        }
        filter.output_data_len_range = query
            .data_len_range
            .map(|range| [range.start.into(), range.end.into()]);
        SearchKey {
            script: query.lock_script.clone().into(),
            script_type: ScriptType::Lock,
            script_search_mode: Some(SearchMode::Exact),
            filter: Some(filter),
            with_data: Some(true),
            group_by_transaction: None,
        }
    }
}
