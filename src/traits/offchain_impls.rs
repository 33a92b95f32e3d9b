//! For offchain operations or for testing purpose

use super::{CellQuery, CellQueryError, CellQueryOptions, LiveCell};

/// A cell query only use offchain data, cells are returned in insertion order
#[derive(Default, Clone)]
pub struct OffchainCellQuery {
    pub live_cells: Vec<LiveCell>,
}

impl OffchainCellQuery {
    pub fn new(live_cells: Vec<LiveCell>) -> OffchainCellQuery {
        OffchainCellQuery { live_cells }
    }

    pub fn add_cell(&mut self, cell: LiveCell) {
        self.live_cells.push(cell);
    }
}

impl CellQuery for OffchainCellQuery {
    fn query_cells(&self, query: &CellQueryOptions) -> Result<Vec<LiveCell>, CellQueryError> {
        Ok(self
            .live_cells
            .iter()
            .filter(|cell| query.match_cell(cell))
            .cloned()
            .collect())
    }
}
