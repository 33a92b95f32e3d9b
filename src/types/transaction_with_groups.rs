use ckb_types::core::TransactionView;

use super::{ScriptGroup, ScriptGroupType};

#[derive(Debug, Clone)]
pub struct TransactionWithScriptGroups {
    pub tx_view: TransactionView,
    pub script_groups: Vec<ScriptGroup>,
}

impl TransactionWithScriptGroups {
    pub fn new(tx_view: TransactionView, script_groups: Vec<ScriptGroup>) -> Self {
        Self {
            tx_view,
            script_groups,
        }
    }
    pub fn get_tx_view(&self) -> &TransactionView {
        &self.tx_view
    }

    pub fn set_tx_view(&mut self, tx_view: TransactionView) {
        self.tx_view = tx_view;
    }

    pub fn get_script_groups(&self) -> &[ScriptGroup] {
        &self.script_groups
    }

    pub fn lock_groups(&self) -> impl Iterator<Item = &ScriptGroup> {
        self.script_groups
            .iter()
            .filter(|group| group.group_type == ScriptGroupType::Lock)
    }
}
