use ckb_types::packed::Script;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ScriptGroupType {
    Lock,
    Type,
}

/// Input/output indices of a transaction that run the same script
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ScriptGroup {
    pub script: Script,
    pub group_type: ScriptGroupType,
    pub input_indices: Vec<usize>,
    pub output_indices: Vec<usize>,
}

impl ScriptGroup {
    pub fn from_lock_script(script: &Script) -> ScriptGroup {
        ScriptGroup {
            script: script.clone(),
            group_type: ScriptGroupType::Lock,
            input_indices: Vec::new(),
            output_indices: Vec::new(),
        }
    }

    pub fn from_type_script(script: &Script) -> ScriptGroup {
        ScriptGroup {
            script: script.clone(),
            group_type: ScriptGroupType::Type,
            input_indices: Vec::new(),
            output_indices: Vec::new(),
        }
    }
}
