//! Basic types shared by the builder, the signer and the rpc layer
mod address;
mod human_capacity;
mod network_type;
mod script_group;
mod transaction_with_groups;

pub use address::{Address, AddressPayload, AddressType, CodeHashIndex};
pub use human_capacity::{HumanAmount, HumanCapacity};
pub use network_type::{NetworkInfo, NetworkType};
pub use script_group::{ScriptGroup, ScriptGroupType};
pub use transaction_with_groups::TransactionWithScriptGroups;
