use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    NETWORK_DEV, NETWORK_MAINNET, NETWORK_TESTNET, PREFIX_MAINNET, PREFIX_TESTNET,
};

#[derive(Hash, Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    Mainnet,
    Testnet,
    Dev,
}

impl NetworkType {
    pub fn from_prefix(value: &str) -> Option<NetworkType> {
        match value {
            PREFIX_MAINNET => Some(NetworkType::Mainnet),
            PREFIX_TESTNET => Some(NetworkType::Testnet),
            _ => None,
        }
    }

    pub fn to_prefix(self) -> &'static str {
        match self {
            NetworkType::Mainnet => PREFIX_MAINNET,
            NetworkType::Testnet | NetworkType::Dev => PREFIX_TESTNET,
        }
    }

    pub fn from_raw_str(value: &str) -> Option<NetworkType> {
        match value {
            NETWORK_MAINNET | "mainnet" => Some(NetworkType::Mainnet),
            NETWORK_TESTNET | "testnet" => Some(NetworkType::Testnet),
            NETWORK_DEV | "dev" => Some(NetworkType::Dev),
            _ => None,
        }
    }

    pub fn to_str(self) -> &'static str {
        match self {
            NetworkType::Mainnet => NETWORK_MAINNET,
            NetworkType::Testnet => NETWORK_TESTNET,
            NetworkType::Dev => NETWORK_DEV,
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Network type plus the CKB node rpc url serving it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkInfo {
    pub network_type: NetworkType,
    pub url: String,
}

impl NetworkInfo {
    pub fn new(network_type: NetworkType, url: String) -> Self {
        Self { network_type, url }
    }
    pub fn mainnet() -> Self {
        Self {
            network_type: NetworkType::Mainnet,
            url: "https://mainnet.ckb.dev".to_string(),
        }
    }
    pub fn testnet() -> Self {
        Self {
            network_type: NetworkType::Testnet,
            url: "https://testnet.ckb.dev".to_string(),
        }
    }
    pub fn devnet() -> Self {
        Self {
            network_type: NetworkType::Dev,
            url: "http://127.0.0.1:8114".to_string(),
        }
    }
}
