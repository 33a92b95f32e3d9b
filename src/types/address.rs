use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use bech32::{FromBase32, ToBase32, Variant};
use ckb_types::{
    bytes::Bytes,
    core::ScriptHashType,
    packed::{self, Byte32, Script},
    prelude::*,
    H160, H256,
};

use super::NetworkType;
use crate::constants::{
    ACP_TYPE_HASH_AGGRON, ACP_TYPE_HASH_LINA, MULTISIG_TYPE_HASH, SIGHASH_TYPE_HASH,
};

#[derive(Hash, Eq, PartialEq, Debug, Clone, Copy)]
#[repr(u8)]
pub enum AddressType {
    // full version identifies the hash_type and vm_version
    Full = 0x00,
    // short version for locks with popular code_hash, deprecated
    Short = 0x01,
    // full version with hash_type = "Data", deprecated
    FullData = 0x02,
    // full version with hash_type = "Type", deprecated
    FullType = 0x04,
}

impl AddressType {
    pub fn from_u8(value: u8) -> Result<AddressType, String> {
        match value {
            0x00 => Ok(AddressType::Full),
            0x01 => Ok(AddressType::Short),
            0x02 => Ok(AddressType::FullData),
            0x04 => Ok(AddressType::FullType),
            _ => Err(format!("Invalid address type value: {}", value)),
        }
    }
}

#[derive(Hash, Eq, PartialEq, Debug, Clone, Copy)]
#[repr(u8)]
pub enum CodeHashIndex {
    // SECP256K1 + blake160
    Sighash = 0x00,
    // SECP256K1 + multisig
    Multisig = 0x01,
    // anyone can pay
    Acp = 0x02,
}

impl CodeHashIndex {
    pub fn from_u8(value: u8) -> Result<CodeHashIndex, String> {
        match value {
            0x00 => Ok(CodeHashIndex::Sighash),
            0x01 => Ok(CodeHashIndex::Multisig),
            0x02 => Ok(CodeHashIndex::Acp),
            _ => Err(format!("Invalid code hash index value: {}", value)),
        }
    }

    fn code_hash(self, network: NetworkType) -> H256 {
        match self {
            CodeHashIndex::Sighash => SIGHASH_TYPE_HASH,
            CodeHashIndex::Multisig => MULTISIG_TYPE_HASH,
            CodeHashIndex::Acp => match network {
                NetworkType::Mainnet => ACP_TYPE_HASH_LINA,
                NetworkType::Testnet | NetworkType::Dev => ACP_TYPE_HASH_AGGRON,
            },
        }
    }
}

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum AddressPayload {
    Short {
        index: CodeHashIndex,
        hash: H160,
    },
    Full {
        hash_type: ScriptHashType,
        code_hash: Byte32,
        args: Bytes,
    },
}

impl AddressPayload {
    pub fn new_short_sighash(hash: H160) -> AddressPayload {
        AddressPayload::Short {
            index: CodeHashIndex::Sighash,
            hash,
        }
    }

    pub fn new_full(hash_type: ScriptHashType, code_hash: Byte32, args: Bytes) -> AddressPayload {
        AddressPayload::Full {
            hash_type,
            code_hash,
            args,
        }
    }

    pub fn to_script(&self, network: NetworkType) -> Script {
        match self {
            AddressPayload::Short { index, hash } => Script::new_builder()
                .code_hash(index.code_hash(network).pack())
                .hash_type(ScriptHashType::Type.into())
                .args(Bytes::from(hash.as_bytes().to_vec()).pack())
                .build(),
            AddressPayload::Full {
                hash_type,
                code_hash,
                args,
            } => Script::new_builder()
                .code_hash(code_hash.clone())
                .hash_type((*hash_type).into())
                .args(args.pack())
                .build(),
        }
    }
}

impl TryFrom<&Script> for AddressPayload {
    type Error = String;

    fn try_from(lock: &Script) -> Result<AddressPayload, String> {
        let hash_type = ScriptHashType::try_from(lock.hash_type())
            .map_err(|err| format!("Invalid hash_type: {:?}", err))?;
        Ok(AddressPayload::new_full(
            hash_type,
            lock.code_hash(),
            lock.args().raw_data(),
        ))
    }
}

/// A CKB address, see:
/// <https://github.com/nervosnetwork/rfcs/blob/master/rfcs/0021-ckb-address-format/0021-ckb-address-format.md>
///
/// Every payload format is accepted when parsing; display always uses the
/// full (bech32m) format.
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub struct Address {
    network: NetworkType,
    payload: AddressPayload,
}

impl Address {
    pub fn new(network: NetworkType, payload: AddressPayload) -> Address {
        Address { network, payload }
    }

    pub fn from_lock(network: NetworkType, lock: &Script) -> Result<Address, String> {
        AddressPayload::try_from(lock).map(|payload| Address::new(network, payload))
    }

    pub fn network(&self) -> NetworkType {
        self.network
    }
    pub fn payload(&self) -> &AddressPayload {
        &self.payload
    }

    fn full_payload_data(&self) -> Vec<u8> {
        let script = Script::from(self);
        let args = script.args().raw_data();
        let mut data = Vec::with_capacity(34 + args.len());
        data.push(AddressType::Full as u8);
        data.extend_from_slice(script.code_hash().as_slice());
        data.extend_from_slice(script.hash_type().as_slice());
        data.extend_from_slice(args.as_ref());
        data
    }
}

impl From<&Address> for Script {
    fn from(addr: &Address) -> Script {
        addr.payload.to_script(addr.network)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.full_payload_data();
        let encoded = bech32::encode(self.network.to_prefix(), data.to_base32(), Variant::Bech32m)
            .map_err(|_| fmt::Error)?;
        write!(f, "{}", encoded)
    }
}

fn parse_hash_type(value: u8) -> Result<ScriptHashType, String> {
    ScriptHashType::try_from(packed::Byte::new(value))
        .map_err(|err| format!("Invalid hash_type {}: {:?}", value, err))
}

impl FromStr for Address {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (hrp, data, variant) = bech32::decode(input).map_err(|err| err.to_string())?;
        let network =
            NetworkType::from_prefix(&hrp).ok_or_else(|| format!("Invalid hrp: {}", hrp))?;
        let data = Vec::<u8>::from_base32(&data).map_err(|err| err.to_string())?;
        let ty = data
            .first()
            .ok_or_else(|| "Empty address payload".to_string())
            .and_then(|value| AddressType::from_u8(*value))?;

        let expected_variant = match ty {
            AddressType::Full => Variant::Bech32m,
            _ => Variant::Bech32,
        };
        if variant != expected_variant {
            return Err(format!(
                "Invalid variant for address type {:?}: {:?}",
                ty, variant
            ));
        }

        let payload = match ty {
            AddressType::Short => {
                if data.len() != 22 {
                    return Err(format!(
                        "Invalid input data length, expected: 22, got: {}",
                        data.len()
                    ));
                }
                let index = CodeHashIndex::from_u8(data[1])?;
                let hash =
                    H160::from_slice(&data[2..22]).map_err(|err| format!("{:?}", err))?;
                AddressPayload::Short { index, hash }
            }
            AddressType::Full => {
                if data.len() < 34 {
                    return Err(format!(
                        "Insufficient data length, expected at least 34, got: {}",
                        data.len()
                    ));
                }
                let code_hash = Byte32::from_slice(&data[1..33]).map_err(|err| err.to_string())?;
                let hash_type = parse_hash_type(data[33])?;
                AddressPayload::new_full(hash_type, code_hash, Bytes::from(data[34..].to_vec()))
            }
            AddressType::FullData | AddressType::FullType => {
                if data.len() < 33 {
                    return Err(format!(
                        "Insufficient data length, expected at least 33, got: {}",
                        data.len()
                    ));
                }
                let hash_type = if ty == AddressType::FullData {
                    ScriptHashType::Data
                } else {
                    ScriptHashType::Type
                };
                let code_hash = Byte32::from_slice(&data[1..33]).map_err(|err| err.to_string())?;
                AddressPayload::new_full(hash_type, code_hash, Bytes::from(data[33..].to_vec()))
            }
        };
        Ok(Address { network, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ckb_types::h160;

    #[test]
    fn test_short_sighash_address() {
        let addr = Address::from_str("ckt1qyq86vaa6e8tsruv5ngcd5tp7lcvcewxy7cquuksvj").unwrap();
        assert_eq!(addr.network(), NetworkType::Testnet);
        assert_eq!(
            addr.payload(),
            &AddressPayload::new_short_sighash(h160!("0x7d33bdd64eb80f8ca4d186d161f7f0cc65c627b0"))
        );
        let script = Script::from(&addr);
        let code_hash: H256 = script.code_hash().unpack();
        assert_eq!(code_hash, SIGHASH_TYPE_HASH);
        assert_eq!(
            script.args().raw_data().as_ref(),
            h160!("0x7d33bdd64eb80f8ca4d186d161f7f0cc65c627b0").as_bytes()
        );
    }

    #[test]
    fn test_full_address_display_parse() {
        let short = Address::from_str("ckt1qyq86vaa6e8tsruv5ngcd5tp7lcvcewxy7cquuksvj").unwrap();
        let full_str = short.to_string();
        assert!(full_str.starts_with("ckt1q"));
        let full = Address::from_str(&full_str).unwrap();
        assert!(matches!(full.payload(), AddressPayload::Full { .. }));
        assert_eq!(Script::from(&full), Script::from(&short));
    }

    #[test]
    fn test_receiver_full_address() {
        let addr = Address::from_str("ckt1qrfrwcdnvssswdwpn3s9v8fp87emat306ctjwsm3nmlkjg8qyza2cqgqqxs09mzapj59hfgrjk62d6mffawj4dyafygvehhc").unwrap();
        assert_eq!(addr.network(), NetworkType::Testnet);
        assert!(matches!(addr.payload(), AddressPayload::Full { .. }));
        let script = Script::from(&addr);
        assert_eq!(Address::from_lock(NetworkType::Testnet, &script).unwrap(), addr);
    }

    #[test]
    fn test_invalid_address() {
        assert!(Address::from_str("ckt1qyq86vaa6e8tsruv5ngcd5tp7lcvcewxy7cquuksvx").is_err());
        assert!(Address::from_str("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4").is_err());
        assert!(Address::from_str("").is_err());
    }
}
