use ckb_types::{h256, H256};

pub const PREFIX_MAINNET: &str = "ckb";
pub const PREFIX_TESTNET: &str = "ckt";

pub const NETWORK_MAINNET: &str = "ckb";
pub const NETWORK_TESTNET: &str = "ckb_testnet";
pub const NETWORK_DEV: &str = "ckb_dev";

pub const SECP_SIGNATURE_SIZE: usize = 65;

pub const ONE_CKB: u64 = 100_000_000;
pub const MIN_SECP_CELL_CAPACITY: u64 = 61 * ONE_CKB;

/// Size of the little-endian `u128` amount at the head of a UDT cell's data
pub const UDT_AMOUNT_SIZE: usize = 16;

/// Change up to this much capacity is folded into the receiver's capacity
/// output instead of becoming a new cell.
pub const DEFAULT_DUST_THRESHOLD: u64 = 65 * ONE_CKB;

/// Default fee rate in shannons per 1000 bytes
pub const DEFAULT_FEE_RATE: u64 = 1000;

pub const SIGHASH_TYPE_HASH: H256 =
    h256!("0x9bd7e06f3ecf4be0f2fcd2188b23f1b9fcc88e5d4b65a8637b17723bbda3cce8");
pub const MULTISIG_TYPE_HASH: H256 =
    h256!("0x5c5069eb0857efc65e1bca0c07df34c31663b3622fd3876c876320fc9634e2a8");

/// anyone can pay script mainnet code hash, see:
/// <https://github.com/nervosnetwork/rfcs/blob/master/rfcs/0026-anyone-can-pay/0026-anyone-can-pay.md#notes>
pub const ACP_TYPE_HASH_LINA: H256 =
    h256!("0xd369597ff47f29fbc0d47d2e3775370d1250b85140c670e4718af712983a2354");
/// anyone can pay script testnet code hash
pub const ACP_TYPE_HASH_AGGRON: H256 =
    h256!("0x3419a1c09eb2567f6552ee7a8ecffd64155cffe0f1796e6e61ec088d740c1356");

/// secp256k1_blake160_sighash_all dep group, (tx_hash, index)
pub const SIGHASH_DEP_GROUP_LINA: (H256, u32) = (
    h256!("0x71a7ba8fc96349fea0ed3a5c47992e3b4084b031a42264a018e0072e8172e46c"),
    0,
);
pub const SIGHASH_DEP_GROUP_AGGRON: (H256, u32) = (
    h256!("0xf8de3bb47d055cdf460d93a2a6e1b05f7432f9777c8c474abf4eec1d4aee5d37"),
    0,
);

/// xUDT type script code hash (hash_type = type), see:
/// <https://github.com/nervosnetwork/rfcs/blob/master/rfcs/0052-extensible-udt/0052-extensible-udt.md>
pub const XUDT_CODE_HASH_MAINNET: H256 =
    h256!("0x50bd8d6680b8b9cf98b73f3c08faf8b2a21914311954118ad6609be6e78a1b95");
pub const XUDT_CODE_HASH_TESTNET: H256 =
    h256!("0x25c29dc317811a6f6f3985a7a9ebc4838bd388d19d0feeecf0bcd60f6c0975bb");

/// xUDT code cell, (tx_hash, index)
pub const XUDT_CELL_DEP_MAINNET: (H256, u32) = (
    h256!("0xc07844ce21b38e4b071dd0e1ee3b0e27afd8d7532491327f39b786343f558ab7"),
    0,
);
pub const XUDT_CELL_DEP_TESTNET: (H256, u32) = (
    h256!("0xbf6fb538763efec2a70a6a3dcb7242787087e1030c4e7d86585bc63a9d337f5f"),
    0,
);

#[cfg(test)]
mod test {
    use super::*;
    use ckb_types::{
        core::{Capacity, ScriptHashType},
        packed::{CellOutput, Script},
        prelude::*,
        H160,
    };

    fn sighash_lock() -> Script {
        Script::new_builder()
            .code_hash(SIGHASH_TYPE_HASH.pack())
            .hash_type(ScriptHashType::Type.into())
            .args(H160::default().as_bytes().pack())
            .build()
    }

    #[test]
    fn test_min_capacity() {
        let min_secp_cell_capacity = CellOutput::new_builder()
            .lock(sighash_lock())
            .build()
            .occupied_capacity(Capacity::zero())
            .unwrap()
            .as_u64();

        assert_eq!(min_secp_cell_capacity, MIN_SECP_CELL_CAPACITY);
    }

    #[test]
    fn test_min_xudt_capacity() {
        let xudt_type = Script::new_builder()
            .code_hash(XUDT_CODE_HASH_TESTNET.pack())
            .hash_type(ScriptHashType::Type.into())
            .args(sighash_lock().calc_script_hash().as_bytes().pack())
            .build();
        let capacity = CellOutput::new_builder()
            .lock(sighash_lock())
            .type_(Some(xudt_type).pack())
            .build()
            .occupied_capacity(Capacity::bytes(UDT_AMOUNT_SIZE).unwrap())
            .unwrap()
            .as_u64();

        assert_eq!(capacity, 142 * ONE_CKB);
    }

    #[test]
    fn test_dust_threshold_covers_secp_cell() {
        assert!(DEFAULT_DUST_THRESHOLD > MIN_SECP_CELL_CAPACITY);
    }
}
