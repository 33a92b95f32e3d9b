use std::str::FromStr;

use anyhow::{anyhow, Context};
use clap::Parser;
use log::info;

use ckb_jsonrpc_types as json_types;
use ckb_types::{core::ScriptHashType, packed::Script, prelude::*, H256};
use xudt_transfer::{
    constants::SIGHASH_TYPE_HASH,
    traits::{DefaultCellQuery, SecpCkbRawKeySigner},
    transfer_xudt,
    tx_builder::{FixedFee, XudtTransferBuilder},
    Address, CkbRpcClient, HumanAmount, HumanCapacity, NetworkInfo, NetworkType,
    SecpSighashScriptSigner, TransactionBuilderConfiguration, XudtTransferRequest,
};

/// Transfer xUDT tokens (plus some CKB) from a sighash address to another address
/// # Example:
///     ./target/debug/examples/transfer_xudt --private-key <key> --xudt-args 0x<owner lock hash> --receiver ckt1qyqfjslcvyaay029vvfxtn80rxnwmlma43xscrqn85 --amount 1000 --ckb-amount 142
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// The sender private key (hex string)
    #[clap(long, env = "CKB_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,

    /// mainnet, testnet or dev
    #[clap(long, env = "CKB_NETWORK", default_value = "testnet")]
    network: String,

    /// CKB rpc url, the public node of the network by default
    #[clap(long, env = "CKB_RPC_URL")]
    ckb_rpc: Option<String>,

    /// The xUDT type script as json
    #[clap(long, conflicts_with = "xudt_args", required_unless_present = "xudt_args")]
    xudt_type_script: Option<String>,

    /// The xUDT type script args (owner lock script hash), the code hash is
    /// the network's xUDT deployment
    #[clap(long)]
    xudt_args: Option<String>,

    /// The receiver address
    #[clap(long)]
    receiver: String,

    /// The token amount to transfer (example: 1000.5)
    #[clap(long)]
    amount: String,

    /// The token decimals
    #[clap(long, default_value_t = 8)]
    decimals: u8,

    /// The CKB sent to the receiver in a separate cell (unit: CKB, example: 142)
    #[clap(long)]
    ckb_amount: String,

    /// Fee rate in shannons per 1000 bytes
    #[clap(long, conflicts_with = "fixed_fee")]
    fee_rate: Option<u64>,

    /// Pay a fixed fee instead (unit: CKB)
    #[clap(long)]
    fixed_fee: Option<String>,

    /// Print the signed transaction instead of sending it
    #[clap(long)]
    dry_run: bool,
}

fn parse_network(args: &Args) -> anyhow::Result<NetworkInfo> {
    let network_type = NetworkType::from_raw_str(&args.network)
        .ok_or_else(|| anyhow!("invalid network: {}", args.network))?;
    let mut network = match network_type {
        NetworkType::Mainnet => NetworkInfo::mainnet(),
        NetworkType::Testnet => NetworkInfo::testnet(),
        NetworkType::Dev => NetworkInfo::devnet(),
    };
    if let Some(url) = &args.ckb_rpc {
        network.url = url.clone();
    }
    Ok(network)
}

fn parse_xudt_script(
    args: &Args,
    configuration: &TransactionBuilderConfiguration,
) -> anyhow::Result<Script> {
    if let Some(json) = &args.xudt_type_script {
        let script: json_types::Script =
            serde_json::from_str(json).context("parse xudt type script")?;
        return Ok(script.into());
    }
    let owner_hash = args
        .xudt_args
        .as_deref()
        .ok_or_else(|| anyhow!("one of --xudt-type-script and --xudt-args is required"))?;
    let owner_hash = H256::from_str(owner_hash.trim_start_matches("0x"))
        .map_err(|err| anyhow!("parse xudt args: {}", err))?;
    let code_hash = configuration.xudt_code_hash().ok_or_else(|| {
        anyhow!("no xudt deployment known for this network, use --xudt-type-script")
    })?;
    Ok(Script::new_builder()
        .code_hash(code_hash.pack())
        .hash_type(ScriptHashType::Type.into())
        .args(owner_hash.as_bytes().pack())
        .build())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let network = parse_network(&args)?;
    let mut configuration = TransactionBuilderConfiguration::new_with_network(network.clone());
    if let Some(fee_rate) = args.fee_rate {
        configuration.set_fee_rate(fee_rate);
    }
    if let Some(fixed_fee) = &args.fixed_fee {
        let fee = HumanCapacity::from_str(fixed_fee)
            .map_err(|err| anyhow!("parse fixed fee: {}", err))?;
        configuration.set_fee_policy(FixedFee(fee.0));
    }

    let private_key = H256::from_str(args.private_key.trim_start_matches("0x"))
        .map_err(|err| anyhow!("parse private key: {}", err))?;
    let mut key_signer = SecpCkbRawKeySigner::default();
    let sender_arg = key_signer.add_secret_key(private_key)?;
    let signer = SecpSighashScriptSigner::new(Box::new(key_signer));
    let sender = Script::new_builder()
        .code_hash(SIGHASH_TYPE_HASH.pack())
        .hash_type(ScriptHashType::Type.into())
        .args(sender_arg.as_bytes().pack())
        .build();
    let receiver = Script::from(
        &Address::from_str(&args.receiver).map_err(|err| anyhow!("parse receiver: {}", err))?,
    );

    let xudt_amount = HumanAmount::parse(&args.amount, args.decimals)
        .map_err(|err| anyhow!("parse amount: {}", err))?;
    let ckb_amount = HumanCapacity::from_str(&args.ckb_amount)
        .map_err(|err| anyhow!("parse ckb amount: {}", err))?;
    let request = XudtTransferRequest::new(
        parse_xudt_script(&args, &configuration)?,
        sender,
        receiver,
        xudt_amount.value,
        ckb_amount.0,
    );

    let ckb_client = CkbRpcClient::new(&network.url)?;
    let cell_query = DefaultCellQuery::new(ckb_client.clone());
    info!(
        "transfer {} xudt and {} CKB on {}",
        xudt_amount, ckb_amount, network.network_type
    );

    if args.dry_run {
        let mut unsigned =
            XudtTransferBuilder::new(&configuration).build_with_query(&request, &cell_query)?;
        signer.sign_transaction(&mut unsigned.tx_with_groups)?;
        let json_tx =
            json_types::TransactionView::from(unsigned.tx_with_groups.get_tx_view().clone());
        println!("fee: {} CKB", HumanCapacity(unsigned.fee));
        println!("tx: {}", serde_json::to_string_pretty(&json_tx)?);
        return Ok(());
    }

    let tx_hash = transfer_xudt(&configuration, &request, &cell_query, &signer, &ckb_client)?;
    println!(">>> tx {:#x} sent! <<<", tx_hash);
    Ok(())
}
