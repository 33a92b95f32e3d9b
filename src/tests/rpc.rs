use ckb_jsonrpc_types::JsonBytes;
use ckb_types::{bytes::Bytes, core::TransactionView, prelude::*, H256};
use httpmock::prelude::*;
use serde_json::{json, Value};

use super::*;
use crate::rpc::ckb_indexer::{Cell, Pagination};
use crate::rpc::{CkbRpcClient, RpcError};
use crate::traits::{CellQuery, CellQueryOptions, DefaultCellQuery, TransactionSender};

fn rpc_result(result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "result": result, "id": 0 })
}

fn indexer_cell(cell: &LiveCell) -> Cell {
    Cell {
        output: cell.output.clone().into(),
        output_data: Some(JsonBytes::from_bytes(cell.output_data.clone())),
        out_point: cell.out_point.clone().into(),
        block_number: cell.block_number.into(),
        tx_index: cell.tx_index.into(),
    }
}

fn page(cells: &[LiveCell], last_cursor: &str) -> Value {
    let page = Pagination {
        objects: cells.iter().map(indexer_cell).collect(),
        last_cursor: JsonBytes::from_vec(hex::decode(last_cursor).unwrap()),
    };
    rpc_result(serde_json::to_value(page).unwrap())
}

fn mock_synced_tip(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST).path("/").body_contains("get_tip_block_number");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(rpc_result(json!("0x64")));
    });
    server.mock(|when, then| {
        when.method(POST).path("/").body_contains("get_indexer_tip");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(rpc_result(json!({
                "block_hash": format!("{:#x}", H256::from([9u8; 32])),
                "block_number": "0x64",
            })));
    });
}

#[test]
fn test_default_cell_query_pages() {
    let server = MockServer::start();
    mock_synced_tip(&server);
    let sender = build_sighash_script(ACCOUNT0_ARG);
    let first = plain_cell(1, &sender, 100 * ONE_CKB);
    let mut with_data = plain_cell(2, &sender, 100 * ONE_CKB);
    with_data.output_data = Bytes::from(vec![1u8]);
    let second = plain_cell(3, &sender, 200 * ONE_CKB);

    let page1 = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("get_cells")
            .body_contains("\"0x10\",null]");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(page(&[first.clone(), with_data.clone()], "aaaa"));
    });
    let page2 = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("get_cells")
            .body_contains("\"0x20\",\"0xaaaa\"]");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(page(&[second.clone()], "bbbb"));
    });
    let page3 = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("get_cells")
            .body_contains("\"0x40\",\"0xbbbb\"]");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(page(&[], "bbbb"));
    });

    let cell_query = DefaultCellQuery::new_with_url(&server.url("/")).unwrap();
    let cells = cell_query
        .query_cells(&CellQueryOptions::new_plain(sender))
        .unwrap();
    assert_eq!(cells, vec![first, second]);
    page1.assert_hits(1);
    page2.assert_hits(1);
    page3.assert_hits(1);
}

#[test]
fn test_default_cell_query_indexer_not_ready() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/").body_contains("get_tip_block_number");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(rpc_result(json!("0x64")));
    });
    server.mock(|when, then| {
        when.method(POST).path("/").body_contains("get_indexer_tip");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(rpc_result(Value::Null));
    });
    let cells_mock = server.mock(|when, then| {
        when.method(POST).path("/").body_contains("get_cells");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(page(&[], "00"));
    });

    let cell_query = DefaultCellQuery::new_with_url(&server.url("/")).unwrap();
    let sender = build_sighash_script(ACCOUNT0_ARG);
    assert!(cell_query
        .query_cells(&CellQueryOptions::new_plain(sender))
        .is_err());
    cells_mock.assert_hits(0);
}

#[test]
fn test_send_transaction_passthrough() {
    let server = MockServer::start();
    let tx = TransactionView::new_advanced_builder().build();
    let tx_hash: H256 = tx.hash().unpack();
    let send_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/")
            .body_contains("send_transaction")
            .body_contains("\"passthrough\"");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(rpc_result(json!(format!("{:#x}", tx_hash))));
    });

    let client = CkbRpcClient::new(&server.url("/")).unwrap();
    let sent_hash = client.send(&tx).unwrap();
    assert_eq!(sent_hash, tx_hash);
    send_mock.assert_hits(1);
}

#[test]
fn test_rpc_error_response() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/").body_contains("get_tip_block_number");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "jsonrpc": "2.0",
                "error": { "code": -32601, "message": "Method not found" },
                "id": 0
            }));
    });

    let client = CkbRpcClient::new(&server.url("/")).unwrap();
    let err = client.get_tip_block_number().unwrap_err();
    match err {
        RpcError::Rpc(error) => assert_eq!(error.message, "Method not found"),
        err => panic!("unexpected error: {}", err),
    }
    assert_eq!(client.url(), server.url("/"));
}
