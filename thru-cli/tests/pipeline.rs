//! End-to-end pipeline tests for the `thru` CLI: JSON in, plan and
//! persisted order out.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use rstest::{fixture, rstest};
use tempfile::TempDir;
use thru_cli::{Cli, CliError, execute};
use thru_core::AggregateError;

const SHOPS_JSON: &str = r#"[
  {
    "id": "grocer",
    "name": "Midway Grocer",
    "shop_type": "grocery",
    "location": { "x": 77.625, "y": 12.925 },
    "address": "12 Midway Road",
    "active": true,
    "categories": ["grocery", "food", "household"]
  },
  {
    "id": "chemist",
    "name": "Route Chemist",
    "shop_type": "pharmacy",
    "location": { "x": 77.63, "y": 12.925 },
    "address": "14 Midway Road",
    "active": true,
    "categories": ["medical", "pharmacy", "health"]
  },
  {
    "id": "faraway",
    "name": "Faraway Grocer",
    "shop_type": "grocery",
    "location": { "x": 77.90, "y": 13.20 },
    "address": "99 Distant Lane",
    "active": true,
    "categories": ["grocery"]
  }
]"#;

const REQUEST_JSON: &str = r#"{
  "origin": { "location": { "x": 77.60, "y": 12.90 }, "address": "Home" },
  "destination": { "location": { "x": 77.65, "y": 12.95 }, "address": "Office" },
  "max_detour_km": 2.0,
  "pinned": [
    { "vendor_id": "grocer", "items": [{ "item_id": "bread", "quantity": 1 }] }
  ],
  "global": [
    { "item_id": "onion", "quantity": 2, "category": "grocery" },
    { "item_id": "bandage", "quantity": 1, "category": "medical" },
    { "item_id": "leash", "quantity": 1, "category": "pets" }
  ],
  "items": [
    { "id": "bread", "name": "Whole Wheat Bread", "category": "grocery", "price": 45.0 },
    { "id": "onion", "name": "Onion", "category": "grocery", "price": 30.0 },
    { "id": "bandage", "name": "Bandage", "category": "medical", "price": 90.0 },
    { "id": "leash", "name": "Dog Leash", "category": "pets", "price": 250.0 }
  ],
  "fees": { "platform_fee": 10.0, "gateway_fee": 5.0 },
  "seed": 7,
  "order_id": "ORD-TEST"
}"#;

struct Inputs {
    _dir: TempDir,
    shops: PathBuf,
    request: PathBuf,
    root: PathBuf,
}

#[fixture]
fn inputs() -> Inputs {
    let dir = TempDir::new().expect("create temp dir");
    let shops = dir.path().join("shops.json");
    let request = dir.path().join("request.json");
    fs::write(&shops, SHOPS_JSON).expect("write shops fixture");
    fs::write(&request, REQUEST_JSON).expect("write request fixture");
    let root = dir.path().to_path_buf();
    Inputs {
        _dir: dir,
        shops,
        request,
        root,
    }
}

fn cli(shops: &Path, request: &Path, orders_db: Option<PathBuf>) -> Cli {
    Cli {
        shops: shops.to_path_buf(),
        request: request.to_path_buf(),
        output: None,
        orders_db,
    }
}

#[rstest]
fn pipeline_plans_and_prices_the_whole_trip(inputs: Inputs) {
    let rendered = execute(&cli(&inputs.shops, &inputs.request, None)).expect("pipeline runs");
    let output: serde_json::Value = serde_json::from_str(&rendered).expect("valid output JSON");

    assert_eq!(output["geometry"], "fallback");
    assert_eq!(output["candidate_count"], 2);

    let entries = output["plan"]["entries"]
        .as_array()
        .expect("plan entries array");
    assert_eq!(entries.len(), 3);

    let order = &output["order"];
    assert_eq!(order["order_id"], "ORD-TEST");
    assert_eq!(order["status"], "new");
    let portions = order["portions"].as_array().expect("portions array");
    assert_eq!(portions.len(), 3);
    // 45 + 60 grocer, 90 chemist, 250 synthetic, plus 15 in fees.
    let grand_total = order["grand_total"].as_f64().expect("grand total");
    assert!((grand_total - 460.0).abs() < 1e-6);
}

#[rstest]
fn pinned_vendor_consolidates_the_grocery_items(inputs: Inputs) {
    let rendered = execute(&cli(&inputs.shops, &inputs.request, None)).expect("pipeline runs");
    let output: serde_json::Value = serde_json::from_str(&rendered).expect("valid output JSON");

    let entries = output["plan"]["entries"]
        .as_array()
        .expect("plan entries array");
    let grocer = entries
        .iter()
        .find(|entry| entry["vendor"]["candidate"]["shop"]["id"] == "grocer")
        .expect("grocer entry present");
    let items = grocer["items"].as_array().expect("grocer items");
    assert_eq!(items.len(), 2);

    let synthetic = entries
        .iter()
        .find(|entry| entry["vendor"]["synthetic"].is_object())
        .expect("synthetic entry present");
    assert_eq!(synthetic["vendor"]["synthetic"]["category"], "pets");
    let synthetic_id = synthetic["vendor"]["synthetic"]["id"]
        .as_str()
        .expect("synthetic id");
    assert!(synthetic_id.starts_with("synthetic-pets-"));
}

#[rstest]
fn identical_runs_mint_identical_synthetic_ids(inputs: Inputs) {
    let first = execute(&cli(&inputs.shops, &inputs.request, None)).expect("first run");
    let second = execute(&cli(&inputs.shops, &inputs.request, None)).expect("second run");

    let plan_of = |rendered: &str| -> serde_json::Value {
        let output: serde_json::Value = serde_json::from_str(rendered).expect("valid output JSON");
        output["plan"].clone()
    };
    assert_eq!(plan_of(&first), plan_of(&second));
}

#[rstest]
fn sqlite_store_rejects_a_replayed_order_id(inputs: Inputs) {
    let db = inputs.root.join("orders.db");
    execute(&cli(&inputs.shops, &inputs.request, Some(db.clone()))).expect("first run persists");

    let error = execute(&cli(&inputs.shops, &inputs.request, Some(db)))
        .expect_err("replaying the same order id must fail");
    assert!(matches!(
        error,
        CliError::Aggregate(AggregateError::Store(_))
    ));
}

#[rstest]
fn missing_input_files_are_reported_with_their_path(inputs: Inputs) {
    let missing = inputs.root.join("nope.json");
    let error = execute(&cli(&missing, &inputs.request, None)).expect_err("missing shops file");
    assert!(matches!(error, CliError::OpenShops { .. }));
}

#[rstest]
fn arguments_parse_from_the_command_line() {
    let cli = Cli::try_parse_from([
        "thru",
        "--shops",
        "shops.json",
        "--request",
        "trip.json",
        "--output",
        "plan.json",
    ])
    .expect("arguments parse");
    assert_eq!(cli.shops, PathBuf::from("shops.json"));
    assert_eq!(cli.request, PathBuf::from("trip.json"));
    assert_eq!(cli.output, Some(PathBuf::from("plan.json")));
    assert_eq!(cli.orders_db, None);
}
