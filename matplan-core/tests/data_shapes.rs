use std::collections::BTreeMap;

use matplan_core::{
    CalcOptions, Catalog, FarmingDataset, InventoryLedger, ProgressionTarget, SkillTrack, lookup,
    recompute,
};
use serde_json::{Value, json};

const CATALOG_JSON: &str = include_str!("../../assets/data/catalog.json");
const FARMING_JSON: &str = include_str!("../../assets/data/farming.json");
const INVENTORY_JSON: &str = include_str!("../../assets/data/inventory.json");

#[test]
fn fixture_files_parse() {
    let catalog = Catalog::from_json(CATALOG_JSON).unwrap();
    assert_eq!(catalog.entities().len(), 2);
    assert_eq!(catalog.items().len(), 12);

    let dataset = FarmingDataset::from_json(FARMING_JSON).unwrap();
    assert_eq!(dataset.0.len(), 5);

    let snapshot: BTreeMap<String, u64> = serde_json::from_str(INVENTORY_JSON).unwrap();
    assert_eq!(snapshot["qp"], 25_000_000);
}

#[test]
fn plan_serializes_with_composite_source_ids() {
    let catalog = Catalog::from_json(CATALOG_JSON).unwrap();
    let knight = catalog.entity(100_100).unwrap();
    let target = ProgressionTarget {
        current_level: 1,
        target_level: 1,
        current_ascension: 1,
        target_ascension: 2,
        skills: [
            SkillTrack::new(3, 4),
            SkillTrack::new(1, 1),
            SkillTrack::new(1, 1),
        ],
    };
    let options = CalcOptions {
        include_currency: false,
    };
    let mut ledger = InventoryLedger::new();
    let plan = recompute(&target, knight, &catalog, &mut ledger, options).unwrap();

    let value = serde_json::to_value(&plan).unwrap();
    let materials = value["materials"].as_array().unwrap();
    let proof = materials
        .iter()
        .find(|m| m["id"] == json!("6503"))
        .expect("proof of hero line");
    assert_eq!(proof["required"], json!(15 + 8));
    assert_eq!(proof["sourceIds"], json!(["ascension-6503", "skill-6503"]));
    assert_eq!(proof["rarityLabel"], json!("bronze"));
}

#[test]
fn ledger_export_is_a_flat_object() {
    let mut ledger = InventoryLedger::new();
    ledger.import_json(INVENTORY_JSON).unwrap();
    let exported: Value = serde_json::from_str(&ledger.export_json().unwrap()).unwrap();
    let object = exported.as_object().unwrap();
    assert!(object.values().all(Value::is_u64));
    assert_eq!(object.len(), 5);
}

#[test]
fn farming_report_tags_status() {
    let dataset = FarmingDataset::from_json(FARMING_JSON).unwrap();
    let matched = serde_json::to_value(lookup("Proof of Hero", 1, &dataset)).unwrap();
    assert_eq!(matched["status"], json!("matched"));
    assert_eq!(matched["tier"], json!("exact"));
    assert_eq!(matched["spots"][0]["runsForOneDrop"], json!({ "runs": 3 }));

    let missing = serde_json::to_value(lookup("Nonexistent", 1, &dataset)).unwrap();
    assert_eq!(missing["status"], json!("not_found"));
    assert_eq!(missing["query"], json!("Nonexistent"));
}
