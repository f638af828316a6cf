mod common;

use assert_matches::assert_matches;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use medsupply_api::auth::AuthContext;
use medsupply_api::entities::locations::LocationType;
use medsupply_api::entities::{audit_events, inventory_records, items};
use medsupply_api::errors::ServiceError;
use medsupply_api::queries::report_queries::InventorySummaryQuery;
use medsupply_api::queries::Query;
use medsupply_api::services::exports::render_inventory_csv;
use medsupply_api::services::imports::{
    self, DuplicateDecision, ParsedUpload,
};
use std::collections::HashMap;

const ITEM_HEADER: &str =
    "Item Name,Item Number,Manufacturer,Required by State Standards,Required Quantity,Minimum Threshold";

fn parse_items(content: &str) -> Vec<imports::ItemDefinitionRow> {
    match imports::parse_upload("items.csv", content).unwrap() {
        ParsedUpload::Items(rows) => rows,
        other => panic!("unexpected schema: {:?}", other),
    }
}

fn parse_counts(content: &str) -> Vec<imports::CountRow> {
    match imports::parse_upload("counts.csv", content).unwrap() {
        ParsedUpload::Counts(rows) => rows,
        other => panic!("unexpected schema: {:?}", other),
    }
}

#[tokio::test]
async fn duplicate_numbers_are_staged_not_applied() {
    let db = common::setup_db().await;
    common::seed_item(&db, "Gauze", Some("GZ-100"), 0).await;

    let content = format!("{}\nGauze Roll,GZ-100,Medline,No,0,0\nTape,TP-200,3M,No,0,0\n", ITEM_HEADER);
    let rows = parse_items(&content);
    let preview = imports::preview_item_import(&db, rows).await.unwrap();

    assert_eq!(preview.new_items.len(), 1);
    assert_eq!(preview.new_items[0].name, "Tape");
    assert_eq!(preview.duplicates.len(), 1);
    assert_eq!(
        preview.duplicates[0].incoming.item_number.as_deref(),
        Some("GZ-100")
    );
    // Nothing was written during preview.
    assert_eq!(items::Entity::find().count(&*db).await.unwrap(), 1);
}

#[tokio::test]
async fn add_decision_appends_numeric_suffix() {
    let db = common::setup_db().await;
    let ctx = AuthContext::user(common::seed_user(&db, "alice", false).await.id);
    common::seed_item(&db, "Gauze", Some("GZ-100"), 0).await;

    let content = format!("{}\nGauze Roll,GZ-100,Medline,No,0,0\n", ITEM_HEADER);
    let mut decisions = HashMap::new();
    decisions.insert("GZ-100".to_string(), DuplicateDecision::Add);
    let summary = imports::commit_item_import(&db, &ctx, parse_items(&content), &decisions)
        .await
        .unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.replaced, 0);

    let added = items::Entity::find_active_by_number("GZ-100-1")
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(added.name, "Gauze Roll");

    // A second add takes the next free suffix.
    let summary = imports::commit_item_import(&db, &ctx, parse_items(&content), &decisions)
        .await
        .unwrap();
    assert_eq!(summary.created, 1);
    assert!(items::Entity::find_active_by_number("GZ-100-2")
        .one(&*db)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn replace_decision_overwrites_existing_item() {
    let db = common::setup_db().await;
    let ctx = AuthContext::user(common::seed_user(&db, "alice", false).await.id);
    let existing = common::seed_item(&db, "Gauze", Some("GZ-100"), 2).await;

    let content = format!("{}\nGauze Roll,GZ-100,Medline,Yes,10,5\n", ITEM_HEADER);
    let mut decisions = HashMap::new();
    decisions.insert("GZ-100".to_string(), DuplicateDecision::Replace);
    let summary = imports::commit_item_import(&db, &ctx, parse_items(&content), &decisions)
        .await
        .unwrap();
    assert_eq!(summary.replaced, 1);

    let updated = items::Entity::find_by_id(existing.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Gauze Roll");
    assert_eq!(updated.manufacturer.as_deref(), Some("Medline"));
    assert!(updated.is_required);
    assert_eq!(updated.minimum_threshold, 5);
    assert_eq!(items::Entity::find().count(&*db).await.unwrap(), 1);
}

#[tokio::test]
async fn undecided_duplicate_rolls_back_the_whole_batch() {
    let db = common::setup_db().await;
    let ctx = AuthContext::user(common::seed_user(&db, "alice", false).await.id);
    common::seed_item(&db, "Gauze", Some("GZ-100"), 0).await;

    // The Tape row would be fine on its own, but the batch is atomic.
    let content = format!("{}\nTape,TP-200,3M,No,0,0\nGauze Roll,GZ-100,Medline,No,0,0\n", ITEM_HEADER);
    let err = imports::commit_item_import(&db, &ctx, parse_items(&content), &HashMap::new())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ImportError(_));
    assert_eq!(items::Entity::find().count(&*db).await.unwrap(), 1);
}

#[tokio::test]
async fn count_import_fails_closed_on_unknown_references() {
    let db = common::setup_db().await;
    let ctx = AuthContext::user(common::seed_user(&db, "alice", false).await.id);
    let room = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    common::seed_item(&db, "Gauze", Some("GZ-100"), 0).await;

    let content = format!(
        "Location ID,Item Number,Quantity,Expiration Date,Lot Number\n{},GZ-100,4,,\n{},MISSING,1,,\n",
        room.id, room.id
    );
    let err = imports::commit_count_import(&db, &ctx, parse_counts(&content))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ImportError(msg) if msg.contains("MISSING"));
    assert_eq!(
        inventory_records::Entity::find().count(&*db).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn zero_quantity_row_soft_deletes_the_matching_line() {
    let db = common::setup_db().await;
    let ctx = AuthContext::user(common::seed_user(&db, "alice", false).await.id);
    let room = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    let gauze = common::seed_item(&db, "Gauze", Some("GZ-100"), 0).await;
    common::seed_item(&db, "Tape", Some("TP-200"), 0).await;
    let record = common::seed_record(&db, gauze.id, room.id, 5, None).await;

    // Gauze zeroes out an existing line; Tape has no line, so its zero
    // row writes nothing.
    let content = format!(
        "Location ID,Item Number,Quantity,Expiration Date,Lot Number\n{},GZ-100,0,,\n{},TP-200,0,,\n",
        room.id, room.id
    );
    let summary = imports::commit_count_import(&db, &ctx, parse_counts(&content))
        .await
        .unwrap();
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 0);

    assert_eq!(
        inventory_records::Entity::find_active().count(&*db).await.unwrap(),
        0
    );
    let gone = inventory_records::Entity::find_by_id(record.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert!(!gone.is_active);
    assert!(gone.deleted_at.is_some());
    // No second record was ever written for the Tape row.
    assert_eq!(
        inventory_records::Entity::find().count(&*db).await.unwrap(),
        1
    );

    // Same trail a zeroed count edit leaves.
    let delete_event = audit_events::Entity::find()
        .filter(audit_events::Column::Action.eq("DELETE"))
        .filter(audit_events::Column::RecordId.eq(record.id))
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    let old: serde_json::Value =
        serde_json::from_str(delete_event.old_values.as_deref().unwrap()).unwrap();
    assert_eq!(old["quantity"], 5);
    assert!(delete_event.new_values.is_none());
}

#[tokio::test]
async fn negative_quantity_rows_never_reach_the_store() {
    let db = common::setup_db().await;
    common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    common::seed_item(&db, "Tape", Some("TP-200"), 0).await;

    let err = imports::parse_upload(
        "counts.csv",
        "Location ID,Item Number,Quantity,Expiration Date,Lot Number\n1,TP-200,-3,,\n",
    )
    .unwrap_err();
    assert_matches!(err, ServiceError::ImportError(msg) if msg.contains("Row 2") && msg.contains("negative"));
    assert_eq!(
        inventory_records::Entity::find().count(&*db).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn export_reimport_round_trip_preserves_quantities() {
    let db = common::setup_db().await;
    let ctx = AuthContext::user(common::seed_user(&db, "alice", false).await.id);
    let room = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    let gauze = common::seed_item(&db, "Gauze", Some("GZ-100"), 0).await;
    let tape = common::seed_item(&db, "Tape", Some("TP-200"), 0).await;
    common::seed_record(&db, gauze.id, room.id, 7, None).await;
    common::seed_record(&db, tape.id, room.id, 12, None).await;

    let rows = InventorySummaryQuery::default().execute(&db).await.unwrap();
    let csv = render_inventory_csv(&rows).unwrap();
    assert!(csv.starts_with("Location,Section,Item Name,Quantity"));

    // Rebuild a count upload from the exported rows using the item numbers
    // and location ids the summary carries.
    let mut upload = String::from("Location ID,Item Number,Quantity,Expiration Date,Lot Number\n");
    for row in &rows {
        upload.push_str(&format!(
            "{},{},{},{},{}\n",
            row.location_id,
            row.item_number.as_deref().unwrap(),
            row.quantity,
            row.expiration_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "No Expiry".to_string()),
            row.lot_number.as_deref().unwrap_or("N/A"),
        ));
    }

    let summary = imports::commit_count_import(&db, &ctx, parse_counts(&upload))
        .await
        .unwrap();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 2);

    let after = InventorySummaryQuery::default().execute(&db).await.unwrap();
    assert_eq!(after.len(), 2);
    let quantities: Vec<_> = after.iter().map(|r| (r.item_name.clone(), r.quantity)).collect();
    assert_eq!(
        quantities,
        vec![("Gauze".to_string(), 7), ("Tape".to_string(), 12)]
    );
}
