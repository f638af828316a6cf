mod common;

use assert_matches::assert_matches;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use medsupply_api::auth::AuthContext;
use medsupply_api::commands::counts::{
    AddRecordCommand, ClearAllCountsCommand, ClearCountCommand, CreateItemWithRecordCommand,
    DuplicateRecordCommand, RemoveRecordCommand, SetRecordQuantityCommand, StartCountCommand,
};
use medsupply_api::commands::Command;
use medsupply_api::entities::locations::LocationType;
use medsupply_api::entities::{audit_events, inventory_counts, inventory_records, items};
use medsupply_api::errors::ServiceError;

#[tokio::test]
async fn first_count_copies_nothing() {
    let db = common::setup_db().await;
    let user = common::seed_user(&db, "alice", false).await;
    let location = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;

    let result = StartCountCommand {
        location_id: location.id,
        notes: None,
    }
    .execute(db.clone(), &AuthContext::user(user.id))
    .await
    .unwrap();

    assert_eq!(result.records_copied, 0);
    assert_eq!(result.count.location_id, location.id);
}

#[tokio::test]
async fn starting_a_new_count_carries_forward_prior_records() {
    let db = common::setup_db().await;
    let user = common::seed_user(&db, "alice", false).await;
    let location = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    let gauze = common::seed_item(&db, "Gauze", Some("GZ-100"), 0).await;
    let tape = common::seed_item(&db, "Tape", Some("TP-200"), 0).await;
    let ctx = AuthContext::user(user.id);

    StartCountCommand {
        location_id: location.id,
        notes: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap();
    let source_a = common::seed_record(&db, gauze.id, location.id, 7, None).await;
    let source_b = common::seed_record(&db, tape.id, location.id, 3, None).await;

    let result = StartCountCommand {
        location_id: location.id,
        notes: Some("monthly".to_string()),
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap();

    assert_eq!(result.records_copied, 2);
    let active = inventory_records::Entity::find_active().all(&*db).await.unwrap();
    assert_eq!(active.len(), 4);

    // Sources are untouched; copies have fresh ids but identical tuples.
    let source_a_now = inventory_records::Entity::find_by_id(source_a.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(source_a_now, source_a);
    let copies: Vec<_> = active
        .iter()
        .filter(|r| r.id != source_a.id && r.id != source_b.id)
        .collect();
    assert_eq!(copies.len(), 2);
    assert!(copies
        .iter()
        .any(|r| r.item_id == gauze.id && r.quantity == 7 && r.expiration_date.is_none()));
    assert!(copies.iter().any(|r| r.item_id == tape.id && r.quantity == 3));

    let copy_events = audit_events::Entity::find()
        .filter(audit_events::Column::Action.eq("COPY"))
        .all(&*db)
        .await
        .unwrap();
    assert_eq!(copy_events.len(), 1);
    let payload: serde_json::Value =
        serde_json::from_str(copy_events[0].new_values.as_deref().unwrap()).unwrap();
    assert_eq!(payload["records_copied"], 2);
}

#[tokio::test]
async fn quantity_zero_soft_deletes_and_leaves_audit_trail() {
    let db = common::setup_db().await;
    let user = common::seed_user(&db, "alice", false).await;
    let location = common::seed_location(&db, "Medic 1", LocationType::Ambulance).await;
    let item = common::seed_item(&db, "Gauze", None, 0).await;
    let ctx = AuthContext::user(user.id);

    let count = StartCountCommand {
        location_id: location.id,
        notes: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap()
    .count;
    let record = common::seed_record(&db, item.id, location.id, 9, None).await;

    let result = SetRecordQuantityCommand {
        count_id: count.id,
        record_id: record.id,
        quantity: 0,
        expiration_date: None,
        lot_number: None,
        section: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap();
    assert!(result.is_none());

    let active = inventory_records::Entity::find_active().all(&*db).await.unwrap();
    assert!(active.is_empty());

    // Prior quantity survives in the audit trail.
    let delete_event = audit_events::Entity::find()
        .filter(audit_events::Column::Action.eq("DELETE"))
        .filter(audit_events::Column::RecordId.eq(record.id))
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    let old: serde_json::Value =
        serde_json::from_str(delete_event.old_values.as_deref().unwrap()).unwrap();
    assert_eq!(old["quantity"], 9);
    assert!(delete_event.new_values.is_none());
}

#[tokio::test]
async fn set_quantity_rejects_record_from_another_location() {
    let db = common::setup_db().await;
    let user = common::seed_user(&db, "alice", false).await;
    let here = common::seed_location(&db, "Medic 1", LocationType::Ambulance).await;
    let elsewhere = common::seed_location(&db, "Medic 2", LocationType::Ambulance).await;
    let item = common::seed_item(&db, "Gauze", None, 0).await;
    let ctx = AuthContext::user(user.id);

    let count = StartCountCommand {
        location_id: here.id,
        notes: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap()
    .count;
    let foreign = common::seed_record(&db, item.id, elsewhere.id, 5, None).await;

    let err = SetRecordQuantityCommand {
        count_id: count.id,
        record_id: foreign.id,
        quantity: 1,
        expiration_date: None,
        lot_number: None,
        section: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
}

#[tokio::test]
async fn add_record_merges_identical_tuples() {
    let db = common::setup_db().await;
    let user = common::seed_user(&db, "alice", false).await;
    let location = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    let item = common::seed_item(&db, "Gauze", None, 0).await;
    let ctx = AuthContext::user(user.id);

    let count = StartCountCommand {
        location_id: location.id,
        notes: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap()
    .count;

    for quantity in [3, 5] {
        AddRecordCommand {
            count_id: count.id,
            item_id: item.id,
            quantity,
            expiration_date: None,
            lot_number: Some("LOT7".to_string()),
            section: None,
        }
        .execute(db.clone(), &ctx)
        .await
        .unwrap();
    }

    let active = inventory_records::Entity::find_active().all(&*db).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].quantity, 8);

    // A different lot is a different tuple and gets its own line.
    AddRecordCommand {
        count_id: count.id,
        item_id: item.id,
        quantity: 2,
        expiration_date: None,
        lot_number: Some("LOT8".to_string()),
        section: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap();
    let active = inventory_records::Entity::find_active().all(&*db).await.unwrap();
    assert_eq!(active.len(), 2);
}

#[tokio::test]
async fn add_record_requires_positive_quantity() {
    let db = common::setup_db().await;
    let user = common::seed_user(&db, "alice", false).await;
    let location = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    let item = common::seed_item(&db, "Gauze", None, 0).await;
    let ctx = AuthContext::user(user.id);

    let count = StartCountCommand {
        location_id: location.id,
        notes: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap()
    .count;

    let err = AddRecordCommand {
        count_id: count.id,
        item_id: item.id,
        quantity: 0,
        expiration_date: None,
        lot_number: None,
        section: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn add_record_merge_overflow_is_a_validation_error() {
    let db = common::setup_db().await;
    let user = common::seed_user(&db, "alice", false).await;
    let location = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    let item = common::seed_item(&db, "Gauze", None, 0).await;
    let ctx = AuthContext::user(user.id);

    let count = StartCountCommand {
        location_id: location.id,
        notes: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap()
    .count;
    let record = common::seed_record(&db, item.id, location.id, i32::MAX, None).await;

    let err = AddRecordCommand {
        count_id: count.id,
        item_id: item.id,
        quantity: 1,
        expiration_date: None,
        lot_number: None,
        section: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));

    let unchanged = inventory_records::Entity::find_by_id(record.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.quantity, i32::MAX);
}

#[tokio::test]
async fn duplicate_record_copies_tuple_onto_target_item() {
    let db = common::setup_db().await;
    let user = common::seed_user(&db, "alice", false).await;
    let location = common::seed_location(&db, "Medic 1", LocationType::Ambulance).await;
    let gauze = common::seed_item(&db, "Gauze", None, 0).await;
    let tape = common::seed_item(&db, "Tape", None, 0).await;
    let ctx = AuthContext::user(user.id);

    let count = StartCountCommand {
        location_id: location.id,
        notes: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap()
    .count;
    let expiry = chrono::NaiveDate::from_ymd_opt(2027, 3, 1);
    let source = common::seed_record(&db, gauze.id, location.id, 6, expiry).await;

    let copy = DuplicateRecordCommand {
        count_id: count.id,
        source_record_id: source.id,
        target_item_id: tape.id,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap();

    assert_eq!(copy.item_id, tape.id);
    assert_eq!(copy.location_id, location.id);
    assert_eq!(copy.quantity, 6);
    assert_eq!(copy.expiration_date, expiry);
    // Both lines stay active; the source keeps its own item.
    let active = inventory_records::Entity::find_active().all(&*db).await.unwrap();
    assert_eq!(active.len(), 2);
    assert!(active.iter().any(|r| r.id == source.id && r.item_id == gauze.id));
}

#[tokio::test]
async fn duplicate_record_rejects_source_from_another_location() {
    let db = common::setup_db().await;
    let user = common::seed_user(&db, "alice", false).await;
    let here = common::seed_location(&db, "Medic 1", LocationType::Ambulance).await;
    let elsewhere = common::seed_location(&db, "Medic 2", LocationType::Ambulance).await;
    let item = common::seed_item(&db, "Gauze", None, 0).await;
    let ctx = AuthContext::user(user.id);

    let count = StartCountCommand {
        location_id: here.id,
        notes: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap()
    .count;
    let foreign = common::seed_record(&db, item.id, elsewhere.id, 5, None).await;

    let err = DuplicateRecordCommand {
        count_id: count.id,
        source_record_id: foreign.id,
        target_item_id: item.id,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
    assert_eq!(
        inventory_records::Entity::find_active().count(&*db).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn create_item_with_record_inserts_both_in_one_step() {
    let db = common::setup_db().await;
    let user = common::seed_user(&db, "alice", false).await;
    let location = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    let ctx = AuthContext::user(user.id);

    let count = StartCountCommand {
        location_id: location.id,
        notes: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap()
    .count;

    let result = CreateItemWithRecordCommand {
        count_id: count.id,
        name: "Burn Dressing".to_string(),
        item_number: Some("BD-400".to_string()),
        manufacturer: Some("Medline".to_string()),
        is_required: false,
        required_quantity: 0,
        minimum_threshold: 2,
        quantity: 4,
        expiration_date: None,
        lot_number: None,
        section: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap();

    assert_eq!(result.item.item_number.as_deref(), Some("BD-400"));
    assert_eq!(result.record.item_id, result.item.id);
    assert_eq!(result.record.location_id, location.id);
    assert_eq!(result.record.quantity, 4);

    // One CREATE event per inserted row.
    let item_creates = audit_events::Entity::find()
        .filter(audit_events::Column::Action.eq("CREATE"))
        .filter(audit_events::Column::TableName.eq("items"))
        .count(&*db)
        .await
        .unwrap();
    assert_eq!(item_creates, 1);
    let record_creates = audit_events::Entity::find()
        .filter(audit_events::Column::Action.eq("CREATE"))
        .filter(audit_events::Column::TableName.eq("inventory_records"))
        .count(&*db)
        .await
        .unwrap();
    assert_eq!(record_creates, 1);
}

#[tokio::test]
async fn create_item_with_record_conflicts_on_taken_number() {
    let db = common::setup_db().await;
    let user = common::seed_user(&db, "alice", false).await;
    let location = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    common::seed_item(&db, "Gauze", Some("GZ-100"), 0).await;
    let ctx = AuthContext::user(user.id);

    let count = StartCountCommand {
        location_id: location.id,
        notes: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap()
    .count;

    let err = CreateItemWithRecordCommand {
        count_id: count.id,
        name: "Gauze Roll".to_string(),
        item_number: Some("GZ-100".to_string()),
        manufacturer: None,
        is_required: false,
        required_quantity: 0,
        minimum_threshold: 0,
        quantity: 1,
        expiration_date: None,
        lot_number: None,
        section: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
    assert_eq!(items::Entity::find().count(&*db).await.unwrap(), 1);
    assert_eq!(
        inventory_records::Entity::find().count(&*db).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn clear_count_clears_only_its_location() {
    let db = common::setup_db().await;
    let admin = common::seed_user(&db, "boss", true).await;
    let ctx = AuthContext::admin(admin.id);

    let item = common::seed_item(&db, "Gauze", None, 0).await;
    let room_a = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    let room_b = common::seed_location(&db, "Supply Room B", LocationType::SupplyRoom).await;
    let count_a = StartCountCommand {
        location_id: room_a.id,
        notes: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap()
    .count;
    StartCountCommand {
        location_id: room_b.id,
        notes: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap();
    for _ in 0..3 {
        common::seed_record(&db, item.id, room_a.id, 1, None).await;
    }
    for _ in 0..2 {
        common::seed_record(&db, item.id, room_b.id, 1, None).await;
    }

    let user = common::seed_user(&db, "alice", false).await;
    let err = ClearCountCommand { count_id: count_a.id }
        .execute(db.clone(), &AuthContext::user(user.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));

    let cleared = ClearCountCommand { count_id: count_a.id }
        .execute(db.clone(), &ctx)
        .await
        .unwrap();
    assert_eq!(cleared, 3);

    // The other location's count and records are untouched.
    assert_eq!(
        inventory_counts::Entity::find_active().count(&*db).await.unwrap(),
        1
    );
    let remaining = inventory_records::Entity::find_active().all(&*db).await.unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|r| r.location_id == room_b.id));

    // One audit event for the whole sweep, carrying the cleared total.
    let delete_events = audit_events::Entity::find()
        .filter(audit_events::Column::Action.eq("DELETE"))
        .filter(audit_events::Column::TableName.eq("inventory_counts"))
        .all(&*db)
        .await
        .unwrap();
    assert_eq!(delete_events.len(), 1);
    let payload: serde_json::Value =
        serde_json::from_str(delete_events[0].old_values.as_deref().unwrap()).unwrap();
    assert_eq!(payload["records_cleared"], 3);
}

#[tokio::test]
async fn remove_record_not_found_when_nothing_matches() {
    let db = common::setup_db().await;
    let user = common::seed_user(&db, "alice", false).await;
    let location = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    let item = common::seed_item(&db, "Gauze", None, 0).await;
    let ctx = AuthContext::user(user.id);

    let count = StartCountCommand {
        location_id: location.id,
        notes: None,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap()
    .count;

    let err = RemoveRecordCommand {
        count_id: count.id,
        item_id: item.id,
    }
    .execute(db.clone(), &ctx)
    .await
    .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn clear_all_counts_is_one_bulk_audit_event() {
    let db = common::setup_db().await;
    let admin = common::seed_user(&db, "boss", true).await;
    let ctx = AuthContext::admin(admin.id);

    let item = common::seed_item(&db, "Gauze", None, 0).await;
    let room_a = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    let room_b = common::seed_location(&db, "Supply Room B", LocationType::SupplyRoom).await;
    let medic = common::seed_location(&db, "Medic 1", LocationType::Ambulance).await;
    for location in [&room_a, &room_b, &medic] {
        StartCountCommand {
            location_id: location.id,
            notes: None,
        }
        .execute(db.clone(), &ctx)
        .await
        .unwrap();
    }
    for _ in 0..4 {
        common::seed_record(&db, item.id, room_a.id, 1, None).await;
    }
    for _ in 0..2 {
        common::seed_record(&db, item.id, room_b.id, 1, None).await;
    }

    let deletes_before = audit_events::Entity::find()
        .filter(audit_events::Column::Action.eq("DELETE"))
        .count(&*db)
        .await
        .unwrap();

    let result = ClearAllCountsCommand::default()
        .execute(db.clone(), &ctx)
        .await
        .unwrap();
    assert_eq!(result.counts_cleared, 3);
    assert_eq!(result.records_cleared, 6);

    assert_eq!(
        inventory_counts::Entity::find_active().count(&*db).await.unwrap(),
        0
    );
    assert_eq!(
        inventory_records::Entity::find_active().count(&*db).await.unwrap(),
        0
    );

    // Exactly one bulk event, no per-row logs.
    let clear_events = audit_events::Entity::find()
        .filter(audit_events::Column::Action.eq("CLEAR_ALL"))
        .all(&*db)
        .await
        .unwrap();
    assert_eq!(clear_events.len(), 1);
    assert!(clear_events[0].record_id.is_none());
    let deletes_after = audit_events::Entity::find()
        .filter(audit_events::Column::Action.eq("DELETE"))
        .count(&*db)
        .await
        .unwrap();
    assert_eq!(deletes_after, deletes_before);
}

#[tokio::test]
async fn clear_all_counts_requires_admin() {
    let db = common::setup_db().await;
    let user = common::seed_user(&db, "alice", false).await;

    let err = ClearAllCountsCommand::default()
        .execute(db.clone(), &AuthContext::user(user.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Forbidden(_));
}
