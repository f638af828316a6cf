mod common;

use chrono::{Duration, Utc};

use medsupply_api::auth::AuthContext;
use medsupply_api::commands::counts::StartCountCommand;
use medsupply_api::commands::Command;
use medsupply_api::entities::locations::LocationType;
use medsupply_api::queries::report_queries::{
    ExpirationReportQuery, InventorySummaryQuery, StatusFilter,
};
use medsupply_api::queries::status_queries::RecordStatus;
use medsupply_api::queries::Query;

#[tokio::test]
async fn expiration_report_buckets_are_exclusive() {
    let db = common::setup_db().await;
    let today = Utc::now().date_naive();
    let room = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    let item = common::seed_item(&db, "Gauze", None, 0).await;

    common::seed_record(&db, item.id, room.id, 5, Some(today - Duration::days(1))).await;
    common::seed_record(&db, item.id, room.id, 5, Some(today)).await;
    common::seed_record(&db, item.id, room.id, 5, Some(today + Duration::days(30))).await;
    common::seed_record(&db, item.id, room.id, 5, Some(today + Duration::days(31))).await;
    common::seed_record(&db, item.id, room.id, 5, Some(today + Duration::days(75))).await;
    common::seed_record(&db, item.id, room.id, 5, Some(today + Duration::days(180))).await;
    common::seed_record(&db, item.id, room.id, 5, Some(today + Duration::days(181))).await;
    common::seed_record(&db, item.id, room.id, 5, None).await;

    let report = ExpirationReportQuery::default().execute(&db).await.unwrap();
    assert_eq!(report.expired.len(), 1);
    assert_eq!(report.within_30_days.len(), 2);
    assert_eq!(report.within_31_to_60_days.len(), 1);
    assert_eq!(report.within_61_to_90_days.len(), 1);
    assert_eq!(report.within_91_to_180_days.len(), 1);
}

#[tokio::test]
async fn summary_sorts_by_location_then_item() {
    let db = common::setup_db().await;
    let zulu = common::seed_location(&db, "Zulu Room", LocationType::SupplyRoom).await;
    let alpha = common::seed_location(&db, "Alpha Room", LocationType::SupplyRoom).await;
    let tape = common::seed_item(&db, "Tape", None, 0).await;
    let gauze = common::seed_item(&db, "Gauze", None, 0).await;

    common::seed_record(&db, tape.id, zulu.id, 5, None).await;
    common::seed_record(&db, tape.id, alpha.id, 5, None).await;
    common::seed_record(&db, gauze.id, alpha.id, 5, None).await;

    let rows = InventorySummaryQuery::default().execute(&db).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].location_name, "Alpha Room");
    assert_eq!(rows[0].item_name, "Gauze");
    assert_eq!(rows[1].location_name, "Alpha Room");
    assert_eq!(rows[1].item_name, "Tape");
    assert_eq!(rows[2].location_name, "Zulu Room");
}

#[tokio::test]
async fn summary_filters_compose() {
    let db = common::setup_db().await;
    let today = Utc::now().date_naive();
    let room = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    let medic = common::seed_location(&db, "Medic 1", LocationType::Ambulance).await;
    let gauze = common::seed_item(&db, "Gauze", None, 0).await;
    let tape = common::seed_item(&db, "Tape", None, 0).await;

    common::seed_record(&db, gauze.id, room.id, 10, Some(today - Duration::days(1))).await;
    common::seed_record(&db, gauze.id, medic.id, 10, None).await;
    common::seed_record(&db, tape.id, room.id, 10, None).await;

    let by_location = InventorySummaryQuery {
        location_id: Some(room.id),
        ..Default::default()
    }
    .execute(&db)
    .await
    .unwrap();
    assert_eq!(by_location.len(), 2);

    let expired_in_room = InventorySummaryQuery {
        location_id: Some(room.id),
        status: Some(StatusFilter::Expired),
        ..Default::default()
    }
    .execute(&db)
    .await
    .unwrap();
    assert_eq!(expired_in_room.len(), 1);
    assert_eq!(expired_in_room[0].status, RecordStatus::Expired);
    assert_eq!(expired_in_room[0].item_name, "Gauze");

    let search = InventorySummaryQuery {
        q: Some("tape".to_string()),
        ..Default::default()
    }
    .execute(&db)
    .await
    .unwrap();
    assert_eq!(search.len(), 1);
    assert_eq!(search[0].item_name, "Tape");
}

#[tokio::test]
async fn summary_exposes_latest_count_date_per_location() {
    let db = common::setup_db().await;
    let user = common::seed_user(&db, "alice", false).await;
    let room = common::seed_location(&db, "Supply Room A", LocationType::SupplyRoom).await;
    let gauze = common::seed_item(&db, "Gauze", None, 0).await;
    common::seed_record(&db, gauze.id, room.id, 5, None).await;

    let rows = InventorySummaryQuery::default().execute(&db).await.unwrap();
    assert_eq!(rows[0].last_inventory_date, None);

    StartCountCommand {
        location_id: room.id,
        notes: None,
    }
    .execute(db.clone(), &AuthContext::user(user.id))
    .await
    .unwrap();

    let rows = InventorySummaryQuery::default().execute(&db).await.unwrap();
    let today = Utc::now().date_naive();
    assert!(rows.iter().all(|r| r.last_inventory_date == Some(today)));
}
