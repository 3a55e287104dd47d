use rsvp_admin::domain::rsvp::RsvpId;
use rsvp_admin::repository::database::init_database;
use rsvp_admin::repository::group_names::{GroupNameStore, SqliteGroupNameStore};
use rsvp_admin::repository::mock::InMemoryRecordStore;
use rsvp_admin::services::dashboard::DashboardOptions;
use rsvp_admin::services::RsvpDashboard;
use rsvp_admin::test_helpers::family_scenario;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_group_names_survive_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("local").join("groups.db");

    {
        let pool = init_database(&path).await.unwrap();
        let store = SqliteGroupNameStore::new(pool.clone());
        assert!(store.add("Neighbours").await.unwrap());
        assert!(store.add("College").await.unwrap());
        assert!(!store.add("College").await.unwrap());
        pool.close().await;
    }

    let pool = init_database(&path).await.unwrap();
    let store = SqliteGroupNameStore::new(pool);
    assert_eq!(store.list().await.unwrap(), vec!["College", "Neighbours"]);
}

#[tokio::test]
async fn test_dashboard_offers_cached_and_custom_groups() {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("groups.db")).await.unwrap();
    let groups = SqliteGroupNameStore::new(pool);
    groups.add("Work").await.unwrap();

    let dashboard = RsvpDashboard::new(
        Arc::new(InMemoryRecordStore::with_records(family_scenario())),
        Arc::new(groups.clone()),
        DashboardOptions::default(),
    );
    dashboard.load().await.unwrap();
    assert_eq!(dashboard.group_names().await, vec!["Family", "Work"]);

    dashboard.toggle_selection(&RsvpId::new("B"));
    dashboard.bulk_assign_group("Book Club").await.unwrap();

    assert_eq!(groups.list().await.unwrap(), vec!["Book Club", "Work"]);
    assert_eq!(
        dashboard.group_names().await,
        vec!["Book Club", "Family", "Work"]
    );
}
