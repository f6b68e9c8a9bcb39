//! Integration tests for the direct site transaction repository.
//!
//! Skipped when `DATABASE_URL` is not set.

use rust_decimal_macros::dec;
use sea_orm::{Database, DatabaseConnection, EntityTrait};
use uuid::Uuid;

use sitebook_db::entities::sea_orm_active_enums::{TxnNature, TxnSource};
use sitebook_db::entities::sites;
use sitebook_db::repositories::{
    AuditActor, CreateSiteInput, CreateSiteTransactionInput, SiteRepository,
    SiteTransactionFilter, SiteTransactionRepository,
};

async fn connect_or_skip() -> Option<DatabaseConnection> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    };
    Some(
        Database::connect(&url)
            .await
            .expect("Failed to connect to database"),
    )
}

fn actor() -> AuditActor {
    AuditActor {
        user_id: Some("tester".to_string()),
        ip: None,
    }
}

async fn create_test_site(db: &DatabaseConnection) -> Uuid {
    let repo = SiteRepository::new(db.clone());
    repo.create(
        CreateSiteInput {
            name: format!("Txn Site {}", Uuid::new_v4()),
            location: None,
            client_name: None,
        },
        &actor(),
    )
    .await
    .expect("Failed to create test site")
    .id
}

async fn cleanup_site(db: &DatabaseConnection, site_id: Uuid) {
    sites::Entity::delete_by_id(site_id).exec(db).await.ok();
}

fn txn_input(site_id: Uuid, date: &str, nature: TxnNature, amount: rust_decimal::Decimal) -> CreateSiteTransactionInput {
    CreateSiteTransactionInput {
        site_id,
        txn_date: date.parse().unwrap(),
        nature,
        amount,
        title: "Advance from client".to_string(),
        remarks: None,
        meta: None,
    }
}

#[tokio::test]
async fn test_direct_create_is_its_own_source() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let site_id = create_test_site(&db).await;
    let repo = SiteTransactionRepository::new(db.clone());

    let row = repo
        .create(txn_input(site_id, "2024-02-01", TxnNature::Credit, dec!(1000)), &actor())
        .await
        .expect("Failed to create transaction");

    assert_eq!(row.source, TxnSource::Manual);
    assert_eq!(row.source_id, row.id);

    repo.hard_delete(row.id, &actor()).await.unwrap();
    cleanup_site(&db, site_id).await;
}

#[tokio::test]
async fn test_list_filters_by_date_range_and_nature() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let site_id = create_test_site(&db).await;
    let repo = SiteTransactionRepository::new(db.clone());

    let credit = repo
        .create(txn_input(site_id, "2024-02-01", TxnNature::Credit, dec!(1000)), &actor())
        .await
        .unwrap();
    let debit = repo
        .create(txn_input(site_id, "2024-03-01", TxnNature::Debit, dec!(400)), &actor())
        .await
        .unwrap();

    let credits = repo
        .list(SiteTransactionFilter {
            site_id: Some(site_id),
            nature: Some(TxnNature::Credit),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(credits.len(), 1);
    assert_eq!(credits[0].id, credit.id);

    let march = repo
        .list(SiteTransactionFilter {
            site_id: Some(site_id),
            from: Some("2024-02-15".parse().unwrap()),
            to: Some("2024-03-15".parse().unwrap()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(march.len(), 1);
    assert_eq!(march[0].id, debit.id);

    repo.hard_delete(credit.id, &actor()).await.unwrap();
    repo.hard_delete(debit.id, &actor()).await.unwrap();
    cleanup_site(&db, site_id).await;
}

#[tokio::test]
async fn test_soft_delete_hides_row_from_default_list() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let site_id = create_test_site(&db).await;
    let repo = SiteTransactionRepository::new(db.clone());

    let row = repo
        .create(txn_input(site_id, "2024-02-01", TxnNature::Debit, dec!(50)), &actor())
        .await
        .unwrap();

    repo.soft_delete(row.id, &actor()).await.unwrap();

    let visible = repo
        .list(SiteTransactionFilter {
            site_id: Some(site_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(visible.is_empty());

    let with_deleted = repo
        .list(SiteTransactionFilter {
            site_id: Some(site_id),
            include_deleted: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(with_deleted.len(), 1);

    let restored = repo.restore(row.id, &actor()).await.unwrap();
    assert!(!restored.is_deleted);

    repo.hard_delete(row.id, &actor()).await.unwrap();
    cleanup_site(&db, site_id).await;
}

#[tokio::test]
async fn test_received_total_sums_active_credits_only() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let site_id = create_test_site(&db).await;
    let repo = SiteTransactionRepository::new(db.clone());

    let a = repo
        .create(txn_input(site_id, "2024-02-01", TxnNature::Credit, dec!(1000)), &actor())
        .await
        .unwrap();
    let b = repo
        .create(txn_input(site_id, "2024-02-10", TxnNature::Credit, dec!(250)), &actor())
        .await
        .unwrap();
    let debit = repo
        .create(txn_input(site_id, "2024-02-15", TxnNature::Debit, dec!(400)), &actor())
        .await
        .unwrap();

    assert_eq!(repo.received_total_for_site(site_id).await.unwrap(), dec!(1250));

    repo.soft_delete(b.id, &actor()).await.unwrap();
    assert_eq!(repo.received_total_for_site(site_id).await.unwrap(), dec!(1000));

    for id in [a.id, b.id, debit.id] {
        repo.hard_delete(id, &actor()).await.ok();
    }
    cleanup_site(&db, site_id).await;
}
