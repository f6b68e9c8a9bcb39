//! Integration tests for the site expense repository and its transaction
//! mirror.
//!
//! These tests run against a migrated database; they skip themselves when
//! `DATABASE_URL` is not set.

use rust_decimal_macros::dec;
use sea_orm::{Database, DatabaseConnection, EntityTrait};
use uuid::Uuid;

use sitebook_core::{ManualExpense, aggregate_material_expenses, merge_expense_rows};
use sitebook_db::entities::sea_orm_active_enums::{AuditAction, TxnNature, TxnSource};
use sitebook_db::entities::sites;
use sitebook_db::repositories::{
    AuditActor, AuditLogRepository, CreatePurchaseInput, CreateSiteExpenseInput, CreateSiteInput,
    MaterialLedgerRepository, SiteExpenseRepository, SiteRepository, SiteTransactionRepository,
    UpdateSiteExpenseInput,
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
        ip: Some("127.0.0.1".to_string()),
    }
}

async fn create_test_site(db: &DatabaseConnection) -> Uuid {
    let repo = SiteRepository::new(db.clone());
    let site = repo
        .create(
            CreateSiteInput {
                name: format!("Test Site {}", Uuid::new_v4()),
                location: None,
                client_name: None,
            },
            &actor(),
        )
        .await
        .expect("Failed to create test site");
    site.id
}

async fn cleanup_site(db: &DatabaseConnection, site_id: Uuid) {
    sites::Entity::delete_by_id(site_id).exec(db).await.ok();
}

fn expense_input(site_id: Uuid) -> CreateSiteExpenseInput {
    CreateSiteExpenseInput {
        site_id,
        expense_date: "2024-03-01".parse().unwrap(),
        title: Some("Scaffolding rental".to_string()),
        summary: Some("Weekly rental".to_string()),
        payment_details: Some("UPI".to_string()),
        amount: dec!(500),
    }
}

#[tokio::test]
async fn test_create_writes_exactly_one_mirror() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let site_id = create_test_site(&db).await;

    let expenses = SiteExpenseRepository::new(db.clone());
    let transactions = SiteTransactionRepository::new(db.clone());

    let expense = expenses
        .create(expense_input(site_id), &actor())
        .await
        .expect("Failed to create expense");

    let mirror = transactions
        .find_by_source(TxnSource::SiteExpense, expense.id)
        .await
        .expect("Failed to query mirror")
        .expect("Mirror row should exist");

    assert_eq!(mirror.site_id, site_id);
    assert_eq!(mirror.amount, dec!(500));
    assert_eq!(mirror.txn_date, expense.expense_date);
    assert_eq!(mirror.nature, TxnNature::Debit);
    assert!(!mirror.is_deleted);

    expenses
        .hard_delete(expense.id, &actor())
        .await
        .expect("Failed to clean up expense");
    cleanup_site(&db, site_id).await;
}

#[tokio::test]
async fn test_update_amount_updates_mirror_in_place() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let site_id = create_test_site(&db).await;

    let expenses = SiteExpenseRepository::new(db.clone());
    let transactions = SiteTransactionRepository::new(db.clone());

    let expense = expenses
        .create(expense_input(site_id), &actor())
        .await
        .expect("Failed to create expense");
    let mirror_before = transactions
        .find_by_source(TxnSource::SiteExpense, expense.id)
        .await
        .unwrap()
        .unwrap();

    expenses
        .update(
            expense.id,
            UpdateSiteExpenseInput {
                amount: Some(dec!(750)),
                ..Default::default()
            },
            &actor(),
        )
        .await
        .expect("Failed to update expense");

    let mirror_after = transactions
        .find_by_source(TxnSource::SiteExpense, expense.id)
        .await
        .unwrap()
        .expect("Mirror should still exist");

    // Updated in place under the same key, not duplicated.
    assert_eq!(mirror_after.id, mirror_before.id);
    assert_eq!(mirror_after.amount, dec!(750));

    expenses.hard_delete(expense.id, &actor()).await.unwrap();
    cleanup_site(&db, site_id).await;
}

#[tokio::test]
async fn test_soft_delete_and_restore_move_in_lockstep() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let site_id = create_test_site(&db).await;

    let expenses = SiteExpenseRepository::new(db.clone());
    let transactions = SiteTransactionRepository::new(db.clone());

    let expense = expenses
        .create(expense_input(site_id), &actor())
        .await
        .expect("Failed to create expense");

    let deleted = expenses
        .soft_delete(expense.id, &actor())
        .await
        .expect("Failed to soft-delete");
    assert!(deleted.is_deleted);
    assert!(deleted.deleted_at.is_some());

    let mirror = transactions
        .find_by_source(TxnSource::SiteExpense, expense.id)
        .await
        .unwrap()
        .unwrap();
    assert!(mirror.is_deleted);

    let restored = expenses
        .restore(expense.id, &actor())
        .await
        .expect("Failed to restore");
    assert!(!restored.is_deleted);
    assert!(restored.deleted_at.is_none());

    let mirror = transactions
        .find_by_source(TxnSource::SiteExpense, expense.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!mirror.is_deleted);
    assert!(mirror.deleted_at.is_none());

    expenses.hard_delete(expense.id, &actor()).await.unwrap();
    cleanup_site(&db, site_id).await;
}

#[tokio::test]
async fn test_hard_delete_removes_expense_and_mirror() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let site_id = create_test_site(&db).await;

    let expenses = SiteExpenseRepository::new(db.clone());
    let transactions = SiteTransactionRepository::new(db.clone());

    let expense = expenses
        .create(expense_input(site_id), &actor())
        .await
        .expect("Failed to create expense");

    expenses
        .hard_delete(expense.id, &actor())
        .await
        .expect("Failed to hard-delete");

    assert!(expenses.get(expense.id).await.is_err());
    assert!(
        transactions
            .find_by_source(TxnSource::SiteExpense, expense.id)
            .await
            .unwrap()
            .is_none()
    );

    cleanup_site(&db, site_id).await;
}

#[tokio::test]
async fn test_every_mutation_leaves_an_audit_row() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let site_id = create_test_site(&db).await;

    let expenses = SiteExpenseRepository::new(db.clone());
    let audits = AuditLogRepository::new(db.clone());

    let expense = expenses
        .create(expense_input(site_id), &actor())
        .await
        .unwrap();
    expenses
        .update(
            expense.id,
            UpdateSiteExpenseInput {
                amount: Some(dec!(900)),
                ..Default::default()
            },
            &actor(),
        )
        .await
        .unwrap();
    expenses.soft_delete(expense.id, &actor()).await.unwrap();
    expenses.restore(expense.id, &actor()).await.unwrap();
    expenses.hard_delete(expense.id, &actor()).await.unwrap();

    let trail = audits
        .list_for_entity("site_expense", expense.id)
        .await
        .expect("Failed to load audit trail");

    assert_eq!(trail.len(), 5);
    let actions: Vec<AuditAction> = trail.iter().rev().map(|a| a.action).collect();
    assert_eq!(
        actions,
        vec![
            AuditAction::Create,
            AuditAction::Update,
            AuditAction::SoftDelete,
            AuditAction::Restore,
            AuditAction::HardDelete,
        ]
    );
    assert!(trail.iter().all(|a| a.actor.as_deref() == Some("tester")));

    cleanup_site(&db, site_id).await;
}

#[tokio::test]
async fn test_soft_deleted_rows_leave_the_active_list() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let site_id = create_test_site(&db).await;

    let expenses = SiteExpenseRepository::new(db.clone());
    let expense = expenses
        .create(expense_input(site_id), &actor())
        .await
        .unwrap();

    let before = expenses.list_active(Some(site_id)).await.unwrap();
    assert_eq!(before.len(), 1);

    expenses.soft_delete(expense.id, &actor()).await.unwrap();
    let after = expenses.list_active(Some(site_id)).await.unwrap();
    assert!(after.is_empty());

    expenses.hard_delete(expense.id, &actor()).await.unwrap();
    cleanup_site(&db, site_id).await;
}

#[tokio::test]
async fn test_created_expense_appears_in_merged_view_next_to_auto_rows() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let site_id = create_test_site(&db).await;

    let expenses = SiteExpenseRepository::new(db.clone());
    let ledger = MaterialLedgerRepository::new(db.clone());

    let supplier = ledger
        .create_supplier("Merged View Supplier".to_string(), None, &actor())
        .await
        .unwrap();
    let purchase = ledger
        .create_purchase(
            CreatePurchaseInput {
                supplier_id: supplier.id,
                site_id,
                entry_date: "2024-03-05".parse().unwrap(),
                material: "Cement".to_string(),
                qty: dec!(10),
                rate: dec!(400),
                total_amount: None,
                invoice_no: None,
                remarks: None,
            },
            &actor(),
        )
        .await
        .unwrap();
    let expense = expenses
        .create(expense_input(site_id), &actor())
        .await
        .unwrap();

    // Same read path the API uses: manual rows + projected auto rows, merged.
    let manual: Vec<ManualExpense> = expenses
        .list_active(Some(site_id))
        .await
        .unwrap()
        .into_iter()
        .map(|m| ManualExpense {
            id: m.id,
            site_id: m.site_id,
            expense_date: m.expense_date,
            title: m.title,
            summary: m.summary,
            payment_details: m.payment_details,
            amount: m.amount,
        })
        .collect();
    let snapshot = ledger.purchase_snapshot(Some(site_id)).await.unwrap();
    let auto = aggregate_material_expenses(&snapshot.rows, &snapshot.supplier_names);
    let merged = merge_expense_rows(manual, auto);

    assert_eq!(merged.len(), 2);
    // 2024-03-05 auto row sorts before the 2024-03-01 manual expense.
    assert!(merged[0].is_auto());
    assert_eq!(merged[0].amount(), dec!(4000));
    assert!(!merged[1].is_auto());
    assert_eq!(merged[1].id(), expense.id.to_string());

    expenses.hard_delete(expense.id, &actor()).await.unwrap();
    ledger.delete_purchase(purchase.id, &actor()).await.unwrap();
    sitebook_db::entities::material_suppliers::Entity::delete_by_id(supplier.id)
        .exec(&db)
        .await
        .ok();
    cleanup_site(&db, site_id).await;
}
