//! Database seeder for Sitebook development and testing.
//!
//! Seeds a demo site, suppliers, material purchases, manual expenses, and a
//! couple of direct transactions. Everything goes through the repositories so
//! transaction mirrors and audit rows are created exactly as in production.
//!
//! Usage: cargo run --bin seeder

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use sitebook_db::entities::sea_orm_active_enums::TxnNature;
use sitebook_db::repositories::{
    AuditActor, CreatePurchaseInput, CreateSiteExpenseInput, CreateSiteInput,
    CreateSiteTransactionInput, MaterialLedgerRepository, SiteExpenseRepository, SiteRepository,
    SiteTransactionRepository,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn amount(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = sitebook_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    let actor = AuditActor {
        user_id: Some("seeder".to_string()),
        ip: None,
    };

    let site_repo = SiteRepository::new(db.clone());
    let existing = site_repo.list().await.expect("Failed to list sites");
    if !existing.is_empty() {
        println!("Sites already present, skipping seed.");
        return;
    }

    println!("Seeding demo site...");
    let site = site_repo
        .create(
            CreateSiteInput {
                name: "Riverside Apartments".to_string(),
                location: Some("Sector 12".to_string()),
                client_name: Some("Mehta Builders".to_string()),
            },
            &actor,
        )
        .await
        .expect("Failed to create site");

    println!("Seeding suppliers and purchases...");
    let ledger_repo = MaterialLedgerRepository::new(db.clone());
    let shree = ledger_repo
        .create_supplier(
            "Shree Traders".to_string(),
            Some("98200 11223".to_string()),
            &actor,
        )
        .await
        .expect("Failed to create supplier");
    let kamal = ledger_repo
        .create_supplier("Kamal Cement Depot".to_string(), None, &actor)
        .await
        .expect("Failed to create supplier");

    let purchases = [
        (shree.id, date(2025, 1, 10), "River Sand", "30", "55", None),
        (shree.id, date(2025, 1, 18), "river sand", "20", "55", None),
        (
            kamal.id,
            date(2025, 1, 15),
            "Cement",
            "100",
            "380",
            Some("37500"),
        ),
    ];
    for (supplier_id, entry_date, material, qty, rate, total) in purchases {
        ledger_repo
            .create_purchase(
                CreatePurchaseInput {
                    supplier_id,
                    site_id: site.id,
                    entry_date,
                    material: material.to_string(),
                    qty: amount(qty),
                    rate: amount(rate),
                    total_amount: total.map(amount),
                    invoice_no: None,
                    remarks: None,
                },
                &actor,
            )
            .await
            .expect("Failed to create purchase");
    }

    println!("Seeding manual expenses...");
    let expense_repo = SiteExpenseRepository::new(db.clone());
    expense_repo
        .create(
            CreateSiteExpenseInput {
                site_id: site.id,
                expense_date: date(2025, 1, 12),
                title: Some("Diesel for JCB".to_string()),
                summary: Some("Excavation week 2".to_string()),
                payment_details: Some("cash".to_string()),
                amount: amount("4500"),
            },
            &actor,
        )
        .await
        .expect("Failed to create expense");
    expense_repo
        .create(
            CreateSiteExpenseInput {
                site_id: site.id,
                expense_date: date(2025, 1, 20),
                title: Some("Labour advance".to_string()),
                summary: None,
                payment_details: Some("UPI".to_string()),
                amount: amount("12000"),
            },
            &actor,
        )
        .await
        .expect("Failed to create expense");

    println!("Seeding direct transactions...");
    let txn_repo = SiteTransactionRepository::new(db);
    txn_repo
        .create(
            CreateSiteTransactionInput {
                site_id: site.id,
                txn_date: date(2025, 1, 5),
                nature: TxnNature::Credit,
                amount: amount("200000"),
                title: "Client advance".to_string(),
                remarks: Some("First installment".to_string()),
                meta: Some(serde_json::json!({ "mode": "bank transfer" })),
            },
            &actor,
        )
        .await
        .expect("Failed to create transaction");
    txn_repo
        .create(
            CreateSiteTransactionInput {
                site_id: site.id,
                txn_date: date(2025, 1, 25),
                nature: TxnNature::Debit,
                amount: amount("8000"),
                title: "Scaffolding rental".to_string(),
                remarks: None,
                meta: None,
            },
            &actor,
        )
        .await
        .expect("Failed to create transaction");

    println!("Seeding complete!");
}
