//! Initial database migration.
//!
//! Creates enums, core tables, indexes, and the updated_at trigger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: DIMENSION TABLES
        // ============================================================
        db.execute_unprepared(SITES_SQL).await?;
        db.execute_unprepared(MATERIAL_SUPPLIERS_SQL).await?;

        // ============================================================
        // PART 3: LEDGER ROWS
        // ============================================================
        db.execute_unprepared(MATERIAL_PURCHASES_SQL).await?;

        // ============================================================
        // PART 4: EXPENSES & TRANSACTION MIRROR
        // ============================================================
        db.execute_unprepared(SITE_EXPENSES_SQL).await?;
        db.execute_unprepared(SITE_TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 5: AUDIT LOG
        // ============================================================
        db.execute_unprepared(AUDIT_LOGS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Site transaction origin
CREATE TYPE txn_source AS ENUM ('site_expense', 'manual');

-- Site transaction nature
CREATE TYPE txn_nature AS ENUM ('debit', 'credit');

-- Audit log actions
CREATE TYPE audit_action AS ENUM (
    'create',
    'update',
    'soft_delete',
    'restore',
    'hard_delete'
);
";

const SITES_SQL: &str = r"
CREATE TABLE sites (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    location VARCHAR(255),
    client_name VARCHAR(255),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_sites_is_active ON sites(is_active);
";

const MATERIAL_SUPPLIERS_SQL: &str = r"
CREATE TABLE material_suppliers (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    contact VARCHAR(255),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const MATERIAL_PURCHASES_SQL: &str = r"
CREATE TABLE material_purchases (
    id UUID PRIMARY KEY,
    supplier_id UUID NOT NULL REFERENCES material_suppliers(id),
    site_id UUID NOT NULL REFERENCES sites(id),
    entry_date DATE NOT NULL,
    material VARCHAR(255) NOT NULL,
    qty NUMERIC(14, 2) NOT NULL DEFAULT 0,
    rate NUMERIC(14, 2) NOT NULL DEFAULT 0,
    total_amount NUMERIC(14, 2),
    invoice_no VARCHAR(100),
    remarks TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_material_purchases_site ON material_purchases(site_id);
CREATE INDEX idx_material_purchases_supplier ON material_purchases(supplier_id);
CREATE INDEX idx_material_purchases_entry_date ON material_purchases(entry_date);
";

const SITE_EXPENSES_SQL: &str = r"
CREATE TABLE site_expenses (
    id UUID PRIMARY KEY,
    site_id UUID NOT NULL REFERENCES sites(id),
    expense_date DATE NOT NULL,
    title VARCHAR(255) NOT NULL,
    summary TEXT,
    payment_details TEXT,
    amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
    is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
    deleted_at TIMESTAMPTZ,
    deleted_by VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_site_expenses_site ON site_expenses(site_id);
CREATE INDEX idx_site_expenses_expense_date ON site_expenses(expense_date);
CREATE INDEX idx_site_expenses_is_deleted ON site_expenses(is_deleted);
";

const SITE_TRANSACTIONS_SQL: &str = r"
CREATE TABLE site_transactions (
    id UUID PRIMARY KEY,
    site_id UUID NOT NULL REFERENCES sites(id),
    txn_date DATE NOT NULL,
    source txn_source NOT NULL,
    source_id UUID NOT NULL,
    nature txn_nature NOT NULL,
    amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
    title VARCHAR(255) NOT NULL,
    remarks TEXT,
    meta JSONB NOT NULL DEFAULT '{}',
    is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
    deleted_at TIMESTAMPTZ,
    deleted_by VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- One mirror row per originating record
CREATE UNIQUE INDEX ux_site_transactions_source ON site_transactions(source, source_id);

CREATE INDEX idx_site_transactions_site ON site_transactions(site_id);
CREATE INDEX idx_site_transactions_txn_date ON site_transactions(txn_date);
CREATE INDEX idx_site_transactions_nature ON site_transactions(nature);
";

const AUDIT_LOGS_SQL: &str = r"
CREATE TABLE audit_logs (
    id UUID PRIMARY KEY,
    entity VARCHAR(100) NOT NULL,
    entity_id UUID NOT NULL,
    action audit_action NOT NULL,
    actor VARCHAR(255),
    ip VARCHAR(64),
    old_value JSONB,
    new_value JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_audit_logs_entity ON audit_logs(entity, entity_id);
CREATE INDEX idx_audit_logs_created_at ON audit_logs(created_at);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_sites_updated_at
    BEFORE UPDATE ON sites
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_material_suppliers_updated_at
    BEFORE UPDATE ON material_suppliers
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_site_expenses_updated_at
    BEFORE UPDATE ON site_expenses
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_site_transactions_updated_at
    BEFORE UPDATE ON site_transactions
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS audit_logs CASCADE;
DROP TABLE IF EXISTS site_transactions CASCADE;
DROP TABLE IF EXISTS site_expenses CASCADE;
DROP TABLE IF EXISTS material_purchases CASCADE;
DROP TABLE IF EXISTS material_suppliers CASCADE;
DROP TABLE IF EXISTS sites CASCADE;
DROP FUNCTION IF EXISTS touch_updated_at CASCADE;
DROP TYPE IF EXISTS audit_action;
DROP TYPE IF EXISTS txn_nature;
DROP TYPE IF EXISTS txn_source;
";
