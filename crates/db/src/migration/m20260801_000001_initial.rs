//! Initial database migration.
//!
//! Creates all enums, tables and indexes for the ledger.

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
        // PART 2: CORE TABLES
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(PROJECTS_SQL).await?;

        // ============================================================
        // PART 3: LEDGER RECORD STREAMS
        // ============================================================
        db.execute_unprepared(ALLOCATIONS_SQL).await?;
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(EXPENSES_SQL).await?;

        // ============================================================
        // PART 4: INDEXES
        // ============================================================
        db.execute_unprepared(INDEXES_SQL).await?;

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
-- User roles
CREATE TYPE user_role AS ENUM ('admin', 'professional');

-- Expense review status
CREATE TYPE expense_status AS ENUM ('pending', 'approved', 'rejected');

-- Allocation kind
CREATE TYPE allocation_kind AS ENUM ('grant', 'transfer_out', 'transfer_in');

-- Project kind and lifecycle
CREATE TYPE project_kind AS ENUM ('client', 'petty_cash');
CREATE TYPE project_status AS ENUM ('active', 'deleted');

-- Invoice payment status
CREATE TYPE payment_status AS ENUM ('pending', 'paid', 'annulled');
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    display_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    code TEXT,
    role user_role NOT NULL DEFAULT 'professional',
    -- Cached net balance; positive = company owes the user.
    balance NUMERIC(18, 2) NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const PROJECTS_SQL: &str = r"
CREATE TABLE projects (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    client TEXT,
    code TEXT,
    recurrence TEXT,
    kind project_kind NOT NULL DEFAULT 'client',
    status project_status NOT NULL DEFAULT 'active',
    -- Cached total of approved expense amounts charged to this project.
    expenses NUMERIC(18, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const ALLOCATIONS_SQL: &str = r"
CREATE TABLE allocations (
    id UUID PRIMARY KEY,
    user_id UUID NOT NULL REFERENCES users(id),
    project_id UUID NOT NULL REFERENCES projects(id),
    -- Signed; transfer-out legs are negative.
    amount NUMERIC(18, 2) NOT NULL,
    date DATE NOT NULL,
    kind allocation_kind NOT NULL DEFAULT 'grant',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY,
    number TEXT NOT NULL UNIQUE,
    client TEXT,
    project_id UUID REFERENCES projects(id),
    total_amount NUMERIC(18, 2) NOT NULL,
    line_items JSONB NOT NULL DEFAULT '[]',
    payment_status payment_status NOT NULL DEFAULT 'pending',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const EXPENSES_SQL: &str = r"
CREATE TABLE expenses (
    id UUID PRIMARY KEY,
    -- Nullable: company expenses have no owner; a deleted account leaves
    -- the row behind rather than cascading into the ledger history.
    user_id UUID REFERENCES users(id) ON DELETE SET NULL,
    is_company_expense BOOLEAN NOT NULL DEFAULT FALSE,
    project_id UUID REFERENCES projects(id),
    event_name TEXT,
    category TEXT,
    date DATE NOT NULL,
    merchant TEXT,
    tax_id TEXT,
    amount NUMERIC(18, 2) NOT NULL CHECK (amount >= 0),
    currency TEXT NOT NULL DEFAULT 'COP',
    status expense_status NOT NULL DEFAULT 'pending',
    rejection_reason TEXT,
    receipt_url TEXT,
    voucher_url TEXT,
    -- Set while referenced by a non-annulled invoice (the lock).
    invoice_id UUID REFERENCES invoices(id) ON DELETE SET NULL,
    split_group_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const INDEXES_SQL: &str = r"
CREATE INDEX idx_allocations_user ON allocations(user_id);
CREATE INDEX idx_allocations_project ON allocations(project_id);
CREATE INDEX idx_expenses_user ON expenses(user_id);
CREATE INDEX idx_expenses_project ON expenses(project_id);
CREATE INDEX idx_expenses_status ON expenses(status);
CREATE INDEX idx_expenses_invoice ON expenses(invoice_id);
CREATE INDEX idx_expenses_split_group ON expenses(split_group_id);
CREATE INDEX idx_invoices_status ON invoices(payment_status);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS expenses;
DROP TABLE IF EXISTS invoices;
DROP TABLE IF EXISTS allocations;
DROP TABLE IF EXISTS projects;
DROP TABLE IF EXISTS users;
DROP TYPE IF EXISTS payment_status;
DROP TYPE IF EXISTS project_status;
DROP TYPE IF EXISTS project_kind;
DROP TYPE IF EXISTS allocation_kind;
DROP TYPE IF EXISTS expense_status;
DROP TYPE IF EXISTS user_role;
";
