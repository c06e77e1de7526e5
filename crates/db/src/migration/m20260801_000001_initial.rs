//! Initial database migration.
//!
//! Creates all core tables, enums, indexes, and triggers for the ledger and
//! treasury subsystems.

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
        // PART 2: TENANCY
        // ============================================================
        db.execute_unprepared(ORGANIZATIONS_SQL).await?;

        // ============================================================
        // PART 3: CHART OF ACCOUNTS & DETAIL CATALOGUE
        // ============================================================
        db.execute_unprepared(CODE_NODES_SQL).await?;
        db.execute_unprepared(DETAILS_SQL).await?;
        db.execute_unprepared(DETAIL_LINKS_SQL).await?;

        // ============================================================
        // PART 4: FISCAL YEARS
        // ============================================================
        db.execute_unprepared(FISCAL_YEARS_SQL).await?;

        // ============================================================
        // PART 5: JOURNALS
        // ============================================================
        db.execute_unprepared(JOURNALS_SQL).await?;
        db.execute_unprepared(JOURNAL_ITEMS_SQL).await?;

        // ============================================================
        // PART 6: TREASURY INSTRUMENTS
        // ============================================================
        db.execute_unprepared(BANKS_SQL).await?;
        db.execute_unprepared(BANK_ACCOUNTS_SQL).await?;
        db.execute_unprepared(CARD_READERS_SQL).await?;
        db.execute_unprepared(CASHBOXES_SQL).await?;
        db.execute_unprepared(CHECKBOOKS_SQL).await?;
        db.execute_unprepared(CHECKS_SQL).await?;

        // ============================================================
        // PART 7: RECEIPTS & PAYMENTS
        // ============================================================
        db.execute_unprepared(RECEIPTS_SQL).await?;
        db.execute_unprepared(RECEIPT_ITEMS_SQL).await?;
        db.execute_unprepared(PAYMENTS_SQL).await?;
        db.execute_unprepared(PAYMENT_ITEMS_SQL).await?;

        // ============================================================
        // PART 8: SETTINGS
        // ============================================================
        db.execute_unprepared(SETTINGS_SQL).await?;

        // ============================================================
        // PART 9: TRIGGERS & FUNCTIONS
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
-- Chart-of-accounts hierarchy level
CREATE TYPE code_kind AS ENUM ('group', 'general', 'specific');

-- Natural balance side of an account node
CREATE TYPE account_nature AS ENUM ('debit', 'credit');

-- Origin of a detail catalogue entry
CREATE TYPE detail_kind AS ENUM ('user_defined', 'system_managed');

-- Journal lifecycle
CREATE TYPE journal_status AS ENUM ('draft', 'posted');

-- Receipt/payment lifecycle
CREATE TYPE voucher_status AS ENUM ('draft', 'sent');

-- Payment instrument on a voucher item
CREATE TYPE instrument_type AS ENUM ('cash', 'card', 'transfer', 'check', 'checkin');

-- Check direction
CREATE TYPE check_kind AS ENUM ('incoming', 'outgoing');

-- Check lifecycle
CREATE TYPE check_status AS ENUM ('created', 'incashbox', 'issued', 'spent');

-- Checkbook lifecycle
CREATE TYPE checkbook_status AS ENUM ('active', 'exhausted');
";

const ORGANIZATIONS_SQL: &str = r"
CREATE TABLE organizations (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const CODE_NODES_SQL: &str = r"
CREATE TABLE code_nodes (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    parent_id UUID REFERENCES code_nodes(id),
    code VARCHAR(16) NOT NULL,
    title VARCHAR(255) NOT NULL,
    kind code_kind NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    nature account_nature,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- One code namespace across all kinds: postings reference a single code id space
CREATE UNIQUE INDEX code_nodes_org_code ON code_nodes (organization_id, code);
CREATE INDEX code_nodes_parent ON code_nodes (parent_id);
";

const DETAILS_SQL: &str = r"
CREATE TABLE details (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    code CHAR(4) NOT NULL,
    title VARCHAR(255) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    kind detail_kind NOT NULL DEFAULT 'user_defined',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Backstop for read-then-insert code allocation: writers retry on conflict
CREATE UNIQUE INDEX details_org_code ON details (organization_id, code);
";

const DETAIL_LINKS_SQL: &str = r"
CREATE TABLE detail_links (
    id UUID PRIMARY KEY,
    detail_id UUID NOT NULL REFERENCES details(id),
    code_node_id UUID NOT NULL REFERENCES code_nodes(id),
    is_primary BOOLEAN NOT NULL DEFAULT FALSE,
    position INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX detail_links_pair ON detail_links (detail_id, code_node_id);
CREATE INDEX detail_links_node ON detail_links (code_node_id);
";

const FISCAL_YEARS_SQL: &str = r"
CREATE TABLE fiscal_years (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    name VARCHAR(64) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    is_closed BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT fiscal_years_date_order CHECK (start_date < end_date)
);

CREATE UNIQUE INDEX fiscal_years_org_start ON fiscal_years (organization_id, start_date);

-- Database-level backstop for the exclusivity invariant: at most one open
-- year per organization
CREATE UNIQUE INDEX fiscal_years_one_open
    ON fiscal_years (organization_id)
    WHERE NOT is_closed;
";

const JOURNALS_SQL: &str = r"
CREATE TABLE journals (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    fiscal_year_id UUID NOT NULL REFERENCES fiscal_years(id),
    ref_no BIGINT NOT NULL,
    code BIGINT NOT NULL,
    journal_date DATE NOT NULL,
    description TEXT,
    status journal_status NOT NULL DEFAULT 'draft',
    reversal_of UUID REFERENCES journals(id),
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Backstop for max+1 sequential allocation: writers retry on conflict
CREATE UNIQUE INDEX journals_year_ref ON journals (fiscal_year_id, ref_no);
CREATE UNIQUE INDEX journals_year_code ON journals (fiscal_year_id, code);
CREATE INDEX journals_org_date ON journals (organization_id, journal_date);
";

const JOURNAL_ITEMS_SQL: &str = r"
CREATE TABLE journal_items (
    id UUID PRIMARY KEY,
    journal_id UUID NOT NULL REFERENCES journals(id) ON DELETE CASCADE,
    code_node_id UUID NOT NULL REFERENCES code_nodes(id),
    party_id UUID,
    detail_id UUID REFERENCES details(id),
    debit NUMERIC(20, 4) NOT NULL DEFAULT 0,
    credit NUMERIC(20, 4) NOT NULL DEFAULT 0,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT journal_items_non_negative CHECK (debit >= 0 AND credit >= 0),
    CONSTRAINT journal_items_one_side CHECK (NOT (debit > 0 AND credit > 0))
);

CREATE INDEX journal_items_journal ON journal_items (journal_id);
CREATE INDEX journal_items_code ON journal_items (code_node_id);
CREATE INDEX journal_items_detail ON journal_items (detail_id);
";

const BANKS_SQL: &str = r"
CREATE TABLE banks (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const BANK_ACCOUNTS_SQL: &str = r"
CREATE TABLE bank_accounts (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    bank_id UUID NOT NULL REFERENCES banks(id),
    name VARCHAR(255) NOT NULL,
    account_number VARCHAR(64) NOT NULL,
    handler_detail_id UUID NOT NULL REFERENCES details(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX bank_accounts_handler ON bank_accounts (handler_detail_id);
";

const CARD_READERS_SQL: &str = r"
CREATE TABLE card_readers (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    bank_account_id UUID NOT NULL REFERENCES bank_accounts(id),
    name VARCHAR(255) NOT NULL,
    handler_detail_id UUID NOT NULL REFERENCES details(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX card_readers_handler ON card_readers (handler_detail_id);
";

const CASHBOXES_SQL: &str = r"
CREATE TABLE cashboxes (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    code CHAR(4) NOT NULL,
    name VARCHAR(255) NOT NULL,
    handler_detail_id UUID NOT NULL REFERENCES details(id),
    starting_amount NUMERIC(20, 4) NOT NULL DEFAULT 0,
    starting_date DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- The cashbox code mirrors its handler detail's code
CREATE UNIQUE INDEX cashboxes_org_code ON cashboxes (organization_id, code);
CREATE UNIQUE INDEX cashboxes_handler ON cashboxes (handler_detail_id);
";

const CHECKBOOKS_SQL: &str = r"
CREATE TABLE checkbooks (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    bank_account_id UUID NOT NULL REFERENCES bank_accounts(id),
    serial VARCHAR(64) NOT NULL,
    start_number BIGINT NOT NULL,
    page_count BIGINT NOT NULL,
    status checkbook_status NOT NULL DEFAULT 'active',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT checkbooks_positive_pages CHECK (page_count > 0)
);
";

const CHECKS_SQL: &str = r"
CREATE TABLE checks (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    kind check_kind NOT NULL,
    checkbook_id UUID REFERENCES checkbooks(id),
    number BIGINT NOT NULL,
    amount NUMERIC(20, 4) NOT NULL,
    issue_date DATE NOT NULL,
    due_date DATE NOT NULL,
    beneficiary_detail_id UUID REFERENCES details(id),
    status check_status NOT NULL,
    cashbox_id UUID REFERENCES cashboxes(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- A checkbook page is issued at most once
CREATE UNIQUE INDEX checks_book_number
    ON checks (checkbook_id, number)
    WHERE checkbook_id IS NOT NULL;
CREATE INDEX checks_status ON checks (organization_id, status);
";

const RECEIPTS_SQL: &str = r"
CREATE TABLE receipts (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    number BIGINT NOT NULL,
    status voucher_status NOT NULL DEFAULT 'draft',
    receipt_date DATE NOT NULL,
    fiscal_year_id UUID NOT NULL REFERENCES fiscal_years(id),
    detail_id UUID NOT NULL REFERENCES details(id),
    special_code_id UUID REFERENCES code_nodes(id),
    cashbox_id UUID REFERENCES cashboxes(id),
    total_amount NUMERIC(20, 4) NOT NULL DEFAULT 0,
    journal_id UUID REFERENCES journals(id),
    description TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX receipts_org_number ON receipts (organization_id, number);
CREATE INDEX receipts_year ON receipts (fiscal_year_id);
";

const RECEIPT_ITEMS_SQL: &str = r"
CREATE TABLE receipt_items (
    id UUID PRIMARY KEY,
    receipt_id UUID NOT NULL REFERENCES receipts(id) ON DELETE CASCADE,
    instrument_type instrument_type NOT NULL,
    amount NUMERIC(20, 4) NOT NULL,
    bank_account_id UUID REFERENCES bank_accounts(id),
    card_reader_id UUID REFERENCES card_readers(id),
    check_id UUID REFERENCES checks(id),
    reference VARCHAR(128),
    position INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT receipt_items_positive CHECK (amount > 0)
);

CREATE INDEX receipt_items_receipt ON receipt_items (receipt_id);
CREATE INDEX receipt_items_check ON receipt_items (check_id);
";

const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    number BIGINT NOT NULL,
    status voucher_status NOT NULL DEFAULT 'draft',
    payment_date DATE NOT NULL,
    fiscal_year_id UUID NOT NULL REFERENCES fiscal_years(id),
    detail_id UUID NOT NULL REFERENCES details(id),
    special_code_id UUID REFERENCES code_nodes(id),
    cashbox_id UUID REFERENCES cashboxes(id),
    total_amount NUMERIC(20, 4) NOT NULL DEFAULT 0,
    journal_id UUID REFERENCES journals(id),
    description TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX payments_org_number ON payments (organization_id, number);
CREATE INDEX payments_year ON payments (fiscal_year_id);
";

const PAYMENT_ITEMS_SQL: &str = r"
CREATE TABLE payment_items (
    id UUID PRIMARY KEY,
    payment_id UUID NOT NULL REFERENCES payments(id) ON DELETE CASCADE,
    instrument_type instrument_type NOT NULL,
    amount NUMERIC(20, 4) NOT NULL,
    bank_account_id UUID REFERENCES bank_accounts(id),
    card_reader_id UUID REFERENCES card_readers(id),
    check_id UUID REFERENCES checks(id),
    reference VARCHAR(128),
    position INTEGER NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT payment_items_positive CHECK (amount > 0)
);

CREATE INDEX payment_items_payment ON payment_items (payment_id);
CREATE INDEX payment_items_check ON payment_items (check_id);
";

const SETTINGS_SQL: &str = r"
CREATE TABLE settings (
    id UUID PRIMARY KEY,
    organization_id UUID NOT NULL REFERENCES organizations(id),
    name VARCHAR(128) NOT NULL,
    value JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE UNIQUE INDEX settings_org_name ON settings (organization_id, name);
";

const TRIGGERS_SQL: &str = r"
-- Keep updated_at current on row updates
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER organizations_updated_at BEFORE UPDATE ON organizations
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER code_nodes_updated_at BEFORE UPDATE ON code_nodes
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER details_updated_at BEFORE UPDATE ON details
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER fiscal_years_updated_at BEFORE UPDATE ON fiscal_years
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER journals_updated_at BEFORE UPDATE ON journals
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER banks_updated_at BEFORE UPDATE ON banks
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER bank_accounts_updated_at BEFORE UPDATE ON bank_accounts
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER card_readers_updated_at BEFORE UPDATE ON card_readers
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER cashboxes_updated_at BEFORE UPDATE ON cashboxes
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER checkbooks_updated_at BEFORE UPDATE ON checkbooks
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER checks_updated_at BEFORE UPDATE ON checks
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER receipts_updated_at BEFORE UPDATE ON receipts
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER payments_updated_at BEFORE UPDATE ON payments
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER settings_updated_at BEFORE UPDATE ON settings
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS settings CASCADE;
DROP TABLE IF EXISTS payment_items CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS receipt_items CASCADE;
DROP TABLE IF EXISTS receipts CASCADE;
DROP TABLE IF EXISTS checks CASCADE;
DROP TABLE IF EXISTS checkbooks CASCADE;
DROP TABLE IF EXISTS cashboxes CASCADE;
DROP TABLE IF EXISTS card_readers CASCADE;
DROP TABLE IF EXISTS bank_accounts CASCADE;
DROP TABLE IF EXISTS banks CASCADE;
DROP TABLE IF EXISTS journal_items CASCADE;
DROP TABLE IF EXISTS journals CASCADE;
DROP TABLE IF EXISTS fiscal_years CASCADE;
DROP TABLE IF EXISTS detail_links CASCADE;
DROP TABLE IF EXISTS details CASCADE;
DROP TABLE IF EXISTS code_nodes CASCADE;
DROP TABLE IF EXISTS organizations CASCADE;

DROP FUNCTION IF EXISTS set_updated_at CASCADE;

DROP TYPE IF EXISTS checkbook_status;
DROP TYPE IF EXISTS check_status;
DROP TYPE IF EXISTS check_kind;
DROP TYPE IF EXISTS instrument_type;
DROP TYPE IF EXISTS voucher_status;
DROP TYPE IF EXISTS journal_status;
DROP TYPE IF EXISTS detail_kind;
DROP TYPE IF EXISTS account_nature;
DROP TYPE IF EXISTS code_kind;
";
