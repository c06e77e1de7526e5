//! Shared setup for database integration tests.
//!
//! Tests connect to `DATABASE_URL` and skip (returning `None`) when it is
//! not set, so the suite stays green without a provisioned database. Each
//! test works in its own freshly created organization.

#![allow(dead_code)]

use chrono::NaiveDate;
use daftar_db::entities::{
    code_nodes, organizations,
    sea_orm_active_enums::{AccountNature, CodeKind, DetailKind},
};
use daftar_db::migration::Migrator;
use daftar_db::repositories::{CreateFiscalYearInput, FiscalYearRepository};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

/// Connects to the test database, or skips the test when `DATABASE_URL`
/// is not set. Migrations are applied idempotently on connect.
pub async fn connect_or_skip() -> Option<DatabaseConnection> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    };

    let db = Database::connect(&url)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    Some(db)
}

/// Creates a fresh organization for test isolation.
pub async fn create_org(db: &DatabaseConnection) -> Uuid {
    let id = Uuid::new_v4();
    let now = chrono::Utc::now().into();
    organizations::ActiveModel {
        id: Set(id),
        name: Set(format!("Test Org {id}")),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert organization");
    id
}

/// Seeds the minimal chart the posting fallback codes expect. Returns the
/// id of the "1101" cash node.
pub async fn seed_chart(db: &DatabaseConnection, org: Uuid) -> Uuid {
    let rows: &[(&str, &str, CodeKind, Option<&str>)] = &[
        ("1", "Assets", CodeKind::Group, None),
        ("11", "Current assets", CodeKind::General, Some("1")),
        ("1101", "Cash in cashboxes", CodeKind::Specific, Some("11")),
        ("1102", "Bank accounts", CodeKind::Specific, Some("11")),
        ("1104", "Checks receivable", CodeKind::Specific, Some("11")),
        ("1105", "Accounts receivable", CodeKind::Specific, Some("11")),
        ("2", "Liabilities", CodeKind::Group, None),
        ("21", "Current liabilities", CodeKind::General, Some("2")),
        ("2101", "Accounts payable", CodeKind::Specific, Some("21")),
        ("2102", "Checks payable", CodeKind::Specific, Some("21")),
    ];

    let mut ids: std::collections::HashMap<&str, Uuid> = std::collections::HashMap::new();
    let mut cash_node = Uuid::nil();
    for (code, title, kind, parent) in rows {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now().into();
        code_nodes::ActiveModel {
            id: Set(id),
            organization_id: Set(org),
            parent_id: Set(parent.map(|p| ids[p])),
            code: Set((*code).to_string()),
            title: Set((*title).to_string()),
            kind: Set(kind.clone()),
            is_active: Set(true),
            nature: Set(Some(if code.starts_with('1') {
                AccountNature::Debit
            } else {
                AccountNature::Credit
            })),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("Failed to insert chart node");

        ids.insert(code, id);
        if *code == "1101" {
            cash_node = id;
        }
    }
    cash_node
}

/// Creates a user-defined counterparty detail.
pub async fn create_detail(db: &DatabaseConnection, org: Uuid, code: &str) -> Uuid {
    let id = Uuid::new_v4();
    let now = chrono::Utc::now().into();
    daftar_db::entities::details::ActiveModel {
        id: Set(id),
        organization_id: Set(org),
        code: Set(code.to_string()),
        title: Set(format!("Counterparty {code}")),
        is_active: Set(true),
        kind: Set(DetailKind::UserDefined),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert detail");
    id
}

/// Creates a calendar year and opens it.
pub async fn create_open_year(db: &DatabaseConnection, org: Uuid, year: i32) -> Uuid {
    let repo = FiscalYearRepository::new(db.clone());
    let created = repo
        .create(CreateFiscalYearInput {
            organization_id: org,
            name: format!("FY{year}"),
            start_date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
        })
        .await
        .expect("Failed to create fiscal year");
    repo.open(created.id).await.expect("Failed to open year");
    created.id
}

/// A fixed caller identity for audit fields.
pub fn test_user() -> Uuid {
    Uuid::parse_str("00000000-0000-0000-0000-000000000002").unwrap()
}
