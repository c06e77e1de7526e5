//! Database seeder for Daftar development and testing.
//!
//! Seeds a test organization, a default chart of accounts, a starter
//! counterparty detail, and the treasury posting settings.
//!
//! Usage: cargo run --bin seeder

use daftar_core::posting::{CodeSlot, VoucherKind};
use daftar_db::entities::{
    code_nodes, details, organizations,
    sea_orm_active_enums::{AccountNature, CodeKind, DetailKind},
};
use daftar_db::repositories::SettingsRepository;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// Test organization ID (consistent for all seeds)
const TEST_ORG_ID: &str = "00000000-0000-0000-0000-000000000001";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = daftar_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding test organization...");
    seed_test_organization(&db).await;

    println!("Seeding default chart of accounts...");
    seed_chart_of_accounts(&db).await;

    println!("Seeding counterparty detail...");
    seed_counterparty_detail(&db).await;

    println!("Seeding treasury posting settings...");
    seed_posting_settings(&db).await;

    println!("Seeding complete!");
}

fn test_org_id() -> Uuid {
    Uuid::parse_str(TEST_ORG_ID).unwrap()
}

async fn seed_test_organization(db: &DatabaseConnection) {
    let existing = organizations::Entity::find_by_id(test_org_id())
        .one(db)
        .await
        .expect("Failed to query organizations");
    if existing.is_some() {
        println!("  Test organization already exists, skipping");
        return;
    }

    let now = chrono::Utc::now().into();
    organizations::ActiveModel {
        id: Set(test_org_id()),
        name: Set("Demo Trading Co.".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert test organization");
}

/// The default chart rows: (code, title, kind, parent code, nature).
const CHART: &[(&str, &str, CodeKind, Option<&str>, Option<AccountNature>)] = &[
    ("1", "Assets", CodeKind::Group, None, Some(AccountNature::Debit)),
    ("11", "Current assets", CodeKind::General, Some("1"), Some(AccountNature::Debit)),
    ("1101", "Cash in cashboxes", CodeKind::Specific, Some("11"), Some(AccountNature::Debit)),
    ("1102", "Bank accounts", CodeKind::Specific, Some("11"), Some(AccountNature::Debit)),
    ("1104", "Checks receivable", CodeKind::Specific, Some("11"), Some(AccountNature::Debit)),
    ("1105", "Accounts receivable", CodeKind::Specific, Some("11"), Some(AccountNature::Debit)),
    ("2", "Liabilities", CodeKind::Group, None, Some(AccountNature::Credit)),
    ("21", "Current liabilities", CodeKind::General, Some("2"), Some(AccountNature::Credit)),
    ("2101", "Accounts payable", CodeKind::Specific, Some("21"), Some(AccountNature::Credit)),
    ("2102", "Checks payable", CodeKind::Specific, Some("21"), Some(AccountNature::Credit)),
];

async fn seed_chart_of_accounts(db: &DatabaseConnection) {
    for (code, title, kind, parent_code, nature) in CHART {
        let existing = find_code(db, code).await;
        if existing.is_some() {
            continue;
        }

        let parent_id = match parent_code {
            Some(parent_code) => Some(
                find_code(db, parent_code)
                    .await
                    .expect("Parent must be seeded before its children")
                    .id,
            ),
            None => None,
        };

        let now = chrono::Utc::now().into();
        code_nodes::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(test_org_id()),
            parent_id: Set(parent_id),
            code: Set((*code).to_string()),
            title: Set((*title).to_string()),
            kind: Set(kind.clone()),
            is_active: Set(true),
            nature: Set(nature.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .expect("Failed to insert chart node");
        println!("  {code} {title}");
    }
}

async fn seed_counterparty_detail(db: &DatabaseConnection) {
    let existing = details::Entity::find()
        .filter(details::Column::OrganizationId.eq(test_org_id()))
        .filter(details::Column::Code.eq("0001"))
        .one(db)
        .await
        .expect("Failed to query details");
    if existing.is_some() {
        println!("  Counterparty detail already exists, skipping");
        return;
    }

    let now = chrono::Utc::now().into();
    details::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(test_org_id()),
        code: Set("0001".to_string()),
        title: Set("Walk-in counterparty".to_string()),
        is_active: Set(true),
        kind: Set(DetailKind::UserDefined),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("Failed to insert counterparty detail");
}

/// Points every posting slot at its seeded chart code, so resolution
/// normally succeeds at tier 2 without relying on the literal fallback.
async fn seed_posting_settings(db: &DatabaseConnection) {
    let settings = SettingsRepository::new(db.clone());

    for kind in [VoucherKind::Receipt, VoucherKind::Payment] {
        for slot in [
            CodeSlot::Cash,
            CodeSlot::Card,
            CodeSlot::Transfer,
            CodeSlot::Check,
            CodeSlot::Counterparty,
        ] {
            let code_value = slot.fallback_code(kind);
            let node = find_code(db, code_value)
                .await
                .expect("Chart must be seeded before settings");

            settings
                .put_code_ref(test_org_id(), slot.setting_key(kind), node.id)
                .await
                .expect("Failed to upsert posting setting");
            println!("  {} -> {}", slot.setting_key(kind), code_value);
        }
    }
}

async fn find_code(db: &DatabaseConnection, code: &str) -> Option<code_nodes::Model> {
    code_nodes::Entity::find()
        .filter(code_nodes::Column::OrganizationId.eq(test_org_id()))
        .filter(code_nodes::Column::Code.eq(code))
        .one(db)
        .await
        .expect("Failed to query code nodes")
}
