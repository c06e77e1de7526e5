//! Integration tests for journal creation, posting, and reversal.

mod common;

use daftar_core::journal::{JournalError as CoreJournalError, JournalItemInput};
use daftar_db::entities::sea_orm_active_enums::JournalStatus;
use daftar_db::repositories::{CreateJournalInput, JournalError, JournalRepository};
use daftar_shared::types::CodeNodeId;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use common::{connect_or_skip, create_org, create_open_year, seed_chart, test_user};

struct Fixture {
    repo: JournalRepository,
    org: Uuid,
    year: Uuid,
    cash_node: Uuid,
}

async fn fixture(db: &DatabaseConnection) -> Fixture {
    let org = create_org(db).await;
    let cash_node = seed_chart(db, org).await;
    let year = create_open_year(db, org, 2024).await;
    Fixture {
        repo: JournalRepository::new(db.clone()),
        org,
        year,
        cash_node,
    }
}

fn balanced_items(debit_node: Uuid, credit_node: Uuid) -> Vec<JournalItemInput> {
    vec![
        JournalItemInput {
            code_id: CodeNodeId::from_uuid(debit_node),
            party_id: None,
            detail_id: None,
            debit: dec!(250),
            credit: dec!(0),
            description: Some("cash in".to_string()),
        },
        JournalItemInput {
            code_id: CodeNodeId::from_uuid(credit_node),
            party_id: None,
            detail_id: None,
            debit: dec!(0),
            credit: dec!(250),
            description: None,
        },
    ]
}

fn input(fx: &Fixture, items: Vec<JournalItemInput>) -> CreateJournalInput {
    CreateJournalInput {
        organization_id: fx.org,
        fiscal_year_id: fx.year,
        journal_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        description: Some("test entry".to_string()),
        items,
        created_by: test_user(),
    }
}

#[tokio::test]
async fn test_create_draft_with_sequential_ref() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fx = fixture(&db).await;

    let first = fx
        .repo
        .create(input(&fx, balanced_items(fx.cash_node, fx.cash_node)))
        .await
        .unwrap();
    let second = fx
        .repo
        .create(input(&fx, balanced_items(fx.cash_node, fx.cash_node)))
        .await
        .unwrap();

    assert_eq!(first.journal.status, JournalStatus::Draft);
    assert_eq!(first.journal.ref_no, 1);
    assert_eq!(second.journal.ref_no, 2);
    assert_eq!(second.items.len(), 2);
}

#[tokio::test]
async fn test_unbalanced_rejected_without_write() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fx = fixture(&db).await;

    let mut items = balanced_items(fx.cash_node, fx.cash_node);
    items[1].credit = dec!(240);

    let result = fx.repo.create(input(&fx, items)).await;
    assert!(matches!(
        result,
        Err(JournalError::Rule(CoreJournalError::Unbalanced { .. }))
    ));

    let journals = fx.repo.list_for_year(fx.year, None).await.unwrap();
    assert!(journals.is_empty(), "nothing is written on rejection");
}

#[tokio::test]
async fn test_post_makes_journal_immutable() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fx = fixture(&db).await;

    let created = fx
        .repo
        .create(input(&fx, balanced_items(fx.cash_node, fx.cash_node)))
        .await
        .unwrap();
    let posted = fx.repo.post(created.journal.id).await.unwrap();
    assert_eq!(posted.status, JournalStatus::Posted);

    // Posting twice fails; draft-only operations fail too.
    assert!(matches!(
        fx.repo.post(posted.id).await,
        Err(JournalError::Rule(CoreJournalError::NotDraft(_)))
    ));
    assert!(matches!(
        fx.repo.delete(posted.id).await,
        Err(JournalError::Rule(CoreJournalError::NotDraft(_)))
    ));
}

#[tokio::test]
async fn test_reverse_swaps_sides_and_links_back() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fx = fixture(&db).await;

    let created = fx
        .repo
        .create(input(&fx, balanced_items(fx.cash_node, fx.cash_node)))
        .await
        .unwrap();
    fx.repo.post(created.journal.id).await.unwrap();

    let reversal = fx.repo.reverse(created.journal.id, test_user()).await.unwrap();

    assert_eq!(reversal.journal.status, JournalStatus::Posted);
    assert_eq!(reversal.journal.reversal_of, Some(created.journal.id));
    assert_eq!(reversal.journal.journal_date, created.journal.journal_date);
    assert!(
        reversal
            .journal
            .description
            .as_deref()
            .unwrap()
            .contains("REV-1")
    );

    // Signs swapped line by line.
    assert_eq!(reversal.items[0].debit, dec!(0));
    assert_eq!(reversal.items[0].credit, dec!(250));
    assert_eq!(reversal.items[1].debit, dec!(250));
    assert!(
        reversal.items[0]
            .description
            .as_deref()
            .unwrap()
            .starts_with("Reversal")
    );
}

#[tokio::test]
async fn test_reverse_requires_posted() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fx = fixture(&db).await;

    let created = fx
        .repo
        .create(input(&fx, balanced_items(fx.cash_node, fx.cash_node)))
        .await
        .unwrap();

    let result = fx.repo.reverse(created.journal.id, test_user()).await;
    assert!(matches!(
        result,
        Err(JournalError::Rule(CoreJournalError::NotPosted(_)))
    ));
}

#[tokio::test]
async fn test_post_rederives_totals_from_rows() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fx = fixture(&db).await;

    let created = fx
        .repo
        .create(input(&fx, balanced_items(fx.cash_node, fx.cash_node)))
        .await
        .unwrap();

    // Knock the persisted rows out of balance behind the repository's back.
    use daftar_db::entities::journal_items;
    use sea_orm::{ActiveModelTrait, Set};
    let mut row: journal_items::ActiveModel = created.items[0].clone().into();
    row.debit = Set(dec!(300));
    row.update(&db).await.unwrap();

    let result = fx.repo.post(created.journal.id).await;
    assert!(matches!(
        result,
        Err(JournalError::Rule(CoreJournalError::Unbalanced { .. }))
    ));
}
