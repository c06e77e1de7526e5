//! Integration tests for the posting engine: receipts and payments
//! compiled into balanced journals.

mod common;

use chrono::NaiveDate;
use daftar_core::posting::{InstrumentType, PostingError as CorePostingError};
use daftar_db::entities::sea_orm_active_enums::{CheckStatus, JournalStatus, VoucherStatus};
use daftar_db::repositories::{
    CheckbookRepository, CreateCashboxInput, PostingError, PostingRepository, ReceiptRepository,
    RecordIncomingCheckInput, SaveReceiptInput, SaveVoucherItemInput, TreasuryRepository,
};
use daftar_shared::config::{NumberingConfig, PostingOverrides};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use common::{connect_or_skip, create_detail, create_open_year, create_org, seed_chart, test_user};

struct Fixture {
    org: Uuid,
    year: Uuid,
    cashbox: Uuid,
    cashbox_detail: Uuid,
    counterparty: Uuid,
    receipts: ReceiptRepository,
    checkbooks: CheckbookRepository,
    posting: PostingRepository,
}

async fn fixture(db: &DatabaseConnection) -> Fixture {
    let org = create_org(db).await;
    seed_chart(db, org).await;
    let year = create_open_year(db, org, 2024).await;
    let counterparty = create_detail(db, org, "0001").await;

    let treasury = TreasuryRepository::new(db.clone(), NumberingConfig::default());
    let (cashbox, cashbox_detail) = treasury
        .create_cashbox(CreateCashboxInput {
            organization_id: org,
            name: "Front desk".to_string(),
            starting_amount: dec!(0),
            starting_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        })
        .await
        .unwrap();

    Fixture {
        org,
        year,
        cashbox: cashbox.id,
        cashbox_detail: cashbox_detail.id,
        counterparty,
        receipts: ReceiptRepository::new(db.clone()),
        checkbooks: CheckbookRepository::new(db.clone()),
        posting: PostingRepository::new(db.clone(), PostingOverrides::default()),
    }
}

fn receipt_input(fx: &Fixture, total: Decimal, items: Vec<SaveVoucherItemInput>) -> SaveReceiptInput {
    SaveReceiptInput {
        organization_id: fx.org,
        receipt_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
        fiscal_year_id: fx.year,
        detail_id: fx.counterparty,
        special_code_id: None,
        cashbox_id: Some(fx.cashbox),
        total_amount: total,
        description: Some("April sales".to_string()),
        items,
        created_by: test_user(),
    }
}

fn cash_item(amount: Decimal) -> SaveVoucherItemInput {
    SaveVoucherItemInput {
        instrument: InstrumentType::Cash,
        amount,
        bank_account_id: None,
        card_reader_id: None,
        check_id: None,
        reference: None,
        position: 0,
    }
}

#[tokio::test]
async fn test_post_receipt_builds_balanced_journal() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fx = fixture(&db).await;

    let check = fx
        .checkbooks
        .record_incoming_check(RecordIncomingCheckInput {
            organization_id: fx.org,
            number: 42,
            amount: dec!(50),
            issue_date: NaiveDate::from_ymd_opt(2024, 3, 20).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 4, 20).unwrap(),
            beneficiary_detail_id: Some(fx.counterparty),
        })
        .await
        .unwrap();

    let items = vec![
        cash_item(dec!(100)),
        SaveVoucherItemInput {
            instrument: InstrumentType::Check,
            amount: dec!(50),
            bank_account_id: None,
            card_reader_id: None,
            check_id: Some(check.id),
            reference: None,
            position: 1,
        },
    ];
    let saved = fx
        .receipts
        .create(receipt_input(&fx, dec!(150), items))
        .await
        .unwrap();

    let outcome = fx
        .posting
        .post_receipt(saved.receipt.id, test_user())
        .await
        .unwrap();

    // Three lines: debit cash 100, debit check 50, credit counterparty 150.
    assert_eq!(outcome.journal.items.len(), 3);
    let debits: Decimal = outcome.journal.items.iter().map(|i| i.debit).sum();
    let credits: Decimal = outcome.journal.items.iter().map(|i| i.credit).sum();
    assert_eq!(debits, dec!(150));
    assert_eq!(credits, dec!(150));

    assert_eq!(outcome.journal.items[0].debit, dec!(100));
    assert_eq!(
        outcome.journal.items[0].detail_id,
        Some(fx.cashbox_detail),
        "cash line carries the cashbox handler detail"
    );
    assert_eq!(outcome.journal.items[1].debit, dec!(50));
    assert_eq!(outcome.journal.items[2].credit, dec!(150));
    assert_eq!(outcome.journal.items[2].detail_id, Some(fx.counterparty));

    assert_eq!(outcome.journal.journal.status, JournalStatus::Draft);

    // Header stamped and advanced; check deposited.
    let header = fx.receipts.get_with_items(saved.receipt.id).await.unwrap();
    assert_eq!(header.receipt.status, VoucherStatus::Sent);
    assert_eq!(header.receipt.journal_id, Some(outcome.journal.journal.id));

    let check = fx.checkbooks.get_check(check.id).await.unwrap();
    assert_eq!(check.status, CheckStatus::InCashbox);
}

#[tokio::test]
async fn test_total_mismatch_writes_nothing() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fx = fixture(&db).await;

    let saved = fx
        .receipts
        .create(receipt_input(
            &fx,
            dec!(150),
            vec![cash_item(dec!(100)), cash_item(dec!(40))],
        ))
        .await
        .unwrap();

    let result = fx.posting.post_receipt(saved.receipt.id, test_user()).await;
    assert!(matches!(
        result,
        Err(PostingError::Rule(CorePostingError::TotalMismatch { .. }))
    ));

    let header = fx.receipts.get_with_items(saved.receipt.id).await.unwrap();
    assert_eq!(header.receipt.status, VoucherStatus::Draft);
    assert_eq!(header.receipt.journal_id, None);
}

#[tokio::test]
async fn test_post_twice_rejected() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fx = fixture(&db).await;

    let saved = fx
        .receipts
        .create(receipt_input(&fx, dec!(100), vec![cash_item(dec!(100))]))
        .await
        .unwrap();

    fx.posting
        .post_receipt(saved.receipt.id, test_user())
        .await
        .unwrap();
    let result = fx.posting.post_receipt(saved.receipt.id, test_user()).await;
    assert!(matches!(
        result,
        Err(PostingError::Rule(CorePostingError::AlreadyPosted(_)))
    ));
}

#[tokio::test]
async fn test_missing_items_rejected() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let fx = fixture(&db).await;

    let saved = fx
        .receipts
        .create(receipt_input(&fx, dec!(0), vec![]))
        .await
        .unwrap();

    let result = fx.posting.post_receipt(saved.receipt.id, test_user()).await;
    assert!(matches!(
        result,
        Err(PostingError::Rule(CorePostingError::MissingItems))
    ));
}

#[tokio::test]
async fn test_missing_code_mapping_without_chart() {
    let Some(db) = connect_or_skip().await else {
        return;
    };

    // An organization with no chart at all: every resolution tier fails.
    let org = create_org(&db).await;
    let year = create_open_year(&db, org, 2024).await;
    let counterparty = create_detail(&db, org, "0001").await;

    let treasury = TreasuryRepository::new(db.clone(), NumberingConfig::default());
    let (cashbox, _) = treasury
        .create_cashbox(CreateCashboxInput {
            organization_id: org,
            name: "Bare".to_string(),
            starting_amount: dec!(0),
            starting_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        })
        .await
        .unwrap();

    let receipts = ReceiptRepository::new(db.clone());
    let posting = PostingRepository::new(db.clone(), PostingOverrides::default());

    let saved = receipts
        .create(SaveReceiptInput {
            organization_id: org,
            receipt_date: NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
            fiscal_year_id: year,
            detail_id: counterparty,
            special_code_id: None,
            cashbox_id: Some(cashbox.id),
            total_amount: dec!(10),
            description: None,
            items: vec![cash_item(dec!(10))],
            created_by: test_user(),
        })
        .await
        .unwrap();

    let result = posting.post_receipt(saved.receipt.id, test_user()).await;
    assert!(matches!(
        result,
        Err(PostingError::Rule(CorePostingError::MissingCodeMapping(_)))
    ));
}
