//! Integration tests for the fiscal year repository and its exclusivity
//! invariant.

mod common;

use chrono::NaiveDate;
use daftar_db::repositories::{
    CreateFiscalYearInput, FiscalError, FiscalYearRepository, UpdateFiscalYearInput,
};

use common::{connect_or_skip, create_org};

fn year_input(org: uuid::Uuid, year: i32) -> CreateFiscalYearInput {
    CreateFiscalYearInput {
        organization_id: org,
        name: format!("FY{year}"),
        start_date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
    }
}

#[tokio::test]
async fn test_create_starts_closed() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let org = create_org(&db).await;
    let repo = FiscalYearRepository::new(db);

    let year = repo.create(year_input(org, 2024)).await.unwrap();
    assert!(year.is_closed);
}

#[tokio::test]
async fn test_invalid_date_range_rejected() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let org = create_org(&db).await;
    let repo = FiscalYearRepository::new(db);

    let result = repo
        .create(CreateFiscalYearInput {
            organization_id: org,
            name: "Backwards".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        })
        .await;
    assert!(matches!(result, Err(FiscalError::InvalidDateRange)));
}

#[tokio::test]
async fn test_open_closes_all_other_years() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let org = create_org(&db).await;
    let repo = FiscalYearRepository::new(db);

    let y2023 = repo.create(year_input(org, 2023)).await.unwrap();
    let y2024 = repo.create(year_input(org, 2024)).await.unwrap();

    repo.open(y2023.id).await.unwrap();
    repo.open(y2024.id).await.unwrap();

    let years = repo.list(org).await.unwrap();
    let open: Vec<_> = years.iter().filter(|y| !y.is_closed).collect();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, y2024.id);
}

#[tokio::test]
async fn test_open_next_rolls_forward_one_year() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let org = create_org(&db).await;
    let repo = FiscalYearRepository::new(db);

    let y2024 = repo.create(year_input(org, 2024)).await.unwrap();
    let next = repo.open_next(y2024.id).await.unwrap();

    assert_eq!(next.start_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    assert_eq!(next.end_date, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    assert!(!next.is_closed);
}

#[tokio::test]
async fn test_open_next_requires_closed_source() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let org = create_org(&db).await;
    let repo = FiscalYearRepository::new(db);

    let y2024 = repo.create(year_input(org, 2024)).await.unwrap();
    let opened = repo.open(y2024.id).await.unwrap();

    let result = repo.open_next(opened.id).await;
    assert!(matches!(result, Err(FiscalError::MustBeClosed(_))));
}

#[tokio::test]
async fn test_open_next_duplicate_range_rejected() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let org = create_org(&db).await;
    let repo = FiscalYearRepository::new(db);

    let y2024 = repo.create(year_input(org, 2024)).await.unwrap();
    repo.create(year_input(org, 2025)).await.unwrap();

    let result = repo.open_next(y2024.id).await;
    assert!(matches!(result, Err(FiscalError::DuplicateRange(_))));
}

#[tokio::test]
async fn test_delete_open_year_reopens_previous() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let org = create_org(&db).await;
    let repo = FiscalYearRepository::new(db);

    let y2023 = repo.create(year_input(org, 2023)).await.unwrap();
    let y2024 = repo.create(year_input(org, 2024)).await.unwrap();
    repo.open(y2024.id).await.unwrap();

    repo.delete(y2024.id).await.unwrap();

    let years = repo.list(org).await.unwrap();
    assert_eq!(years.len(), 1);
    assert_eq!(years[0].id, y2023.id);
    assert!(!years[0].is_closed, "previous year becomes the open one");
}

#[tokio::test]
async fn test_update_dates_allowed_without_documents() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let org = create_org(&db).await;
    let repo = FiscalYearRepository::new(db);

    let year = repo.create(year_input(org, 2026)).await.unwrap();
    let updated = repo
        .update(
            year.id,
            UpdateFiscalYearInput {
                end_date: NaiveDate::from_ymd_opt(2026, 6, 30),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        updated.end_date,
        NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()
    );
}
