//! Integration tests for the chart-of-accounts hierarchy and the detail
//! catalogue.

mod common;

use daftar_core::catalog::{CatalogError as CoreCatalogError, CodeKind};
use daftar_db::repositories::{
    CatalogError, CatalogRepository, CreateDetailInput, CreateNodeInput, DetailError,
    DetailRepository, TreasuryRepository, UpdateDetailInput,
};
use daftar_shared::config::NumberingConfig;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use common::{connect_or_skip, create_org};

fn node_input(org: Uuid, code: &str, kind: CodeKind, parent: Option<Uuid>) -> CreateNodeInput {
    CreateNodeInput {
        organization_id: org,
        code: code.to_string(),
        title: format!("Node {code}"),
        kind,
        parent_id: parent,
        nature: None,
    }
}

async fn catalog(db: &DatabaseConnection) -> (CatalogRepository, Uuid) {
    let org = create_org(db).await;
    (CatalogRepository::new(db.clone()), org)
}

#[tokio::test]
async fn test_hierarchy_parent_rules() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let (repo, org) = catalog(&db).await;

    let group = repo
        .create_node(node_input(org, "1", CodeKind::Group, None))
        .await
        .unwrap();
    let general = repo
        .create_node(node_input(org, "11", CodeKind::General, Some(group.id)))
        .await
        .unwrap();
    repo.create_node(node_input(org, "1101", CodeKind::Specific, Some(general.id)))
        .await
        .unwrap();

    // A general without a group parent is rejected.
    let result = repo
        .create_node(node_input(org, "12", CodeKind::General, None))
        .await;
    assert!(matches!(
        result,
        Err(CatalogError::Rule(CoreCatalogError::InvalidParent { .. }))
    ));

    // A specific under a group (skipping the general level) is rejected.
    let result = repo
        .create_node(node_input(org, "1201", CodeKind::Specific, Some(group.id)))
        .await;
    assert!(matches!(
        result,
        Err(CatalogError::Rule(CoreCatalogError::InvalidParent { .. }))
    ));
}

#[tokio::test]
async fn test_code_namespace_is_global_across_kinds() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let (repo, org) = catalog(&db).await;

    let group = repo
        .create_node(node_input(org, "1", CodeKind::Group, None))
        .await
        .unwrap();

    // Same code on a different kind still collides.
    let result = repo
        .create_node(node_input(org, "1", CodeKind::General, Some(group.id)))
        .await;
    assert!(matches!(
        result,
        Err(CatalogError::Rule(CoreCatalogError::DuplicateCode(_)))
    ));
}

#[tokio::test]
async fn test_delete_node_with_children_fails() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let (repo, org) = catalog(&db).await;

    let group = repo
        .create_node(node_input(org, "1", CodeKind::Group, None))
        .await
        .unwrap();
    repo.create_node(node_input(org, "11", CodeKind::General, Some(group.id)))
        .await
        .unwrap();

    let result = repo.delete_node(group.id).await;
    assert!(matches!(
        result,
        Err(CatalogError::Rule(CoreCatalogError::HasChildren(_)))
    ));
}

#[tokio::test]
async fn test_detail_code_format_and_suggestion() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let org = create_org(&db).await;
    let repo = DetailRepository::new(db.clone());

    // Malformed codes are rejected.
    for bad in ["123", "12345", "12a4"] {
        let result = repo
            .create_detail(CreateDetailInput {
                organization_id: org,
                code: bad.to_string(),
                title: "Bad".to_string(),
            })
            .await;
        assert!(matches!(
            result,
            Err(DetailError::Rule(CoreCatalogError::InvalidDetailCode(_)))
        ));
    }

    repo.create_detail(CreateDetailInput {
        organization_id: org,
        code: "0001".to_string(),
        title: "First".to_string(),
    })
    .await
    .unwrap();
    repo.create_detail(CreateDetailInput {
        organization_id: org,
        code: "0002".to_string(),
        title: "Second".to_string(),
    })
    .await
    .unwrap();

    assert_eq!(repo.suggest_next_code(org).await.unwrap(), "0003");
}

#[tokio::test]
async fn test_link_detail_requires_leaf() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let (nodes, org) = catalog(&db).await;
    let details = DetailRepository::new(db.clone());

    let group = nodes
        .create_node(node_input(org, "1", CodeKind::Group, None))
        .await
        .unwrap();
    let general = nodes
        .create_node(node_input(org, "11", CodeKind::General, Some(group.id)))
        .await
        .unwrap();
    let specific = nodes
        .create_node(node_input(org, "1101", CodeKind::Specific, Some(general.id)))
        .await
        .unwrap();

    let detail = details
        .create_detail(CreateDetailInput {
            organization_id: org,
            code: "0001".to_string(),
            title: "Counterparty".to_string(),
        })
        .await
        .unwrap();

    // Leaf link succeeds; a node with children is rejected.
    details
        .link_detail(detail.id, specific.id, true, 0)
        .await
        .unwrap();
    let result = details.link_detail(detail.id, group.id, false, 1).await;
    assert!(matches!(
        result,
        Err(DetailError::Rule(CoreCatalogError::MustBeLeaf(_)))
    ));
}

#[tokio::test]
async fn test_system_managed_detail_rejects_generic_mutation() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let org = create_org(&db).await;

    let treasury = TreasuryRepository::new(db.clone(), NumberingConfig::default());
    let (_, handler) = treasury
        .create_cashbox(daftar_db::repositories::CreateCashboxInput {
            organization_id: org,
            name: "Front desk".to_string(),
            starting_amount: dec!(0),
            starting_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        })
        .await
        .unwrap();

    let details = DetailRepository::new(db.clone());
    let result = details
        .update_detail(
            handler.id,
            UpdateDetailInput {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(
        result,
        Err(DetailError::Rule(CoreCatalogError::SystemManaged(_)))
    ));

    let result = details.delete_detail(handler.id).await;
    assert!(matches!(
        result,
        Err(DetailError::Rule(CoreCatalogError::SystemManaged(_)))
    ));
}

#[tokio::test]
async fn test_cashbox_code_mirrors_detail_and_uses_offset() {
    let Some(db) = connect_or_skip().await else {
        return;
    };
    let org = create_org(&db).await;

    let numbering = NumberingConfig::default();
    let treasury = TreasuryRepository::new(db.clone(), numbering.clone());
    let (cashbox, handler) = treasury
        .create_cashbox(daftar_db::repositories::CreateCashboxInput {
            organization_id: org,
            name: "Front desk".to_string(),
            starting_amount: dec!(100),
            starting_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        })
        .await
        .unwrap();

    assert_eq!(cashbox.code, handler.code);
    assert_eq!(cashbox.code, format!("{:04}", numbering.cashbox_offset));

    // Renaming cascades to the detail title.
    treasury.rename_cashbox(cashbox.id, "Back office").await.unwrap();
    let details = DetailRepository::new(db.clone());
    let renamed = details.get_detail(handler.id).await.unwrap();
    assert_eq!(renamed.title, "Back office");
}
