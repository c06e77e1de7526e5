//! Detail repository for the global four-digit catalogue.
//!
//! System-managed details (instrument handlers) reject mutation through this
//! API; the treasury repository owns their lifecycle.

use std::collections::HashSet;

use daftar_core::catalog::{
    self, next_free_code, validate_detail_code, validate_link_target,
};
use daftar_shared::types::{CodeNodeId, DetailId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{
    bank_accounts, card_readers, cashboxes, checks, code_nodes, detail_links, details,
    journal_items, payments, receipts,
    sea_orm_active_enums::DetailKind,
};

/// Error types for detail operations.
#[derive(Debug, thiserror::Error)]
pub enum DetailError {
    /// A catalogue rule was violated.
    #[error(transparent)]
    Rule(#[from] catalog::CatalogError),

    /// Detail not found.
    #[error("Detail not found: {0}")]
    NotFound(Uuid),

    /// Node not found.
    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a detail.
#[derive(Debug, Clone)]
pub struct CreateDetailInput {
    /// Organization ID.
    pub organization_id: Uuid,
    /// Four-digit code, unique per organization.
    pub code: String,
    /// Display title.
    pub title: String,
}

/// Input for updating a detail.
#[derive(Debug, Clone, Default)]
pub struct UpdateDetailInput {
    /// New code.
    pub code: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// Activation toggle.
    pub is_active: Option<bool>,
}

/// Detail repository.
#[derive(Debug, Clone)]
pub struct DetailRepository {
    db: DatabaseConnection,
}

impl DetailRepository {
    /// Creates a new detail repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a user-defined detail.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is not exactly four digits or is
    /// already taken in the organization.
    pub async fn create_detail(
        &self,
        input: CreateDetailInput,
    ) -> Result<details::Model, DetailError> {
        validate_detail_code(&input.code)?;
        self.ensure_code_free(input.organization_id, &input.code, None)
            .await?;

        Ok(insert_detail(
            &self.db,
            input.organization_id,
            &input.code,
            &input.title,
            DetailKind::UserDefined,
        )
        .await?)
    }

    /// Updates a user-defined detail.
    ///
    /// System-managed details are rejected; only the owning treasury
    /// subsystem may mutate them.
    pub async fn update_detail(
        &self,
        id: Uuid,
        input: UpdateDetailInput,
    ) -> Result<details::Model, DetailError> {
        let detail = self.get_detail(id).await?;
        if detail.kind == DetailKind::SystemManaged {
            return Err(catalog::CatalogError::SystemManaged(DetailId::from_uuid(id)).into());
        }

        if let Some(code) = &input.code
            && *code != detail.code
        {
            validate_detail_code(code)?;
            self.ensure_code_free(detail.organization_id, code, Some(id))
                .await?;
        }

        let mut active: details::ActiveModel = detail.into();
        if let Some(code) = input.code {
            active.code = Set(code);
        }
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a user-defined detail.
    ///
    /// Fails when the detail is referenced by journal items, vouchers, or
    /// checks; the detail's own node links are removed with it.
    pub async fn delete_detail(&self, id: Uuid) -> Result<(), DetailError> {
        let detail = self.get_detail(id).await?;
        if detail.kind == DetailKind::SystemManaged {
            return Err(catalog::CatalogError::SystemManaged(DetailId::from_uuid(id)).into());
        }

        if reference_count(&self.db, id).await? > 0 {
            return Err(catalog::CatalogError::InUse {
                entity: "detail",
                id: id.to_string(),
            }
            .into());
        }

        detail_links::Entity::delete_many()
            .filter(detail_links::Column::DetailId.eq(id))
            .exec(&self.db)
            .await?;
        details::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    /// Returns the smallest unused four-digit code in `0001..=9999`.
    pub async fn suggest_next_code(&self, organization_id: Uuid) -> Result<String, DetailError> {
        let used = used_codes(&self.db, organization_id).await?;
        Ok(next_free_code(&used, 1)?)
    }

    /// Links a detail to a leaf hierarchy node.
    ///
    /// # Errors
    ///
    /// Returns `MustBeLeaf` when the node has children.
    pub async fn link_detail(
        &self,
        detail_id: Uuid,
        node_id: Uuid,
        is_primary: bool,
        position: i32,
    ) -> Result<detail_links::Model, DetailError> {
        self.get_detail(detail_id).await?;
        let node = code_nodes::Entity::find_by_id(node_id)
            .one(&self.db)
            .await?
            .ok_or(DetailError::NodeNotFound(node_id))?;

        let children = code_nodes::Entity::find()
            .filter(code_nodes::Column::ParentId.eq(node.id))
            .count(&self.db)
            .await?;
        validate_link_target(CodeNodeId::from_uuid(node_id), children)?;

        let link = detail_links::ActiveModel {
            id: Set(Uuid::new_v4()),
            detail_id: Set(detail_id),
            code_node_id: Set(node_id),
            is_primary: Set(is_primary),
            position: Set(position),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await?;

        Ok(link)
    }

    /// Removes a detail-to-node link.
    pub async fn unlink_detail(&self, detail_id: Uuid, node_id: Uuid) -> Result<(), DetailError> {
        detail_links::Entity::delete_many()
            .filter(detail_links::Column::DetailId.eq(detail_id))
            .filter(detail_links::Column::CodeNodeId.eq(node_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Fetches a detail by id.
    pub async fn get_detail(&self, id: Uuid) -> Result<details::Model, DetailError> {
        details::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DetailError::NotFound(id))
    }

    /// Lists details for an organization, code-ordered.
    pub async fn list_details(
        &self,
        organization_id: Uuid,
        kind: Option<catalog::DetailKind>,
    ) -> Result<Vec<details::Model>, DetailError> {
        let mut query = details::Entity::find()
            .filter(details::Column::OrganizationId.eq(organization_id));
        if let Some(kind) = kind {
            query = query.filter(details::Column::Kind.eq(DetailKind::from(kind)));
        }

        Ok(query
            .order_by_asc(details::Column::Code)
            .all(&self.db)
            .await?)
    }

    async fn ensure_code_free(
        &self,
        organization_id: Uuid,
        code: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), DetailError> {
        let mut query = details::Entity::find()
            .filter(details::Column::OrganizationId.eq(organization_id))
            .filter(details::Column::Code.eq(code));
        if let Some(exclude) = exclude {
            query = query.filter(details::Column::Id.ne(exclude));
        }

        if query.count(&self.db).await? > 0 {
            return Err(catalog::CatalogError::DuplicateDetailCode(code.to_string()).into());
        }
        Ok(())
    }
}

/// Loads the numeric values of all detail codes in an organization.
pub(crate) async fn used_codes<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
) -> Result<HashSet<u16>, DbErr> {
    let rows = details::Entity::find()
        .filter(details::Column::OrganizationId.eq(organization_id))
        .all(conn)
        .await?;

    Ok(rows
        .iter()
        .filter_map(|d| d.code.trim().parse::<u16>().ok())
        .collect())
}

/// Inserts a detail row on any connection (plain or transaction).
pub(crate) async fn insert_detail<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
    code: &str,
    title: &str,
    kind: DetailKind,
) -> Result<details::Model, DbErr> {
    let now = chrono::Utc::now().into();
    details::ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(organization_id),
        code: Set(code.to_string()),
        title: Set(title.to_string()),
        is_active: Set(true),
        kind: Set(kind),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(conn)
    .await
}

/// Counts references to a detail from journal items, voucher headers,
/// checks, and instrument handlers.
pub(crate) async fn reference_count<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<u64, DbErr> {
    let items = journal_items::Entity::find()
        .filter(journal_items::Column::DetailId.eq(id))
        .count(conn)
        .await?;
    let receipt_refs = receipts::Entity::find()
        .filter(receipts::Column::DetailId.eq(id))
        .count(conn)
        .await?;
    let payment_refs = payments::Entity::find()
        .filter(payments::Column::DetailId.eq(id))
        .count(conn)
        .await?;
    let check_refs = checks::Entity::find()
        .filter(checks::Column::BeneficiaryDetailId.eq(id))
        .count(conn)
        .await?;
    let account_refs = bank_accounts::Entity::find()
        .filter(bank_accounts::Column::HandlerDetailId.eq(id))
        .count(conn)
        .await?;
    let reader_refs = card_readers::Entity::find()
        .filter(card_readers::Column::HandlerDetailId.eq(id))
        .count(conn)
        .await?;
    let cashbox_refs = cashboxes::Entity::find()
        .filter(cashboxes::Column::HandlerDetailId.eq(id))
        .count(conn)
        .await?;

    Ok(items + receipt_refs + payment_refs + check_refs + account_refs + reader_refs + cashbox_refs)
}
