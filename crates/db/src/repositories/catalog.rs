//! Catalog repository for chart-of-accounts hierarchy operations.

use daftar_core::catalog::{self, validate_parent};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{
    code_nodes, detail_links, journal_items, payments, receipts,
    sea_orm_active_enums::{AccountNature, CodeKind},
};

/// Error types for catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A hierarchy or format rule was violated.
    #[error(transparent)]
    Rule(#[from] daftar_core::catalog::CatalogError),

    /// Node not found.
    #[error("Node not found: {0}")]
    NotFound(Uuid),

    /// Parent node not found.
    #[error("Parent node not found: {0}")]
    ParentNotFound(Uuid),

    /// Parent node belongs to a different organization.
    #[error("Parent node belongs to a different organization")]
    ParentWrongOrganization,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a hierarchy node.
#[derive(Debug, Clone)]
pub struct CreateNodeInput {
    /// Organization ID.
    pub organization_id: Uuid,
    /// Account code, unique across the organization's node namespace.
    pub code: String,
    /// Display title.
    pub title: String,
    /// Hierarchy level.
    pub kind: catalog::CodeKind,
    /// Parent node, per the kind's parent rule.
    pub parent_id: Option<Uuid>,
    /// Natural balance side, when declared.
    pub nature: Option<catalog::AccountNature>,
}

/// Input for updating a hierarchy node.
#[derive(Debug, Clone, Default)]
pub struct UpdateNodeInput {
    /// New account code.
    pub code: Option<String>,
    /// New display title.
    pub title: Option<String>,
    /// New parent (outer `Some` = change, inner `None` = detach).
    pub parent_id: Option<Option<Uuid>>,
    /// Activation toggle.
    pub is_active: Option<bool>,
    /// New natural balance side.
    pub nature: Option<Option<catalog::AccountNature>>,
}

/// Filter options for listing nodes.
#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    /// Filter by hierarchy level.
    pub kind: Option<catalog::CodeKind>,
    /// Filter by parent node.
    pub parent_id: Option<Uuid>,
    /// Filter by activation state.
    pub is_active: Option<bool>,
}

/// Catalog repository for hierarchy node operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    db: DatabaseConnection,
}

impl CatalogRepository {
    /// Creates a new catalog repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a hierarchy node.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind/parent rule is violated, the code is
    /// already taken anywhere in the organization's node namespace, or the
    /// parent does not exist.
    pub async fn create_node(
        &self,
        input: CreateNodeInput,
    ) -> Result<code_nodes::Model, CatalogError> {
        let parent_kind = self
            .resolve_parent_kind(input.organization_id, input.parent_id)
            .await?;
        validate_parent(input.kind, parent_kind)?;

        self.ensure_code_free(input.organization_id, &input.code, None)
            .await?;

        let now = chrono::Utc::now().into();
        let node = code_nodes::ActiveModel {
            id: Set(Uuid::new_v4()),
            organization_id: Set(input.organization_id),
            parent_id: Set(input.parent_id),
            code: Set(input.code),
            title: Set(input.title),
            kind: Set(CodeKind::from(input.kind)),
            is_active: Set(true),
            nature: Set(input.nature.map(AccountNature::from)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        Ok(node)
    }

    /// Updates a hierarchy node, re-validating the parent rule against the
    /// next state.
    pub async fn update_node(
        &self,
        id: Uuid,
        input: UpdateNodeInput,
    ) -> Result<code_nodes::Model, CatalogError> {
        let node = self.get_node(id).await?;
        let kind = catalog::CodeKind::from(node.kind.clone());

        // The parent rule applies to the state after the change.
        let next_parent_id = input.parent_id.unwrap_or(node.parent_id);
        if next_parent_id != node.parent_id {
            let parent_kind = self
                .resolve_parent_kind(node.organization_id, next_parent_id)
                .await?;
            validate_parent(kind, parent_kind)?;
        }

        if let Some(code) = &input.code
            && *code != node.code
        {
            self.ensure_code_free(node.organization_id, code, Some(id))
                .await?;
        }

        let mut active: code_nodes::ActiveModel = node.into();
        if let Some(code) = input.code {
            active.code = Set(code);
        }
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(parent_id) = input.parent_id {
            active.parent_id = Set(parent_id);
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(nature) = input.nature {
            active.nature = Set(nature.map(AccountNature::from));
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a hierarchy node.
    ///
    /// Deletion of a node with descendants or existing references fails
    /// rather than cascading.
    pub async fn delete_node(&self, id: Uuid) -> Result<(), CatalogError> {
        let node = self.get_node(id).await?;
        let node_id = daftar_shared::types::CodeNodeId::from_uuid(id);

        let children = self.children_count(id).await?;
        if children > 0 {
            return Err(catalog::CatalogError::HasChildren(node_id).into());
        }

        if self.reference_count(id).await? > 0 {
            return Err(catalog::CatalogError::InUse {
                entity: "node",
                id: id.to_string(),
            }
            .into());
        }

        code_nodes::Entity::delete_by_id(node.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Fetches a node by id.
    pub async fn get_node(&self, id: Uuid) -> Result<code_nodes::Model, CatalogError> {
        code_nodes::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Lists nodes for an organization, code-ordered.
    pub async fn list_nodes(
        &self,
        organization_id: Uuid,
        filter: NodeFilter,
    ) -> Result<Vec<code_nodes::Model>, CatalogError> {
        let mut query = code_nodes::Entity::find()
            .filter(code_nodes::Column::OrganizationId.eq(organization_id));

        if let Some(kind) = filter.kind {
            query = query.filter(code_nodes::Column::Kind.eq(CodeKind::from(kind)));
        }
        if let Some(parent_id) = filter.parent_id {
            query = query.filter(code_nodes::Column::ParentId.eq(parent_id));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(code_nodes::Column::IsActive.eq(is_active));
        }

        Ok(query
            .order_by_asc(code_nodes::Column::Code)
            .all(&self.db)
            .await?)
    }

    /// Counts direct children of a node.
    pub async fn children_count(&self, id: Uuid) -> Result<u64, CatalogError> {
        Ok(code_nodes::Entity::find()
            .filter(code_nodes::Column::ParentId.eq(id))
            .count(&self.db)
            .await?)
    }

    async fn resolve_parent_kind(
        &self,
        organization_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Option<catalog::CodeKind>, CatalogError> {
        let Some(parent_id) = parent_id else {
            return Ok(None);
        };

        let parent = code_nodes::Entity::find_by_id(parent_id)
            .one(&self.db)
            .await?
            .ok_or(CatalogError::ParentNotFound(parent_id))?;

        if parent.organization_id != organization_id {
            return Err(CatalogError::ParentWrongOrganization);
        }

        Ok(Some(parent.kind.into()))
    }

    async fn ensure_code_free(
        &self,
        organization_id: Uuid,
        code: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), CatalogError> {
        let mut query = code_nodes::Entity::find()
            .filter(code_nodes::Column::OrganizationId.eq(organization_id))
            .filter(code_nodes::Column::Code.eq(code));
        if let Some(exclude) = exclude {
            query = query.filter(code_nodes::Column::Id.ne(exclude));
        }

        if query.count(&self.db).await? > 0 {
            return Err(catalog::CatalogError::DuplicateCode(code.to_string()).into());
        }
        Ok(())
    }

    /// Counts references to a node from journal items, detail links, and
    /// voucher special codes.
    async fn reference_count(&self, id: Uuid) -> Result<u64, CatalogError> {
        let items = journal_items::Entity::find()
            .filter(journal_items::Column::CodeNodeId.eq(id))
            .count(&self.db)
            .await?;
        let links = detail_links::Entity::find()
            .filter(detail_links::Column::CodeNodeId.eq(id))
            .count(&self.db)
            .await?;
        let receipt_refs = receipts::Entity::find()
            .filter(receipts::Column::SpecialCodeId.eq(id))
            .count(&self.db)
            .await?;
        let payment_refs = payments::Entity::find()
            .filter(payments::Column::SpecialCodeId.eq(id))
            .count(&self.db)
            .await?;

        Ok(items + links + receipt_refs + payment_refs)
    }
}
