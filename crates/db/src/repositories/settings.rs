//! Settings repository: the per-organization key-value store.
//!
//! Consumed by the posting engine's code-resolution chain (tier 2) and by
//! detail numbering offsets. A stored value is either a structured code
//! reference (`{"code_id": "..."}`) or a raw JSON value.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set,
};
use serde_json::Value;
use uuid::Uuid;

use crate::entities::settings;

/// Error types for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A decoded setting value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    /// A chart-of-accounts code reference.
    Code(Uuid),
    /// Any other JSON value.
    Raw(Value),
}

impl SettingValue {
    /// Decodes the stored JSON shape.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        if let Some(code) = value
            .get("code_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
        {
            Self::Code(code)
        } else {
            Self::Raw(value.clone())
        }
    }

    /// Returns the code reference, if this is one.
    #[must_use]
    pub const fn as_code(&self) -> Option<Uuid> {
        match self {
            Self::Code(id) => Some(*id),
            Self::Raw(_) => None,
        }
    }
}

/// Settings repository.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    db: DatabaseConnection,
}

impl SettingsRepository {
    /// Creates a new settings repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetches a setting by name.
    pub async fn get(
        &self,
        organization_id: Uuid,
        name: &str,
    ) -> Result<Option<SettingValue>, SettingsError> {
        get_on(&self.db, organization_id, name).await
    }

    /// Upserts a setting.
    pub async fn put(
        &self,
        organization_id: Uuid,
        name: &str,
        value: Value,
    ) -> Result<settings::Model, SettingsError> {
        let existing = settings::Entity::find()
            .filter(settings::Column::OrganizationId.eq(organization_id))
            .filter(settings::Column::Name.eq(name))
            .one(&self.db)
            .await?;

        let now = chrono::Utc::now().into();
        let model = if let Some(existing) = existing {
            let mut active: settings::ActiveModel = existing.into();
            active.value = Set(value);
            active.updated_at = Set(now);
            active.update(&self.db).await?
        } else {
            settings::ActiveModel {
                id: Set(Uuid::new_v4()),
                organization_id: Set(organization_id),
                name: Set(name.to_string()),
                value: Set(value),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&self.db)
            .await?
        };

        Ok(model)
    }

    /// Upserts a code-reference setting.
    pub async fn put_code_ref(
        &self,
        organization_id: Uuid,
        name: &str,
        code_id: Uuid,
    ) -> Result<settings::Model, SettingsError> {
        self.put(
            organization_id,
            name,
            serde_json::json!({ "code_id": code_id }),
        )
        .await
    }
}

/// Fetches and decodes a setting on any connection (plain or transaction).
pub(crate) async fn get_on<C: ConnectionTrait>(
    conn: &C,
    organization_id: Uuid,
    name: &str,
) -> Result<Option<SettingValue>, SettingsError> {
    let setting = settings::Entity::find()
        .filter(settings::Column::OrganizationId.eq(organization_id))
        .filter(settings::Column::Name.eq(name))
        .one(conn)
        .await?;

    Ok(setting.map(|s| SettingValue::from_json(&s.value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_ref_decoding() {
        let id = Uuid::new_v4();
        let value = serde_json::json!({ "code_id": id });
        assert_eq!(SettingValue::from_json(&value), SettingValue::Code(id));
        assert_eq!(SettingValue::from_json(&value).as_code(), Some(id));
    }

    #[test]
    fn test_raw_decoding() {
        let value = serde_json::json!({ "offset": 6001 });
        let decoded = SettingValue::from_json(&value);
        assert!(matches!(decoded, SettingValue::Raw(_)));
        assert_eq!(decoded.as_code(), None);
    }

    #[test]
    fn test_malformed_code_ref_is_raw() {
        let value = serde_json::json!({ "code_id": "not-a-uuid" });
        assert!(matches!(
            SettingValue::from_json(&value),
            SettingValue::Raw(_)
        ));
    }
}
