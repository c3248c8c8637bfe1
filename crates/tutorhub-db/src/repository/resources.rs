//! Generic resource document operations

use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::Row;
use tracing::debug;

use crate::error::DbError;
use crate::filter::ResourceFilter;
use crate::models::{Resource, ResourceKind, ResourceTotals};
use crate::repository::Database;

impl Database {
    // ==================== Resource Operations ====================

    /// List every document of a kind, oldest first
    pub async fn list_resources(&self, kind: ResourceKind) -> Result<Vec<Resource>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, kind, data, created_at, updated_at
            FROM resources
            WHERE kind = ?
            ORDER BY id
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Resource::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get one document
    pub async fn get_resource(
        &self,
        kind: ResourceKind,
        id: i64,
    ) -> Result<Option<Resource>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, kind, data, created_at, updated_at
            FROM resources
            WHERE kind = ? AND id = ?
            "#,
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| Resource::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Insert a new document
    pub async fn insert_resource(
        &self,
        kind: ResourceKind,
        data: Map<String, Value>,
    ) -> Result<Resource, DbError> {
        let now = Utc::now();
        let body = serde_json::to_string(&data)?;

        let result = sqlx::query(
            r#"
            INSERT INTO resources (kind, data, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(kind.as_str())
        .bind(body)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;

        let id: i64 = result.get("id");
        debug!("Inserted {} {}", kind, id);

        Ok(Resource {
            id,
            kind,
            data,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace a document's data
    pub async fn update_resource(
        &self,
        kind: ResourceKind,
        id: i64,
        data: Map<String, Value>,
    ) -> Result<Option<Resource>, DbError> {
        let now = Utc::now();
        let body = serde_json::to_string(&data)?;

        let result = sqlx::query(
            r#"
            UPDATE resources
            SET data = ?, updated_at = ?
            WHERE kind = ? AND id = ?
            "#,
        )
        .bind(body)
        .bind(now.to_rfc3339())
        .bind(kind.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_resource(kind, id).await
    }

    /// Set a single field of a document, keeping the rest
    pub async fn patch_resource(
        &self,
        kind: ResourceKind,
        id: i64,
        field: &str,
        value: Value,
    ) -> Result<Option<Resource>, DbError> {
        let Some(mut resource) = self.get_resource(kind, id).await? else {
            return Ok(None);
        };
        resource.data.insert(field.to_string(), value);
        self.update_resource(kind, id, resource.data).await
    }

    /// Delete a document
    pub async fn delete_resource(&self, kind: ResourceKind, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM resources WHERE kind = ? AND id = ?")
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List the documents of a kind matching every predicate of `filter`
    pub async fn filter_resources(
        &self,
        kind: ResourceKind,
        filter: &ResourceFilter,
    ) -> Result<Vec<Resource>, DbError> {
        let resources = self.list_resources(kind).await?;
        Ok(resources
            .into_iter()
            .filter(|r| filter.matches(&r.data))
            .collect())
    }

    /// Count the documents of a kind and sum one numeric field
    ///
    /// Documents where the field is missing or not a number count toward
    /// `count` but add nothing to `total`. Numeric strings are accepted.
    pub async fn resource_totals(
        &self,
        kind: ResourceKind,
        field: &str,
    ) -> Result<ResourceTotals, DbError> {
        let resources = self.list_resources(kind).await?;
        let total = resources
            .iter()
            .filter_map(|r| match r.data.get(field)? {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            })
            .sum();

        Ok(ResourceTotals {
            count: resources.len() as i64,
            total,
        })
    }
}
