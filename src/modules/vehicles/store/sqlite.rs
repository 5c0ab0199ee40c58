use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::RecordSource;
use crate::modules::vehicles::error::{CatalogError, CatalogResult};
use crate::modules::vehicles::models::{
    timestamp_now, Make, MakeId, MakeInput, ModelId, ModelInput, ModelWithMake,
};
use crate::modules::vehicles::query::ModelFilter;

const MODEL_SELECT: &str = "SELECT m.id, m.make_id, m.name, m.abrv, m.created_at, \
     k.name AS make_name, k.abrv AS make_abrv, k.created_at AS make_created_at \
     FROM vehicle_models m JOIN vehicle_makes k ON k.id = m.make_id";

#[derive(Debug, sqlx::FromRow)]
struct ModelRow {
    id: ModelId,
    make_id: MakeId,
    name: String,
    abrv: String,
    created_at: String,
    make_name: String,
    make_abrv: String,
    make_created_at: String,
}

impl From<ModelRow> for ModelWithMake {
    fn from(row: ModelRow) -> Self {
        ModelWithMake {
            id: row.id,
            make_id: row.make_id,
            name: row.name,
            abrv: row.abrv,
            created_at: row.created_at,
            make: Make {
                id: row.make_id,
                name: row.make_name,
                abrv: row.make_abrv,
                created_at: row.make_created_at,
            },
        }
    }
}

/// Record source over the `vehicle_makes` / `vehicle_models` tables.
///
/// Expects the `vehicles` migrations to have run and foreign keys to be on.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_foreign_key_violation())
}

#[async_trait]
impl RecordSource for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn makes(&self) -> CatalogResult<Vec<Make>> {
        let makes = sqlx::query_as::<_, Make>(
            "SELECT id, name, abrv, created_at FROM vehicle_makes ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(makes)
    }

    async fn make(&self, id: MakeId) -> CatalogResult<Option<Make>> {
        let make = sqlx::query_as::<_, Make>(
            "SELECT id, name, abrv, created_at FROM vehicle_makes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(make)
    }

    async fn insert_make(&self, input: &MakeInput) -> CatalogResult<Make> {
        let make = sqlx::query_as::<_, Make>(
            "INSERT INTO vehicle_makes (name, abrv, created_at) VALUES (?, ?, ?) \
             RETURNING id, name, abrv, created_at",
        )
        .bind(&input.name)
        .bind(&input.abrv)
        .bind(timestamp_now())
        .fetch_one(&self.pool)
        .await?;
        Ok(make)
    }

    async fn delete_make(&self, id: MakeId) -> CatalogResult<bool> {
        let result = sqlx::query("DELETE FROM vehicle_makes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn model_rows(&self, filter: &ModelFilter) -> CatalogResult<Vec<ModelWithMake>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(MODEL_SELECT);
        // Only the make narrows in SQL; search matching needs Unicode case folding.
        if let Some(make_id) = filter.make_id() {
            query.push(" WHERE m.make_id = ").push_bind(make_id);
        }
        query.push(" ORDER BY m.id");

        let rows: Vec<ModelRow> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ModelWithMake::from).collect())
    }

    async fn model_row(&self, id: ModelId) -> CatalogResult<Option<ModelWithMake>> {
        let row = sqlx::query_as::<_, ModelRow>(&format!("{MODEL_SELECT} WHERE m.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ModelWithMake::from))
    }

    async fn insert_model(&self, input: &ModelInput) -> CatalogResult<ModelWithMake> {
        let inserted: Result<(ModelId,), sqlx::Error> = sqlx::query_as(
            "INSERT INTO vehicle_models (make_id, name, abrv, created_at) VALUES (?, ?, ?, ?) \
             RETURNING id",
        )
        .bind(input.make_id)
        .bind(&input.name)
        .bind(&input.abrv)
        .bind(timestamp_now())
        .fetch_one(&self.pool)
        .await;

        let (id,) = match inserted {
            Ok(row) => row,
            Err(err) if foreign_key_violation(&err) => {
                return Err(CatalogError::unknown_make(input.make_id))
            }
            Err(err) => return Err(err.into()),
        };

        self.model_row(id)
            .await?
            .ok_or_else(|| CatalogError::store(format!("model {id} vanished after insert")))
    }

    async fn update_model(
        &self,
        id: ModelId,
        input: &ModelInput,
    ) -> CatalogResult<Option<ModelWithMake>> {
        let updated = sqlx::query(
            "UPDATE vehicle_models SET make_id = ?, name = ?, abrv = ? WHERE id = ?",
        )
        .bind(input.make_id)
        .bind(&input.name)
        .bind(&input.abrv)
        .bind(id)
        .execute(&self.pool)
        .await;

        match updated {
            Ok(result) if result.rows_affected() == 0 => Ok(None),
            Ok(_) => self.model_row(id).await,
            Err(err) if foreign_key_violation(&err) => Err(CatalogError::unknown_make(input.make_id)),
            Err(err) => Err(err.into()),
        }
    }

    async fn delete_model(&self, id: ModelId) -> CatalogResult<bool> {
        let result = sqlx::query("DELETE FROM vehicle_models WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
