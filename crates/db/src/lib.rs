//! SQLite pool factory and migration runner.

use std::str::FromStr;

use anyhow::Context;
use motorpool_kernel::settings::DatabaseSettings;
use motorpool_kernel::Migration;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const LEDGER_TABLE: &str = "_motorpool_migrations";

/// Open a pool against the configured database, creating the file if missing.
///
/// Foreign keys are enforced on every connection so parent deletes cascade.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&settings.url)
        .with_context(|| format!("invalid database url '{}'", settings.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("failed to connect to '{}'", settings.url))?;

    tracing::info!(target: "motorpool-db", url = %settings.url, "database pool ready");
    Ok(pool)
}

/// Single-connection in-memory pool; every connection to `sqlite::memory:` is a
/// separate database, so the pool is pinned to one.
pub async fn connect_in_memory() -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .with_context(|| "invalid in-memory database url")?
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .with_context(|| "failed to open in-memory database")
}

/// Apply every migration not yet recorded in the ledger, in the given order.
///
/// Returns the number of migrations applied by this call.
pub async fn run_migrations(
    pool: &SqlitePool,
    migrations: &[(String, Migration)],
) -> anyhow::Result<usize> {
    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {LEDGER_TABLE} (
            module TEXT NOT NULL,
            id TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (module, id)
        )"
    ))
    .execute(pool)
    .await
    .with_context(|| "failed to create migration ledger")?;

    let mut applied = 0;
    for (module, migration) in migrations {
        let seen: Option<(String,)> = sqlx::query_as(&format!(
            "SELECT id FROM {LEDGER_TABLE} WHERE module = ? AND id = ?"
        ))
        .bind(module)
        .bind(migration.id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to read ledger for {module}/{}", migration.id))?;

        if seen.is_some() {
            tracing::debug!(target: "motorpool-db", %module, id = migration.id, "migration already applied");
            continue;
        }

        let mut tx = pool.begin().await.context("failed to open migration transaction")?;
        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("migration {module}/{} failed", migration.id))?;
        sqlx::query(&format!(
            "INSERT INTO {LEDGER_TABLE} (module, id) VALUES (?, ?)"
        ))
        .bind(module)
        .bind(migration.id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("failed to record migration {module}/{}", migration.id))?;
        tx.commit().await.context("failed to commit migration")?;

        tracing::info!(target: "motorpool-db", %module, id = migration.id, "migration applied");
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget_migrations() -> Vec<(String, Migration)> {
        vec![(
            "widgets".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE widget (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
                     CREATE INDEX widget_name ON widget(name);",
            },
        )]
    }

    #[tokio::test]
    async fn migrations_apply_once() {
        let pool = connect_in_memory().await.unwrap();
        let migrations = widget_migrations();

        assert_eq!(run_migrations(&pool, &migrations).await.unwrap(), 1);
        assert_eq!(run_migrations(&pool, &migrations).await.unwrap(), 0);

        sqlx::query("INSERT INTO widget (name) VALUES ('gear')")
            .execute(&pool)
            .await
            .unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM widget")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn failing_migration_is_not_recorded() {
        let pool = connect_in_memory().await.unwrap();
        let broken = vec![(
            "broken".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE nope (",
            },
        )];

        assert!(run_migrations(&pool, &broken).await.is_err());
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {LEDGER_TABLE}"))
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let pool = connect_in_memory().await.unwrap();
        sqlx::raw_sql(
            "CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE child (id INTEGER PRIMARY KEY, parent_id INTEGER NOT NULL REFERENCES parent(id) ON DELETE CASCADE);
             INSERT INTO parent (id) VALUES (1);
             INSERT INTO child (id, parent_id) VALUES (1, 1);
             DELETE FROM parent WHERE id = 1;",
        )
        .execute(&pool)
        .await
        .unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM child")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
