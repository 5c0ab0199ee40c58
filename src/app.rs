use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use motorpool_kernel::settings::{Settings, StoreBackend};
use motorpool_kernel::{InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

use crate::modules;
use crate::modules::vehicles::store::{MemoryStore, RecordSource, SqliteStore};
use crate::modules::vehicles::Catalog;

/// Apply pending SQLite migrations without starting any module.
pub async fn migrate(settings: &Settings) -> anyhow::Result<usize> {
    let pool = motorpool_db::connect(&settings.database).await?;
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, Catalog::new(Arc::new(SqliteStore::new(pool.clone()))))?;

    let applied = motorpool_db::run_migrations(&pool, &registry.collect_migrations())
        .await
        .context("failed to migrate database")?;
    pool.close().await;
    Ok(applied)
}

/// Fully wired application: store, catalog and started modules.
pub struct Application {
    settings: Settings,
    registry: ModuleRegistry,
    catalog: Catalog,
    pool: Option<SqlitePool>,
}

impl Application {
    /// Open the configured store, run migrations, then init and start every module.
    pub async fn build(settings: Settings) -> anyhow::Result<Self> {
        let (source, pool): (Arc<dyn RecordSource>, Option<SqlitePool>) =
            match settings.store.backend {
                StoreBackend::Memory => {
                    let latency = Duration::from_millis(settings.store.simulated_latency_ms);
                    (Arc::new(MemoryStore::new(latency)), None)
                }
                StoreBackend::Sqlite => {
                    let pool = motorpool_db::connect(&settings.database).await?;
                    (Arc::new(SqliteStore::new(pool.clone())), Some(pool))
                }
            };

        let catalog = Catalog::new(source);
        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, catalog.clone())?;

        if let Some(pool) = &pool {
            let applied = motorpool_db::run_migrations(pool, &registry.collect_migrations())
                .await
                .context("failed to migrate database")?;
            tracing::info!(applied, "database migrations complete");
        }

        let ctx = InitCtx {
            settings: &settings,
        };
        registry.init_all(&ctx).await?;
        registry.start_all(&ctx).await?;

        tracing::info!(
            env = ?settings.environment,
            backend = catalog.backend(),
            modules = registry.len(),
            "motorpool bootstrap complete"
        );

        Ok(Self {
            settings,
            registry,
            catalog,
            pool,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Serve HTTP until shutdown, then stop modules and close the pool.
    pub async fn serve(self) -> anyhow::Result<()> {
        let served = motorpool_http::start_server(&self.registry, &self.settings).await;
        self.shutdown().await?;
        served
    }

    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.registry.stop_all().await?;
        if let Some(pool) = self.pool {
            pool.close().await;
        }
        Ok(())
    }
}
