use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::RecordSource;
use crate::modules::vehicles::error::{CatalogError, CatalogResult};
use crate::modules::vehicles::models::{
    timestamp_now, Make, MakeId, MakeInput, Model, ModelId, ModelInput, ModelWithMake,
};
use crate::modules::vehicles::query::ModelFilter;

#[derive(Debug, Default)]
struct Tables {
    makes: Vec<Make>,
    models: Vec<Model>,
    last_make_id: MakeId,
    last_model_id: ModelId,
}

impl Tables {
    fn make(&self, id: MakeId) -> Option<&Make> {
        self.makes.iter().find(|make| make.id == id)
    }

    fn joined(&self, model: &Model) -> Option<ModelWithMake> {
        self.make(model.make_id)
            .map(|make| ModelWithMake::join(model, make))
    }
}

/// In-process record source that imitates a network round trip.
///
/// Each instance owns its tables, so tests can run isolated stores side by side.
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    latency: Duration,
}

impl MemoryStore {
    pub fn new(latency: Duration) -> Self {
        Self {
            tables: Arc::default(),
            latency,
        }
    }

    /// No artificial delay.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl RecordSource for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn makes(&self) -> CatalogResult<Vec<Make>> {
        self.round_trip().await;
        Ok(self.tables.read().await.makes.clone())
    }

    async fn make(&self, id: MakeId) -> CatalogResult<Option<Make>> {
        self.round_trip().await;
        Ok(self.tables.read().await.make(id).cloned())
    }

    async fn insert_make(&self, input: &MakeInput) -> CatalogResult<Make> {
        self.round_trip().await;
        let mut tables = self.tables.write().await;
        tables.last_make_id += 1;
        let make = Make {
            id: tables.last_make_id,
            name: input.name.clone(),
            abrv: input.abrv.clone(),
            created_at: timestamp_now(),
        };
        tables.makes.push(make.clone());
        Ok(make)
    }

    async fn delete_make(&self, id: MakeId) -> CatalogResult<bool> {
        self.round_trip().await;
        let mut tables = self.tables.write().await;
        let before = tables.makes.len();
        tables.makes.retain(|make| make.id != id);
        if tables.makes.len() == before {
            return Ok(false);
        }
        tables.models.retain(|model| model.make_id != id);
        Ok(true)
    }

    async fn model_rows(&self, _filter: &ModelFilter) -> CatalogResult<Vec<ModelWithMake>> {
        self.round_trip().await;
        let tables = self.tables.read().await;
        Ok(tables
            .models
            .iter()
            .filter_map(|model| tables.joined(model))
            .collect())
    }

    async fn model_row(&self, id: ModelId) -> CatalogResult<Option<ModelWithMake>> {
        self.round_trip().await;
        let tables = self.tables.read().await;
        Ok(tables
            .models
            .iter()
            .find(|model| model.id == id)
            .and_then(|model| tables.joined(model)))
    }

    async fn insert_model(&self, input: &ModelInput) -> CatalogResult<ModelWithMake> {
        self.round_trip().await;
        let mut tables = self.tables.write().await;
        let make = tables
            .make(input.make_id)
            .cloned()
            .ok_or_else(|| CatalogError::unknown_make(input.make_id))?;

        tables.last_model_id += 1;
        let model = Model {
            id: tables.last_model_id,
            make_id: make.id,
            name: input.name.clone(),
            abrv: input.abrv.clone(),
            created_at: timestamp_now(),
        };
        tables.models.push(model.clone());
        Ok(ModelWithMake::join(&model, &make))
    }

    async fn update_model(
        &self,
        id: ModelId,
        input: &ModelInput,
    ) -> CatalogResult<Option<ModelWithMake>> {
        self.round_trip().await;
        let mut tables = self.tables.write().await;
        let Some(index) = tables.models.iter().position(|model| model.id == id) else {
            return Ok(None);
        };
        let make = tables
            .make(input.make_id)
            .cloned()
            .ok_or_else(|| CatalogError::unknown_make(input.make_id))?;

        let model = &mut tables.models[index];
        model.make_id = make.id;
        model.name = input.name.clone();
        model.abrv = input.abrv.clone();
        Ok(Some(ModelWithMake::join(model, &make)))
    }

    async fn delete_model(&self, id: ModelId) -> CatalogResult<bool> {
        self.round_trip().await;
        let mut tables = self.tables.write().await;
        let before = tables.models.len();
        tables.models.retain(|model| model.id != id);
        Ok(tables.models.len() != before)
    }
}
