use std::sync::Arc;

use validator::Validate;

use super::error::{CatalogError, CatalogResult};
use super::models::{
    DeleteOutcome, ListParams, Make, MakeId, MakeInput, ModelId, ModelInput, ModelWithMake,
    PaginatedResponse,
};
use super::query::{collate, ModelQuery};
use super::seed;
use super::store::RecordSource;

/// Backend-agnostic catalog operations over any [`RecordSource`].
#[derive(Clone)]
pub struct Catalog {
    source: Arc<dyn RecordSource>,
}

impl Catalog {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }

    pub fn backend(&self) -> &'static str {
        self.source.backend()
    }

    /// All makes ordered by name.
    pub async fn list_makes(&self) -> CatalogResult<Vec<Make>> {
        let mut makes = self.source.makes().await?;
        makes.sort_by(|a, b| collate(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(makes)
    }

    pub async fn get_make(&self, id: MakeId) -> CatalogResult<Make> {
        self.source
            .make(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("make", id))
    }

    pub async fn create_make(&self, input: &MakeInput) -> CatalogResult<Make> {
        input.validate()?;
        let make = self.source.insert_make(&input.trimmed()).await?;
        tracing::info!(make_id = make.id, name = %make.name, "make created");
        Ok(make)
    }

    /// Deletes the make and, by cascade, all of its models.
    pub async fn delete_make(&self, id: MakeId) -> CatalogResult<DeleteOutcome> {
        if !self.source.delete_make(id).await? {
            return Err(CatalogError::not_found("make", id));
        }
        tracing::info!(make_id = id, "make deleted with its models");
        Ok(DeleteOutcome { success: true })
    }

    pub async fn list_models(
        &self,
        params: &ListParams,
    ) -> CatalogResult<PaginatedResponse<ModelWithMake>> {
        params.validate()?;
        let query = ModelQuery::from_params(params);
        let rows = self.source.model_rows(&query.filter).await?;
        let page = query.run(rows);

        tracing::debug!(
            backend = self.backend(),
            page = page.page,
            limit = page.limit,
            total = page.total,
            returned = page.data.len(),
            "models listed"
        );
        Ok(page)
    }

    pub async fn get_model(&self, id: ModelId) -> CatalogResult<ModelWithMake> {
        self.source
            .model_row(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("model", id))
    }

    pub async fn create_model(&self, input: &ModelInput) -> CatalogResult<ModelWithMake> {
        input.validate()?;
        self.require_make(input.make_id).await?;
        let model = self.source.insert_model(&input.trimmed()).await?;
        tracing::info!(model_id = model.id, make_id = model.make_id, "model created");
        Ok(model)
    }

    /// Full replace of make, name and abbreviation.
    pub async fn update_model(
        &self,
        id: ModelId,
        input: &ModelInput,
    ) -> CatalogResult<ModelWithMake> {
        input.validate()?;
        if self.source.model_row(id).await?.is_none() {
            return Err(CatalogError::not_found("model", id));
        }
        self.require_make(input.make_id).await?;

        let model = self
            .source
            .update_model(id, &input.trimmed())
            .await?
            .ok_or_else(|| CatalogError::not_found("model", id))?;
        tracing::info!(model_id = id, make_id = model.make_id, "model updated");
        Ok(model)
    }

    /// Not idempotent: deleting an id twice fails the second time.
    pub async fn delete_model(&self, id: ModelId) -> CatalogResult<DeleteOutcome> {
        if !self.source.delete_model(id).await? {
            return Err(CatalogError::not_found("model", id));
        }
        tracing::info!(model_id = id, "model deleted");
        Ok(DeleteOutcome { success: true })
    }

    /// Load the sample makes and models into an empty store.
    ///
    /// Returns the number of models inserted; zero when makes already exist.
    pub async fn seed_demo_data(&self) -> CatalogResult<usize> {
        if !self.source.makes().await?.is_empty() {
            tracing::debug!(backend = self.backend(), "store not empty; skipping seed");
            return Ok(0);
        }

        let mut make_ids = Vec::with_capacity(seed::MAKES.len());
        for (name, abrv) in seed::MAKES {
            let make = self.source.insert_make(&MakeInput::new(*name, *abrv)).await?;
            make_ids.push(make.id);
        }
        for (make_index, name, abrv) in seed::MODELS {
            self.source
                .insert_model(&ModelInput::new(make_ids[*make_index], *name, *abrv))
                .await?;
        }

        tracing::info!(
            backend = self.backend(),
            makes = make_ids.len(),
            models = seed::MODELS.len(),
            "demo data seeded"
        );
        Ok(seed::MODELS.len())
    }

    async fn require_make(&self, make_id: MakeId) -> CatalogResult<()> {
        match self.source.make(make_id).await? {
            Some(_) => Ok(()),
            None => Err(CatalogError::unknown_make(make_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::vehicles::models::{SortDirection, SortField};
    use crate::modules::vehicles::store::{MemoryStore, SqliteStore};

    async fn memory_catalog() -> Catalog {
        let catalog = Catalog::new(Arc::new(MemoryStore::instant()));
        catalog.seed_demo_data().await.unwrap();
        catalog
    }

    async fn sqlite_catalog() -> Catalog {
        let pool = motorpool_db::connect_in_memory().await.unwrap();
        let migrations: Vec<(String, motorpool_kernel::Migration)> =
            crate::modules::vehicles::migrations()
                .into_iter()
                .map(|m| ("vehicles".to_string(), m))
                .collect();
        motorpool_db::run_migrations(&pool, &migrations).await.unwrap();
        let catalog = Catalog::new(Arc::new(SqliteStore::new(pool)));
        catalog.seed_demo_data().await.unwrap();
        catalog
    }

    #[tokio::test]
    async fn seeding_only_fills_an_empty_store() {
        let catalog = memory_catalog().await;
        assert_eq!(catalog.seed_demo_data().await.unwrap(), 0);
        assert_eq!(catalog.list_makes().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn makes_are_listed_by_name() {
        let catalog = memory_catalog().await;
        let names: Vec<String> = catalog
            .list_makes()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Audi", "BMW", "Honda", "Mercedes-Benz", "Toyota"]);
    }

    #[tokio::test]
    async fn seeded_list_paginates_twelve_models() {
        let catalog = memory_catalog().await;
        let first = catalog.list_models(&ListParams::new(1, 10)).await.unwrap();
        assert_eq!((first.data.len(), first.total, first.total_pages), (10, 12, 2));
        let second = catalog.list_models(&ListParams::new(2, 10)).await.unwrap();
        assert_eq!(second.data.len(), 2);
    }

    #[tokio::test]
    async fn invalid_list_params_are_rejected() {
        let catalog = memory_catalog().await;
        let err = catalog.list_models(&ListParams::new(0, 10)).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation { .. }));
    }

    #[tokio::test]
    async fn create_model_with_unknown_make_fails() {
        let catalog = memory_catalog().await;
        let err = catalog
            .create_model(&ModelInput::new(9999, "Phantom", "PH"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation { .. }));
    }

    #[tokio::test]
    async fn create_trims_and_returns_joined_make() {
        let catalog = memory_catalog().await;
        let toyota = catalog
            .list_makes()
            .await
            .unwrap()
            .into_iter()
            .find(|m| m.name == "Toyota")
            .unwrap();

        let model = catalog
            .create_model(&ModelInput::new(toyota.id, "  Corolla ", " COR "))
            .await
            .unwrap();
        assert_eq!(model.name, "Corolla");
        assert_eq!(model.abrv, "COR");
        assert_eq!(model.make.name, "Toyota");
        assert_eq!(catalog.get_model(model.id).await.unwrap(), model);
    }

    #[tokio::test]
    async fn update_replaces_fields_and_checks_existence() {
        let catalog = memory_catalog().await;
        let honda = catalog.get_make(5).await.unwrap();

        let updated = catalog
            .update_model(1, &ModelInput::new(honda.id, "Jazz", "JAZ"))
            .await
            .unwrap();
        assert_eq!(updated.make.name, "Honda");
        assert_eq!(updated.name, "Jazz");

        let err = catalog
            .update_model(404, &ModelInput::new(honda.id, "Jazz", "JAZ"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));

        let err = catalog
            .update_model(1, &ModelInput::new(9999, "Jazz", "JAZ"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation { .. }));
    }

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let catalog = memory_catalog().await;
        assert!(catalog.delete_model(3).await.unwrap().success);
        let err = catalog.delete_model(3).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
        assert!(matches!(
            catalog.get_model(3).await.unwrap_err(),
            CatalogError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn deleting_a_make_cascades_to_models() {
        for catalog in [memory_catalog().await, sqlite_catalog().await] {
            let make = catalog.create_make(&MakeInput::new("X", "X")).await.unwrap();
            let model = catalog
                .create_model(&ModelInput::new(make.id, "X1", "X1"))
                .await
                .unwrap();

            catalog.delete_make(make.id).await.unwrap();

            let err = catalog.get_model(model.id).await.unwrap_err();
            assert!(
                matches!(err, CatalogError::NotFound { .. }),
                "{} backend kept an orphan",
                catalog.backend()
            );
        }
    }

    #[tokio::test]
    async fn backends_return_identical_pages() {
        let memory = memory_catalog().await;
        let sqlite = sqlite_catalog().await;

        let requests = vec![
            ListParams::new(1, 10),
            ListParams::new(2, 5).sorted(SortField::MakeName, SortDirection::Desc),
            ListParams::new(1, 10).searching("bmw"),
            ListParams::new(1, 10).searching("CLASS").sorted(SortField::Abrv, SortDirection::Desc),
            ListParams::new(1, 3).for_make(4).sorted(SortField::Name, SortDirection::Asc),
            ListParams::new(1, 20).searching("o").sorted(SortField::Id, SortDirection::Desc),
        ];

        for params in requests {
            let a = memory.list_models(&params).await.unwrap();
            let b = sqlite.list_models(&params).await.unwrap();
            let ids = |page: &PaginatedResponse<ModelWithMake>| {
                page.data.iter().map(|m| m.id).collect::<Vec<_>>()
            };
            assert_eq!(ids(&a), ids(&b), "mismatch for {params:?}");
            assert_eq!(a.total, b.total);
            assert_eq!(a.total_pages, b.total_pages);
        }
    }

    #[tokio::test]
    async fn backends_agree_on_unicode_case_folding() {
        let memory = memory_catalog().await;
        let sqlite = sqlite_catalog().await;

        for catalog in [&memory, &sqlite] {
            // KELVIN SIGN lowercases to an ASCII 'k'.
            let make = catalog
                .create_make(&MakeInput::new("\u{212A}ia", "KIA"))
                .await
                .unwrap();
            catalog
                .create_model(&ModelInput::new(make.id, "Rio", "RIO"))
                .await
                .unwrap();
        }

        let params = ListParams::new(1, 20).searching("kia");
        let a = memory.list_models(&params).await.unwrap();
        let b = sqlite.list_models(&params).await.unwrap();
        assert_eq!(a.total, 1);
        assert_eq!(b.total, 1);
        assert_eq!(a.data[0].name, b.data[0].name);

        let params = ListParams::new(1, 20).searching("\u{130}");
        assert_eq!(
            memory.list_models(&params).await.unwrap().total,
            sqlite.list_models(&params).await.unwrap().total
        );
    }

    #[tokio::test]
    async fn search_matches_parent_name() {
        let catalog = sqlite_catalog().await;
        let page = catalog
            .list_models(&ListParams::new(1, 10).searching("bmw"))
            .await
            .unwrap();
        assert!(page.data.iter().any(|m| m.name == "X5"));
        assert_eq!(page.total, 3);
    }
}
