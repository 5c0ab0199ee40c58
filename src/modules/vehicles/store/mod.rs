//! Record sources behind the vehicle catalog.
//!
//! A source only stores and returns raw rows; ordering, filtering and paging
//! of model lists live in [`super::query`].

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use super::error::CatalogResult;
use super::models::{Make, MakeId, MakeInput, ModelId, ModelInput, ModelWithMake};
use super::query::ModelFilter;

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Short name for logs.
    fn backend(&self) -> &'static str;

    /// Every make, in any order.
    async fn makes(&self) -> CatalogResult<Vec<Make>>;

    async fn make(&self, id: MakeId) -> CatalogResult<Option<Make>>;

    /// Insert a make; the source assigns a never-reused id.
    async fn insert_make(&self, input: &MakeInput) -> CatalogResult<Make>;

    /// Remove a make and every model that references it.
    ///
    /// Returns false when no make had that id.
    async fn delete_make(&self, id: MakeId) -> CatalogResult<bool>;

    /// Joined model rows in ascending id order.
    ///
    /// The filter is a hint: a source may use it to narrow what it returns but
    /// must include every row the filter matches.
    async fn model_rows(&self, filter: &ModelFilter) -> CatalogResult<Vec<ModelWithMake>>;

    async fn model_row(&self, id: ModelId) -> CatalogResult<Option<ModelWithMake>>;

    /// Fails with a validation error when `make_id` does not resolve.
    async fn insert_model(&self, input: &ModelInput) -> CatalogResult<ModelWithMake>;

    /// Replace all mutable fields; `Ok(None)` when the model is absent.
    async fn update_model(
        &self,
        id: ModelId,
        input: &ModelInput,
    ) -> CatalogResult<Option<ModelWithMake>>;

    /// Returns false when no model had that id.
    async fn delete_model(&self, id: ModelId) -> CatalogResult<bool>;
}
