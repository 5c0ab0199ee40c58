//! Vehicle makes and models: entities, list query engine, record sources and HTTP surface.

pub mod error;
pub mod models;
pub mod preferences;
pub mod query;
pub mod routes;
pub mod seed;
pub mod service;
pub mod session;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use motorpool_kernel::{InitCtx, Migration, Module};
use serde_json::json;

pub use error::{CatalogError, CatalogResult};
pub use service::Catalog;

pub const MODULE_NAME: &str = "vehicles";

const SCHEMA_V1: &str = r#"
    CREATE TABLE vehicle_makes (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        abrv        TEXT NOT NULL,
        created_at  TEXT NOT NULL
    );
    CREATE TABLE vehicle_models (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        make_id     INTEGER NOT NULL REFERENCES vehicle_makes(id) ON DELETE CASCADE,
        name        TEXT NOT NULL,
        abrv        TEXT NOT NULL,
        created_at  TEXT NOT NULL
    );
    CREATE INDEX vehicle_models_make_id ON vehicle_models(make_id);
"#;

/// Schema for the SQLite record source.
pub fn migrations() -> Vec<Migration> {
    vec![Migration {
        id: "001_init",
        up: SCHEMA_V1,
    }]
}

pub struct VehiclesModule {
    catalog: Catalog,
}

impl VehiclesModule {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Module for VehiclesModule {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            backend = self.catalog.backend(),
            "vehicles module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.catalog.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    fn migrations(&self) -> Vec<Migration> {
        migrations()
    }

    async fn start(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if ctx.settings.store.seed_demo_data {
            self.catalog.seed_demo_data().await?;
        }
        tracing::info!(module = self.name(), "vehicles module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "vehicles module stopped");
        Ok(())
    }
}

pub fn create_module(catalog: Catalog) -> Arc<dyn Module> {
    Arc::new(VehiclesModule::new(catalog))
}

fn json_response(description: &str, schema: serde_json::Value) -> serde_json::Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn error_response(description: &str) -> serde_json::Value {
    json_response(
        description,
        json!({ "$ref": "#/components/schemas/ErrorResponse" }),
    )
}

fn schema_ref(name: &str) -> serde_json::Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

fn id_parameter() -> serde_json::Value {
    json!({ "name": "id", "in": "path", "required": true, "schema": { "type": "integer" } })
}

fn openapi_fragment() -> serde_json::Value {
    let list_parameters = json!([
        { "name": "page", "in": "query", "schema": { "type": "integer", "minimum": 1 } },
        { "name": "limit", "in": "query", "schema": { "type": "integer", "minimum": 1, "maximum": 100 } },
        { "name": "sortField", "in": "query", "schema": { "type": "string", "enum": ["id", "name", "abrv", "make.name"] } },
        { "name": "sortDirection", "in": "query", "schema": { "type": "string", "enum": ["asc", "desc"] } },
        { "name": "search", "in": "query", "schema": { "type": "string" } },
        { "name": "makeId", "in": "query", "schema": { "type": "integer" } }
    ]);

    json!({
        "paths": {
            "/health": {
                "get": {
                    "summary": "Vehicles health check",
                    "tags": ["Vehicles"],
                    "responses": { "200": { "description": "OK" } }
                }
            },
            "/makes": {
                "get": {
                    "summary": "List makes ordered by name",
                    "tags": ["Vehicles"],
                    "responses": {
                        "200": json_response("Makes", json!({ "type": "array", "items": schema_ref("Make") }))
                    }
                },
                "post": {
                    "summary": "Create a make",
                    "tags": ["Vehicles"],
                    "requestBody": { "required": true, "content": { "application/json": { "schema": schema_ref("MakeInput") } } },
                    "responses": {
                        "201": json_response("Created make", schema_ref("Make")),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/makes/{id}": {
                "get": {
                    "summary": "Get a make",
                    "tags": ["Vehicles"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": json_response("Make", schema_ref("Make")),
                        "404": error_response("Make not found")
                    }
                },
                "delete": {
                    "summary": "Delete a make and its models",
                    "tags": ["Vehicles"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": json_response("Deleted", schema_ref("DeleteOutcome")),
                        "404": error_response("Make not found")
                    }
                }
            },
            "/models": {
                "get": {
                    "summary": "List models with filtering, sorting and pagination",
                    "tags": ["Vehicles"],
                    "parameters": list_parameters,
                    "responses": {
                        "200": json_response("Page of models", schema_ref("PaginatedModels")),
                        "400": error_response("Malformed query"),
                        "422": error_response("Validation error")
                    }
                },
                "post": {
                    "summary": "Create a model",
                    "tags": ["Vehicles"],
                    "requestBody": { "required": true, "content": { "application/json": { "schema": schema_ref("ModelInput") } } },
                    "responses": {
                        "201": json_response("Created model", schema_ref("ModelWithMake")),
                        "422": error_response("Validation error")
                    }
                }
            },
            "/models/{id}": {
                "get": {
                    "summary": "Get a model",
                    "tags": ["Vehicles"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": json_response("Model", schema_ref("ModelWithMake")),
                        "404": error_response("Model not found")
                    }
                },
                "put": {
                    "summary": "Replace a model's make, name and abbreviation",
                    "tags": ["Vehicles"],
                    "parameters": [id_parameter()],
                    "requestBody": { "required": true, "content": { "application/json": { "schema": schema_ref("ModelInput") } } },
                    "responses": {
                        "200": json_response("Updated model", schema_ref("ModelWithMake")),
                        "404": error_response("Model not found"),
                        "422": error_response("Validation error")
                    }
                },
                "delete": {
                    "summary": "Delete a model",
                    "tags": ["Vehicles"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": json_response("Deleted", schema_ref("DeleteOutcome")),
                        "404": error_response("Model not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Make": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "name": { "type": "string" },
                        "abrv": { "type": "string" },
                        "createdAt": { "type": "string", "format": "date-time" }
                    },
                    "required": ["id", "name", "abrv", "createdAt"]
                },
                "MakeInput": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "minLength": 1, "maxLength": 100 },
                        "abrv": { "type": "string", "minLength": 1, "maxLength": 10 }
                    },
                    "required": ["name", "abrv"]
                },
                "ModelInput": {
                    "type": "object",
                    "properties": {
                        "makeId": { "type": "integer", "minimum": 1 },
                        "name": { "type": "string", "minLength": 2, "maxLength": 50 },
                        "abrv": { "type": "string", "minLength": 1, "maxLength": 10 }
                    },
                    "required": ["makeId", "name", "abrv"]
                },
                "ModelWithMake": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer" },
                        "makeId": { "type": "integer" },
                        "name": { "type": "string" },
                        "abrv": { "type": "string" },
                        "createdAt": { "type": "string", "format": "date-time" },
                        "make": schema_ref("Make")
                    },
                    "required": ["id", "makeId", "name", "abrv", "createdAt", "make"]
                },
                "PaginatedModels": {
                    "type": "object",
                    "properties": {
                        "data": { "type": "array", "items": schema_ref("ModelWithMake") },
                        "total": { "type": "integer" },
                        "page": { "type": "integer" },
                        "limit": { "type": "integer" },
                        "totalPages": { "type": "integer" }
                    },
                    "required": ["data", "total", "page", "limit", "totalPages"]
                },
                "DeleteOutcome": {
                    "type": "object",
                    "properties": { "success": { "type": "boolean" } },
                    "required": ["success"]
                }
            }
        }
    })
}
