//! HTTP handlers for the vehicles module.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use motorpool_http::error::AppError;
use serde::Deserialize;

use super::models::{
    DeleteOutcome, FilterSpec, ListParams, Make, MakeId, MakeInput, ModelId, ModelInput,
    ModelWithMake, PaginatedResponse, SortDirection, SortSpec, SortField, DEFAULT_PAGE_SIZE,
};
use super::service::Catalog;

type ApiResult<T> = Result<T, AppError>;

pub fn router(catalog: Catalog) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/makes", get(list_makes).post(create_make))
        .route("/makes/{id}", get(get_make).delete(delete_make))
        .route("/models", get(list_models).post(create_model))
        .route(
            "/models/{id}",
            get(get_model).put(update_model).delete(delete_model),
        )
        .with_state(catalog)
}

/// Flat query string form of [`ListParams`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListModelsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub sort_field: Option<SortField>,
    pub sort_direction: Option<SortDirection>,
    pub search: Option<String>,
    pub make_id: Option<MakeId>,
}

impl From<ListModelsQuery> for ListParams {
    fn from(query: ListModelsQuery) -> Self {
        let sort = match (query.sort_field, query.sort_direction) {
            (None, None) => None,
            (field, direction) => Some(SortSpec::new(
                field.unwrap_or_default(),
                direction.unwrap_or_default(),
            )),
        };
        let filter = (query.search.is_some() || query.make_id.is_some()).then(|| FilterSpec {
            search: query.search,
            make_id: query.make_id,
        });

        ListParams {
            page: query.page.unwrap_or(1),
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            sort,
            filter,
        }
    }
}

async fn health_check(State(catalog): State<Catalog>) -> String {
    format!("vehicles module is healthy ({} backend)", catalog.backend())
}

async fn list_makes(State(catalog): State<Catalog>) -> ApiResult<Json<Vec<Make>>> {
    Ok(Json(catalog.list_makes().await?))
}

async fn get_make(
    State(catalog): State<Catalog>,
    Path(id): Path<MakeId>,
) -> ApiResult<Json<Make>> {
    Ok(Json(catalog.get_make(id).await?))
}

async fn create_make(
    State(catalog): State<Catalog>,
    body: Result<Json<MakeInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Make>)> {
    let Json(input) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let make = catalog.create_make(&input).await?;
    Ok((StatusCode::CREATED, Json(make)))
}

async fn delete_make(
    State(catalog): State<Catalog>,
    Path(id): Path<MakeId>,
) -> ApiResult<Json<DeleteOutcome>> {
    Ok(Json(catalog.delete_make(id).await?))
}

async fn list_models(
    State(catalog): State<Catalog>,
    query: Result<Query<ListModelsQuery>, QueryRejection>,
) -> ApiResult<Json<PaginatedResponse<ModelWithMake>>> {
    let Query(query) = query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let params = ListParams::from(query);
    Ok(Json(catalog.list_models(&params).await?))
}

async fn get_model(
    State(catalog): State<Catalog>,
    Path(id): Path<ModelId>,
) -> ApiResult<Json<ModelWithMake>> {
    Ok(Json(catalog.get_model(id).await?))
}

async fn create_model(
    State(catalog): State<Catalog>,
    body: Result<Json<ModelInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ModelWithMake>)> {
    let Json(input) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let model = catalog.create_model(&input).await?;
    Ok((StatusCode::CREATED, Json(model)))
}

async fn update_model(
    State(catalog): State<Catalog>,
    Path(id): Path<ModelId>,
    body: Result<Json<ModelInput>, JsonRejection>,
) -> ApiResult<Json<ModelWithMake>> {
    let Json(input) = body.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    Ok(Json(catalog.update_model(id, &input).await?))
}

async fn delete_model(
    State(catalog): State<Catalog>,
    Path(id): Path<ModelId>,
) -> ApiResult<Json<DeleteOutcome>> {
    Ok(Json(catalog.delete_model(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::vehicles::store::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app() -> Router {
        let catalog = Catalog::new(Arc::new(MemoryStore::instant()));
        catalog.seed_demo_data().await.unwrap();
        router(catalog)
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn with_json(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn query_without_sort_or_filter_maps_to_defaults() {
        let params = ListParams::from(ListModelsQuery::default());
        assert_eq!(params, ListParams::new(1, DEFAULT_PAGE_SIZE));
    }

    #[tokio::test]
    async fn lists_models_with_query_parameters() {
        let router = app().await;
        let (status, body) = send(
            &router,
            get("/models?page=1&limit=5&sortField=make.name&sortDirection=desc&search=a"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["limit"], 5);
        assert_eq!(body["data"][0]["make"]["name"], "Toyota");
        assert!(body["totalPages"].as_u64().unwrap() >= 1);
    }

    #[tokio::test]
    async fn malformed_query_is_a_bad_request() {
        let router = app().await;
        let (status, body) = send(&router, get("/models?sortField=color")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn model_crud_round() {
        let router = app().await;

        let (status, created) = send(
            &router,
            with_json("POST", "/models", json!({"makeId": 3, "name": "A6", "abrv": "A6"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["make"]["name"], "Audi");
        let id = created["id"].as_i64().unwrap();

        let (status, updated) = send(
            &router,
            with_json(
                "PUT",
                &format!("/models/{id}"),
                json!({"makeId": 3, "name": "A6 Avant", "abrv": "A6A"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "A6 Avant");

        let delete = Request::builder()
            .method("DELETE")
            .uri(format!("/models/{id}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&router, delete).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = send(&router, get(&format!("/models/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn unknown_make_is_unprocessable() {
        let router = app().await;
        let (status, body) = send(
            &router,
            with_json("POST", "/models", json!({"makeId": 9999, "name": "Ghost", "abrv": "GH"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["details"][0]["field"], "makeId");
    }

    #[tokio::test]
    async fn invalid_form_fields_are_reported() {
        let router = app().await;
        let (status, body) = send(
            &router,
            with_json("POST", "/models", json!({"makeId": 1, "name": "X", "abrv": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["details"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn makes_can_be_created_and_listed() {
        let router = app().await;
        let (status, make) = send(
            &router,
            with_json("POST", "/makes", json!({"name": "Volvo", "abrv": "VOL"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(make["id"], 6);

        let (status, makes) = send(&router, get("/makes")).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = makes
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["name"].as_str().unwrap())
            .collect();
        assert_eq!(names.last(), Some(&"Volvo"));
    }
}
