use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    application::dto::{
        CreateProductRequest, HealthResponse, UpdateProductRequest, from_json_body,
    },
    domain::{Product, ProductError},
    interface::http::problem::{ApiProblem, ApiResult},
    state::AppState,
};

pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    let products = state.product_service.list_products().await?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let product_id = parse_id(&id)?;
    let product = state.product_service.get_product(product_id).await?;
    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, [(header::HeaderName, String); 1], Json<Product>)> {
    let request: CreateProductRequest = decode_body(payload)?;
    let created = state.product_service.create_product(request).await?;

    let location = format!("/products/{}", created.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let product_id = parse_id(&id)?;
    let request: UpdateProductRequest = decode_body(payload)?;
    let updated = state
        .product_service
        .update_product(product_id, request)
        .await?;
    Ok(Json(updated))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let product_id = parse_id(&id)?;
    state.product_service.delete_product(product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Sign is checked by the service so zero and negatives share its error.
fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.trim().parse::<i64>().map_err(|_| {
        ApiProblem::from_domain(ProductError::validation("id", "id must be an integer"))
    })
}

fn decode_body<T: DeserializeOwned>(
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<T> {
    let Json(body) = payload.map_err(ApiProblem::from_rejection)?;
    from_json_body(body).map_err(|err| ApiProblem::invalid_body(err.to_string()))
}
