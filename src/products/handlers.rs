use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{debug, info, instrument};

use crate::{error::ApiError, metrics::Endpoint, state::AppState};

use super::dto::{CreateProductRequest, ProductResponse};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    responses((status = 200, description = "Every product, ordered by id", body = Vec<ProductResponse>))
)]
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let _timer = state.metrics.request_duration.start_timer();
    state.metrics.count_request("GET", Endpoint::All);

    let products = state.products.get_all().await?;
    state.metrics.set_stock_total(&products);

    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = ProductResponse),
        (status = 404, description = "No product with this id")
    )
)]
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, ApiError> {
    let _timer = state.metrics.request_duration.start_timer();
    state.metrics.count_request("GET", Endpoint::ById);

    match state.products.get_by_id(id).await? {
        Some(product) => Ok(Json(product.into())),
        None => {
            state.metrics.count_request("GET", Endpoint::ByIdNotFound);
            debug!(%id, "product not found");
            Err(ApiError::NotFound)
        }
    }
}

#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Created; Location points at the new product", body = ProductResponse),
        (status = 400, description = "Body is not valid JSON")
    )
)]
#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, HeaderMap, Json<ProductResponse>), ApiError> {
    let _timer = state.metrics.request_duration.start_timer();
    state.metrics.count_request("POST", Endpoint::Create);

    let created = state.products.add(payload.into()).await?;
    state.metrics.products_created.inc();
    info!(id = created.id, name = %created.name, "product created");

    let mut headers = HeaderMap::new();
    let location = HeaderValue::try_from(format!("/products/{}", created.id))
        .map_err(anyhow::Error::from)?;
    headers.insert(header::LOCATION, location);

    Ok((StatusCode::CREATED, headers, Json(created.into())))
}

#[utoipa::path(
    put,
    path = "/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Product id")),
    request_body = CreateProductRequest,
    responses(
        (status = 204, description = "Replaced"),
        (status = 404, description = "No product with this id")
    )
)]
#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<StatusCode, ApiError> {
    let _timer = state.metrics.request_duration.start_timer();
    state.metrics.count_request("PUT", Endpoint::Update);

    // check-then-write is two round trips; a concurrent delete in between surfaces as a 500
    let Some(mut product) = state.products.get_by_id(id).await? else {
        debug!(%id, "update of missing product");
        return Err(ApiError::NotFound);
    };
    payload.apply_to(&mut product);
    state.products.update(&product).await?;
    info!(%id, "product updated");

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "products",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No product with this id")
    )
)]
#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let _timer = state.metrics.request_duration.start_timer();
    state.metrics.count_request("DELETE", Endpoint::Delete);

    if !state.products.delete(id).await? {
        debug!(%id, "delete of missing product");
        return Err(ApiError::NotFound);
    }
    info!(%id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
