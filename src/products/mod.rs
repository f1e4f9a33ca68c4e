mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Product Service API"),
    paths(
        handlers::list_products,
        handlers::get_product,
        handlers::create_product,
        handlers::update_product,
        handlers::delete_product,
    ),
    components(schemas(dto::CreateProductRequest, dto::ProductResponse)),
    tags((name = "products", description = "Product catalogue CRUD"))
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    handlers::product_routes()
}
