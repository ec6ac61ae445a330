use crate::db::DbPool;
use crate::entities::ingredient;
use crate::error::ApiError;
use crate::models::IngredientResponse;
use crate::services::ingredients;
use actix_web::{web, HttpResponse};
use sea_orm::EntityTrait;
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct IngredientQuery {
    /// Case-insensitive name prefix.
    #[schema(example = "sug")]
    pub name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    params(("name" = Option<String>, Query, description = "Name prefix, case-insensitive")),
    responses(
        (status = 200, description = "Matching ingredients ordered by name", body = Vec<IngredientResponse>)
    ),
    tag = "ingredients"
)]
pub async fn list_ingredients(
    pool: web::Data<DbPool>,
    query: web::Query<IngredientQuery>,
) -> Result<HttpResponse, ApiError> {
    let found = ingredients::search(pool.get_ref(), query.name.as_deref()).await?;
    let body: Vec<IngredientResponse> = found.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{ingredient_id}",
    params(("ingredient_id" = i64, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient", body = IngredientResponse),
        (status = 404, description = "No such ingredient")
    ),
    tag = "ingredients"
)]
pub async fn get_ingredient(
    path: web::Path<i64>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let found = ingredient::Entity::find_by_id(path.into_inner())
        .one(pool.get_ref())
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(HttpResponse::Ok().json(IngredientResponse::from(found)))
}
