use super::find_recipe;
use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::db::DbPool;
use crate::entities::recipe;
use crate::error::ApiError;
use crate::models::{
    RecipeResponse, RecipeWriteRequest, ShortLinkResponse, ShortRecipeResponse, WriteMode,
};
use crate::pagination::{Page, PageRequest, RecipePage};
use crate::services::media::MediaStore;
use crate::services::recipe_lists::{self, RecipeList};
use crate::services::{recipes as recipe_writes, representation, shopping_list};
use crate::shortlink;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Deserialize;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RecipeQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub limit: Option<u64>,
    #[schema(example = 1)]
    pub author: Option<i64>,
    /// `1` keeps only the caller's favorites, `0` excludes them.
    #[schema(example = "1")]
    pub is_favorited: Option<String>,
    /// `1` keeps only recipes in the caller's cart, `0` excludes them.
    #[schema(example = "0")]
    pub is_in_shopping_cart: Option<String>,
}

/// Recipes owned by someone else cannot be changed.
fn ensure_author(found: &recipe::Model, caller: &AuthenticatedUser) -> Result<(), ApiError> {
    if found.author_id != caller.user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

fn list_filter(
    select: sea_orm::Select<recipe::Entity>,
    list: RecipeList,
    user_id: i64,
    flag: Option<&str>,
) -> sea_orm::Select<recipe::Entity> {
    match flag {
        Some("1") => select.filter(
            recipe::Column::Id.in_subquery(recipe_lists::recipe_ids_query(list, user_id)),
        ),
        Some("0") => select.filter(
            recipe::Column::Id.not_in_subquery(recipe_lists::recipe_ids_query(list, user_id)),
        ),
        _ => select,
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 10)"),
        ("author" = Option<i64>, Query, description = "Only recipes by this user"),
        ("is_favorited" = Option<String>, Query, description = "1 or 0, authenticated callers only"),
        ("is_in_shopping_cart" = Option<String>, Query, description = "1 or 0, authenticated callers only")
    ),
    responses(
        (status = 200, description = "Page of recipes, newest first", body = RecipePage),
        (status = 404, description = "Page out of range")
    ),
    tag = "recipes"
)]
pub async fn list_recipes(
    req: HttpRequest,
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
    query: web::Query<RecipeQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = PageRequest::new(query.page, query.limit);
    let db = pool.get_ref();
    let viewer_id = viewer.map(|v| v.user_id);

    let mut select = recipe::Entity::find();
    if let Some(author) = query.author {
        select = select.filter(recipe::Column::AuthorId.eq(author));
    }
    if let Some(user_id) = viewer_id {
        select = list_filter(
            select,
            RecipeList::Favorites,
            user_id,
            query.is_favorited.as_deref(),
        );
        select = list_filter(
            select,
            RecipeList::ShoppingCart,
            user_id,
            query.is_in_shopping_cart.as_deref(),
        );
    }
    let select = select
        .order_by_desc(recipe::Column::PubDate)
        .order_by_desc(recipe::Column::Id);

    let count = select.clone().count(db).await?;
    page.ensure_exists(count)?;

    let recipes = select
        .offset(page.offset())
        .limit(page.limit)
        .all(db)
        .await?;
    let results = representation::recipe_responses(db, recipes, viewer_id, &media).await?;
    Ok(HttpResponse::Ok().json(Page::new(&req, page, count, results)))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{recipe_id}",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe", body = RecipeResponse),
        (status = 404, description = "No such recipe")
    ),
    tag = "recipes"
)]
pub async fn get_recipe(
    path: web::Path<i64>,
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
) -> Result<HttpResponse, ApiError> {
    let found = find_recipe(&pool, path.into_inner()).await?;
    let body =
        representation::recipe_response(pool.get_ref(), found, viewer.map(|v| v.user_id), &media)
            .await?;
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    request_body = RecipeWriteRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid field values"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn create_recipe(
    req: web::Json<RecipeWriteRequest>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
) -> Result<HttpResponse, ApiError> {
    let draft = req.into_inner().validate(WriteMode::Create)?;
    let created = recipe_writes::create_recipe(&pool, &media, caller.user_id, draft).await?;
    let body =
        representation::recipe_response(pool.get_ref(), created, Some(caller.user_id), &media)
            .await?;
    Ok(HttpResponse::Created().json(body))
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{recipe_id}",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    request_body = RecipeWriteRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid field values"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such recipe")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn update_recipe(
    path: web::Path<i64>,
    req: web::Json<RecipeWriteRequest>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
) -> Result<HttpResponse, ApiError> {
    let found = find_recipe(&pool, path.into_inner()).await?;
    ensure_author(&found, &caller)?;

    let draft = req.into_inner().validate(WriteMode::Update)?;
    let updated = recipe_writes::update_recipe(&pool, &media, found, draft).await?;
    let body =
        representation::recipe_response(pool.get_ref(), updated, Some(caller.user_id), &media)
            .await?;
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "No such recipe")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn delete_recipe(
    path: web::Path<i64>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
) -> Result<HttpResponse, ApiError> {
    let found = find_recipe(&pool, path.into_inner()).await?;
    ensure_author(&found, &caller)?;
    recipe_writes::delete_recipe(pool.get_ref(), &media, found).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn add_to_list(
    list: RecipeList,
    recipe_id: i64,
    caller: &AuthenticatedUser,
    pool: &DbPool,
    media: &MediaStore,
) -> Result<HttpResponse, ApiError> {
    let found = find_recipe(pool, recipe_id).await?;
    recipe_lists::add(pool, list, caller.user_id, found.id).await?;
    log::info!(
        "User {} added recipe {} to {:?}",
        caller.user_id,
        found.id,
        list
    );
    Ok(HttpResponse::Created().json(representation::short_recipe(&found, media)))
}

async fn remove_from_list(
    list: RecipeList,
    recipe_id: i64,
    caller: &AuthenticatedUser,
    pool: &DbPool,
) -> Result<HttpResponse, ApiError> {
    let found = find_recipe(pool, recipe_id).await?;
    recipe_lists::remove(pool, list, caller.user_id, found.id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/recipes/{recipe_id}/favorite",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added to favorites", body = ShortRecipeResponse),
        (status = 400, description = "Already in favorites"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such recipe")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn add_favorite(
    path: web::Path<i64>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
) -> Result<HttpResponse, ApiError> {
    add_to_list(RecipeList::Favorites, path.into_inner(), &caller, &pool, &media).await
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}/favorite",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 400, description = "Was not in favorites"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such recipe")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn remove_favorite(
    path: web::Path<i64>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    remove_from_list(RecipeList::Favorites, path.into_inner(), &caller, &pool).await
}

#[utoipa::path(
    post,
    path = "/api/recipes/{recipe_id}/shopping_cart",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added to the shopping cart", body = ShortRecipeResponse),
        (status = 400, description = "Already in the shopping cart"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such recipe")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn add_to_shopping_cart(
    path: web::Path<i64>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
) -> Result<HttpResponse, ApiError> {
    add_to_list(RecipeList::ShoppingCart, path.into_inner(), &caller, &pool, &media).await
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{recipe_id}/shopping_cart",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed from the shopping cart"),
        (status = 400, description = "Was not in the shopping cart"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such recipe")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn remove_from_shopping_cart(
    path: web::Path<i64>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    remove_from_list(RecipeList::ShoppingCart, path.into_inner(), &caller, &pool).await
}

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    responses(
        (status = 200, description = "Shopping list as an RTF attachment"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "recipes"
)]
pub async fn download_shopping_cart(
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let document = shopping_list::build(pool.get_ref(), caller.user_id).await?;
    Ok(HttpResponse::Ok()
        .content_type(document.content_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(document.filename.to_string())],
        })
        .body(document.bytes))
}

#[utoipa::path(
    get,
    path = "/api/recipes/{recipe_id}/get-link",
    params(("recipe_id" = i64, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Absolute short link", body = ShortLinkResponse),
        (status = 404, description = "No such recipe")
    ),
    tag = "recipes"
)]
pub async fn get_link(
    req: HttpRequest,
    path: web::Path<i64>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let found = find_recipe(&pool, path.into_inner()).await?;
    let base = match config.server.public_base_url.as_deref() {
        Some(base) => base.trim_end_matches('/').to_string(),
        None => {
            let info = req.connection_info();
            format!("{}://{}", info.scheme(), info.host())
        }
    };
    Ok(HttpResponse::Ok().json(ShortLinkResponse {
        short_link: format!("{}/s/{}", base, shortlink::encode(found.id)),
    }))
}
