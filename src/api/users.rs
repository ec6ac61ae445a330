use super::{find_user, PageQuery};
use crate::auth::AuthenticatedUser;
use crate::db::DbPool;
use crate::entities::{subscription, user};
use crate::error::ApiError;
use crate::models::{AvatarRequest, AvatarResponse, UserResponse, UserWithRecipesResponse};
use crate::pagination::{Page, PageRequest, SubscriptionPage, UserPage};
use crate::services::media::{decode_data_url, MediaStore};
use crate::services::{representation, subscriptions as follows};
use actix_web::{web, HttpRequest, HttpResponse};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::Deserialize;

const DEFAULT_RECIPES_LIMIT: u64 = 3;
const AVATAR_FOLDER: &str = "users";

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SubscriptionQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub limit: Option<u64>,
    /// How many recipes to embed per author; anything unparseable means 3.
    #[schema(example = "3")]
    pub recipes_limit: Option<String>,
}

impl SubscriptionQuery {
    fn recipes_limit(&self) -> u64 {
        self.recipes_limit
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(DEFAULT_RECIPES_LIMIT)
    }
}

#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Page of users", body = UserPage),
        (status = 404, description = "Page out of range")
    ),
    tag = "users"
)]
pub async fn list_users(
    req: HttpRequest,
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = PageRequest::new(query.page, query.limit);
    let db = pool.get_ref();

    let all = user::Entity::find().order_by_asc(user::Column::Username);
    let count = all.clone().count(db).await?;
    page.ensure_exists(count)?;

    let users = all.offset(page.offset()).limit(page.limit).all(db).await?;
    let results =
        representation::user_responses(db, users, viewer.map(|v| v.user_id), &media).await?;
    Ok(HttpResponse::Ok().json(Page::new(&req, page, count, results)))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "No such user")
    ),
    tag = "users"
)]
pub async fn get_user(
    path: web::Path<i64>,
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
) -> Result<HttpResponse, ApiError> {
    let found = find_user(&pool, path.into_inner()).await?;
    let body =
        representation::user_response(pool.get_ref(), found, viewer.map(|v| v.user_id), &media)
            .await?;
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The caller", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn me(
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
) -> Result<HttpResponse, ApiError> {
    // A valid token for a deleted account is treated as no credentials.
    let found = user::Entity::find_by_id(caller.user_id)
        .one(pool.get_ref())
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    let body =
        representation::user_response(pool.get_ref(), found, Some(caller.user_id), &media).await?;
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    put,
    path = "/api/users/me/avatar",
    request_body = AvatarRequest,
    responses(
        (status = 200, description = "Avatar stored", body = AvatarResponse),
        (status = 400, description = "Missing or invalid image"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn set_avatar(
    req: web::Json<AvatarRequest>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
) -> Result<HttpResponse, ApiError> {
    let raw = req
        .avatar
        .as_deref()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::field("avatar", "This field is required."))?;
    let image = decode_data_url(raw).map_err(|e| {
        log::debug!("Rejected avatar: {}", e);
        ApiError::field("avatar", "Invalid image data.")
    })?;

    let found = user::Entity::find_by_id(caller.user_id)
        .one(pool.get_ref())
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    let previous = found.avatar.clone();

    let stored = media
        .save(AVATAR_FOLDER, &image)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    let mut active: user::ActiveModel = found.into();
    active.avatar = Set(Some(stored.clone()));
    if let Err(e) = active.update(pool.get_ref()).await {
        media.delete(&stored).await;
        return Err(e.into());
    }
    if let Some(old) = previous {
        media.delete(&old).await;
    }

    Ok(HttpResponse::Ok().json(AvatarResponse {
        avatar: media.url(&stored),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/users/me/avatar",
    responses(
        (status = 204, description = "Avatar removed"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn delete_avatar(
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
) -> Result<HttpResponse, ApiError> {
    let found = user::Entity::find_by_id(caller.user_id)
        .one(pool.get_ref())
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if let Some(old) = found.avatar.clone() {
        let mut active: user::ActiveModel = found.into();
        active.avatar = Set(None);
        active.update(pool.get_ref()).await?;
        media.delete(&old).await;
    }
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u64>, Query, description = "Items per page (default: 10)"),
        ("recipes_limit" = Option<u64>, Query, description = "Recipes per author (default: 3)")
    ),
    responses(
        (status = 200, description = "Followed authors with their recipes", body = SubscriptionPage),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn subscriptions(
    req: HttpRequest,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
    query: web::Query<SubscriptionQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = PageRequest::new(query.page, query.limit);
    let db = pool.get_ref();

    let followed = user::Entity::find()
        .filter(
            user::Column::Id.in_subquery(
                Query::select()
                    .column(subscription::Column::AuthorId)
                    .from(subscription::Entity)
                    .and_where(subscription::Column::UserId.eq(caller.user_id))
                    .to_owned(),
            ),
        )
        .order_by_asc(user::Column::Username);
    let count = followed.clone().count(db).await?;
    page.ensure_exists(count)?;

    let authors = followed
        .offset(page.offset())
        .limit(page.limit)
        .all(db)
        .await?;
    let results = representation::users_with_recipes(
        db,
        authors,
        Some(caller.user_id),
        query.recipes_limit(),
        &media,
    )
    .await?;
    Ok(HttpResponse::Ok().json(Page::new(&req, page, count, results)))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/subscribe",
    params(
        ("user_id" = i64, Path, description = "Author to follow"),
        ("recipes_limit" = Option<u64>, Query, description = "Recipes to embed (default: 3)")
    ),
    responses(
        (status = 201, description = "Subscribed", body = UserWithRecipesResponse),
        (status = 400, description = "Already subscribed or self-subscription"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such user")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn subscribe(
    path: web::Path<i64>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
    query: web::Query<SubscriptionQuery>,
) -> Result<HttpResponse, ApiError> {
    let author = find_user(&pool, path.into_inner()).await?;
    follows::subscribe(pool.get_ref(), caller.user_id, &author).await?;

    let mut shaped = representation::users_with_recipes(
        pool.get_ref(),
        vec![author],
        Some(caller.user_id),
        query.recipes_limit(),
        &media,
    )
    .await?;
    let body = shaped
        .pop()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("subscribed author vanished")))?;
    Ok(HttpResponse::Created().json(body))
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/subscribe",
    params(("user_id" = i64, Path, description = "Author to unfollow")),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed or self-subscription"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such user")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "users"
)]
pub async fn unsubscribe(
    path: web::Path<i64>,
    caller: AuthenticatedUser,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let author = find_user(&pool, path.into_inner()).await?;
    follows::unsubscribe(pool.get_ref(), caller.user_id, &author).await?;
    Ok(HttpResponse::NoContent().finish())
}
