use super::find_recipe;
use crate::auth::AuthenticatedUser;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::RecipeResponse;
use crate::services::media::MediaStore;
use crate::services::representation;
use crate::shortlink;
use actix_web::{web, HttpResponse};

#[utoipa::path(
    get,
    path = "/s/{token}",
    params(("token" = String, Path, description = "Hexadecimal recipe token")),
    responses(
        (status = 200, description = "The linked recipe", body = RecipeResponse),
        (status = 404, description = "Malformed token or no such recipe")
    ),
    tag = "shortlinks"
)]
pub async fn resolve(
    path: web::Path<String>,
    viewer: Option<AuthenticatedUser>,
    pool: web::Data<DbPool>,
    media: web::Data<MediaStore>,
) -> Result<HttpResponse, ApiError> {
    let token = path.into_inner();
    let recipe_id = shortlink::decode(&token).ok_or_else(|| {
        log::debug!("Unresolvable short link token {:?}", token);
        ApiError::NotFound
    })?;

    let found = find_recipe(&pool, recipe_id).await?;
    let body =
        representation::recipe_response(pool.get_ref(), found, viewer.map(|v| v.user_id), &media)
            .await?;
    Ok(HttpResponse::Ok().json(body))
}
