pub mod auth;
pub mod ingredients;
pub mod recipes;
pub mod shortlinks;
pub mod users;

use crate::db::DbPool;
use crate::entities::{recipe, user};
use crate::error::ApiError;
use crate::models::{
    AuthResponse, AvatarRequest, AvatarResponse, IngredientAmountRequest, IngredientResponse,
    LoginRequest, RecipeIngredientResponse, RecipeResponse, RecipeWriteRequest,
    ShortLinkResponse, ShortRecipeResponse, SignupRequest, UserResponse,
    UserWithRecipesResponse,
};
use crate::pagination::{RecipePage, SubscriptionPage, UserPage};
use actix_web::web;
use sea_orm::EntityTrait;
use serde::Deserialize;
use utoipa::{Modify, OpenApi};

/// Largest accepted JSON body; recipe images arrive base64-encoded inline.
const JSON_LIMIT: usize = 10 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth endpoints
        auth::signup,
        auth::login,
        // User endpoints
        users::list_users,
        users::get_user,
        users::me,
        users::set_avatar,
        users::delete_avatar,
        users::subscriptions,
        users::subscribe,
        users::unsubscribe,
        // Recipe endpoints
        recipes::list_recipes,
        recipes::get_recipe,
        recipes::create_recipe,
        recipes::update_recipe,
        recipes::delete_recipe,
        recipes::add_favorite,
        recipes::remove_favorite,
        recipes::add_to_shopping_cart,
        recipes::remove_from_shopping_cart,
        recipes::download_shopping_cart,
        recipes::get_link,
        // Ingredient endpoints
        ingredients::list_ingredients,
        ingredients::get_ingredient,
        // Short links
        shortlinks::resolve,
    ),
    components(schemas(
        // Auth schemas
        SignupRequest,
        LoginRequest,
        AuthResponse,
        // User schemas
        UserResponse,
        UserWithRecipesResponse,
        AvatarRequest,
        AvatarResponse,
        UserPage,
        SubscriptionPage,
        // Recipe schemas
        RecipeWriteRequest,
        IngredientAmountRequest,
        RecipeIngredientResponse,
        RecipeResponse,
        ShortRecipeResponse,
        ShortLinkResponse,
        RecipePage,
        // Ingredient schemas
        IngredientResponse,
        // Query schemas
        PageQuery,
        recipes::RecipeQuery,
        users::SubscriptionQuery,
        ingredients::IngredientQuery,
    )),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "Users, avatars and subscriptions"),
        (name = "recipes", description = "Recipes, favorites and shopping cart"),
        (name = "ingredients", description = "Ingredient catalogue"),
        (name = "shortlinks", description = "Public short links"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct PageQuery {
    #[schema(example = 1)]
    pub page: Option<u64>,
    #[schema(example = 10)]
    pub limit: Option<u64>,
}

/// Extractor settings and the full route table.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT)
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        log::debug!("Unparseable path segment: {}", err);
        ApiError::NotFound.into()
    }))
    .route("/s/{token}", web::get().to(shortlinks::resolve))
    .service(
        web::scope("/api")
            .route("/s/{token}", web::get().to(shortlinks::resolve))
            .service(
                web::scope("/auth")
                    .route("/signup", web::post().to(auth::signup))
                    .route("/login", web::post().to(auth::login)),
            )
            .service(
                web::scope("/users")
                    .route("", web::get().to(users::list_users))
                    .route("/me", web::get().to(users::me))
                    .route("/me/avatar", web::put().to(users::set_avatar))
                    .route("/me/avatar", web::delete().to(users::delete_avatar))
                    .route("/subscriptions", web::get().to(users::subscriptions))
                    .route("/{user_id}", web::get().to(users::get_user))
                    .route("/{user_id}/subscribe", web::post().to(users::subscribe))
                    .route("/{user_id}/subscribe", web::delete().to(users::unsubscribe)),
            )
            .service(
                web::scope("/recipes")
                    .route("", web::get().to(recipes::list_recipes))
                    .route("", web::post().to(recipes::create_recipe))
                    .route(
                        "/download_shopping_cart",
                        web::get().to(recipes::download_shopping_cart),
                    )
                    .route("/{recipe_id}", web::get().to(recipes::get_recipe))
                    .route("/{recipe_id}", web::patch().to(recipes::update_recipe))
                    .route("/{recipe_id}", web::delete().to(recipes::delete_recipe))
                    .route("/{recipe_id}/favorite", web::post().to(recipes::add_favorite))
                    .route(
                        "/{recipe_id}/favorite",
                        web::delete().to(recipes::remove_favorite),
                    )
                    .route(
                        "/{recipe_id}/shopping_cart",
                        web::post().to(recipes::add_to_shopping_cart),
                    )
                    .route(
                        "/{recipe_id}/shopping_cart",
                        web::delete().to(recipes::remove_from_shopping_cart),
                    )
                    .route("/{recipe_id}/get-link", web::get().to(recipes::get_link)),
            )
            .service(
                web::scope("/ingredients")
                    .route("", web::get().to(ingredients::list_ingredients))
                    .route("/{ingredient_id}", web::get().to(ingredients::get_ingredient)),
            ),
    );
}

pub(crate) async fn find_recipe(db: &DbPool, recipe_id: i64) -> Result<recipe::Model, ApiError> {
    recipe::Entity::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or(ApiError::NotFound)
}

pub(crate) async fn find_user(db: &DbPool, user_id: i64) -> Result<user::Model, ApiError> {
    user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(ApiError::NotFound)
}
