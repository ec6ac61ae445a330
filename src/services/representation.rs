//! Response shapes, one function per shape.
//!
//! List views load related rows in batches (authors, ingredients, the
//! viewer's favorites/cart/subscriptions) instead of per recipe.

use crate::entities::{ingredient, recipe, recipe_ingredient, user};
use crate::models::{
    RecipeIngredientResponse, RecipeResponse, ShortRecipeResponse, UserResponse,
    UserWithRecipesResponse,
};
use crate::services::media::MediaStore;
use crate::services::recipe_lists::{self, RecipeList};
use crate::services::subscriptions;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use std::collections::{HashMap, HashSet};

fn user_shape(model: user::Model, is_subscribed: bool, media: &MediaStore) -> UserResponse {
    UserResponse {
        email: model.email,
        id: model.id,
        username: model.username,
        first_name: model.first_name,
        last_name: model.last_name,
        is_subscribed,
        avatar: model.avatar.as_deref().map(|path| media.url(path)),
    }
}

pub async fn user_responses<C: ConnectionTrait>(
    db: &C,
    users: Vec<user::Model>,
    viewer: Option<i64>,
    media: &MediaStore,
) -> Result<Vec<UserResponse>, DbErr> {
    let followed = match viewer {
        Some(viewer) => {
            let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
            subscriptions::followed_among(db, viewer, &ids).await?
        }
        None => HashSet::new(),
    };

    Ok(users
        .into_iter()
        .map(|u| {
            let is_subscribed = followed.contains(&u.id);
            user_shape(u, is_subscribed, media)
        })
        .collect())
}

pub async fn user_response<C: ConnectionTrait>(
    db: &C,
    user: user::Model,
    viewer: Option<i64>,
    media: &MediaStore,
) -> Result<UserResponse, DbErr> {
    let mut shaped = user_responses(db, vec![user], viewer, media).await?;
    shaped
        .pop()
        .ok_or_else(|| DbErr::Custom("user vanished while rendering".into()))
}

pub fn short_recipe(model: &recipe::Model, media: &MediaStore) -> ShortRecipeResponse {
    ShortRecipeResponse {
        id: model.id,
        name: model.name.clone(),
        image: media.url(&model.image),
        cooking_time: model.cooking_time,
    }
}

pub async fn recipe_responses<C: ConnectionTrait>(
    db: &C,
    recipes: Vec<recipe::Model>,
    viewer: Option<i64>,
    media: &MediaStore,
) -> Result<Vec<RecipeResponse>, DbErr> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
    let mut author_ids: Vec<i64> = recipes.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors = user::Entity::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(db)
        .await?;
    let authors: HashMap<i64, UserResponse> = user_responses(db, authors, viewer, media)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let rows: Vec<(i64, i64, String, String, i32)> = recipe_ingredient::Entity::find()
        .select_only()
        .column(recipe_ingredient::Column::RecipeId)
        .column(ingredient::Column::Id)
        .column(ingredient::Column::Name)
        .column(ingredient::Column::MeasurementUnit)
        .column(recipe_ingredient::Column::Amount)
        .join(
            JoinType::InnerJoin,
            recipe_ingredient::Relation::Ingredient.def(),
        )
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids.iter().copied()))
        .order_by_asc(recipe_ingredient::Column::Id)
        .into_tuple()
        .all(db)
        .await?;

    let mut ingredients: HashMap<i64, Vec<RecipeIngredientResponse>> = HashMap::new();
    for (recipe_id, id, name, measurement_unit, amount) in rows {
        ingredients
            .entry(recipe_id)
            .or_default()
            .push(RecipeIngredientResponse {
                id,
                name,
                measurement_unit,
                amount,
            });
    }

    let (favorited, in_cart) = match viewer {
        Some(viewer) => (
            recipe_lists::members(db, RecipeList::Favorites, viewer, &recipe_ids).await?,
            recipe_lists::members(db, RecipeList::ShoppingCart, viewer, &recipe_ids).await?,
        ),
        None => (HashSet::new(), HashSet::new()),
    };

    recipes
        .into_iter()
        .map(|r| {
            let author = authors
                .get(&r.author_id)
                .cloned()
                .ok_or_else(|| DbErr::RecordNotFound(format!("author {}", r.author_id)))?;
            Ok(RecipeResponse {
                id: r.id,
                author,
                ingredients: ingredients.remove(&r.id).unwrap_or_default(),
                is_favorited: favorited.contains(&r.id),
                is_in_shopping_cart: in_cart.contains(&r.id),
                image: media.url(&r.image),
                name: r.name,
                text: r.text,
                cooking_time: r.cooking_time,
            })
        })
        .collect()
}

pub async fn recipe_response<C: ConnectionTrait>(
    db: &C,
    recipe: recipe::Model,
    viewer: Option<i64>,
    media: &MediaStore,
) -> Result<RecipeResponse, DbErr> {
    let mut shaped = recipe_responses(db, vec![recipe], viewer, media).await?;
    shaped
        .pop()
        .ok_or_else(|| DbErr::Custom("recipe vanished while rendering".into()))
}

/// Authors with their newest `recipes_limit` recipes and total recipe count.
pub async fn users_with_recipes<C: ConnectionTrait>(
    db: &C,
    authors: Vec<user::Model>,
    viewer: Option<i64>,
    recipes_limit: u64,
    media: &MediaStore,
) -> Result<Vec<UserWithRecipesResponse>, DbErr> {
    let users = user_responses(db, authors, viewer, media).await?;

    let mut shaped = Vec::with_capacity(users.len());
    for user in users {
        let by_author = recipe::Entity::find().filter(recipe::Column::AuthorId.eq(user.id));
        let recipes_count = by_author.clone().count(db).await?;
        let recipes = by_author
            .order_by_desc(recipe::Column::PubDate)
            .order_by_desc(recipe::Column::Id)
            .limit(recipes_limit)
            .all(db)
            .await?
            .iter()
            .map(|r| short_recipe(r, media))
            .collect();
        shaped.push(UserWithRecipesResponse {
            user,
            recipes,
            recipes_count,
        });
    }
    Ok(shaped)
}
