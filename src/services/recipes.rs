use crate::entities::{ingredient, recipe, recipe_ingredient};
use crate::error::ApiError;
use crate::models::RecipeDraft;
use crate::services::media::MediaStore;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use std::collections::HashSet;

const RECIPE_IMAGES: &str = "recipes/images";

/// Every id must name an existing ingredient.
pub async fn ensure_ingredients_exist<C: ConnectionTrait>(
    db: &C,
    pairs: &[(i64, i32)],
) -> Result<(), ApiError> {
    let wanted: Vec<i64> = pairs.iter().map(|(id, _)| *id).collect();
    let found: HashSet<i64> = ingredient::Entity::find()
        .select_only()
        .column(ingredient::Column::Id)
        .filter(ingredient::Column::Id.is_in(wanted.iter().copied()))
        .into_tuple::<i64>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    let missing: Vec<String> = wanted
        .iter()
        .filter(|id| !found.contains(id))
        .map(|id| format!("Ingredient with id {} does not exist.", id))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        let mut errors = crate::error::FieldErrors::new();
        errors.insert("ingredients".to_string(), missing);
        Err(ApiError::Validation(errors))
    }
}

fn ingredient_rows(recipe_id: i64, pairs: &[(i64, i32)]) -> Vec<recipe_ingredient::ActiveModel> {
    pairs
        .iter()
        .map(|(ingredient_id, amount)| recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe_id),
            ingredient_id: Set(*ingredient_id),
            amount: Set(*amount),
            ..Default::default()
        })
        .collect()
}

/// Insert a recipe with all its ingredient rows in one transaction.
pub async fn create_recipe(
    db: &DatabaseConnection,
    media: &MediaStore,
    author_id: i64,
    draft: RecipeDraft,
) -> Result<recipe::Model, ApiError> {
    let (Some(name), Some(text), Some(cooking_time), Some(image)) =
        (draft.name, draft.text, draft.cooking_time, draft.image)
    else {
        return Err(ApiError::BadRequest("Incomplete recipe payload.".to_string()));
    };
    ensure_ingredients_exist(db, &draft.ingredients).await?;

    let stored = media
        .save(RECIPE_IMAGES, &image)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;

    let result: Result<recipe::Model, DbErr> = async {
        let txn = db.begin().await?;
        let created = recipe::Entity::insert(recipe::ActiveModel {
            author_id: Set(author_id),
            name: Set(name),
            image: Set(stored.clone()),
            text: Set(text),
            cooking_time: Set(cooking_time),
            pub_date: Set(Utc::now()),
            ..Default::default()
        })
        .exec_with_returning(&txn)
        .await?;
        recipe_ingredient::Entity::insert_many(ingredient_rows(created.id, &draft.ingredients))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        Ok(created)
    }
    .await;

    match result {
        Ok(created) => {
            log::info!("User {} created recipe {}", author_id, created.id);
            Ok(created)
        }
        Err(e) => {
            media.delete(&stored).await;
            Err(e.into())
        }
    }
}

/// Apply the provided fields and replace the ingredient set atomically.
pub async fn update_recipe(
    db: &DatabaseConnection,
    media: &MediaStore,
    existing: recipe::Model,
    draft: RecipeDraft,
) -> Result<recipe::Model, ApiError> {
    ensure_ingredients_exist(db, &draft.ingredients).await?;

    let new_image = match &draft.image {
        Some(image) => Some(
            media
                .save(RECIPE_IMAGES, image)
                .await
                .map_err(|e| ApiError::Internal(e.into()))?,
        ),
        None => None,
    };

    let mut active: recipe::ActiveModel = existing.clone().into();
    if let Some(name) = draft.name {
        active.name = Set(name);
    }
    if let Some(text) = draft.text {
        active.text = Set(text);
    }
    if let Some(minutes) = draft.cooking_time {
        active.cooking_time = Set(minutes);
    }
    if let Some(path) = &new_image {
        active.image = Set(path.clone());
    }

    let result: Result<recipe::Model, DbErr> = async {
        let txn = db.begin().await?;
        let updated = if active.is_changed() {
            active.update(&txn).await?
        } else {
            existing.clone()
        };
        recipe_ingredient::Entity::delete_many()
            .filter(recipe_ingredient::Column::RecipeId.eq(updated.id))
            .exec(&txn)
            .await?;
        recipe_ingredient::Entity::insert_many(ingredient_rows(updated.id, &draft.ingredients))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        Ok(updated)
    }
    .await;

    match result {
        Ok(updated) => {
            if new_image.is_some() {
                media.delete(&existing.image).await;
            }
            log::info!("Recipe {} updated", updated.id);
            Ok(updated)
        }
        Err(e) => {
            if let Some(path) = &new_image {
                media.delete(path).await;
            }
            Err(e.into())
        }
    }
}

/// Delete a recipe; ingredient, favorite and cart rows go with it.
pub async fn delete_recipe<C: ConnectionTrait>(
    db: &C,
    media: &MediaStore,
    existing: recipe::Model,
) -> Result<(), ApiError> {
    recipe::Entity::delete_by_id(existing.id).exec(db).await?;
    media.delete(&existing.image).await;
    log::info!("Recipe {} deleted", existing.id);
    Ok(())
}
