//! Favorites and shopping cart: per-user recipe lists stored as join rows.

use crate::entities::{favorite, shopping_cart};
use crate::error::ApiError;
use chrono::Utc;
use sea_orm::sea_query::{Query, SelectStatement};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
    Set, SqlErr,
};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    fn already_present(self) -> &'static str {
        match self {
            RecipeList::Favorites => "Recipe is already in favorites.",
            RecipeList::ShoppingCart => "Recipe is already in the shopping cart.",
        }
    }

    fn not_present(self) -> &'static str {
        match self {
            RecipeList::Favorites => "Recipe was not in favorites.",
            RecipeList::ShoppingCart => "Recipe was not in the shopping cart.",
        }
    }
}

/// Put `recipe_id` on the user's list.
///
/// A row inserted concurrently between the check and the insert trips the
/// unique constraint and is reported as the same conflict.
pub async fn add<C: ConnectionTrait>(
    db: &C,
    list: RecipeList,
    user_id: i64,
    recipe_id: i64,
) -> Result<(), ApiError> {
    if contains(db, list, user_id, recipe_id).await? {
        return Err(ApiError::Conflict(list.already_present().to_string()));
    }

    let now = Utc::now();
    let inserted = match list {
        RecipeList::Favorites => favorite::Entity::insert(favorite::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            created_at: Set(now),
            ..Default::default()
        })
        .exec(db)
        .await
        .map(|_| ()),
        RecipeList::ShoppingCart => shopping_cart::Entity::insert(shopping_cart::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            created_at: Set(now),
            ..Default::default()
        })
        .exec(db)
        .await
        .map(|_| ()),
    };

    inserted.map_err(|e| conflict_or_db(e, list.already_present()))
}

pub async fn remove<C: ConnectionTrait>(
    db: &C,
    list: RecipeList,
    user_id: i64,
    recipe_id: i64,
) -> Result<(), ApiError> {
    let deleted = match list {
        RecipeList::Favorites => {
            favorite::Entity::delete_many()
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::RecipeId.eq(recipe_id))
                .exec(db)
                .await?
        }
        RecipeList::ShoppingCart => {
            shopping_cart::Entity::delete_many()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                .exec(db)
                .await?
        }
    };

    if deleted.rows_affected == 0 {
        return Err(ApiError::Conflict(list.not_present().to_string()));
    }
    Ok(())
}

pub async fn contains<C: ConnectionTrait>(
    db: &C,
    list: RecipeList,
    user_id: i64,
    recipe_id: i64,
) -> Result<bool, DbErr> {
    let count = match list {
        RecipeList::Favorites => {
            favorite::Entity::find()
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::RecipeId.eq(recipe_id))
                .count(db)
                .await?
        }
        RecipeList::ShoppingCart => {
            shopping_cart::Entity::find()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                .count(db)
                .await?
        }
    };
    Ok(count > 0)
}

/// The subset of `recipe_ids` on the user's list.
pub async fn members<C: ConnectionTrait>(
    db: &C,
    list: RecipeList,
    user_id: i64,
    recipe_ids: &[i64],
) -> Result<HashSet<i64>, DbErr> {
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let ids: Vec<i64> = match list {
        RecipeList::Favorites => {
            favorite::Entity::find()
                .select_only()
                .column(favorite::Column::RecipeId)
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                .into_tuple()
                .all(db)
                .await?
        }
        RecipeList::ShoppingCart => {
            shopping_cart::Entity::find()
                .select_only()
                .column(shopping_cart::Column::RecipeId)
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                .into_tuple()
                .all(db)
                .await?
        }
    };
    Ok(ids.into_iter().collect())
}

/// `SELECT recipe_id` of the user's list, for `IN (...)` filters.
pub fn recipe_ids_query(list: RecipeList, user_id: i64) -> SelectStatement {
    match list {
        RecipeList::Favorites => Query::select()
            .column(favorite::Column::RecipeId)
            .from(favorite::Entity)
            .and_where(favorite::Column::UserId.eq(user_id))
            .to_owned(),
        RecipeList::ShoppingCart => Query::select()
            .column(shopping_cart::Column::RecipeId)
            .from(shopping_cart::Entity)
            .and_where(shopping_cart::Column::UserId.eq(user_id))
            .to_owned(),
    }
}

/// Unique violations become `reason`; anything else is a database failure.
pub(crate) fn conflict_or_db(e: DbErr, reason: &str) -> ApiError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            log::info!("Duplicate insert rejected by constraint: {}", detail);
            ApiError::Conflict(reason.to_string())
        }
        _ => ApiError::Database(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;
    use crate::entities::{recipe, user};

    async fn seed(db: &sea_orm::DatabaseConnection) -> (i64, i64) {
        let cook = user::Entity::insert(user::ActiveModel {
            email: Set("cook@example.com".into()),
            username: Set("cook".into()),
            first_name: Set("Ann".into()),
            last_name: Set("Cook".into()),
            password_hash: Set("x".into()),
            avatar: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        })
        .exec_with_returning(db)
        .await
        .unwrap();
        let dish = recipe::Entity::insert(recipe::ActiveModel {
            author_id: Set(cook.id),
            name: Set("Soup".into()),
            image: Set("recipes/images/soup.png".into()),
            text: Set("Boil.".into()),
            cooking_time: Set(5),
            pub_date: Set(Utc::now()),
            ..Default::default()
        })
        .exec_with_returning(db)
        .await
        .unwrap();
        (cook.id, dish.id)
    }

    #[actix_rt::test]
    async fn add_twice_conflicts() {
        let db = create_memory_pool().await.unwrap();
        let (user_id, recipe_id) = seed(&db).await;

        add(&db, RecipeList::Favorites, user_id, recipe_id).await.unwrap();
        assert!(matches!(
            add(&db, RecipeList::Favorites, user_id, recipe_id).await,
            Err(ApiError::Conflict(_))
        ));
        // The cart is a separate list.
        add(&db, RecipeList::ShoppingCart, user_id, recipe_id).await.unwrap();
    }

    #[actix_rt::test]
    async fn remove_twice_conflicts() {
        let db = create_memory_pool().await.unwrap();
        let (user_id, recipe_id) = seed(&db).await;

        add(&db, RecipeList::ShoppingCart, user_id, recipe_id).await.unwrap();
        remove(&db, RecipeList::ShoppingCart, user_id, recipe_id).await.unwrap();
        assert!(matches!(
            remove(&db, RecipeList::ShoppingCart, user_id, recipe_id).await,
            Err(ApiError::Conflict(_))
        ));
    }

    #[actix_rt::test]
    async fn constraint_violation_maps_to_conflict() {
        let db = create_memory_pool().await.unwrap();
        let (user_id, recipe_id) = seed(&db).await;
        add(&db, RecipeList::Favorites, user_id, recipe_id).await.unwrap();

        // Bypass the existence check, as a racing request would.
        let err = favorite::Entity::insert(favorite::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        })
        .exec(&db)
        .await
        .unwrap_err();
        assert!(matches!(
            conflict_or_db(err, "dup"),
            ApiError::Conflict(reason) if reason == "dup"
        ));
    }

    #[actix_rt::test]
    async fn members_reports_listed_recipes() {
        let db = create_memory_pool().await.unwrap();
        let (user_id, recipe_id) = seed(&db).await;
        add(&db, RecipeList::Favorites, user_id, recipe_id).await.unwrap();

        let listed = members(&db, RecipeList::Favorites, user_id, &[recipe_id, 999])
            .await
            .unwrap();
        assert_eq!(listed, HashSet::from([recipe_id]));
        assert!(members(&db, RecipeList::ShoppingCart, user_id, &[recipe_id])
            .await
            .unwrap()
            .is_empty());
    }
}
