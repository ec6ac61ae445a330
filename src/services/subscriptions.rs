use crate::entities::{subscription, user};
use crate::error::ApiError;
use crate::services::recipe_lists::conflict_or_db;
use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
    Set,
};
use std::collections::HashSet;

const SELF_SUBSCRIPTION: &str = "You cannot subscribe to yourself.";

/// Make `follower_id` follow `author`.
pub async fn subscribe<C: ConnectionTrait>(
    db: &C,
    follower_id: i64,
    author: &user::Model,
) -> Result<(), ApiError> {
    if follower_id == author.id {
        return Err(ApiError::Conflict(SELF_SUBSCRIPTION.to_string()));
    }

    let already = format!("You are already subscribed to {}.", author.username);
    if is_subscribed(db, follower_id, author.id).await? {
        return Err(ApiError::Conflict(already));
    }

    subscription::Entity::insert(subscription::ActiveModel {
        user_id: Set(follower_id),
        author_id: Set(author.id),
        created_at: Set(Utc::now()),
        ..Default::default()
    })
    .exec(db)
    .await
    .map_err(|e| conflict_or_db(e, &already))?;

    log::info!("User {} subscribed to {}", follower_id, author.id);
    Ok(())
}

pub async fn unsubscribe<C: ConnectionTrait>(
    db: &C,
    follower_id: i64,
    author: &user::Model,
) -> Result<(), ApiError> {
    if follower_id == author.id {
        return Err(ApiError::Conflict(SELF_SUBSCRIPTION.to_string()));
    }

    let deleted = subscription::Entity::delete_many()
        .filter(subscription::Column::UserId.eq(follower_id))
        .filter(subscription::Column::AuthorId.eq(author.id))
        .exec(db)
        .await?;

    if deleted.rows_affected == 0 {
        return Err(ApiError::Conflict(format!(
            "You were not subscribed to {}.",
            author.username
        )));
    }
    Ok(())
}

pub async fn is_subscribed<C: ConnectionTrait>(
    db: &C,
    follower_id: i64,
    author_id: i64,
) -> Result<bool, DbErr> {
    let count = subscription::Entity::find()
        .filter(subscription::Column::UserId.eq(follower_id))
        .filter(subscription::Column::AuthorId.eq(author_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// The subset of `author_ids` that `follower_id` follows.
pub async fn followed_among<C: ConnectionTrait>(
    db: &C,
    follower_id: i64,
    author_ids: &[i64],
) -> Result<HashSet<i64>, DbErr> {
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<i64> = subscription::Entity::find()
        .select_only()
        .column(subscription::Column::AuthorId)
        .filter(subscription::Column::UserId.eq(follower_id))
        .filter(subscription::Column::AuthorId.is_in(author_ids.iter().copied()))
        .into_tuple()
        .all(db)
        .await?;
    Ok(ids.into_iter().collect())
}
