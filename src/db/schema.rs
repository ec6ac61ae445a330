use crate::entities::{
    favorite, ingredient, recipe, recipe_ingredient, shopping_cart, subscription, user,
};
use sea_orm::sea_query::{Expr, Index, TableCreateStatement};
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};

/// Create all tables that do not exist yet.
///
/// Table order matters: foreign keys point at tables created earlier.
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let statements: Vec<TableCreateStatement> = vec![
        table(&schema, user::Entity),
        table(&schema, ingredient::Entity),
        table(&schema, recipe::Entity),
        table(&schema, recipe_ingredient::Entity)
            .index(
                Index::create()
                    .name("unique_ingredient_in_recipe")
                    .col(recipe_ingredient::Column::RecipeId)
                    .col(recipe_ingredient::Column::IngredientId)
                    .unique(),
            )
            .to_owned(),
        table(&schema, favorite::Entity)
            .index(
                Index::create()
                    .name("unique_user_recipe_favorite")
                    .col(favorite::Column::UserId)
                    .col(favorite::Column::RecipeId)
                    .unique(),
            )
            .to_owned(),
        table(&schema, shopping_cart::Entity)
            .index(
                Index::create()
                    .name("unique_user_recipe_shopping_cart")
                    .col(shopping_cart::Column::UserId)
                    .col(shopping_cart::Column::RecipeId)
                    .unique(),
            )
            .to_owned(),
        table(&schema, subscription::Entity)
            .index(
                Index::create()
                    .name("unique_user_author_subscription")
                    .col(subscription::Column::UserId)
                    .col(subscription::Column::AuthorId)
                    .unique(),
            )
            .check(
                Expr::col(subscription::Column::UserId)
                    .ne(Expr::col(subscription::Column::AuthorId)),
            )
            .to_owned(),
    ];

    for statement in statements {
        db.execute(backend.build(&statement)).await?;
    }

    Ok(())
}

fn table<E: EntityTrait>(schema: &Schema, entity: E) -> TableCreateStatement {
    schema
        .create_table_from_entity(entity)
        .if_not_exists()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use crate::db::create_memory_pool;
    use crate::entities::{favorite, recipe, user};
    use chrono::Utc;
    use sea_orm::{EntityTrait, PaginatorTrait, Set};

    #[actix_rt::test]
    async fn schema_is_idempotent() {
        let db = create_memory_pool().await.unwrap();
        super::create_schema(&db).await.unwrap();
    }

    #[actix_rt::test]
    async fn deleting_a_recipe_cascades_to_its_edges() {
        let db = create_memory_pool().await.unwrap();

        let author = user::Entity::insert(user::ActiveModel {
            email: Set("cook@example.com".into()),
            username: Set("cook".into()),
            first_name: Set("Ann".into()),
            last_name: Set("Cook".into()),
            password_hash: Set("x".into()),
            avatar: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        })
        .exec_with_returning(&db)
        .await
        .unwrap();

        let dish = recipe::Entity::insert(recipe::ActiveModel {
            author_id: Set(author.id),
            name: Set("Soup".into()),
            image: Set("recipes/images/soup.png".into()),
            text: Set("Boil.".into()),
            cooking_time: Set(5),
            pub_date: Set(Utc::now()),
            ..Default::default()
        })
        .exec_with_returning(&db)
        .await
        .unwrap();

        favorite::Entity::insert(favorite::ActiveModel {
            user_id: Set(author.id),
            recipe_id: Set(dish.id),
            created_at: Set(Utc::now()),
            ..Default::default()
        })
        .exec(&db)
        .await
        .unwrap();

        recipe::Entity::delete_by_id(dish.id).exec(&db).await.unwrap();
        assert_eq!(favorite::Entity::find().count(&db).await.unwrap(), 0);
    }
}
