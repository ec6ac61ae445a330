use crate::entities::ingredient;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;

/// One entry of the catalogue file fed to `load-ingredients`.
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientRecord {
    pub name: String,
    pub measurement_unit: String,
}

const LIKE_ESCAPE: char = '!';

/// `LIKE` pattern matching names that start with `prefix`, wildcards escaped.
fn starts_with_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in ingredient::search_key(prefix).chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Ingredients ordered by name, optionally restricted to a case-insensitive prefix.
pub async fn search<C: ConnectionTrait>(
    db: &C,
    prefix: Option<&str>,
) -> Result<Vec<ingredient::Model>, DbErr> {
    let mut query = ingredient::Entity::find();
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        query = query.filter(
            Expr::col(ingredient::Column::SearchName)
                .like(LikeExpr::new(starts_with_pattern(prefix)).escape(LIKE_ESCAPE)),
        );
    }
    query
        .order_by_asc(ingredient::Column::Name)
        .order_by_asc(ingredient::Column::Id)
        .all(db)
        .await
}

/// Insert every record whose name is not in the catalogue yet.
///
/// Returns how many rows were created. Names are trimmed; blank names are skipped.
pub async fn load_catalogue<C: ConnectionTrait>(
    db: &C,
    records: Vec<IngredientRecord>,
) -> Result<usize, DbErr> {
    let mut created = 0;
    for record in records {
        let name = record.name.trim();
        if name.is_empty() {
            log::warn!("Skipping ingredient with a blank name");
            continue;
        }

        let exists = ingredient::Entity::find()
            .filter(ingredient::Column::Name.eq(name))
            .one(db)
            .await?
            .is_some();
        if exists {
            continue;
        }

        ingredient::Entity::insert(ingredient::ActiveModel {
            name: Set(name.to_string()),
            search_name: Set(ingredient::search_key(name)),
            measurement_unit: Set(record.measurement_unit.trim().to_string()),
            ..Default::default()
        })
        .exec(db)
        .await?;
        created += 1;
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_memory_pool;

    fn record(name: &str, unit: &str) -> IngredientRecord {
        IngredientRecord {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        }
    }

    #[test]
    fn wildcards_in_prefix_are_literal() {
        assert_eq!(starts_with_pattern("Su"), "su%");
        assert_eq!(starts_with_pattern("50%_!"), "50!%!_!!%");
    }

    #[actix_rt::test]
    async fn loading_skips_existing_names() {
        let db = create_memory_pool().await.unwrap();
        let first = load_catalogue(&db, vec![record("salt", "g"), record("sugar", "g")])
            .await
            .unwrap();
        assert_eq!(first, 2);

        let second = load_catalogue(&db, vec![record(" salt ", "g"), record("", "g"), record("milk", "ml")])
            .await
            .unwrap();
        assert_eq!(second, 1);
        assert_eq!(search(&db, None).await.unwrap().len(), 3);
    }

    #[actix_rt::test]
    async fn prefix_search_is_case_insensitive_and_ordered() {
        let db = create_memory_pool().await.unwrap();
        load_catalogue(
            &db,
            vec![
                record("Sugar", "g"),
                record("salt", "g"),
                record("milk", "ml"),
                record("s_pepper", "g"),
            ],
        )
        .await
        .unwrap();

        let names: Vec<String> = search(&db, Some("S"))
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Sugar", "s_pepper", "salt"]);

        let literal: Vec<String> = search(&db, Some("s_"))
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(literal, vec!["s_pepper"]);
    }

    #[actix_rt::test]
    async fn prefix_search_folds_cyrillic_names() {
        let db = create_memory_pool().await.unwrap();
        load_catalogue(&db, vec![record("Мука", "г"), record("молоко", "мл"), record("Яйца", "шт")])
            .await
            .unwrap();

        for prefix in ["М", "м", "МУ", "му"] {
            let names: Vec<String> = search(&db, Some(prefix))
                .await
                .unwrap()
                .into_iter()
                .map(|i| i.name)
                .collect();
            let expected: &[&str] = if prefix.chars().count() == 1 {
                &["Мука", "молоко"]
            } else {
                &["Мука"]
            };
            assert_eq!(names, expected, "prefix {:?}", prefix);
        }
        assert_eq!(search(&db, Some("я")).await.unwrap()[0].name, "Яйца");
    }
}
