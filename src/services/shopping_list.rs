//! Shopping list built from every recipe in a user's cart.
//!
//! Loading, summing and rendering are separate steps: `load_rows` pulls
//! `(ingredient name, unit, amount)` triples for the cart, `aggregate` sums
//! them per `(name, unit)` and `render_rtf` turns the lines into the
//! downloadable document.

use crate::entities::{ingredient, recipe_ingredient, shopping_cart};
use sea_orm::sea_query::Query;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait};
use std::collections::BTreeMap;
use std::fmt::Write;
use thiserror::Error;

pub const DOCUMENT_TITLE: &str = "Shopping list";
pub const FILENAME: &str = "shopping_list.rtf";
pub const CONTENT_TYPE: &str = "application/rtf";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to format document: {0}")]
    Format(#[from] std::fmt::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// The rendered attachment.
#[derive(Debug)]
pub struct ShoppingListDocument {
    pub filename: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Sum amounts per `(name, unit)`, ordered by name then unit.
pub fn aggregate<I>(rows: I) -> Vec<ShoppingListLine>
where
    I: IntoIterator<Item = (String, String, i64)>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for (name, unit, amount) in rows {
        *totals.entry((name, unit)).or_default() += amount;
    }
    totals
        .into_iter()
        .map(|((name, measurement_unit), amount)| ShoppingListLine {
            name,
            measurement_unit,
            amount,
        })
        .collect()
}

/// Ingredient rows of every recipe in `user_id`'s cart.
pub async fn load_rows<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> Result<Vec<(String, String, i64)>, DbErr> {
    let rows: Vec<(String, String, i32)> = recipe_ingredient::Entity::find()
        .select_only()
        .column(ingredient::Column::Name)
        .column(ingredient::Column::MeasurementUnit)
        .column(recipe_ingredient::Column::Amount)
        .join(
            JoinType::InnerJoin,
            recipe_ingredient::Relation::Ingredient.def(),
        )
        .filter(
            recipe_ingredient::Column::RecipeId.in_subquery(
                Query::select()
                    .column(shopping_cart::Column::RecipeId)
                    .from(shopping_cart::Entity)
                    .and_where(shopping_cart::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        )
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(name, unit, amount)| (name, unit, i64::from(amount)))
        .collect())
}

/// Recompute and render the cart's shopping list.
pub async fn build<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> Result<ShoppingListDocument, crate::error::ApiError> {
    let lines = aggregate(load_rows(db, user_id).await?);
    log::info!(
        "Rendering shopping list for user {} with {} lines",
        user_id,
        lines.len()
    );
    let bytes = render_rtf(&lines)?;
    Ok(ShoppingListDocument {
        filename: FILENAME,
        content_type: CONTENT_TYPE,
        bytes,
    })
}

pub fn render_rtf(lines: &[ShoppingListLine]) -> Result<Vec<u8>, RenderError> {
    let mut doc = String::new();
    doc.push_str("{\\rtf1\\ansi\\ansicpg1252\\deff0\n");
    doc.push_str("{\\fonttbl{\\f0\\fswiss\\fcharset0 Helvetica;}}\n");
    doc.push_str("\\pard\\f0\\fs32\\b ");
    write_escaped(&mut doc, DOCUMENT_TITLE)?;
    doc.push_str("\\b0\\fs24\\par\n\\par\n");

    for (index, line) in lines.iter().enumerate() {
        write!(doc, "{}. ", index + 1)?;
        write_escaped(&mut doc, &line.name)?;
        doc.push_str(" (");
        write_escaped(&mut doc, &line.measurement_unit)?;
        writeln!(doc, ") \\emdash  {}\\par", line.amount)?;
    }

    doc.push('}');
    Ok(doc.into_bytes())
}

/// RTF-escape `text`: control characters are backslash-escaped and anything
/// outside printable ASCII becomes `\uN?` per UTF-16 unit.
fn write_escaped(out: &mut String, text: &str) -> Result<(), std::fmt::Error> {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '\n' => out.push_str("\\line "),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(out, "\\u{}?", *unit as i16)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i64) -> (String, String, i64) {
        (name.to_string(), unit.to_string(), amount)
    }

    #[test]
    fn sums_across_recipes_and_sorts_by_name() {
        // Recipe A: 200 g flour, 2 pcs eggs. Recipe B: 300 g flour.
        let lines = aggregate(vec![
            row("flour", "g", 200),
            row("eggs", "pcs", 2),
            row("flour", "g", 300),
        ]);
        assert_eq!(
            lines,
            vec![
                ShoppingListLine {
                    name: "eggs".into(),
                    measurement_unit: "pcs".into(),
                    amount: 2
                },
                ShoppingListLine {
                    name: "flour".into(),
                    measurement_unit: "g".into(),
                    amount: 500
                },
            ]
        );
    }

    #[test]
    fn same_name_with_different_units_stays_separate() {
        let lines = aggregate(vec![row("milk", "ml", 100), row("milk", "cup", 1)]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].measurement_unit, "cup");
        assert_eq!(lines[1].measurement_unit, "ml");
    }

    #[test]
    fn empty_cart_renders_title_only() {
        assert!(aggregate(Vec::new()).is_empty());
        let doc = String::from_utf8(render_rtf(&[]).unwrap()).unwrap();
        assert!(doc.starts_with("{\\rtf1"));
        assert!(doc.ends_with('}'));
        assert!(doc.contains(DOCUMENT_TITLE));
        assert!(!doc.contains("1. "));
    }

    #[test]
    fn renders_numbered_lines() {
        let lines = aggregate(vec![row("eggs", "pcs", 2), row("flour", "g", 500)]);
        let doc = String::from_utf8(render_rtf(&lines).unwrap()).unwrap();
        assert!(doc.contains("1. eggs (pcs) \\emdash  2\\par"));
        assert!(doc.contains("2. flour (g) \\emdash  500\\par"));
    }

    #[test]
    fn escapes_control_and_non_ascii_characters() {
        let mut out = String::new();
        write_escaped(&mut out, "a{b}\\c").unwrap();
        assert_eq!(out, "a\\{b\\}\\\\c");

        let mut out = String::new();
        write_escaped(&mut out, "мука").unwrap();
        assert_eq!(out, "\\u1084?\\u1091?\\u1082?\\u1072?");
    }

    #[test]
    fn astral_characters_use_surrogate_pairs() {
        let mut out = String::new();
        write_escaped(&mut out, "🥚").unwrap();
        assert_eq!(out, "\\u-10178?\\u-8870?");
    }
}
