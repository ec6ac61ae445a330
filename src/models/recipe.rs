use super::{push, too_long, BLANK, REQUIRED};
use crate::error::{ApiError, FieldErrors};
use crate::models::UserResponse;
use crate::services::media::{decode_data_url, DecodedImage};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

const NAME_MAX: usize = 200;
const MIN_VALUE: &str = "Ensure this value is greater than or equal to 1.";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngredientAmountRequest {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = 200)]
    pub amount: i64,
}

/// Body of recipe create (`POST`) and update (`PATCH`).
///
/// Every field is optional at the wire level; `validate` decides what the
/// operation requires.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecipeWriteRequest {
    pub ingredients: Option<Vec<IngredientAmountRequest>>,
    /// `data:image/<ext>;base64,<payload>`
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    #[schema(example = 15)]
    pub cooking_time: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

/// A recipe payload that passed field validation.
///
/// On update, `None` leaves the stored value untouched. Ingredients are always
/// present and replace the stored set.
#[derive(Debug)]
pub struct RecipeDraft {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<DecodedImage>,
    pub ingredients: Vec<(i64, i32)>,
}

impl RecipeWriteRequest {
    pub fn validate(self, mode: WriteMode) -> Result<RecipeDraft, ApiError> {
        let mut errors = FieldErrors::new();
        let required = mode == WriteMode::Create;

        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                push(&mut errors, "name", BLANK);
                None
            }
            Some(name) if name.chars().count() > NAME_MAX => {
                push(&mut errors, "name", too_long(NAME_MAX));
                None
            }
            Some(name) => Some(name),
            None => {
                if required {
                    push(&mut errors, "name", REQUIRED);
                }
                None
            }
        };

        let text = match self.text {
            Some(text) if text.trim().is_empty() => {
                push(&mut errors, "text", BLANK);
                None
            }
            Some(text) => Some(text),
            None => {
                if required {
                    push(&mut errors, "text", REQUIRED);
                }
                None
            }
        };

        let cooking_time = match self.cooking_time {
            Some(minutes) if minutes < 1 => {
                push(&mut errors, "cooking_time", MIN_VALUE);
                None
            }
            Some(minutes) => match i32::try_from(minutes) {
                Ok(minutes) => Some(minutes),
                Err(_) => {
                    push(
                        &mut errors,
                        "cooking_time",
                        format!("Ensure this value is less than or equal to {}.", i32::MAX),
                    );
                    None
                }
            },
            None => {
                if required {
                    push(&mut errors, "cooking_time", REQUIRED);
                }
                None
            }
        };

        let image = match self.image.as_deref() {
            Some(value) => match decode_data_url(value) {
                Ok(image) => Some(image),
                Err(e) => {
                    log::debug!("Rejected recipe image: {}", e);
                    push(&mut errors, "image", "Invalid image data.");
                    None
                }
            },
            None => {
                if required {
                    push(&mut errors, "image", REQUIRED);
                }
                None
            }
        };

        // Ingredients are mandatory for both create and update.
        let ingredients = match self.ingredients {
            Some(items) => validate_ingredients(&items, &mut errors),
            None => {
                push(&mut errors, "ingredients", REQUIRED);
                Vec::new()
            }
        };

        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        Ok(RecipeDraft {
            name,
            text,
            cooking_time,
            image,
            ingredients,
        })
    }
}

fn validate_ingredients(items: &[IngredientAmountRequest], errors: &mut FieldErrors) -> Vec<(i64, i32)> {
    if items.is_empty() {
        push(errors, "ingredients", "Ingredients list cannot be empty.");
        return Vec::new();
    }

    let mut seen = HashSet::new();
    if !items.iter().all(|item| seen.insert(item.id)) {
        push(
            errors,
            "ingredients",
            "Ingredients must be unique within a recipe. Duplicate IDs found.",
        );
    }

    let mut pairs = Vec::with_capacity(items.len());
    for item in items {
        match i32::try_from(item.amount) {
            Ok(amount) if amount >= 1 => pairs.push((item.id, amount)),
            Ok(_) => push(errors, "ingredients", format!("Ingredient {}: {}", item.id, MIN_VALUE)),
            Err(_) if item.amount < 1 => {
                push(errors, "ingredients", format!("Ingredient {}: {}", item.id, MIN_VALUE))
            }
            Err(_) => push(
                errors,
                "ingredients",
                format!(
                    "Ingredient {}: Ensure this value is less than or equal to {}.",
                    item.id,
                    i32::MAX
                ),
            ),
        }
    }
    pairs
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeIngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i64,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Condensed recipe returned by favorite/cart toggles and subscription listings.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShortRecipeResponse {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShortLinkResponse {
    #[serde(rename = "short-link")]
    pub short_link: String,
}
