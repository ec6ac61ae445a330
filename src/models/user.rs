use super::{push, too_long, BLANK};
use crate::error::{ApiError, FieldErrors};
use crate::models::ShortRecipeResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const NAME_MAX: usize = 150;
const EMAIL_MAX: usize = 254;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();

        let email = self.email.trim();
        if email.is_empty() {
            push(&mut errors, "email", BLANK);
        } else if email.chars().count() > EMAIL_MAX {
            push(&mut errors, "email", too_long(EMAIL_MAX));
        } else if !looks_like_email(email) {
            push(&mut errors, "email", "Enter a valid email address.");
        }

        if self.username.is_empty() {
            push(&mut errors, "username", BLANK);
        } else if self.username.chars().count() > NAME_MAX {
            push(&mut errors, "username", too_long(NAME_MAX));
        } else if !valid_username(&self.username) {
            push(
                &mut errors,
                "username",
                "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.trim().is_empty() {
                push(&mut errors, field, BLANK);
            } else if value.chars().count() > NAME_MAX {
                push(&mut errors, field, too_long(NAME_MAX));
            }
        }

        if self.password.is_empty() {
            push(&mut errors, "password", BLANK);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Letters, digits and `@ . + - _`.
fn valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

/// A followed author together with a slice of their recipes.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserWithRecipesResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes: Vec<ShortRecipeResponse>,
    pub recipes_count: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AvatarRequest {
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SignupRequest {
        SignupRequest {
            email: "cook@example.com".into(),
            username: "cook.book+1".into(),
            first_name: "Ann".into(),
            last_name: "Cook".into(),
            password: "pw".into(),
        }
    }

    #[test]
    fn accepts_valid_signup() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn rejects_bad_username_and_email() {
        let mut req = request();
        req.username = "no spaces".into();
        req.email = "nope".into();
        match req.validate() {
            Err(ApiError::Validation(errors)) => {
                assert!(errors.contains_key("username"));
                assert!(errors.contains_key("email"));
                assert!(!errors.contains_key("password"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unicode_usernames_are_letters() {
        let mut req = request();
        req.username = "повар_1".into();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut req = request();
        req.first_name = "  ".into();
        req.password = String::new();
        match req.validate() {
            Err(ApiError::Validation(errors)) => {
                assert_eq!(errors["first_name"], vec![BLANK.to_string()]);
                assert!(errors.contains_key("password"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
