use crate::auth::{hash_password, issue_token, verify_password};
use crate::config::Config;
use crate::db::DbPool;
use crate::entities::user;
use crate::error::ApiError;
use crate::models::{AuthResponse, LoginRequest, SignupRequest};
use crate::services::media::MediaStore;
use crate::services::representation;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, SqlErr};
use serde_json::json;

fn duplicate_user() -> HttpResponse {
    HttpResponse::Conflict().json(json!({
        "detail": "User with this email or username already exists."
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid field values"),
        (status = 409, description = "User already exists")
    ),
    tag = "auth"
)]
pub async fn signup(
    req: web::Json<SignupRequest>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    media: web::Data<MediaStore>,
) -> Result<HttpResponse, ApiError> {
    let req = req.into_inner();
    req.validate()?;
    let email = req.email.trim().to_string();

    let existing_user = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(&email))
                .add(user::Column::Username.eq(&req.username)),
        )
        .one(pool.get_ref())
        .await?;

    if existing_user.is_some() {
        return Ok(duplicate_user());
    }

    let password_hash = hash_password(&req.password)?;

    let new_user = user::ActiveModel {
        email: sea_orm::Set(email),
        username: sea_orm::Set(req.username),
        first_name: sea_orm::Set(req.first_name),
        last_name: sea_orm::Set(req.last_name),
        password_hash: sea_orm::Set(password_hash),
        avatar: sea_orm::Set(None),
        created_at: sea_orm::Set(Utc::now()),
        ..Default::default()
    };

    let user = match user::Entity::insert(new_user)
        .exec_with_returning(pool.get_ref())
        .await
    {
        Ok(user) => user,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Ok(duplicate_user());
        }
        Err(e) => return Err(e.into()),
    };

    let token = issue_token(&user, &config.jwt)?;
    log::info!("User {} signed up", user.id);

    let user = representation::user_response(pool.get_ref(), user, None, &media).await?;
    Ok(HttpResponse::Created().json(AuthResponse { token, user }))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "User not found")
    ),
    tag = "auth"
)]
pub async fn login(
    req: web::Json<LoginRequest>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    media: web::Data<MediaStore>,
) -> Result<HttpResponse, ApiError> {
    let user = user::Entity::find()
        .filter(user::Column::Email.eq(req.email.trim()))
        .one(pool.get_ref())
        .await?;

    let user = match user {
        Some(u) => u,
        None => {
            return Ok(HttpResponse::NotFound().json(json!({
                "detail": "User not found."
            })));
        }
    };

    if !verify_password(&req.password, &user.password_hash) {
        return Ok(HttpResponse::Unauthorized().json(json!({
            "detail": "Invalid credentials."
        })));
    }

    let token = issue_token(&user, &config.jwt)?;
    let user = representation::user_response(pool.get_ref(), user, None, &media).await?;
    Ok(HttpResponse::Ok().json(AuthResponse { token, user }))
}
