use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    dto::users::{
        Claims, CreateUserRequest, FilteredUserList, LoginRequest, LoginResponse,
        UpdateUserRequest, UserList,
    },
    entity::users::{ActiveModel, Column, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    models::{FilteredUser, User},
    response::{ApiResponse, CountData, Meta},
    state::AppState,
};

pub async fn list_users(state: &AppState) -> AppResult<ApiResponse<UserList>> {
    let items: Vec<User> = Users::find()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

/// Trimmed listing: name, phone and email only.
pub async fn filtered_users(state: &AppState) -> AppResult<ApiResponse<FilteredUserList>> {
    let items: Vec<FilteredUser> = Users::find()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(FilteredUser::from)
        .collect();

    let meta = Meta::total(items.len() as i64);
    Ok(ApiResponse::success(
        "Users",
        FilteredUserList { items },
        Some(meta),
    ))
}

pub async fn get_user(state: &AppState, id: Uuid) -> AppResult<ApiResponse<User>> {
    let user = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("User", User::from(user), None))
}

pub async fn create_user(
    state: &AppState,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    let password_hash = hash_password(&payload.password)?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        email: Set(payload.email),
        password_hash: Set(password_hash),
        phone: Set(payload.phone),
        is_admin: Set(payload.is_admin),
        street: Set(payload.street),
        apartment: Set(payload.apartment),
        zip: Set(payload.zip),
        city: Set(payload.city),
        country: Set(payload.country),
    };
    let user = active.insert(&state.orm).await?;

    Ok(ApiResponse::success(
        "User created",
        User::from(user),
        Some(Meta::empty()),
    ))
}

pub async fn update_user(
    state: &AppState,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    // Omitted or empty password leaves the stored hash untouched.
    let password_hash = match payload.password.as_deref() {
        Some(password) if !password.is_empty() => hash_password(password)?,
        _ => existing.password_hash.clone(),
    };

    let mut active: ActiveModel = existing.into();
    active.name = Set(payload.name);
    active.email = Set(payload.email);
    active.password_hash = Set(password_hash);
    active.phone = Set(payload.phone);
    active.is_admin = Set(payload.is_admin);
    active.street = Set(payload.street);
    active.apartment = Set(payload.apartment);
    active.zip = Set(payload.zip);
    active.city = Set(payload.city);
    active.country = Set(payload.country);
    let user = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "User updated",
        User::from(user),
        Some(Meta::empty()),
    ))
}

pub async fn delete_user(state: &AppState, id: Uuid) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Users::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "User deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn count_users(state: &AppState) -> AppResult<ApiResponse<CountData>> {
    let count = Users::find().count(&state.orm).await? as i64;
    Ok(ApiResponse::success("User count", CountData { count }, None))
}

pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let user = Users::find()
        .filter(Column::Email.eq(payload.email.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("The user was not found".into()))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Wrong password".into()));
    }

    let token = issue_token(&user)?;
    let resp = LoginResponse {
        user: user.email,
        token,
    };

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

/// Sign a token carrying `{ userId, isAdmin }` with a one-day expiry.
fn issue_token(user: &UserModel) -> AppResult<String> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(Duration::days(1))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        user_id: user.id,
        is_admin: user.is_admin,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}
