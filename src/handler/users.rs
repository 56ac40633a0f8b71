use crate::{
    AppState,
    db::UserExt,
    dtos::{
        DeleteUserDto, FilterUserDto, PatchUserDto, RegisterUserDto, UpdateUserDto, UserData,
        UserResponseDto,
    },
    error::{ErrorMessage, HttpError},
    middleware::{JWTAuthMiddleware, auth},
    permissions,
    utils::password,
};
use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

/// Router for account registration and profile operations.
///
/// Registration is public; everything under /{user_id} requires
/// authentication and is restricted to the profile owner or an admin.
pub fn users_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(register))
        .route(
            "/{user_id}",
            get(get_user)
                .put(update_user)
                .patch(patch_user)
                .delete(delete_user)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// Register new user account
///
/// Hashes the password before storage; the created account is always a
/// plain user. Returns 201 with the profile, password excluded.
#[instrument(skip(app_state, body), fields(email = %body.email))]
pub async fn register(
    State(app_state): State<AppState>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid register input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let hash_password = password::hash(&body.password).map_err(|e| {
        tracing::error!("Password hashing error: {}", e);
        HttpError::server_error(e.to_string())
    })?;

    let result = app_state
        .db_client
        .save_user(
            &body.email,
            &body.first_name,
            &body.last_name,
            body.phone.as_deref(),
            &hash_password,
        )
        .await;

    match result {
        Ok(user) => {
            tracing::info!(email = %body.email, "Register Successful");
            Ok((
                StatusCode::CREATED,
                Json(UserResponseDto {
                    status: "success".to_string(),
                    data: UserData {
                        user: FilterUserDto::filter_user(&user),
                    },
                }),
            ))
        }
        Err(sqlx::Error::Database(db_err)) => {
            if db_err.is_unique_violation() {
                tracing::error!("DB error, saving user, unique_violation: {}", db_err);
                Err(HttpError::unique_constraint_violation(
                    "Email already exists".to_string(),
                ))
            } else {
                tracing::error!("DB error, saving user: {}", db_err);
                Err(HttpError::server_error(
                    ErrorMessage::ServerError.to_string(),
                ))
            }
        }
        Err(e) => {
            tracing::error!("DB error, saving user: {}", e);
            Err(HttpError::server_error(
                ErrorMessage::ServerError.to_string(),
            ))
        }
    }
}

/// Retrieve a profile (self or admin)
#[instrument(skip(app_state, jwt), fields(email = %jwt.user.email))]
pub async fn get_user(
    Path(user_id): Path<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let user = fetch_target_user(&app_state, user_id).await?;

    permissions::author_or_admin(&jwt.user, user.id)?;

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    };
    tracing::info!("get_user successful");
    Ok(Json(response))
}

/// Full profile update (self or admin)
///
/// Request body: { email, first_name, last_name, phone?, avatar? }.
/// Role and password are not mutable here.
#[instrument(skip(app_state, jwt, body), fields(email = %jwt.user.email))]
pub async fn update_user(
    Path(user_id): Path<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<UpdateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid update_user input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let user = fetch_target_user(&app_state, user_id).await?;

    permissions::author_or_admin(&jwt.user, user.id)?;

    let updated = save_profile(
        &app_state,
        user_id,
        body.email.as_deref().unwrap(),
        body.first_name.as_deref().unwrap(),
        body.last_name.as_deref().unwrap(),
        body.phone.as_deref(),
        body.avatar.as_deref(),
    )
    .await?;

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&updated),
        },
    };
    tracing::info!("update_user successful");
    Ok(Json(response))
}

/// Partial profile update (self or admin); absent fields keep their value
#[instrument(skip(app_state, jwt, body), fields(email = %jwt.user.email))]
pub async fn patch_user(
    Path(user_id): Path<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<PatchUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid patch_user input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let user = fetch_target_user(&app_state, user_id).await?;

    permissions::author_or_admin(&jwt.user, user.id)?;

    let email = body.email.unwrap_or(user.email);
    let first_name = body.first_name.unwrap_or(user.first_name);
    let last_name = body.last_name.unwrap_or(user.last_name);
    let phone = body.phone.or(user.phone);
    let avatar = body.avatar.or(user.avatar);

    let updated = save_profile(
        &app_state,
        user_id,
        &email,
        &first_name,
        &last_name,
        phone.as_deref(),
        avatar.as_deref(),
    )
    .await?;

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&updated),
        },
    };
    tracing::info!("patch_user successful");
    Ok(Json(response))
}

/// Delete an account.
///
/// The owner must confirm with their current password, verified against
/// the stored hash. Admins deleting another account skip confirmation.
/// Cascades remove the account's advertisements and reviews.
#[instrument(skip(app_state, jwt, body), fields(email = %jwt.user.email))]
pub async fn delete_user(
    Path(user_id): Path<Uuid>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    body: Option<Json<DeleteUserDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let user = fetch_target_user(&app_state, user_id).await?;

    permissions::author_or_admin(&jwt.user, user.id)?;

    if jwt.user.id == user.id {
        let body = body.map(|Json(body)| body).unwrap_or_default();
        let current_password = body.current_password.as_deref().ok_or_else(|| {
            tracing::error!("Missing current password for delete_user");
            HttpError::bad_request("Current password is required".to_string())
        })?;

        let passwords_match = password::compare(current_password, &user.password).map_err(|e| {
            tracing::error!("Password comparison error: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

        if !passwords_match {
            tracing::error!("Invalid password for delete_user");
            return Err(HttpError::bad_request("Invalid password".to_string()));
        }
    }

    app_state.db_client.delete_user(user.id).await.map_err(|e| {
        if let sqlx::Error::RowNotFound = e {
            tracing::error!("User not found for deletion");
            HttpError::not_found(ErrorMessage::UserNotFound.to_string())
        } else {
            tracing::error!("DB error, deleting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        }
    })?;

    // Revoke any live session of the deleted account
    if let Err(e) = app_state
        .redis_client
        .delete_refresh_token(&user.id.to_string())
        .await
    {
        tracing::warn!("RedisDB error, deleting refresh token: {}", e);
    }

    tracing::info!("delete_user successful");
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_target_user(
    app_state: &AppState,
    user_id: Uuid,
) -> Result<crate::models::User, HttpError> {
    let result = app_state
        .db_client
        .get_user(Some(user_id), None)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    result.ok_or_else(|| {
        tracing::error!("User not found");
        HttpError::not_found(ErrorMessage::UserNotFound.to_string())
    })
}

async fn save_profile(
    app_state: &AppState,
    user_id: Uuid,
    email: &str,
    first_name: &str,
    last_name: &str,
    phone: Option<&str>,
    avatar: Option<&str>,
) -> Result<crate::models::User, HttpError> {
    app_state
        .db_client
        .update_user(user_id, email, first_name, last_name, phone, avatar)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    tracing::error!("DB error, updating user, unique_violation: {}", db_err);
                    return HttpError::unique_constraint_violation(
                        "Email already exists".to_string(),
                    );
                }
            }
            tracing::error!("DB error, updating user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })
}
