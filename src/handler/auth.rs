use crate::{
    AppState,
    db::UserExt,
    dtos::{LoginUserDto, RefreshResponseDto, Response, UserLoginResponseDto},
    error::{ErrorMessage, HttpError},
    middleware::{JWTAuthMiddleware, auth},
    utils::{password, token},
};
use axum::{
    Extension, Json, Router, middleware,
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
    routing::post,
};
use axum_client_ip::ClientIp;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::instrument;
use validator::Validate;

/// Router for token bootstrap endpoints
pub fn auth_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(login).layer(app_state.ip_extraction.clone().into_extension()),
        )
        .route("/refresh", post(refresh))
        .route(
            "/logout",
            post(logout).route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// Login with rate limiting (100 attempts per IP per day, 10 per email per hour)
#[instrument(skip(app_state, body), fields(email = %body.email))]
pub async fn login(
    ClientIp(ip): ClientIp,
    State(app_state): State<AppState>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    let ip_attempts = app_state
        .redis_client
        .get_ip_attempts(ip)
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, getting ip attempts: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .unwrap_or(0);
    if ip_attempts >= 100 {
        tracing::error!("Login attempt exceeded the limit");
        return Err(HttpError::server_error("Login failed"));
    }

    let identifier_ip_attempts = app_state
        .redis_client
        .get_identifier_ip_attempts(ip, &body.email)
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, getting email+ip attempts: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .unwrap_or(0);

    if identifier_ip_attempts >= 10 {
        tracing::error!("Login attempt exceeded the limit");
        return Err(HttpError::server_error("Login failed"));
    }

    match authenticate_process(State(app_state.clone()), &body).await {
        Ok(response) => {
            // Clear the per-email window on success
            if let Err(e) = app_state
                .redis_client
                .delete_identifier_ip_attempts(ip, &body.email)
                .await
            {
                tracing::warn!("Failed to clear rate limit: {:?}", e);
            }
            tracing::info!(email = %body.email, ip = %ip, "Login Successful");
            Ok(response)
        }
        Err(_) => {
            if let Err(e) = app_state
                .redis_client
                .increment_attempts(ip, &body.email)
                .await
            {
                tracing::warn!("Failed to increment the rate {:?}", e);
            }
            // Deliberately opaque so credentials can't be probed
            Err(HttpError::server_error("Login failed"))
        }
    }
}

/// Verify credentials and issue access + refresh tokens
async fn authenticate_process(
    State(app_state): State<AppState>,
    body: &LoginUserDto,
) -> Result<impl IntoResponse + use<>, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid login input: {}", e);
        HttpError::server_error("Login failed")
    })?;

    let result = app_state
        .db_client
        .get_user(None, Some(&body.email))
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let user = result.ok_or_else(|| {
        tracing::error!("User not found");
        HttpError::server_error("Login failed")
    })?;

    let password_matched = password::compare(&body.password, &user.password).map_err(|e| {
        tracing::error!("Password error: {}", e);
        HttpError::server_error("Login failed")
    })?;

    if password_matched {
        let access_token = token::create_token(
            &user.id.to_string(),
            app_state.env.jwt_secret.as_bytes(),
            app_state.env.jwt_maxage,
        )
        .map_err(|e| {
            tracing::error!("Access token creation error: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

        let access_cookie = Cookie::build(("access_token", access_token.clone()))
            .path("/")
            .http_only(true)
            .secure(true)
            .build();

        let response = axum::response::Json(UserLoginResponseDto {
            status: "success".to_string(),
            access_token,
        });

        let refresh_token = token::create_token(
            &user.id.to_string(),
            app_state.env.jwt_secret.as_bytes(),
            app_state.env.refresh_token_maxage,
        )
        .map_err(|e| {
            tracing::error!("Refresh token creation error: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

        let refresh_cookie = Cookie::build(("refresh_token", &refresh_token))
            .path("/")
            .http_only(true)
            .secure(true)
            .build();

        let mut headers = HeaderMap::new();

        headers.append(
            header::SET_COOKIE,
            access_cookie.to_string().parse().unwrap(),
        );

        headers.append(
            header::SET_COOKIE,
            refresh_cookie.to_string().parse().unwrap(),
        );

        // Store refresh token in Redis for revocation support
        app_state
            .redis_client
            .save_refresh_token(
                &user.id.to_string(),
                &refresh_token,
                app_state.env.refresh_token_maxage,
            )
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, "RedisDB error, saving refresh token: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?;

        let mut response = response.into_response();
        response.headers_mut().extend(headers);
        tracing::info!("authenticate_process successful");
        Ok(response)
    } else {
        tracing::error!("password mismatch");
        Err(HttpError::server_error("Login failed"))
    }
}

/// Refresh access token using refresh token from cookie
#[instrument(skip(app_state, cookie_jar))]
pub async fn refresh(
    cookie_jar: CookieJar,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let cookies = cookie_jar
        .get("refresh_token")
        .map(|cookie| cookie.value().to_string());

    let token = cookies.ok_or_else(|| {
        tracing::error!("Refresh token not provided");
        HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string())
    })?;

    let token_details = match token::decode_token(&token, app_state.env.jwt_secret.as_bytes()) {
        Ok(token_details) => token_details,
        Err(e) => {
            tracing::error!("Invalid refresh token: {}", e);
            return Err(HttpError::unauthorized(
                ErrorMessage::InvalidToken.to_string(),
            ));
        }
    };

    // Refresh token must still be present in Redis (not revoked)
    let stored_refresh_token = app_state
        .redis_client
        .get_refresh_token(&token_details)
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, getting refresh token: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    if stored_refresh_token.is_none() || stored_refresh_token.unwrap() != token {
        tracing::error!("Refresh token mismatch or not found in Redis");
        return Err(HttpError::unauthorized(
            ErrorMessage::InvalidToken.to_string(),
        ));
    }

    let access_token = token::create_token(
        &token_details,
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| {
        tracing::error!("Access token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let access_cookie = Cookie::build(("access_token", access_token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .build();

    let response = axum::response::Json(RefreshResponseDto {
        status: "success".to_string(),
        access_token,
    });

    let mut headers = HeaderMap::new();

    headers.append(
        header::SET_COOKIE,
        access_cookie.to_string().parse().unwrap(),
    );

    let mut response = response.into_response();
    response.headers_mut().extend(headers);
    tracing::info!("Access token refreshed successfully");
    Ok(response)
}

/// Logout: revoke the refresh token and expire both cookies
#[instrument(skip(user, app_state), fields(email = %user.user.email))]
pub async fn logout(
    Extension(user): Extension<JWTAuthMiddleware>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let user = user.user;

    app_state
        .redis_client
        .delete_refresh_token(&user.id.to_string())
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, deleting refresh token: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let access_cookie = Cookie::build(("access_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .http_only(true)
        .build();

    let refresh_cookie = Cookie::build(("refresh_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        access_cookie.to_string().parse().unwrap(),
    );
    headers.append(
        header::SET_COOKIE,
        refresh_cookie.to_string().parse().unwrap(),
    );

    let json_response = axum::response::Json(Response {
        status: "success",
        message: "Logout successful".to_string(),
    });

    let mut response = json_response.into_response();
    response.headers_mut().extend(headers);
    tracing::info!("logout successful");
    Ok(response)
}
