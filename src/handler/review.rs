use crate::AppState;
use crate::db::{AdvertisementExt, ReviewExt};
use crate::dtos::{
    CreateReviewDto, PageQueryDto, PaginationDto, PatchReviewDto, ReviewDto,
    ReviewListResponseDto, ReviewResponseDto, UpdateReviewDto,
};
use crate::error::{ErrorMessage, HttpError};
use crate::middleware::{JWTAuthMiddleware, auth};
use crate::models::Review;
use crate::permissions;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post, put};
use axum::{Extension, Router, middleware};
use tracing::instrument;
use validator::Validate;

// Fixed page size for review listings
const REVIEWS_PAGE_SIZE: i64 = 10;

/// Router for review endpoints; same access shape as advertisements,
/// different page size.
pub fn review_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_reviews))
        .route(
            "/",
            post(create_review)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/{review_id}",
            get(get_review).route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/{review_id}",
            put(edit_review)
                .patch(patch_review)
                .delete(delete_review)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// List reviews, newest first. Public; out-of-range pages are empty.
#[instrument(skip(app_state))]
pub async fn get_reviews(
    Query(params): Query<PageQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_reviews input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let page = params.page.unwrap_or(1);

    let reviews = app_state
        .db_client
        .get_reviews(page, REVIEWS_PAGE_SIZE)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting reviews: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state.db_client.get_review_count().await.map_err(|e| {
        tracing::error!("DB error, getting review count: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let response = Json(ReviewListResponseDto {
        status: "success".to_string(),
        data: ReviewDto::from_models(reviews),
        pagination: PaginationDto::new(page, REVIEWS_PAGE_SIZE, total),
    });
    tracing::info!("get_reviews successful");
    Ok(response)
}

/// Retrieve one review
#[instrument(skip(app_state, jwt), fields(email = %jwt.user.email))]
pub async fn get_review(
    Path(review_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let review = fetch_review(&app_state, review_id).await?;

    let response = Json(ReviewResponseDto {
        status: "success".to_string(),
        data: ReviewDto::from_model(review),
    });
    tracing::info!("get_review successful");
    Ok(response)
}

/// Create review on an advertisement
///
/// Request body: { text, ad_id }. The advertisement must exist; the
/// author is the authenticated identity. Returns 201.
#[instrument(skip(app_state, body, jwt), fields(email = %jwt.user.email))]
pub async fn create_review(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<CreateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_review input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let ad_id = body.ad_id.unwrap();

    // Reviews must reference an existing advertisement
    let ad = app_state.db_client.get_ad(ad_id).await.map_err(|e| {
        tracing::error!("DB error, getting ad: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    if ad.is_none() {
        tracing::error!(ad_id, "Review creation against unknown advertisement");
        return Err(HttpError::bad_request(
            "Advertisement does not exist".to_string(),
        ));
    }

    let review = app_state
        .db_client
        .create_review(jwt.user.id, ad_id, body.text.as_deref().unwrap())
        .await
        .map_err(|e| {
            tracing::error!("DB error, creating review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(ReviewResponseDto {
        status: "success".to_string(),
        data: ReviewDto::from_model(review),
    });
    tracing::info!("create_review successful");
    Ok((StatusCode::CREATED, response))
}

/// Full update (PUT); author-or-admin only. Text is the only mutable
/// field, the target advertisement never changes.
#[instrument(skip(app_state, body, jwt), fields(email = %jwt.user.email))]
pub async fn edit_review(
    Path(review_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<UpdateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid edit_review input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let review = fetch_review(&app_state, review_id).await?;

    permissions::author_or_admin(&jwt.user, review.author_id)?;

    save_and_respond(&app_state, review_id, body.text.as_deref().unwrap()).await
}

/// Partial update (PATCH); author-or-admin only
#[instrument(skip(app_state, body, jwt), fields(email = %jwt.user.email))]
pub async fn patch_review(
    Path(review_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<PatchReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid patch_review input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let review = fetch_review(&app_state, review_id).await?;

    permissions::author_or_admin(&jwt.user, review.author_id)?;

    let text = body.text.unwrap_or(review.text);

    save_and_respond(&app_state, review_id, &text).await
}

/// Delete review; author-or-admin only
#[instrument(skip(app_state, jwt), fields(email = %jwt.user.email))]
pub async fn delete_review(
    Path(review_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let review = fetch_review(&app_state, review_id).await?;

    permissions::author_or_admin(&jwt.user, review.author_id)?;

    app_state
        .db_client
        .delete_review(review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, deleting review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    tracing::info!("delete_review successful");
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_review(app_state: &AppState, review_id: i64) -> Result<Review, HttpError> {
    let review = app_state
        .db_client
        .get_review(review_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    review.ok_or_else(|| HttpError::not_found(ErrorMessage::ReviewNotFound.to_string()))
}

async fn save_and_respond(
    app_state: &AppState,
    review_id: i64,
    text: &str,
) -> Result<axum::response::Response, HttpError> {
    let review = app_state
        .db_client
        .edit_review(review_id, text)
        .await
        .map_err(|e| {
            tracing::error!("DB error, editing review: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(ReviewResponseDto {
        status: "success".to_string(),
        data: ReviewDto::from_model(review),
    });
    tracing::info!("edit_review successful");
    Ok(response.into_response())
}
