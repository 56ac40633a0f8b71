use crate::AppState;
use crate::db::AdvertisementExt;
use crate::dtos::{
    AdvertisementDto, AdvertisementListResponseDto, AdvertisementResponseDto,
    InputAdvertisementDto, MyAdDto, MyAdsListResponseDto, PageQueryDto, PaginationDto,
    PatchAdvertisementDto,
};
use crate::error::{ErrorMessage, HttpError};
use crate::middleware::{JWTAuthMiddleware, auth};
use crate::models::Advertisement;
use crate::permissions;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post, put};
use axum::{Extension, Router, middleware};
use tracing::instrument;
use validator::Validate;

// Fixed page size for advertisement listings
const ADS_PAGE_SIZE: i64 = 4;

/// Router for advertisement endpoints.
///
/// Listing is public; retrieve and create require authentication;
/// mutation additionally requires author-or-admin.
pub fn advertisement_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_ads))
        .route(
            "/",
            post(create_ad)
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/{ad_id}",
            get(get_ad).route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/{ad_id}",
            put(edit_ad)
                .patch(patch_ad)
                .delete(delete_ad)
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// Router for the "my advertisements" listing, nested under /advs
pub fn my_ads_handler(app_state: AppState) -> Router<AppState> {
    Router::new().route(
        "/me",
        get(get_my_ads).route_layer(middleware::from_fn_with_state(app_state, auth)),
    )
}

/// List advertisements, newest first
///
/// Publicly accessible. Each item carries the derived review-text list
/// and count; pages beyond the data return an empty list.
#[instrument(skip(app_state))]
pub async fn get_ads(
    Query(params): Query<PageQueryDto>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_ads input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let page = params.page.unwrap_or(1);

    let ads = app_state
        .db_client
        .get_ads(page, ADS_PAGE_SIZE)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting ads: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state.db_client.get_ad_count().await.map_err(|e| {
        tracing::error!("DB error, getting ad count: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let response = Json(AdvertisementListResponseDto {
        status: "success".to_string(),
        data: AdvertisementDto::from_rows(ads),
        pagination: PaginationDto::new(page, ADS_PAGE_SIZE, total),
    });
    tracing::info!("get_ads successful");
    Ok(response)
}

/// Retrieve one advertisement with its derived review fields
#[instrument(skip(app_state, jwt), fields(email = %jwt.user.email))]
pub async fn get_ad(
    Path(ad_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let ad = app_state
        .db_client
        .get_ad_with_reviews(ad_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting ad: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::AdvertisementNotFound.to_string()))?;

    let response = Json(AdvertisementResponseDto {
        status: "success".to_string(),
        data: AdvertisementDto::from_row(ad),
    });
    tracing::info!("get_ad successful");
    Ok(response)
}

/// Create advertisement
///
/// Request body: { title, price, description, image? }. The author is
/// always the authenticated identity. Returns 201.
#[instrument(skip(app_state, body, jwt), fields(email = %jwt.user.email))]
pub async fn create_ad(
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<InputAdvertisementDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid create_ad input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let ad = app_state
        .db_client
        .create_ad(
            jwt.user.id,
            body.title.as_deref().unwrap(),
            body.price.unwrap(),
            body.description.as_deref().unwrap(),
            body.image.as_deref(),
        )
        .await
        .map_err(|e| {
            tracing::error!("DB error, creating ad: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(AdvertisementResponseDto {
        status: "success".to_string(),
        data: AdvertisementDto::from_new(ad),
    });
    tracing::info!("create_ad successful");
    Ok((StatusCode::CREATED, response))
}

/// Full update (PUT); author-or-admin only
#[instrument(skip(app_state, body, jwt), fields(email = %jwt.user.email))]
pub async fn edit_ad(
    Path(ad_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<InputAdvertisementDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid edit_ad input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let ad = fetch_ad(&app_state, ad_id).await?;

    permissions::author_or_admin(&jwt.user, ad.author_id)?;

    save_and_respond(
        &app_state,
        ad_id,
        body.title.as_deref().unwrap(),
        body.price.unwrap(),
        body.description.as_deref().unwrap(),
        body.image.as_deref(),
    )
    .await
}

/// Partial update (PATCH); author-or-admin only.
/// Absent fields keep their stored value.
#[instrument(skip(app_state, body, jwt), fields(email = %jwt.user.email))]
pub async fn patch_ad(
    Path(ad_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
    Json(body): Json<PatchAdvertisementDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::error!("Invalid patch_ad input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let ad = fetch_ad(&app_state, ad_id).await?;

    permissions::author_or_admin(&jwt.user, ad.author_id)?;

    let title = body.title.unwrap_or(ad.title);
    let price = body.price.unwrap_or(ad.price);
    let description = body.description.unwrap_or(ad.description);
    let image = body.image.or(ad.image);

    save_and_respond(
        &app_state,
        ad_id,
        &title,
        price,
        &description,
        image.as_deref(),
    )
    .await
}

/// Delete advertisement; author-or-admin only. Cascades to its reviews.
#[instrument(skip(app_state, jwt), fields(email = %jwt.user.email))]
pub async fn delete_ad(
    Path(ad_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let ad = fetch_ad(&app_state, ad_id).await?;

    permissions::author_or_admin(&jwt.user, ad.author_id)?;

    app_state.db_client.delete_ad(ad_id).await.map_err(|e| {
        tracing::error!("DB error, deleting ad: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    tracing::info!("delete_ad successful");
    Ok(StatusCode::NO_CONTENT)
}

/// List the requester's own advertisements
///
/// Always authenticated; only items authored by the requesting identity
/// are returned, in the restricted representation without review fields.
#[instrument(skip(app_state, jwt), fields(email = %jwt.user.email))]
pub async fn get_my_ads(
    Query(params): Query<PageQueryDto>,
    State(app_state): State<AppState>,
    Extension(jwt): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(|e| {
        tracing::error!("Invalid get_my_ads input: {}", e);
        HttpError::bad_request(e.to_string())
    })?;

    let page = params.page.unwrap_or(1);

    let ads = app_state
        .db_client
        .get_ads_by_author(jwt.user.id, page, ADS_PAGE_SIZE)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting my ads: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let total = app_state
        .db_client
        .get_ad_count_by_author(jwt.user.id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting my ad count: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let response = Json(MyAdsListResponseDto {
        status: "success".to_string(),
        data: MyAdDto::from_models(ads),
        pagination: PaginationDto::new(page, ADS_PAGE_SIZE, total),
    });
    tracing::info!("get_my_ads successful");
    Ok(response)
}

async fn fetch_ad(app_state: &AppState, ad_id: i64) -> Result<Advertisement, HttpError> {
    let ad = app_state.db_client.get_ad(ad_id).await.map_err(|e| {
        tracing::error!("DB error, getting ad: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    ad.ok_or_else(|| HttpError::not_found(ErrorMessage::AdvertisementNotFound.to_string()))
}

async fn save_and_respond(
    app_state: &AppState,
    ad_id: i64,
    title: &str,
    price: rust_decimal::Decimal,
    description: &str,
    image: Option<&str>,
) -> Result<axum::response::Response, HttpError> {
    app_state
        .db_client
        .edit_ad(ad_id, title, price, description, image)
        .await
        .map_err(|e| {
            tracing::error!("DB error, editing ad: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    // Re-read with the review aggregation so the response carries the
    // derived fields.
    let ad = app_state
        .db_client
        .get_ad_with_reviews(ad_id)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting ad: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::AdvertisementNotFound.to_string()))?;

    let response = Json(AdvertisementResponseDto {
        status: "success".to_string(),
        data: AdvertisementDto::from_row(ad),
    });
    tracing::info!("edit_ad successful");
    Ok(response.into_response())
}
