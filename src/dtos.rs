use crate::models::{Advertisement, Review, User};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// DTOs define the data exchanged with clients. They are separate from the
// database models so the API surface controls exactly what is exposed
// (the password hash in particular never leaves the stores).

/// Shown in place of the review-text list when an advertisement has no
/// reviews yet.
pub const NO_REVIEWS_PLACEHOLDER: &str = "No reviews yet";

// ============================================================================
// Authentication DTOs
// ============================================================================

/// Login request. Email is the identity field, there is no username.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login success response with JWT access token
#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub access_token: String,
}

/// Token refresh response
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponseDto {
    pub status: String,
    pub access_token: String,
}

/// Generic success response
#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

// ============================================================================
// User DTOs
// ============================================================================

/// Registration request. Role is never accepted from clients; new accounts
/// are always plain users.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 1, max = 150, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 150, message = "Last name is required"))]
    pub last_name: String,

    pub phone: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Full profile update (PUT). Identity fields are required; role and
/// password are not mutable through this endpoint.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateUserDto {
    #[validate(
        required(message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "First name is required"),
        length(min = 1, max = 150, message = "First name is required")
    )]
    pub first_name: Option<String>,

    #[validate(
        required(message = "Last name is required"),
        length(min = 1, max = 150, message = "Last name is required")
    )]
    pub last_name: Option<String>,

    pub phone: Option<String>,
    pub avatar: Option<String>,
}

/// Partial profile update (PATCH). Absent fields keep their stored value.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct PatchUserDto {
    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 150, message = "First name must not be empty"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 150, message = "Last name must not be empty"))]
    pub last_name: Option<String>,

    pub phone: Option<String>,
    pub avatar: Option<String>,
}

/// Account deletion confirmation. The owner must supply their current
/// password; admins deleting another account send no body fields.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct DeleteUserDto {
    pub current_password: Option<String>,
}

/// Client-safe user data (excludes the password hash)
#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            email: user.email.to_owned(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            phone: user.phone.to_owned(),
            role: user.role.to_str().to_string(),
            avatar: user.avatar.to_owned(),
            created_at: user.created_at.unwrap(),
            updated_at: user.updated_at.unwrap(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

// ============================================================================
// Pagination DTOs
// ============================================================================

/// Page-number query parameter. Page sizes are fixed per resource, so the
/// client only picks the page.
#[derive(Serialize, Deserialize, Validate, Debug)]
pub struct PageQueryDto {
    #[validate(range(min = 1, message = "Page must be greater than 0"))]
    pub page: Option<i64>,
}

/// Pagination metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationDto {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PaginationDto {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        PaginationDto {
            page,
            limit,
            total,
            total_pages: (total as f64 / limit as f64).ceil() as i64,
        }
    }
}

// ============================================================================
// Advertisement DTOs
// ============================================================================

/// Advertisement create/full-update request (POST and PUT). Fields are
/// Options so missing ones fail validation with a 400 instead of a body
/// rejection; the author always comes from the authenticated identity.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InputAdvertisementDto {
    #[validate(
        required(message = "Title is required"),
        length(min = 1, max = 150, message = "Title must be between 1 and 150 characters")
    )]
    pub title: Option<String>,

    #[validate(required(message = "Price is required"))]
    pub price: Option<Decimal>,

    #[validate(
        required(message = "Description is required"),
        length(min = 1, message = "Description is required")
    )]
    pub description: Option<String>,

    pub image: Option<String>,
}

/// Advertisement partial-update request (PATCH)
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PatchAdvertisementDto {
    #[validate(length(min = 1, max = 150, message = "Title must be between 1 and 150 characters"))]
    pub title: Option<String>,

    pub price: Option<Decimal>,

    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: Option<String>,

    pub image: Option<String>,
}

/// Database row for an advertisement joined with its review aggregation.
/// `reviews` and `review_count` are computed at read time, never stored.
#[derive(Debug, sqlx::FromRow)]
pub struct AdvertisementWithReviews {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
    pub reviews: Vec<String>,
    pub review_count: i64,
}

/// Full advertisement representation: stored attributes plus the derived
/// review-text list and count.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdvertisementDto {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
    pub review: Vec<String>,
    pub review_count: i64,
}

impl AdvertisementDto {
    /// The review list falls back to a fixed placeholder entry when the
    /// advertisement has no reviews; the count stays at the real zero.
    pub fn from_row(row: AdvertisementWithReviews) -> Self {
        let review = if row.reviews.is_empty() {
            vec![NO_REVIEWS_PLACEHOLDER.to_string()]
        } else {
            row.reviews
        };

        AdvertisementDto {
            id: row.id,
            title: row.title,
            price: row.price,
            description: row.description,
            author_id: row.author_id,
            created_at: row.created_at,
            image: row.image,
            review,
            review_count: row.review_count,
        }
    }

    pub fn from_rows(rows: Vec<AdvertisementWithReviews>) -> Vec<Self> {
        rows.into_iter().map(AdvertisementDto::from_row).collect()
    }

    /// Representation of a freshly created advertisement, which cannot
    /// have reviews yet.
    pub fn from_new(ad: Advertisement) -> Self {
        AdvertisementDto {
            id: ad.id,
            title: ad.title,
            price: ad.price,
            description: ad.description,
            author_id: ad.author_id,
            created_at: ad.created_at,
            image: ad.image,
            review: vec![NO_REVIEWS_PLACEHOLDER.to_string()],
            review_count: 0,
        }
    }
}

/// Restricted representation used only by the "list my advertisements"
/// operation; same stored attributes, no derived review fields.
#[derive(Debug, Serialize, Deserialize)]
pub struct MyAdDto {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub image: Option<String>,
}

impl MyAdDto {
    pub fn from_model(ad: Advertisement) -> Self {
        MyAdDto {
            id: ad.id,
            title: ad.title,
            price: ad.price,
            description: ad.description,
            author_id: ad.author_id,
            created_at: ad.created_at,
            image: ad.image,
        }
    }

    pub fn from_models(ads: Vec<Advertisement>) -> Vec<Self> {
        ads.into_iter().map(MyAdDto::from_model).collect()
    }
}

#[derive(Debug, Serialize)]
pub struct AdvertisementResponseDto {
    pub status: String,
    pub data: AdvertisementDto,
}

#[derive(Debug, Serialize)]
pub struct AdvertisementListResponseDto {
    pub status: String,
    pub data: Vec<AdvertisementDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize)]
pub struct MyAdsListResponseDto {
    pub status: String,
    pub data: Vec<MyAdDto>,
    pub pagination: PaginationDto,
}

// ============================================================================
// Review DTOs
// ============================================================================

/// Review creation request. The target advertisement must exist.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateReviewDto {
    #[validate(
        required(message = "Text is required"),
        length(min = 1, message = "Text is required")
    )]
    pub text: Option<String>,

    #[validate(required(message = "Advertisement id is required"))]
    pub ad_id: Option<i64>,
}

/// Review update request (PUT and PATCH); text is the only mutable field.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateReviewDto {
    #[validate(
        required(message = "Text is required"),
        length(min = 1, message = "Text is required")
    )]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PatchReviewDto {
    #[validate(length(min = 1, message = "Text must not be empty"))]
    pub text: Option<String>,
}

/// Direct field-for-field mapping of a stored review
#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewDto {
    pub id: i64,
    pub text: String,
    pub author_id: Uuid,
    pub ad_id: i64,
    pub created_at: DateTime<Utc>,
}

impl ReviewDto {
    pub fn from_model(review: Review) -> Self {
        ReviewDto {
            id: review.id,
            text: review.text,
            author_id: review.author_id,
            ad_id: review.ad_id,
            created_at: review.created_at,
        }
    }

    pub fn from_models(reviews: Vec<Review>) -> Vec<Self> {
        reviews.into_iter().map(ReviewDto::from_model).collect()
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewResponseDto {
    pub status: String,
    pub data: ReviewDto,
}

#[derive(Debug, Serialize)]
pub struct ReviewListResponseDto {
    pub status: String,
    pub data: Vec<ReviewDto>,
    pub pagination: PaginationDto,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use rust_decimal_macros::dec;

    fn sample_row(reviews: Vec<String>) -> AdvertisementWithReviews {
        let count = reviews.len() as i64;
        AdvertisementWithReviews {
            id: 1,
            title: "test".to_string(),
            price: dec!(300.00),
            description: "test adv".to_string(),
            author_id: Uuid::new_v4(),
            created_at: Utc::now(),
            image: None,
            reviews,
            review_count: count,
        }
    }

    #[test]
    fn ad_dto_keeps_review_texts_and_count() {
        let dto = AdvertisementDto::from_row(sample_row(vec!["test review".to_string()]));
        assert_eq!(dto.review, vec!["test review".to_string()]);
        assert_eq!(dto.review_count, 1);
    }

    #[test]
    fn ad_dto_uses_placeholder_when_no_reviews() {
        let dto = AdvertisementDto::from_row(sample_row(vec![]));
        assert_eq!(dto.review, vec![NO_REVIEWS_PLACEHOLDER.to_string()]);
        assert_eq!(dto.review_count, 0);
    }

    #[test]
    fn filter_user_excludes_password() {
        let user = crate::models::User {
            id: Uuid::new_v4(),
            email: "test@test.ru".to_string(),
            first_name: "R".to_string(),
            last_name: "T".to_string(),
            phone: None,
            role: UserRole::User,
            avatar: None,
            password: "$argon2id$hash".to_string(),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };

        let filtered = FilterUserDto::filter_user(&user);
        let json = serde_json::to_value(&filtered).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "test@test.ru");
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn pagination_rounds_total_pages_up() {
        let pagination = PaginationDto::new(1, 4, 9);
        assert_eq!(pagination.total_pages, 3);

        let empty = PaginationDto::new(5, 4, 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn input_ad_without_price_fails_validation() {
        let body = InputAdvertisementDto {
            title: Some("test".to_string()),
            price: None,
            description: Some("test adv".to_string()),
            image: None,
        };
        let err = body.validate().unwrap_err();
        assert!(err.field_errors().contains_key("price"));
    }
}
