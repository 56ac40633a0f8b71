use super::DBClient;
use crate::dtos::AdvertisementWithReviews;
use crate::models::Advertisement;
use rust_decimal::Decimal;
use uuid::Uuid;

const AD_COLUMNS: &str = "id, title, price, description, author_id, created_at, image";

// Review texts and count are derived at read time by a LEFT JOIN
// aggregation; nothing about reviews is stored on the advertisement row.
const AD_WITH_REVIEWS_SELECT: &str = r#"
    SELECT a.id, a.title, a.price, a.description, a.author_id, a.created_at, a.image,
           COALESCE(
               array_agg(r.text ORDER BY r.created_at DESC) FILTER (WHERE r.id IS NOT NULL),
               '{}'
           ) AS reviews,
           COUNT(r.id) AS review_count
    FROM advertisement a
    LEFT JOIN review r ON r.ad_id = a.id
"#;

/// Advertisement database operations trait
pub trait AdvertisementExt {
    /// Get the bare stored row, without derived fields (used for
    /// ownership checks and review creation)
    async fn get_ad(&self, ad_id: i64) -> Result<Option<Advertisement>, sqlx::Error>;

    /// Get one advertisement with its review aggregation
    async fn get_ad_with_reviews(
        &self,
        ad_id: i64,
    ) -> Result<Option<AdvertisementWithReviews>, sqlx::Error>;

    /// Paginated listing, newest first, with review aggregation
    async fn get_ads(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<Vec<AdvertisementWithReviews>, sqlx::Error>;

    /// Count all advertisements
    async fn get_ad_count(&self) -> Result<i64, sqlx::Error>;

    /// Paginated listing filtered down to one author, newest first
    async fn get_ads_by_author(
        &self,
        author_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<Vec<Advertisement>, sqlx::Error>;

    /// Count advertisements by one author
    async fn get_ad_count_by_author(&self, author_id: Uuid) -> Result<i64, sqlx::Error>;

    /// Create advertisement; author and creation time are set here and
    /// never change afterwards
    async fn create_ad(
        &self,
        author_id: Uuid,
        title: &str,
        price: Decimal,
        description: &str,
        image: Option<&str>,
    ) -> Result<Advertisement, sqlx::Error>;

    /// Update by primary key only; the caller has already authorized the
    /// mutation, and author/created_at stay untouched
    async fn edit_ad(
        &self,
        ad_id: i64,
        title: &str,
        price: Decimal,
        description: &str,
        image: Option<&str>,
    ) -> Result<Advertisement, sqlx::Error>;

    /// Delete by primary key; cascades to attached reviews
    async fn delete_ad(&self, ad_id: i64) -> Result<(), sqlx::Error>;
}

impl AdvertisementExt for DBClient {
    async fn get_ad(&self, ad_id: i64) -> Result<Option<Advertisement>, sqlx::Error> {
        let query = format!("SELECT {AD_COLUMNS} FROM advertisement WHERE id = $1");
        let ad = sqlx::query_as::<_, Advertisement>(&query)
            .bind(ad_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ad)
    }

    async fn get_ad_with_reviews(
        &self,
        ad_id: i64,
    ) -> Result<Option<AdvertisementWithReviews>, sqlx::Error> {
        let query = format!("{AD_WITH_REVIEWS_SELECT} WHERE a.id = $1 GROUP BY a.id");
        let ad = sqlx::query_as::<_, AdvertisementWithReviews>(&query)
            .bind(ad_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(ad)
    }

    async fn get_ads(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<Vec<AdvertisementWithReviews>, sqlx::Error> {
        let offset = (page - 1) * limit;

        // Pages beyond the data simply come back empty.
        let query = format!(
            "{AD_WITH_REVIEWS_SELECT} GROUP BY a.id ORDER BY a.created_at DESC LIMIT $1 OFFSET $2"
        );
        let ads = sqlx::query_as::<_, AdvertisementWithReviews>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(ads)
    }

    async fn get_ad_count(&self) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM advertisement")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn get_ads_by_author(
        &self,
        author_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<Vec<Advertisement>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let query = format!(
            r#"
            SELECT {AD_COLUMNS}
            FROM advertisement
            WHERE author_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let ads = sqlx::query_as::<_, Advertisement>(&query)
            .bind(author_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(ads)
    }

    async fn get_ad_count_by_author(&self, author_id: Uuid) -> Result<i64, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM advertisement WHERE author_id = $1")
                .bind(author_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn create_ad(
        &self,
        author_id: Uuid,
        title: &str,
        price: Decimal,
        description: &str,
        image: Option<&str>,
    ) -> Result<Advertisement, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO advertisement (author_id, title, price, description, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {AD_COLUMNS}
            "#
        );

        let ad = sqlx::query_as::<_, Advertisement>(&query)
            .bind(author_id)
            .bind(title)
            .bind(price)
            .bind(description)
            .bind(image)
            .fetch_one(&self.pool)
            .await?;

        Ok(ad)
    }

    async fn edit_ad(
        &self,
        ad_id: i64,
        title: &str,
        price: Decimal,
        description: &str,
        image: Option<&str>,
    ) -> Result<Advertisement, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE advertisement
            SET title = $1, price = $2, description = $3, image = $4
            WHERE id = $5
            RETURNING {AD_COLUMNS}
            "#
        );

        let ad = sqlx::query_as::<_, Advertisement>(&query)
            .bind(title)
            .bind(price)
            .bind(description)
            .bind(image)
            .bind(ad_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(ad)
    }

    async fn delete_ad(&self, ad_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM advertisement WHERE id = $1")
            .bind(ad_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
