use super::DBClient;
use crate::models::Review;
use uuid::Uuid;

const REVIEW_COLUMNS: &str = "id, text, author_id, ad_id, created_at";

/// Review database operations trait
pub trait ReviewExt {
    async fn get_review(&self, review_id: i64) -> Result<Option<Review>, sqlx::Error>;

    /// Paginated listing of all reviews, newest first
    async fn get_reviews(&self, page: i64, limit: i64) -> Result<Vec<Review>, sqlx::Error>;

    async fn get_review_count(&self) -> Result<i64, sqlx::Error>;

    /// Create a review; the caller has verified the advertisement exists
    async fn create_review(
        &self,
        author_id: Uuid,
        ad_id: i64,
        text: &str,
    ) -> Result<Review, sqlx::Error>;

    /// Update by primary key only; ownership is checked by the caller.
    /// Text is the only mutable field.
    async fn edit_review(&self, review_id: i64, text: &str) -> Result<Review, sqlx::Error>;

    async fn delete_review(&self, review_id: i64) -> Result<(), sqlx::Error>;
}

impl ReviewExt for DBClient {
    async fn get_review(&self, review_id: i64) -> Result<Option<Review>, sqlx::Error> {
        let query = format!("SELECT {REVIEW_COLUMNS} FROM review WHERE id = $1");
        let review = sqlx::query_as::<_, Review>(&query)
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(review)
    }

    async fn get_reviews(&self, page: i64, limit: i64) -> Result<Vec<Review>, sqlx::Error> {
        let offset = (page - 1) * limit;

        let query = format!(
            r#"
            SELECT {REVIEW_COLUMNS}
            FROM review
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        );
        let reviews = sqlx::query_as::<_, Review>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(reviews)
    }

    async fn get_review_count(&self) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM review")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create_review(
        &self,
        author_id: Uuid,
        ad_id: i64,
        text: &str,
    ) -> Result<Review, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO review (author_id, ad_id, text)
            VALUES ($1, $2, $3)
            RETURNING {REVIEW_COLUMNS}
            "#
        );

        let review = sqlx::query_as::<_, Review>(&query)
            .bind(author_id)
            .bind(ad_id)
            .bind(text)
            .fetch_one(&self.pool)
            .await?;

        Ok(review)
    }

    async fn edit_review(&self, review_id: i64, text: &str) -> Result<Review, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE review
            SET text = $1
            WHERE id = $2
            RETURNING {REVIEW_COLUMNS}
            "#
        );

        let review = sqlx::query_as::<_, Review>(&query)
            .bind(text)
            .bind(review_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(review)
    }

    async fn delete_review(&self, review_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM review WHERE id = $1")
            .bind(review_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
