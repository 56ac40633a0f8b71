use sqlx::{Pool, Postgres};

mod user;
pub use user::UserExt;

mod advertisement;
pub use advertisement::AdvertisementExt;

mod review;
pub use review::ReviewExt;

#[derive(Debug, Clone)]
pub struct DBClient {
    pool: Pool<Postgres>,
}
impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }
}
