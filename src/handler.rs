pub mod advertisement;
pub mod auth;
pub mod review;
pub mod users;
