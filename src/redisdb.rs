use std::net::IpAddr;

use redis::{AsyncCommands, aio::ConnectionManager};

#[derive(Clone)]
pub struct RedisClient {
    pub conn: ConnectionManager,
}

impl RedisClient {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    // Refresh tokens live in Redis keyed by user id so logout and
    // password-sensitive operations can revoke them server side.

    pub async fn save_refresh_token(
        &self,
        user_id: &str,
        refresh_token: &str,
        expires_in_seconds: i64,
    ) -> redis::RedisResult<()> {
        let key = format!("refresh:{}", user_id);
        let mut conn = self.conn.clone();
        conn.set_ex(key, refresh_token, expires_in_seconds as u64)
            .await
    }

    pub async fn get_refresh_token(&self, user_id: &str) -> redis::RedisResult<Option<String>> {
        let key = format!("refresh:{}", user_id);
        let mut conn = self.conn.clone();
        conn.get(key).await
    }

    pub async fn delete_refresh_token(&self, user_id: &str) -> redis::RedisResult<()> {
        let key = format!("refresh:{}", user_id);
        let mut conn = self.conn.clone();
        conn.del(key).await
    }

    // Login attempt counters. Two windows: per IP per day, and per
    // email+IP per hour. TTLs are set on first increment.

    pub async fn get_ip_attempts(&self, ip: IpAddr) -> redis::RedisResult<Option<u32>> {
        let key = format!("login_ip:{}", ip);
        let mut conn = self.conn.clone();
        conn.get(key).await
    }

    pub async fn get_identifier_ip_attempts(
        &self,
        ip: IpAddr,
        identifier: &str,
    ) -> redis::RedisResult<Option<u32>> {
        let key = format!("login_id:{}:{}", identifier, ip);
        let mut conn = self.conn.clone();
        conn.get(key).await
    }

    pub async fn increment_attempts(&self, ip: IpAddr, identifier: &str) -> redis::RedisResult<()> {
        let ip_key = format!("login_ip:{}", ip);
        let id_key = format!("login_id:{}:{}", identifier, ip);
        let mut conn = self.conn.clone();

        let ip_attempts: u32 = conn.incr(&ip_key, 1u32).await?;
        if ip_attempts == 1 {
            let _: bool = conn.expire(&ip_key, 60 * 60 * 24).await?;
        }

        let id_attempts: u32 = conn.incr(&id_key, 1u32).await?;
        if id_attempts == 1 {
            let _: bool = conn.expire(&id_key, 60 * 60).await?;
        }

        Ok(())
    }

    pub async fn delete_identifier_ip_attempts(
        &self,
        ip: IpAddr,
        identifier: &str,
    ) -> redis::RedisResult<()> {
        let key = format!("login_id:{}:{}", identifier, ip);
        let mut conn = self.conn.clone();
        conn.del(key).await
    }
}
