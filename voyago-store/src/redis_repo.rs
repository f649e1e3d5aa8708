use redis::{AsyncCommands, RedisResult};
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Blocks a seat for one checkout session while payment completes.
    /// Returns false when another session already holds the seat.
    pub async fn block_seat(
        &self,
        service_id: Uuid,
        seat_number: &str,
        session_id: Uuid,
        ttl_seconds: u64,
    ) -> Result<bool, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("seat:{}:{}", service_id, seat_number);

        // SET NX: only set if the key does not exist
        let result: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(session_id.to_string())
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await?;

        if result.is_some() {
            info!("Seat block taken: {} seat {}", service_id, seat_number);
        }
        Ok(result.is_some())
    }

    /// Frees a seat block early, but only for the session that owns it.
    pub async fn release_seat_block(
        &self,
        service_id: Uuid,
        seat_number: &str,
        session_id: Uuid,
    ) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("seat:{}:{}", service_id, seat_number);
        let script = redis::Script::new(
            r#"
            if redis.call("GET", KEYS[1]) == ARGV[1] then
                return redis.call("DEL", KEYS[1])
            else
                return 0
            end
        "#,
        );
        let deleted: i64 = script
            .key(key)
            .arg(session_id.to_string())
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }

    /// Sessions holding live blocks on the given seats, in seat order.
    /// A seat with no block, or an unparseable owner, yields None.
    pub async fn seat_block_owners(
        &self,
        service_id: Uuid,
        seats: &[String],
    ) -> RedisResult<Vec<Option<Uuid>>> {
        if seats.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let keys: Vec<String> = seats
            .iter()
            .map(|s| format!("seat:{}:{}", service_id, s))
            .collect();
        let owners: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;
        Ok(owners
            .into_iter()
            .map(|o| o.and_then(|s| Uuid::parse_str(&s).ok()))
            .collect())
    }

    pub async fn get_availability(&self, service_id: Uuid) -> RedisResult<Option<i32>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("availability:{}", service_id);
        conn.get(key).await
    }

    pub async fn set_availability(
        &self,
        service_id: Uuid,
        count: i32,
        ttl_seconds: u64,
    ) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("availability:{}", service_id);
        conn.set_ex(key, count, ttl_seconds).await
    }

    /// Drops the cached count after a reservation or release so the next
    /// search re-seeds it from the database.
    pub async fn invalidate_availability(&self, service_id: Uuid) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("availability:{}", service_id);
        conn.del(key).await
    }

    pub async fn check_rate_limit(
        &self,
        key: &str,
        limit: i64,
        window_seconds: i64,
    ) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, window_seconds)
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}
