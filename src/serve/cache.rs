use chrono::Duration;
use redis::RedisError;
use serde_json::Value;

const ALPHA_FEED_KEY: &str = "OKLG_alpha_as_a_service";

const PRICE_TTL_SECONDS: i64 = 600;

pub fn validated_key(address: &str) -> String {
    format!("alpha_validated_{}", address.to_lowercase())
}

pub fn price_key(token: &str) -> String {
    format!("token.{}.price", token.to_lowercase())
}

/// Raw validation flag as stored, `None` when the address never validated
/// or the entry expired.
pub async fn get_validated_flag(
    client: &redis::Client,
    address: &str,
) -> Result<Option<String>, RedisError> {
    let mut conn = client.get_async_connection().await?;
    redis::cmd("GET")
        .arg(validated_key(address))
        .query_async(&mut conn)
        .await
}

pub async fn set_validated_flag(
    client: &redis::Client,
    address: &str,
    validated: bool,
    ttl: Duration,
) -> Result<(), RedisError> {
    let mut conn = client.get_async_connection().await?;
    redis::cmd("SET")
        .arg(validated_key(address))
        .arg(if validated { "true" } else { "false" })
        .arg("EX")
        .arg(ttl.num_seconds())
        .query_async(&mut conn)
        .await
}

pub async fn get_price(
    client: &redis::Client,
    token: &str,
) -> Result<Option<String>, RedisError> {
    let mut conn = client.get_async_connection().await?;
    redis::cmd("GET")
        .arg(price_key(token))
        .query_async(&mut conn)
        .await
}

pub async fn set_price(
    client: &redis::Client,
    token: &str,
    price: &str,
) -> Result<(), RedisError> {
    let mut conn = client.get_async_connection().await?;
    redis::cmd("SET")
        .arg(price_key(token))
        .arg(price)
        .arg("EX")
        .arg(PRICE_TTL_SECONDS)
        .query_async(&mut conn)
        .await
}

/// Newest alpha feed entries, undecodable ones silently dropped.
pub async fn get_alpha_entries(
    client: &redis::Client,
    amount: isize,
) -> Result<Vec<Value>, RedisError> {
    let mut conn = client.get_async_connection().await?;
    let raw: Vec<String> = redis::cmd("LRANGE")
        .arg(ALPHA_FEED_KEY)
        .arg(0)
        .arg(amount)
        .query_async(&mut conn)
        .await?;

    Ok(raw
        .iter()
        .filter_map(|entry| serde_json::from_str(entry).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_case_normalized() {
        assert_eq!(
            validated_key("0xABCdef0123456789abcDEF0123456789ABCDEF01"),
            "alpha_validated_0xabcdef0123456789abcdef0123456789abcdef01"
        );
        assert_eq!(
            price_key("0x5DBB9f64cd96E2dbbca58d14863d615B67B42f2e"),
            "token.0x5dbb9f64cd96e2dbbca58d14863d615b67b42f2e.price"
        );
    }
}
