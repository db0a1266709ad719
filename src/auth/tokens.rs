//! One-time tokens for email verification and password reset.

use rand::{rngs::OsRng, Rng, RngCore};
use time::{Duration, OffsetDateTime};

pub const VERIFICATION_TTL: Duration = Duration::hours(24);
pub const RESET_TTL: Duration = Duration::hours(1);

const RESET_TOKEN_BYTES: usize = 20;

/// Six-digit numeric code, never starting with zero.
pub fn verification_code() -> String {
    OsRng.gen_range(100_000..=999_999u32).to_string()
}

/// 40 lowercase hex characters.
pub fn reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A token is live iff it is present and its expiry is strictly after `now`.
pub fn is_live(expires_at: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
    matches!(expires_at, Some(exp) if exp > now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_code_is_six_digits() {
        for _ in 0..200 {
            let code = verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn reset_token_is_hex_and_unique() {
        let a = reset_token();
        let b = reset_token();
        assert_eq!(a.len(), RESET_TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn liveness_requires_strictly_future_expiry() {
        let now = OffsetDateTime::now_utc();
        assert!(is_live(Some(now + Duration::seconds(1)), now));
        assert!(!is_live(Some(now), now));
        assert!(!is_live(Some(now - Duration::seconds(1)), now));
        assert!(!is_live(None, now));
    }
}
