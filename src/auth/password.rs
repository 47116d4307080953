//! Password hashing. bcrypt is CPU-bound, so both directions run on the
//! blocking pool to keep the async executor free.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::errors::ApiError;

pub async fn hash_password(plain: String) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || hash(&plain, DEFAULT_COST))
        .await
        .map_err(|e| ApiError::Internal(format!("hash task panicked: {e}")))?
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))
}

pub async fn verify_password(plain: String, hashed: String) -> bool {
    tokio::task::spawn_blocking(move || verify(&plain, &hashed).unwrap_or(false))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hashed = hash_password("qwerty123".to_string()).await.unwrap();
        assert_ne!(hashed, "qwerty123");
        assert!(verify_password("qwerty123".to_string(), hashed.clone()).await);
        assert!(!verify_password("wrong".to_string(), hashed).await);
    }

    #[tokio::test]
    async fn test_verify_with_garbage_hash_is_false() {
        assert!(!verify_password("qwerty123".to_string(), "not-a-hash".to_string()).await);
    }
}
