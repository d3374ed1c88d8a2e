//! Password hashing on the blocking thread pool

use bcrypt::{hash, verify};

use crate::error::{AuthError, AuthResult};

/// Hash a password with bcrypt at `cost`.
///
/// The salt is random, so the same password never hashes twice to the same
/// string; compare with [`verify_password`], not in SQL.
pub async fn hash_password(password: &str, cost: u32) -> AuthResult<String> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || {
        hash(password, cost).map_err(|e| AuthError::HashingError(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::HashingError(format!("Task join error: {}", e)))?
}

/// Verify a password against a bcrypt hash
pub async fn verify_password(password: &str, hashed: &str) -> AuthResult<bool> {
    let password = password.to_string();
    let hashed = hashed.to_string();

    tokio::task::spawn_blocking(move || {
        verify(password, &hashed).map_err(|e| AuthError::HashingError(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::HashingError(format!("Task join error: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hashed = hash_password("12345678", 4).await.unwrap();
        assert!(hashed.starts_with("$2"));
        assert!(verify_password("12345678", &hashed).await.unwrap());
        assert!(!verify_password("87654321", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let first = hash_password("secret", 4).await.unwrap();
        let second = hash_password("secret", 4).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage_hash() {
        let result = verify_password("secret", "not-a-bcrypt-hash").await;
        assert!(matches!(result, Err(AuthError::HashingError(_))));
    }
}
