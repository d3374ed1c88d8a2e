//! JWT login, logout and token verification
//!
//! Tokens are HS256-signed `{sub, iat, exp}` claims. Every issued token is
//! recorded in `token_log` and the user's `last_log_id` points at the newest
//! one; a token is only valid while its row exists and its `exp` is in the
//! future. Logout re-signs the stored token with an `exp` in the past.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use scribe_core::{from, insert, update, Connector, Fields, Gateway, Row, Value};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::{AuthError, AuthResult, TokenError};
use crate::password::verify_password;
use crate::response::{ensure, require, require_either, row_i64, row_str, Response};

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Claims for `user_id` expiring `expiry_delta` seconds from now
    pub fn new(user_id: i64, expiry_delta: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            iat: now,
            exp: now + expiry_delta,
        }
    }
}

/// Sign claims with HS256
pub fn encode_token(claims: &Claims, secret: &str) -> AuthResult<String> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&header, claims, &key).map_err(|e| AuthError::SigningError(e.to_string()))
}

/// Check signature and expiry; no leeway is granted
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let key = DecodingKey::from_secret(secret.as_bytes());
    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(e.to_string()),
        })
}

/// Tokens are base64url segments separated by dots
fn is_token_text(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Login parameters: a password plus a username, an email, or both
#[derive(Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Serializes token rotation per user within this process
#[derive(Debug, Default)]
struct SingleFlight {
    inflight: Mutex<HashMap<i64, Arc<AsyncMutex<()>>>>,
}

impl SingleFlight {
    async fn acquire(&self, key: i64) -> Flight<'_> {
        let slot = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(inflight.entry(key).or_default())
        };
        let guard = slot.lock_owned().await;
        Flight {
            owner: self,
            key,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

struct Flight<'a> {
    owner: &'a SingleFlight,
    key: i64,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut inflight = self
            .owner
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // nobody else holds or waits on the slot
        if inflight
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            inflight.remove(&self.key);
        }
    }
}

/// Token issue, verification, rotation and revocation
///
/// Rotation inside [`login`](Self::login) is single-flight per user id for
/// callers sharing this `Authenticator`. Separate processes sharing one
/// database can still race and leave two valid tokens for the same user.
pub struct Authenticator<C> {
    gateway: Arc<Gateway<C>>,
    secret: String,
    flights: SingleFlight,
}

impl<C: Connector> Authenticator<C> {
    pub fn new(gateway: Arc<Gateway<C>>, secret: impl Into<String>) -> Self {
        tracing::debug!("initializing authenticator");
        Self {
            gateway,
            secret: secret.into(),
            flights: SingleFlight::default(),
        }
    }

    /// Look up a token in `token_log` and validate it
    pub async fn verify_token(&self, token: &str) -> AuthResult<Claims> {
        let row = self.find_token(token).await?.ok_or(TokenError::NotFound)?;
        let stored = row_str(&row, "jwt_token").ok_or(TokenError::NotFound)?;
        Ok(decode_token(stored, &self.secret)?)
    }

    /// [`verify_token`](Self::verify_token) as a response
    pub async fn check_token(&self, token: &str) -> Response {
        match self.verify_token(token).await {
            Ok(_) => Response::ok("Valid token!"),
            Err(AuthError::Token(err)) => {
                tracing::info!(error = %err, "token rejected");
                Response::fail("Invalid token!")
            }
            Err(err) => {
                tracing::error!(error = %err, "token verification failed");
                Response::fail("Invalid token!")
            }
        }
    }

    /// Log a user in.
    ///
    /// A still-valid stored token is handed back as is; an absent or expired
    /// one is replaced by a freshly issued token.
    pub async fn login(&self, request: LoginRequest) -> Response {
        tracing::info!("login() running...");
        if let Err(response) = require(&[("password", request.password.is_some())]) {
            return response;
        }
        if let Err(response) = require_either(&[
            ("username", request.username.is_some()),
            ("email", request.email.is_some()),
        ]) {
            return response;
        }

        match self.try_login(&request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = %err, "login failed");
                Response::fail(err.to_string())
            }
        }
    }

    async fn try_login(&self, request: &LoginRequest) -> AuthResult<Response> {
        let Some(user_id) = self.authenticate(request).await? else {
            return Ok(Response::fail("Invalid username or password!"));
        };

        let _flight = self.flights.acquire(user_id).await;

        if let Some(token) = self.current_token(user_id).await? {
            match decode_token(&token, &self.secret) {
                Ok(_) => {
                    return Ok(Response::ok("Already logged in!").with_data(json!({ "token": token })));
                }
                Err(TokenError::Expired) => tracing::debug!(user_id, "stored token expired"),
                Err(err) => return Err(err.into()),
            }
        }

        let token = self.issue_token(user_id).await?;
        Ok(Response::ok("Login successful!").with_data(json!({ "token": token })))
    }

    /// Resolve credentials to an active user id
    async fn authenticate(&self, request: &LoginRequest) -> AuthResult<Option<i64>> {
        let mut filters = Vec::new();
        let mut args = Vec::new();
        if let Some(username) = &request.username {
            filters.push("username=?");
            args.push(Value::from(username));
        }
        if let Some(email) = &request.email {
            filters.push("email=?");
            args.push(Value::from(email));
        }
        let sql = format!(
            "SELECT user_id, password FROM users WHERE {} AND is_active=1 LIMIT 1",
            filters.join(" AND ")
        );

        let envelope = ensure(self.gateway.retrieve(&sql, &args).await)?;
        let Some(row) = envelope.first() else {
            return Ok(None);
        };
        let (Some(user_id), Some(hashed)) = (row_i64(row, "user_id"), row_str(row, "password"))
        else {
            return Err(AuthError::Database(
                "users row lacks user_id or password".to_string(),
            ));
        };

        let password = request.password.as_deref().unwrap_or_default();
        match verify_password(password, hashed).await {
            Ok(true) => Ok(Some(user_id)),
            Ok(false) => Ok(None),
            Err(err) => {
                tracing::warn!(user_id, error = %err, "stored password hash is unreadable");
                Ok(None)
            }
        }
    }

    /// The token `users.last_log_id` points at, if any
    async fn current_token(&self, user_id: i64) -> AuthResult<Option<String>> {
        let query = from(["users", "token_log"])
            .select("users.user_id, token_log.log_id, token_log.jwt_token")
            .join("LEFT JOIN", "users.last_log_id=token_log.log_id")
            .where_([("users.user_id", user_id)])
            .limit(1);
        let envelope = ensure(self.gateway.select(query).await)?;

        Ok(envelope
            .first()
            .and_then(|row| row_str(row, "jwt_token"))
            .filter(|token| !token.is_empty())
            .map(str::to_string))
    }

    /// Issue a token for `user_id`, record it and point `last_log_id` at it
    async fn issue_token(&self, user_id: i64) -> AuthResult<String> {
        let envelope = ensure(
            self.gateway
                .retrieve(
                    "SELECT * FROM users INNER JOIN roles ON users.role_id=roles.role_id WHERE users.user_id=?",
                    &[Value::from(user_id)],
                )
                .await,
        )?;
        let row = envelope
            .first()
            .ok_or_else(|| AuthError::UserNotFound(user_id.to_string()))?;
        let expiry_delta = row_i64(row, "expiry_delta")
            .ok_or_else(|| AuthError::Database("role has no expiry_delta".to_string()))?;

        let token = encode_token(&Claims::new(user_id, expiry_delta), &self.secret)?;
        tracing::info!(user_id, expiry_delta, "JWT token generated");

        let logged = ensure(
            self.gateway
                .insert(insert("token_log").columns_values(
                    Fields::new()
                        .with("user_id", user_id)
                        .with("jwt_token", token.as_str()),
                ))
                .await,
        )?;
        let log_id = logged.last_insert_id.unwrap_or_default();

        ensure(
            self.gateway
                .update(
                    update("users")
                        .set([("last_log_id", log_id)])
                        .where_([("user_id", user_id)]),
                )
                .await,
        )?;
        Ok(token)
    }

    /// Revoke a token by re-signing it with an `exp` in the past
    pub async fn logout(&self, token: &str) -> Response {
        tracing::info!("logout() running...");
        match self.try_logout(token).await {
            Ok(()) => Response::ok("Logout successful!"),
            Err(AuthError::Token(err)) => {
                tracing::info!(error = %err, "logout rejected");
                Response::fail("Invalid token!")
            }
            Err(err) => {
                tracing::error!(error = %err, "logout failed");
                Response::fail(err.to_string())
            }
        }
    }

    async fn try_logout(&self, token: &str) -> AuthResult<()> {
        let row = self.find_token(token).await?.ok_or(TokenError::NotFound)?;
        let log_id = row_i64(&row, "log_id")
            .ok_or_else(|| AuthError::Database("token_log row lacks log_id".to_string()))?;

        let mut claims = decode_token(token, &self.secret)?;
        claims.exp = chrono::Utc::now().timestamp() - 1;
        let revoked = encode_token(&claims, &self.secret)?;

        ensure(
            self.gateway
                .update(
                    update("token_log")
                        .set([("jwt_token", revoked.as_str())])
                        .where_([("log_id", log_id)]),
                )
                .await,
        )?;
        Ok(())
    }

    async fn find_token(&self, token: &str) -> AuthResult<Option<Row>> {
        // token text ends up in generated SQL
        if !is_token_text(token) {
            return Err(TokenError::Malformed("unexpected characters in token".to_string()).into());
        }
        let envelope = ensure(
            self.gateway
                .select(from("token_log").where_([("jwt_token", token)]).limit(1))
                .await,
        )?;
        Ok(envelope.data.into_iter().next())
    }
}
