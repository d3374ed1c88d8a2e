//! User registration: create, edit and soft-delete
//!
//! User-supplied text (names, emails, passwords) is only ever sent through
//! bound arguments; the generated-SQL path sees ids and flags only.

use std::sync::Arc;

use scribe_core::{from, update, Connector, Gateway, Value};
use serde::Deserialize;
use serde_json::json;

use crate::error::AuthResult;
use crate::password::hash_password;
use crate::response::{ensure, require, Response};

/// New account parameters
#[derive(Clone, Default, Deserialize)]
pub struct NewUser {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Fields to change on an existing account; absent fields stay untouched
#[derive(Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub struct Registry<C> {
    gateway: Arc<Gateway<C>>,
    bcrypt_cost: u32,
}

impl<C: Connector> Registry<C> {
    pub fn new(gateway: Arc<Gateway<C>>, bcrypt_cost: u32) -> Self {
        tracing::debug!("initializing registry");
        Self {
            gateway,
            bcrypt_cost,
        }
    }

    /// Create an active user; username and email must be unused among
    /// active users.
    pub async fn create_user(&self, user: NewUser) -> Response {
        tracing::info!("create_user() running...");
        if let Err(response) = require(&[
            ("username", user.username.is_some()),
            ("password", user.password.is_some()),
            ("email", user.email.is_some()),
        ]) {
            return response;
        }

        self.try_create(user).await.unwrap_or_else(|err| {
            tracing::error!(error = %err, "create_user failed");
            Response::fail(err.to_string())
        })
    }

    async fn try_create(&self, user: NewUser) -> AuthResult<Response> {
        let username = user.username.unwrap_or_default();
        let email = user.email.unwrap_or_default();

        let existing = ensure(
            self.gateway
                .retrieve(
                    "SELECT user_id FROM users WHERE (username=? OR email=?) AND is_active=1",
                    &[Value::from(&username), Value::from(&email)],
                )
                .await,
        )?;
        if existing.rows_affected > 0 {
            return Ok(Response::fail("Username or email already existed."));
        }

        let password = user.password.as_deref().unwrap_or_default();
        let hashed = hash_password(password, self.bcrypt_cost).await?;
        let created = ensure(
            self.gateway
                .execute(
                    "INSERT INTO users (username, password, email, first_name, last_name, is_active) VALUES (?, ?, ?, ?, ?, 1)",
                    &[
                        Value::from(username),
                        Value::from(hashed),
                        Value::from(email),
                        Value::from(user.first_name),
                        Value::from(user.last_name),
                    ],
                )
                .await,
        )?;

        tracing::info!(user_id = ?created.last_insert_id, "user created");
        Ok(Response::ok("User has been created successfully.")
            .with_data(json!({ "user_id": created.last_insert_id })))
    }

    /// Update the supplied fields of an active user
    pub async fn edit_user(&self, changes: UserUpdate) -> Response {
        tracing::info!("edit_user() running...");
        if let Err(response) = require(&[("user_id", changes.user_id.is_some())]) {
            return response;
        }
        let user_id = changes.user_id.unwrap_or_default();

        self.try_edit(user_id, changes).await.unwrap_or_else(|err| {
            tracing::error!(user_id, error = %err, "edit_user failed");
            Response::fail(err.to_string())
        })
    }

    async fn try_edit(&self, user_id: i64, changes: UserUpdate) -> AuthResult<Response> {
        let found = ensure(
            self.gateway
                .retrieve(
                    "SELECT user_id FROM users WHERE user_id=? AND is_active=1",
                    &[Value::from(user_id)],
                )
                .await,
        )?;
        if found.rows_affected == 0 {
            return Ok(Response::fail("User does not exist."));
        }

        let password = match changes.password.as_deref() {
            Some(password) => Some(hash_password(password, self.bcrypt_cost).await?),
            None => None,
        };
        let fields = [
            ("username", changes.username),
            ("password", password),
            ("email", changes.email),
            ("first_name", changes.first_name),
            ("last_name", changes.last_name),
        ];

        let mut assignments = Vec::new();
        let mut args = Vec::new();
        for (column, value) in fields {
            if let Some(value) = value {
                assignments.push(format!("{}=?", column));
                args.push(Value::from(value));
            }
        }
        if assignments.is_empty() {
            return Ok(Response::fail("No user information to update."));
        }
        args.push(Value::from(user_id));

        let sql = format!(
            "UPDATE users SET {} WHERE user_id=? AND is_active=1",
            assignments.join(", ")
        );
        ensure(self.gateway.execute(&sql, &args).await)?;
        Ok(Response::ok("User information has been updated."))
    }

    /// Soft delete: flip `is_active` to 0
    pub async fn remove_user(&self, user_id: i64) -> Response {
        tracing::info!("remove_user() running...");
        self.try_remove(user_id).await.unwrap_or_else(|err| {
            tracing::error!(user_id, error = %err, "remove_user failed");
            Response::fail(err.to_string())
        })
    }

    async fn try_remove(&self, user_id: i64) -> AuthResult<Response> {
        let found = ensure(
            self.gateway
                .select(
                    from("users")
                        .select("user_id")
                        .where_([("user_id", user_id), ("is_active", 1)]),
                )
                .await,
        )?;
        if found.rows_affected == 0 {
            return Ok(Response::fail("Invalid credentials!"));
        }

        ensure(
            self.gateway
                .update(
                    update("users")
                        .set([("is_active", 0)])
                        .where_([("user_id", user_id)]),
                )
                .await,
        )?;
        Ok(Response::ok("User has been removed."))
    }
}
