//! # User Repository
//!
//! Login accounts attached to employees. Passwords are stored as argon2
//! PHC strings and verified with `PasswordVerifier`.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use ruedas_core::entities::{AuthenticatedUser, NewUserAccount};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Inserts a user row with an already-hashed password.
pub(crate) async fn insert_user(
    conn: &mut SqliteConnection,
    employee_id: i64,
    account: &NewUserAccount,
    password_hash: &str,
) -> DbResult<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (username, password_hash, user_type, employee_id, active, created_at)
        VALUES (?1, ?2, ?3, ?4, 1, ?5)
        RETURNING id
        "#,
    )
    .bind(account.username.trim())
    .bind(password_hash)
    .bind(account.user_type)
    .bind(employee_id)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
            field,
            value: account.username.trim().to_string(),
        },
        other => other,
    })?;

    Ok(id)
}

#[derive(Debug, FromRow)]
struct UserRow {
    #[sqlx(flatten)]
    user: AuthenticatedUser,
    password_hash: String,
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Verifies credentials.
    ///
    /// ## Returns
    /// * `Ok(Some(user))` - username exists, is active, and the password matches
    /// * `Ok(None)` - unknown user, inactive user, or wrong password
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Option<AuthenticatedUser>> {
        debug!(username = %username, "Authenticating user");

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                u.id AS user_id,
                u.username,
                TRIM(e.first_name || ' ' || e.last_name_1 || ' ' || COALESCE(e.last_name_2, '')) AS full_name,
                u.user_type,
                u.employee_id,
                u.active,
                u.password_hash
            FROM users u
            JOIN employees e ON e.id = u.employee_id
            WHERE u.username = ?1
            "#,
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            warn!(username = %username, "Login for unknown user");
            return Ok(None);
        };

        if !row.user.active {
            warn!(username = %username, "Login for inactive user");
            return Ok(None);
        }

        if !verify_password(password, &row.password_hash) {
            warn!(username = %username, "Login with wrong password");
            return Ok(None);
        }

        Ok(Some(row.user))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("admin123").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("admin123", &hash));
        assert!(!verify_password("admin124", &hash));
        assert!(!verify_password("admin123", "plaintext"));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let employee_id: i64 = sqlx::query_scalar(
            "INSERT INTO employees (first_name, last_name_1, rfc, created_at) VALUES ('Ana', 'Ruiz', 'RUAA800101AB1', ?1) RETURNING id",
        )
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await
        .unwrap();

        let account = NewUserAccount {
            username: "caja1".to_string(),
            password: "secreto1".to_string(),
            user_type: 2,
        };
        let hash = hash_password(&account.password).unwrap();
        insert_user(&mut conn, employee_id, &account, &hash).await.unwrap();
        let duplicate = insert_user(&mut conn, employee_id, &account, &hash).await.unwrap_err();
        assert!(duplicate.is_unique_violation_on("username"));
        drop(conn);

        let users = db.users();
        let user = users.authenticate("caja1", "secreto1").await.unwrap().unwrap();
        assert_eq!(user.full_name, "Ana Ruiz");
        assert_eq!(user.employee_id, employee_id);

        assert!(users.authenticate("caja1", "otro").await.unwrap().is_none());
        assert!(users.authenticate("nadie", "secreto1").await.unwrap().is_none());
    }
}
