//! # User Repository
//!
//! ## Two-Phase Insert
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT INTO users (..., code = NULL, ...)   → id = 7                │
//! │    UPDATE users SET code = 1000 + 7 WHERE id = 7                       │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  The code depends on the id, so it can only be written after the       │
//! │  insert. Both statements share one transaction: no reader ever sees    │
//! │  a committed user without a code.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bodega_core::totals::user_code;
use bodega_core::{NewUser, User};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::Dependent;
use crate::error::{DbError, DbResult};

const TABLE: &str = "users";
const UNIQUE: &[&str] = &["tax_id", "email", "code"];
const DEPENDENTS: &[Dependent] = &[
    ("inventory_inflows", "user_id"),
    ("inventory_outflows", "user_id"),
    ("cash_reconciliations", "operator_id"),
    ("cash_reconciliations", "administrator_id"),
];

const SELECT: &str = r#"
    SELECT id, name, surname, code, tax_id, role, email, password_hash,
           active, registered_at, photo, company_id
    FROM users
"#;

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("{SELECT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn list_by_company(&self, company_id: i64) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("{SELECT} WHERE company_id = ?1 ORDER BY id"))
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{SELECT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn exists(&self, id: i64) -> DbResult<bool> {
        super::exists(&self.pool, TABLE, id).await
    }

    /// Another user holding `value` in `column` (`tax_id`, `email` or `code`).
    pub async fn find_duplicate(
        &self,
        column: &'static str,
        value: &str,
        exclude_id: Option<i64>,
    ) -> DbResult<Option<i64>> {
        super::find_duplicate(&self.pool, TABLE, UNIQUE, column, value, exclude_id).await
    }

    /// Inserts a user and assigns its code in the same transaction.
    pub async fn insert(&self, new: &NewUser) -> DbResult<User> {
        debug!(email = %new.email, company_id = new.company_id, "Inserting user");

        let registered_at = Utc::now();
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO users (
                name, surname, code, tax_id, role, email, password_hash,
                active, registered_at, photo, company_id
            ) VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&new.name)
        .bind(&new.surname)
        .bind(&new.tax_id)
        .bind(&new.role)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.active)
        .bind(registered_at)
        .bind(&new.photo)
        .bind(new.company_id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let code = user_code(id);
        sqlx::query("UPDATE users SET code = ?2 WHERE id = ?1")
            .bind(id)
            .bind(code)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(id, code, "User created");

        Ok(User {
            id,
            name: new.name.clone(),
            surname: new.surname.clone(),
            code: Some(code),
            tax_id: new.tax_id.clone(),
            role: new.role.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            active: new.active,
            registered_at,
            photo: new.photo.clone(),
            company_id: new.company_id,
        })
    }

    /// Writes the editable columns of `user`. `code` and `registered_at`
    /// never change after creation.
    pub async fn update(&self, user: &User) -> DbResult<User> {
        debug!(id = user.id, "Updating user");

        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = ?2, surname = ?3, tax_id = ?4, role = ?5, email = ?6,
                password_hash = ?7, active = ?8, photo = ?9, company_id = ?10
            WHERE id = ?1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.surname)
        .bind(&user.tax_id)
        .bind(&user.role)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.active)
        .bind(&user.photo)
        .bind(user.company_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", user.id));
        }

        self.get_by_id(user.id)
            .await?
            .ok_or_else(|| DbError::not_found("User", user.id))
    }

    /// Deletes a user. Refused while movements or reconciliations name it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting user");

        let mut tx = self.pool.begin().await?;
        super::delete_guarded(&mut *tx, "User", TABLE, id, DEPENDENTS).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use crate::error::DbError;

    #[tokio::test]
    async fn test_insert_assigns_code_from_id() {
        let db = db().await;
        let company = db
            .companies()
            .insert(&new_company("1-1", "Acme"))
            .await
            .unwrap();
        let repo = db.users();

        let first = repo
            .insert(&new_user(company.id, "11-1", "a@acme.test"))
            .await
            .unwrap();
        let second = repo
            .insert(&new_user(company.id, "22-2", "b@acme.test"))
            .await
            .unwrap();

        assert_eq!(first.code, Some(1000 + first.id));
        assert_eq!(second.code, Some(1000 + second.id));

        let stored = repo.get_by_id(second.id).await.unwrap().unwrap();
        assert_eq!(stored.code, second.code);
        assert!(stored.active);
        assert_eq!(stored.password_hash, "$argon2id$test");
    }

    #[tokio::test]
    async fn test_duplicate_email_rolls_back() {
        let db = db().await;
        let company = db
            .companies()
            .insert(&new_company("1-1", "Acme"))
            .await
            .unwrap();
        let repo = db.users();
        repo.insert(&new_user(company.id, "11-1", "a@acme.test"))
            .await
            .unwrap();

        let err = repo
            .insert(&new_user(company.id, "22-2", "a@acme.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "email"));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_company_is_foreign_key_violation() {
        let db = db().await;
        let err = db
            .users()
            .insert(&new_user(404, "11-1", "a@acme.test"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_keeps_code() {
        let db = db().await;
        let ids = graph(&db).await;
        let repo = db.users();

        let mut user = repo.get_by_id(ids.user_id).await.unwrap().unwrap();
        let code = user.code;
        user.active = false;
        user.role = "Cashier".to_string();
        user.code = Some(1);

        let updated = repo.update(&user).await.unwrap();
        assert!(!updated.active);
        assert_eq!(updated.role, "Cashier");
        assert_eq!(updated.code, code);
    }

    #[tokio::test]
    async fn test_list_by_company() {
        let db = db().await;
        let ids = graph(&db).await;
        let users = db.users().list_by_company(ids.company_id).await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(db.users().list_by_company(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unreferenced_user() {
        let db = db().await;
        let ids = graph(&db).await;
        db.users().delete(ids.user_id).await.unwrap();
        assert!(!db.users().exists(ids.user_id).await.unwrap());
    }
}
