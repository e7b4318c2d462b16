//! User repository for the recipient store.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::Result;
use crate::database::models::{ClientProfileDbModel, EmployeeProfileDbModel, UserDbModel};

/// Read access to the recipient store, plus the writes needed to seed it.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Every known user.
    async fn find_all(&self) -> Result<Vec<UserDbModel>>;

    /// Users that own a client profile.
    async fn find_with_client_profile(&self) -> Result<Vec<UserDbModel>>;

    /// Users that own an employee profile.
    async fn find_with_employee_profile(&self) -> Result<Vec<UserDbModel>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<UserDbModel>>;

    async fn create(&self, user: &UserDbModel) -> Result<()>;

    async fn create_client_profile(&self, profile: &ClientProfileDbModel) -> Result<()>;

    async fn create_employee_profile(&self, profile: &EmployeeProfileDbModel) -> Result<()>;

    async fn count(&self) -> Result<i64>;
}

/// SQLx implementation of UserRepository.
pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn find_all(&self) -> Result<Vec<UserDbModel>> {
        let users = sqlx::query_as::<_, UserDbModel>(
            "SELECT * FROM users ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn find_with_client_profile(&self) -> Result<Vec<UserDbModel>> {
        let users = sqlx::query_as::<_, UserDbModel>(
            r#"
            SELECT u.* FROM users u
            INNER JOIN client_profiles cp ON cp.user_id = u.id
            ORDER BY u.created_at, u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn find_with_employee_profile(&self) -> Result<Vec<UserDbModel>> {
        let users = sqlx::query_as::<_, UserDbModel>(
            r#"
            SELECT u.* FROM users u
            INNER JOIN employee_profiles ep ON ep.user_id = u.id
            ORDER BY u.created_at, u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserDbModel>> {
        let user = sqlx::query_as::<_, UserDbModel>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create(&self, user: &UserDbModel) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, first_name, last_name, roles, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.roles)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_client_profile(&self, profile: &ClientProfileDbModel) -> Result<()> {
        sqlx::query(
            "INSERT INTO client_profiles (id, user_id, company_name, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&profile.id)
        .bind(&profile.user_id)
        .bind(&profile.company_name)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_employee_profile(&self, profile: &EmployeeProfileDbModel) -> Result<()> {
        sqlx::query(
            "INSERT INTO employee_profiles (id, user_id, position, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&profile.id)
        .bind(&profile.user_id)
        .bind(&profile.position)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(result.0)
    }
}
