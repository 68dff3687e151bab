//! Database repository for users.

use std::collections::HashMap;

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::users::{User, UserCreateDBRequest, UserFilter, UserUpdateDBRequest},
    },
    types::UserId,
};

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = User;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, display_name, is_admin)
            VALUES ($1, $2, $3)
            RETURNING id, email, display_name, is_admin, created_at, updated_at
            "#,
        )
        .bind(&request.email)
        .bind(&request.display_name)
        .bind(request.is_admin)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self, id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, display_name, is_admin, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, display_name, is_admin, created_at, updated_at FROM users WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = String::from("SELECT id, email, display_name, is_admin, created_at, updated_at FROM users WHERE 1=1");
        if filter.email.is_some() {
            query.push_str(" AND LOWER(email) = LOWER($1)");
        }
        query.push_str(&format!(" ORDER BY created_at DESC LIMIT {} OFFSET {}", filter.limit, filter.skip));

        let mut sql_query = sqlx::query_as::<_, User>(&query);
        if let Some(email) = &filter.email {
            sql_query = sql_query.bind(email);
        }

        let users = sql_query.fetch_all(&mut *self.db).await?;
        Ok(users)
    }

    #[instrument(skip(self, id, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET display_name = COALESCE($2, display_name),
                is_admin = COALESCE($3, is_admin),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, display_name, is_admin, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&request.display_name)
        .bind(request.is_admin)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self, id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Look up a user by email, case-insensitively.
    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, display_name, is_admin, created_at, updated_at FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user)
    }
}
