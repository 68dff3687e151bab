//! Database repository for gyms.

use std::collections::HashMap;

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        handlers::repository::Repository,
        models::gyms::{Gym, GymCreateDBRequest, GymFilter, GymUpdateDBRequest},
    },
    types::GymId,
};

const GYM_COLUMNS: &str = "id, owner_id, name, city, country, currency, is_verified, is_active, created_at, updated_at";

pub struct Gyms<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Gyms<'c> {
    type CreateRequest = GymCreateDBRequest;
    type UpdateRequest = GymUpdateDBRequest;
    type Response = Gym;
    type Id = GymId;
    type Filter = GymFilter;

    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let gym = sqlx::query_as::<_, Gym>(&format!(
            r#"
            INSERT INTO gyms (owner_id, name, city, country, currency, is_verified, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {GYM_COLUMNS}
            "#
        ))
        .bind(request.owner_id)
        .bind(&request.name)
        .bind(&request.city)
        .bind(&request.country)
        .bind(&request.currency)
        .bind(request.is_verified)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(gym)
    }

    #[instrument(skip(self, id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let gym = sqlx::query_as::<_, Gym>(&format!("SELECT {GYM_COLUMNS} FROM gyms WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(gym)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let gyms = sqlx::query_as::<_, Gym>(&format!("SELECT {GYM_COLUMNS} FROM gyms WHERE id = ANY($1)"))
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(gyms.into_iter().map(|g| (g.id, g)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = format!("SELECT {GYM_COLUMNS} FROM gyms WHERE 1=1");
        if filter.owner_id.is_some() {
            query.push_str(" AND owner_id = $1");
        }
        query.push_str(&format!(" ORDER BY created_at DESC LIMIT {} OFFSET {}", filter.limit, filter.skip));

        let mut sql_query = sqlx::query_as::<_, Gym>(&query);
        if let Some(owner_id) = filter.owner_id {
            sql_query = sql_query.bind(owner_id);
        }

        let gyms = sql_query.fetch_all(&mut *self.db).await?;
        Ok(gyms)
    }

    #[instrument(skip(self, id, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let gym = sqlx::query_as::<_, Gym>(&format!(
            r#"
            UPDATE gyms
            SET name = COALESCE($2, name),
                is_verified = COALESCE($3, is_verified),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {GYM_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.name)
        .bind(request.is_verified)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(gym)
    }

    #[instrument(skip(self, id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM gyms WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl<'c> Gyms<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
