//! `SeaORM` repository implementation for principals.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::entity::principal;
use crate::domain::model::{Credential, Principal};
use crate::domain::repo::PrincipalRepository;

/// `SeaORM` implementation of `PrincipalRepository`.
pub struct SeaOrmPrincipalRepository {
    conn: DatabaseConnection,
}

impl SeaOrmPrincipalRepository {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl PrincipalRepository for SeaOrmPrincipalRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Principal>> {
        let model = principal::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(model.map(Principal::from))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Principal>> {
        let model = principal::Entity::find()
            .filter(principal::Column::Email.eq(email))
            .one(&self.conn)
            .await?;
        Ok(model.map(Principal::from))
    }

    async fn create(&self, email: &str) -> anyhow::Result<Principal> {
        let now = Utc::now();
        let active_model = principal::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            email: ActiveValue::Set(email.to_owned()),
            access_token: ActiveValue::Set(None),
            is_active: ActiveValue::Set(true),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };
        let model = active_model.insert(&self.conn).await?;
        Ok(Principal::from(model))
    }

    async fn set_credential(
        &self,
        id: Uuid,
        credential: Option<Credential>,
    ) -> anyhow::Result<()> {
        let token = credential.map(|c| c.expose().to_owned());
        let result = principal::Entity::update_many()
            .col_expr(principal::Column::AccessToken, Expr::value(token))
            .col_expr(principal::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(principal::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;

        if result.rows_affected == 0 {
            anyhow::bail!("principal {id} not found");
        }
        Ok(())
    }
}
