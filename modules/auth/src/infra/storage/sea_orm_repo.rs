//! SeaORM-backed implementation of [`UsersRepository`].

use anyhow::Context;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::contract::model::User;
use crate::domain::repo::{StoredUser, UsersRepository};
use crate::infra::storage::entity::{ActiveModel, Column, Entity};

pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn insert_user(&self, stored: StoredUser) -> anyhow::Result<()> {
        let StoredUser {
            user,
            password_hash,
        } = stored;
        let model = ActiveModel {
            id: Set(user.id),
            email: Set(user.email),
            password_hash: Set(password_hash),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            created_at: Set(user.created_at),
        };
        let _ = model
            .insert(&self.conn)
            .await
            .context("insert_user failed")?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<StoredUser>> {
        let found = Entity::find()
            .filter(Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("find_by_email failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let found = Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }
}
