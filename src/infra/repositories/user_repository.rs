//! User repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::config::BATCH_CHUNK_SIZE;
use crate::domain::{User, UserRole};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Account to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub email_verified: bool,
}

impl NewAccount {
    /// Enrolled or registered end user
    pub fn user(email: String, name: String, password_hash: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            password_hash,
            role: UserRole::User,
            email_verified: false,
        }
    }

    fn into_active_model(self) -> ActiveModel {
        let now = Utc::now();
        ActiveModel {
            id: Set(self.id),
            email: Set(self.email),
            password_hash: Set(self.password_hash),
            name: Set(self.name),
            role: Set(self.role.to_string()),
            email_verified: Set(self.email_verified),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by (normalized) email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Which of `emails` already belong to an account
    async fn existing_emails(&self, emails: Vec<String>) -> AppResult<Vec<String>>;

    /// Create a single account, `Conflict` when the email is taken
    async fn create(&self, account: NewAccount) -> AppResult<User>;

    /// Insert accounts in one statement, silently skipping taken emails.
    ///
    /// Returns the accounts that were actually written.
    async fn create_many(&self, accounts: Vec<NewAccount>) -> AppResult<Vec<User>>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        find_by_id(&self.db, id).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        find_by_email(&self.db, email).await
    }

    async fn existing_emails(&self, emails: Vec<String>) -> AppResult<Vec<String>> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for chunk in emails.chunks(BATCH_CHUNK_SIZE) {
            let models = UserEntity::find()
                .filter(user::Column::Email.is_in(chunk.iter().cloned()))
                .all(&self.db)
                .await
                .map_err(AppError::from)?;
            found.extend(models.into_iter().map(|m| m.email));
        }

        Ok(found)
    }

    async fn create(&self, account: NewAccount) -> AppResult<User> {
        create(&self.db, account).await
    }

    async fn create_many(&self, accounts: Vec<NewAccount>) -> AppResult<Vec<User>> {
        if accounts.is_empty() {
            return Ok(Vec::new());
        }

        let mut inserted = 0u64;
        let mut created = Vec::with_capacity(accounts.len());

        // Bounded statements keep large tables under the bind parameter limit
        for chunk in accounts.chunks(BATCH_CHUNK_SIZE) {
            let ids: Vec<Uuid> = chunk.iter().map(|a| a.id).collect();
            let models: Vec<ActiveModel> = chunk
                .iter()
                .cloned()
                .map(NewAccount::into_active_model)
                .collect();

            inserted += UserEntity::insert_many(models)
                .on_conflict(
                    OnConflict::column(user::Column::Email)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&self.db)
                .await
                .map_err(AppError::from)?;

            // Rows that lost a race to a concurrent insert keep their old id
            created.extend(
                UserEntity::find()
                    .filter(user::Column::Id.is_in(ids))
                    .all(&self.db)
                    .await
                    .map_err(AppError::from)?,
            );
        }

        tracing::debug!(inserted, found = created.len(), "Batch account insert");
        Ok(created.into_iter().map(User::from).collect())
    }
}

pub(crate) async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<Option<User>> {
    let result = UserEntity::find_by_id(id)
        .one(db)
        .await
        .map_err(AppError::from)?;

    Ok(result.map(User::from))
}

pub(crate) async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> AppResult<Option<User>> {
    let result = UserEntity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(AppError::from)?;

    Ok(result.map(User::from))
}

pub(crate) async fn create<C: ConnectionTrait>(db: &C, account: NewAccount) -> AppResult<User> {
    let model = account
        .into_active_model()
        .insert(db)
        .await
        .map_err(|e| AppError::from_constraint(e, "Email is already registered"))?;

    Ok(User::from(model))
}

/// Set the password hash and mark the address as verified.
pub(crate) async fn activate<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    password_hash: String,
) -> AppResult<User> {
    let user = UserEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = user.into();
    active.password_hash = Set(Some(password_hash));
    active.email_verified = Set(true);
    active.updated_at = Set(Utc::now());

    let model = active.update(db).await.map_err(AppError::from)?;
    Ok(User::from(model))
}
