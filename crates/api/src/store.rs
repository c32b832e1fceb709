// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tdhctf_catalog::{Assembler, Challenge, sort_challenges};
use thiserror::Error;

use crate::db::{
    self, Pool,
    models::{ChallengeRow, NewChallenge},
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to connect to database: {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("Failed to run database migrations: {0}")]
    Migration(String),
    #[error("Failed to get database connection: {0}")]
    Pool(String),
    #[error("Database query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("Stored challenge could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Catalog task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Persistent storage of assembled challenges, one record per slug.
#[async_trait]
pub trait ChallengeRepository: Send + Sync {
    async fn count(&self) -> Result<i64, StoreError>;
    /// Inserts the challenges whose slug is not stored yet and returns how many were new.
    /// Existing slugs are left untouched.
    async fn insert_missing(&self, challenges: &[Challenge]) -> Result<usize, StoreError>;
    async fn list(&self) -> Result<Vec<Challenge>, StoreError>;
    async fn get(&self, slug: &str) -> Result<Option<Challenge>, StoreError>;
}

pub struct PgChallengeRepository {
    pool: Pool,
}

impl PgChallengeRepository {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let url = database_url.to_string();
        tokio::task::spawn_blocking(move || db::migrate(&url)).await??;
        let pool = db::build_pool(database_url).await?;
        Ok(Self { pool })
    }

    async fn get_db_conn(
        &self,
    ) -> Result<
        diesel_async::pooled_connection::bb8::PooledConnection<'_, AsyncPgConnection>,
        StoreError,
    > {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }
}

#[async_trait]
impl ChallengeRepository for PgChallengeRepository {
    async fn count(&self) -> Result<i64, StoreError> {
        use crate::db::schema::challenges::dsl::*;

        let mut conn = self.get_db_conn().await?;
        Ok(challenges.count().get_result(&mut conn).await?)
    }

    async fn insert_missing(&self, new_challenges: &[Challenge]) -> Result<usize, StoreError> {
        use crate::db::schema::challenges::dsl::*;

        if new_challenges.is_empty() {
            return Ok(0);
        }
        let rows = new_challenges
            .iter()
            .map(NewChallenge::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let mut conn = self.get_db_conn().await?;
        // Concurrent seeders race on the unique slug, the loser's rows are dropped here.
        let inserted = diesel::insert_into(challenges)
            .values(&rows)
            .on_conflict(slug)
            .do_nothing()
            .execute(&mut conn)
            .await?;
        Ok(inserted)
    }

    async fn list(&self) -> Result<Vec<Challenge>, StoreError> {
        use crate::db::schema::challenges::dsl::*;

        let mut conn = self.get_db_conn().await?;
        let rows = challenges
            .select(ChallengeRow::as_select())
            .load::<ChallengeRow>(&mut conn)
            .await?;
        let mut result = rows
            .into_iter()
            .map(Challenge::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        sort_challenges(&mut result);
        Ok(result)
    }

    async fn get(&self, wanted_slug: &str) -> Result<Option<Challenge>, StoreError> {
        use crate::db::schema::challenges::dsl::*;

        let mut conn = self.get_db_conn().await?;
        let row = challenges
            .filter(slug.eq(wanted_slug))
            .select(ChallengeRow::as_select())
            .first::<ChallengeRow>(&mut conn)
            .await
            .optional()?;
        Ok(row.map(Challenge::try_from).transpose()?)
    }
}

/// Where the catalog is read from. Chosen once at startup and never switched afterwards.
pub enum CatalogStore {
    Persisted(Arc<dyn ChallengeRepository>),
    /// Rebuilds the catalog from the asset directory on every read
    Filesystem(Assembler),
}

impl CatalogStore {
    /// Connects to the database if one is configured, otherwise (or if that fails) serves
    /// from the filesystem for the rest of the process lifetime.
    pub async fn init(database_url: Option<&str>, assembler: Assembler) -> Self {
        let Some(database_url) = database_url else {
            tracing::info!(
                "No database configured, serving challenges from {}",
                assembler.files_dir.to_string_lossy()
            );
            return CatalogStore::Filesystem(assembler);
        };

        let repository = match PgChallengeRepository::connect(database_url).await {
            Ok(repository) => repository,
            Err(e) => {
                tracing::warn!("Database connection failed, falling back to filesystem data: {e}");
                return CatalogStore::Filesystem(assembler);
            }
        };

        match Self::persisted(Arc::new(repository), &assembler).await {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("Failed to seed challenges, falling back to filesystem data: {e}");
                CatalogStore::Filesystem(assembler)
            }
        }
    }

    pub async fn persisted(
        repository: Arc<dyn ChallengeRepository>,
        assembler: &Assembler,
    ) -> Result<Self, StoreError> {
        seed_if_empty(repository.as_ref(), assembler).await?;
        Ok(CatalogStore::Persisted(repository))
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, CatalogStore::Persisted(_))
    }

    pub async fn list(&self) -> Result<Vec<Challenge>, StoreError> {
        match self {
            CatalogStore::Persisted(repository) => repository.list().await,
            CatalogStore::Filesystem(assembler) => assemble(assembler).await,
        }
    }

    pub async fn get(&self, slug: &str) -> Result<Option<Challenge>, StoreError> {
        match self {
            CatalogStore::Persisted(repository) => repository.get(slug).await,
            CatalogStore::Filesystem(assembler) => Ok(assemble(assembler)
                .await?
                .into_iter()
                .find(|c| c.slug == slug)),
        }
    }
}

async fn assemble(assembler: &Assembler) -> Result<Vec<Challenge>, StoreError> {
    let assembler = assembler.clone();
    Ok(tokio::task::spawn_blocking(move || assembler.assemble()).await?)
}

/// Fills an empty repository from the filesystem. Returns the number of inserted challenges.
pub async fn seed_if_empty(
    repository: &dyn ChallengeRepository,
    assembler: &Assembler,
) -> Result<usize, StoreError> {
    if repository.count().await? > 0 {
        return Ok(0);
    }
    let challenges = assemble(assembler).await?;
    let inserted = repository.insert_missing(&challenges).await?;
    tracing::info!("Seeded {inserted} challenges into the database");
    Ok(inserted)
}
