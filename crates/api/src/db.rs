// SPDX-FileCopyrightText: 2025 Aaron Dewes <aaron@nirvati.org>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::time::Duration;

use diesel::{Connection, RunQueryDsl, sql_query, sql_types::BigInt};
use diesel_async::{AsyncPgConnection, pooled_connection::AsyncDieselConnectionManager};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::store::StoreError;

pub mod models;
pub mod schema;

pub type Pool = diesel_async::pooled_connection::bb8::Pool<AsyncPgConnection>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Advisory lock held while migrating so concurrently starting instances run one at a time.
const MIGRATION_LOCK_KEY: i64 = 0x7464_6863_7466;

/// Applies pending migrations over a short-lived blocking connection.
pub fn migrate(database_url: &str) -> Result<(), StoreError> {
    let mut pg_connection = diesel::pg::PgConnection::establish(database_url)?;
    sql_query("SELECT pg_advisory_lock($1)")
        .bind::<BigInt, _>(MIGRATION_LOCK_KEY)
        .execute(&mut pg_connection)?;
    let applied = pg_connection
        .run_pending_migrations(MIGRATIONS)
        .map(|versions| versions.len())
        .map_err(|e| StoreError::Migration(e.to_string()));
    let unlocked = sql_query("SELECT pg_advisory_unlock($1)")
        .bind::<BigInt, _>(MIGRATION_LOCK_KEY)
        .execute(&mut pg_connection);
    let applied = applied?;
    unlocked?;
    if applied > 0 {
        tracing::info!("Applied {applied} database migrations");
    }
    Ok(())
}

pub async fn build_pool(database_url: &str) -> Result<Pool, StoreError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    Pool::builder()
        .connection_timeout(Duration::from_secs(5))
        .build(manager)
        .await
        .map_err(|e| StoreError::Pool(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concurrent_migrations_both_succeed() {
        let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set, skipping");
            return;
        };
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let url = database_url.clone();
                std::thread::spawn(move || migrate(&url))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        migrate(&database_url).unwrap();
    }
}
