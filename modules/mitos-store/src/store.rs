use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use mitos_common::{
    AppConfig, CommunityCount, HomeStats, MitosError, Myth, MythSummary, RegionCount, Tag, TagCount,
};

use crate::filter::MythFilter;
use crate::postgres::PgStore;
use crate::sqlite::SqliteStore;

/// The read surface the query service is written against. One
/// implementation per backend; the SQL itself is shared (see
/// [`crate::sql`]), so the service's algorithms exist exactly once.
#[async_trait]
pub trait MythStore: Send + Sync {
    async fn count_myths(&self, filter: &MythFilter) -> Result<i64>;

    async fn list_myths(
        &self,
        filter: &MythFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MythSummary>>;

    async fn myth_by_slug(&self, slug: &str) -> Result<Option<Myth>>;

    async fn tags_for_myth(&self, myth_id: i64) -> Result<Vec<Tag>>;

    async fn keywords_for_myth(&self, myth_id: i64) -> Result<Vec<String>>;

    async fn regions_with_counts(&self) -> Result<Vec<RegionCount>>;

    async fn communities_with_counts(&self) -> Result<Vec<CommunityCount>>;

    async fn tags_with_counts(&self) -> Result<Vec<TagCount>>;

    /// Candidates sharing the region or community, source excluded,
    /// scored and shuffle-tiebroken in SQL.
    async fn recommended(
        &self,
        myth_id: i64,
        region_id: i64,
        community_id: Option<i64>,
        seed: i64,
        limit: i64,
    ) -> Result<Vec<MythSummary>>;

    async fn featured_with_images(&self, limit: i64, seed: i64) -> Result<Vec<MythSummary>>;

    async fn diverse(&self, limit: i64, seed: i64) -> Result<Vec<MythSummary>>;

    async fn myths_by_region(
        &self,
        region_slug: &str,
        limit: i64,
        seed: i64,
    ) -> Result<Vec<MythSummary>>;

    async fn home_stats(&self) -> Result<HomeStats>;
}

/// Build the store the configuration selects: Postgres when a
/// `DATABASE_URL` is present, the embedded SQLite file otherwise.
/// Construction failures propagate; there is no retry here.
pub async fn connect_store(config: &AppConfig) -> Result<Arc<dyn MythStore>, MitosError> {
    if let Some(url) = &config.database_url {
        info!("store: connecting to postgres backend");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| MitosError::Database(e.to_string()))?;
        Ok(Arc::new(PgStore::new(pool)))
    } else {
        info!(path = %config.sqlite_path, "store: opening embedded sqlite backend");
        let options = SqliteConnectOptions::new()
            .filename(&config.sqlite_path)
            .read_only(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| MitosError::Database(e.to_string()))?;
        Ok(Arc::new(SqliteStore::new(pool)))
    }
}

/// Whether a store error signals exhausted quota or connections, as
/// opposed to a generic failure. Callers use this to tag their degraded
/// result instead of crashing.
///
/// Postgres reports these as SQLSTATE class 53 (insufficient resources,
/// e.g. 53300 too_many_connections); managed providers often surface
/// quota ceilings only in the message text, so that is sniffed too.
pub fn is_quota_exhausted(err: &anyhow::Error) -> bool {
    let Some(sqlx_err) = err.downcast_ref::<sqlx::Error>() else {
        return false;
    };
    match sqlx_err {
        sqlx::Error::Database(db) => {
            if let Some(code) = db.code() {
                if code.starts_with("53") {
                    return true;
                }
            }
            let message = db.message().to_lowercase();
            message.contains("quota")
                || message.contains("too many connections")
                || message.contains("rate limit")
        }
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_quota() {
        let err = anyhow::anyhow!("some application failure");
        assert!(!is_quota_exhausted(&err));
    }

    #[test]
    fn pool_timeout_counts_as_exhaustion() {
        let err = anyhow::Error::from(sqlx::Error::PoolTimedOut);
        assert!(is_quota_exhausted(&err));
    }

    #[test]
    fn row_not_found_is_generic() {
        let err = anyhow::Error::from(sqlx::Error::RowNotFound);
        assert!(!is_quota_exhausted(&err));
    }
}
