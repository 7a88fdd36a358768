use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool};

use mitos_common::{CommunityCount, HomeStats, Myth, MythSummary, RegionCount, Tag, TagCount};

use crate::filter::{Dialect, MythFilter};
use crate::sql;
use crate::store::MythStore;

const DIALECT: Dialect = Dialect::Sqlite;

/// Store over the embedded SQLite file used for local development.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl MythStore for SqliteStore {
    async fn count_myths(&self, filter: &MythFilter) -> Result<i64> {
        let mut qb = sql::count_query::<Sqlite>(filter, DIALECT);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn list_myths(
        &self,
        filter: &MythFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MythSummary>> {
        let mut qb = sql::list_query::<Sqlite>(filter, DIALECT, limit, offset);
        let rows = qb.build_query_as::<MythSummary>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn myth_by_slug(&self, slug: &str) -> Result<Option<Myth>> {
        let mut qb = sql::detail_query::<Sqlite>(slug);
        let row = qb.build_query_as::<Myth>().fetch_optional(&self.pool).await?;
        Ok(row)
    }

    async fn tags_for_myth(&self, myth_id: i64) -> Result<Vec<Tag>> {
        let mut qb = sql::tags_query::<Sqlite>(myth_id, DIALECT);
        let rows = qb.build_query_as::<Tag>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn keywords_for_myth(&self, myth_id: i64) -> Result<Vec<String>> {
        let mut qb = sql::keywords_query::<Sqlite>(myth_id);
        let rows = qb.build_query_scalar().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn regions_with_counts(&self) -> Result<Vec<RegionCount>> {
        let rows = sqlx::query_as::<_, RegionCount>(&sql::regions_sql(DIALECT))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn communities_with_counts(&self) -> Result<Vec<CommunityCount>> {
        let rows = sqlx::query_as::<_, CommunityCount>(&sql::communities_sql(DIALECT))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn tags_with_counts(&self) -> Result<Vec<TagCount>> {
        let rows = sqlx::query_as::<_, TagCount>(&sql::tags_with_counts_sql(DIALECT))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn recommended(
        &self,
        myth_id: i64,
        region_id: i64,
        community_id: Option<i64>,
        seed: i64,
        limit: i64,
    ) -> Result<Vec<MythSummary>> {
        let mut qb =
            sql::recommended_query::<Sqlite>(myth_id, region_id, community_id, seed, limit);
        let rows = qb.build_query_as::<MythSummary>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn featured_with_images(&self, limit: i64, seed: i64) -> Result<Vec<MythSummary>> {
        let mut qb = sql::featured_query::<Sqlite>(limit, seed);
        let rows = qb.build_query_as::<MythSummary>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn diverse(&self, limit: i64, seed: i64) -> Result<Vec<MythSummary>> {
        let mut qb = sql::diverse_query::<Sqlite>(limit, seed);
        let rows = qb.build_query_as::<MythSummary>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn myths_by_region(
        &self,
        region_slug: &str,
        limit: i64,
        seed: i64,
    ) -> Result<Vec<MythSummary>> {
        let mut qb = sql::by_region_query::<Sqlite>(region_slug, limit, seed);
        let rows = qb.build_query_as::<MythSummary>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn home_stats(&self) -> Result<HomeStats> {
        let total_myths: i64 = sqlx::query_scalar(sql::COUNT_MYTHS_SQL)
            .fetch_one(&self.pool)
            .await?;
        let total_regions: i64 = sqlx::query_scalar(sql::COUNT_REGIONS_SQL)
            .fetch_one(&self.pool)
            .await?;
        let myths_with_images: i64 = sqlx::query_scalar(sql::COUNT_MYTHS_WITH_IMAGES_SQL)
            .fetch_one(&self.pool)
            .await?;
        let total_tags: i64 = sqlx::query_scalar(sql::COUNT_TAGS_SQL)
            .fetch_one(&self.pool)
            .await?;
        Ok(HomeStats {
            total_myths,
            total_regions,
            myths_with_images,
            total_tags,
        })
    }
}
