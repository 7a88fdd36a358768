//! The primary read API over the myth archive.
//!
//! Every operation is fail-soft: a backend failure is logged with an
//! operation-identifying prefix and collapsed to the documented fallback
//! shape, so a broken database degrades page renders to empty sections
//! instead of error pages.

use std::sync::Arc;

use tracing::warn;

use mitos_common::{
    HomeStats, ListMythsParams, Myth, MythPage, MythSummary, RecommendationSource, Taxonomy,
    DB_QUOTA_EXCEEDED,
};
use mitos_store::{is_quota_exhausted, MythFilter, MythStore};

use crate::cache::MemoCache;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const MAX_PAGE_OFFSET: i64 = 5000;
pub const DEFAULT_RECOMMENDED_LIMIT: i64 = 8;
pub const DEFAULT_FEATURED_LIMIT: i64 = 12;
pub const DEFAULT_DIVERSE_LIMIT: i64 = 9;
pub const DEFAULT_REGION_LIMIT: i64 = 6;

const HOUR_SECS: u64 = 60 * 60;
const DAY_SECS: u64 = 24 * HOUR_SECS;

pub struct MythQueryService {
    store: Arc<dyn MythStore>,
    cache: Arc<MemoCache>,
}

impl MythQueryService {
    pub fn new(store: Arc<dyn MythStore>, cache: Arc<MemoCache>) -> Self {
        Self { store, cache }
    }

    /// Filtered, paginated listing. The COUNT and the page SELECT share
    /// one normalized filter; limit and offset are clamped before either
    /// runs. Always returns a well-formed page.
    pub async fn list_myths(&self, params: &ListMythsParams) -> MythPage {
        let filter = MythFilter::from_params(params);
        let limit = clamp_limit(params.limit);
        let offset = clamp_offset(params.offset);

        let total = match self.store.count_myths(&filter).await {
            Ok(total) => total,
            Err(err) => return degraded_page(limit, offset, err),
        };

        let items = match self.store.list_myths(&filter, limit, offset).await {
            Ok(items) => items,
            Err(err) => return degraded_page(limit, offset, err),
        };

        MythPage {
            total,
            limit,
            offset,
            items,
            error: None,
        }
    }

    /// Single myth by slug with tags and keywords attached. Blank slugs
    /// short-circuit to `None` without touching the store.
    pub async fn myth_by_slug(&self, slug: &str) -> Option<Myth> {
        let slug = slug.trim();
        if slug.is_empty() {
            return None;
        }

        let result = self
            .cache
            .memo("myth_by_slug", &slug)
            .ttl_secs(HOUR_SECS)
            .get_or(|| async {
                let Some(mut myth) = self.store.myth_by_slug(slug).await? else {
                    return Ok(None);
                };
                myth.tags = self.store.tags_for_myth(myth.id).await?;
                myth.keywords = self.store.keywords_for_myth(myth.id).await?;
                Ok(Some(myth))
            })
            .await;

        match result {
            Ok(myth) => myth,
            Err(err) => {
                warn!("myth_by_slug: {err:#}");
                None
            }
        }
    }

    /// Regions, communities, and tags with live myth counts. Regions and
    /// communities appear even with zero myths; tags only when in use.
    pub async fn taxonomy(&self) -> Taxonomy {
        let result = self
            .cache
            .memo("taxonomy", &())
            .ttl_secs(HOUR_SECS)
            .get_or(|| async {
                let regions = self.store.regions_with_counts().await?;
                let communities = self.store.communities_with_counts().await?;
                let tags = self.store.tags_with_counts().await?;
                Ok(Taxonomy {
                    regions,
                    communities,
                    tags,
                })
            })
            .await;

        result.unwrap_or_else(|err| {
            warn!("taxonomy: {err:#}");
            Taxonomy::default()
        })
    }

    /// Myths related to the source: candidates share its region or
    /// community, scored +2 for the region and +3 for the community.
    /// Without a region there is no candidate pool, so the store is not
    /// consulted at all.
    pub async fn recommended(
        &self,
        source: RecommendationSource,
        limit: Option<i64>,
    ) -> Vec<MythSummary> {
        let Some(region_id) = source.region_id else {
            return Vec::new();
        };
        let limit = limit.unwrap_or(DEFAULT_RECOMMENDED_LIMIT).clamp(1, MAX_PAGE_LIMIT);

        let key = (source.id, region_id, source.community_id, limit);
        let result = self
            .cache
            .memo("recommended_myths", &key)
            .ttl_secs(HOUR_SECS)
            .get_or(|| async {
                // The source's own id seeds the tiebreak shuffle, so the
                // ordering is stable per myth and identical on both
                // backends.
                self.store
                    .recommended(source.id, region_id, source.community_id, source.id, limit)
                    .await
            })
            .await;

        result.unwrap_or_else(|err| {
            warn!("recommended: {err:#}");
            Vec::new()
        })
    }

    /// Rotating editorial selection of myths that have an image. Callers
    /// pass a day-of-year seed so the set changes daily while staying
    /// deterministic and cacheable.
    pub async fn featured_with_images(&self, limit: Option<i64>, seed: i64) -> Vec<MythSummary> {
        let limit = limit.unwrap_or(DEFAULT_FEATURED_LIMIT).clamp(1, MAX_PAGE_LIMIT);

        let key = (limit, seed);
        let result = self
            .cache
            .memo("featured_myths", &key)
            .ttl_secs(DAY_SECS)
            .get_or(|| async { self.store.featured_with_images(limit, seed).await })
            .await;

        result.unwrap_or_else(|err| {
            warn!("featured_with_images: {err:#}");
            Vec::new()
        })
    }

    /// Cross-region-balanced rotating sample (at most two myths per
    /// region, images first).
    pub async fn diverse(&self, limit: Option<i64>, seed: i64) -> Vec<MythSummary> {
        let limit = limit.unwrap_or(DEFAULT_DIVERSE_LIMIT).clamp(1, MAX_PAGE_LIMIT);

        let key = (limit, seed);
        let result = self
            .cache
            .memo("diverse_myths", &key)
            .ttl_secs(DAY_SECS)
            .get_or(|| async { self.store.diverse(limit, seed).await })
            .await;

        result.unwrap_or_else(|err| {
            warn!("diverse: {err:#}");
            Vec::new()
        })
    }

    /// One region's rotating selection. Not memoized: region pages are
    /// rendered far less often than the landing surfaces.
    pub async fn myths_by_region(
        &self,
        region_slug: &str,
        limit: Option<i64>,
        seed: i64,
    ) -> Vec<MythSummary> {
        let region_slug = region_slug.trim();
        if region_slug.is_empty() {
            return Vec::new();
        }
        let limit = limit.unwrap_or(DEFAULT_REGION_LIMIT).clamp(1, MAX_PAGE_LIMIT);

        match self.store.myths_by_region(region_slug, limit, seed).await {
            Ok(items) => items,
            Err(err) => {
                warn!("myths_by_region: {err:#}");
                Vec::new()
            }
        }
    }

    /// Landing-page counters; all zero when the backend is unreachable.
    pub async fn home_stats(&self) -> HomeStats {
        let result = self
            .cache
            .memo("home_stats", &())
            .ttl_secs(HOUR_SECS)
            .get_or(|| async { self.store.home_stats().await })
            .await;

        result.unwrap_or_else(|err| {
            warn!("home_stats: {err:#}");
            HomeStats::default()
        })
    }
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    match limit {
        Some(limit) => limit.clamp(1, MAX_PAGE_LIMIT),
        None => DEFAULT_PAGE_LIMIT,
    }
}

fn clamp_offset(offset: Option<i64>) -> i64 {
    match offset {
        Some(offset) => offset.clamp(0, MAX_PAGE_OFFSET),
        None => 0,
    }
}

/// Empty page for a failed listing. Quota exhaustion is the one backend
/// condition callers can distinguish.
fn degraded_page(limit: i64, offset: i64, err: anyhow::Error) -> MythPage {
    warn!("list_myths: {err:#}");
    let error = if is_quota_exhausted(&err) {
        Some(DB_QUOTA_EXCEEDED.to_string())
    } else {
        None
    };
    MythPage {
        total: 0,
        limit,
        offset,
        items: Vec::new(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_clamps_to_bounds() {
        assert_eq!(clamp_limit(None), 20);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-3)), 1);
        assert_eq!(clamp_limit(Some(9999)), 100);
        assert_eq!(clamp_limit(Some(50)), 50);
    }

    #[test]
    fn offset_clamps_to_bounds() {
        assert_eq!(clamp_offset(None), 0);
        assert_eq!(clamp_offset(Some(-5)), 0);
        assert_eq!(clamp_offset(Some(999_999)), 5000);
        assert_eq!(clamp_offset(Some(40)), 40);
    }
}
