use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error tag surfaced by `list_myths` when the backend reports exhausted
/// quota or connections. Pages render an empty list either way; this tag
/// lets them say why.
pub const DB_QUOTA_EXCEEDED: &str = "db_quota_exceeded";

/// Full myth record as served by the detail page.
///
/// Dedicated struct with explicit column selection -- never uses SELECT *.
/// `tags` and `keywords` are fetched separately and attached by the query
/// service.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Myth {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_focus_keyword: Option<String>,
    pub tags_raw: Option<String>,
    pub focus_keywords_raw: Option<String>,
    pub category_path: Option<String>,
    pub image_url: Option<String>,
    pub image_prompt: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub region_id: i64,
    pub community_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub region_slug: String,
    pub region_name: String,
    pub community_slug: Option<String>,
    pub community_name: Option<String>,
    #[sqlx(skip)]
    pub tags: Vec<Tag>,
    #[sqlx(skip)]
    pub keywords: Vec<String>,
}

/// Listing row: the subset of myth columns every list surface needs.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MythSummary {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub category_path: Option<String>,
    pub image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub region_slug: String,
    pub region_name: String,
    pub community_slug: Option<String>,
    pub community_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub image_url: Option<String>,
    pub image_prompt: Option<String>,
    pub description: Option<String>,
}

/// Region with its aggregated myth count. The count is computed at query
/// time, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RegionCount {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub image_url: Option<String>,
    pub myth_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommunityCount {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub region_id: i64,
    pub image_url: Option<String>,
    pub myth_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagCount {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub myth_count: i64,
}

/// The combined aggregate view of regions, communities, and tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Taxonomy {
    pub regions: Vec<RegionCount>,
    pub communities: Vec<CommunityCount>,
    pub tags: Vec<TagCount>,
}

/// Caller-supplied listing parameters, as parsed from a query string.
/// Blank strings are treated as absent by the filter builder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMythsParams {
    pub region: Option<String>,
    pub community: Option<String>,
    pub tag: Option<String>,
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One page of listing results. Always well-formed: on backend failure the
/// page is empty with `total = 0` and, for quota exhaustion, a
/// distinguishable `error` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MythPage {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub items: Vec<MythSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Landing-page counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct HomeStats {
    pub total_myths: i64,
    pub total_regions: i64,
    pub myths_with_images: i64,
    pub total_tags: i64,
}

/// The identity a recommendation query needs from its source myth.
///
/// Kept separate from `Myth` so callers holding partial data (an id from a
/// route, a region from a filter) can still ask for recommendations; the
/// service refuses to query when `region_id` is absent.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecommendationSource {
    pub id: i64,
    pub region_id: Option<i64>,
    pub community_id: Option<i64>,
}

impl From<&Myth> for RecommendationSource {
    fn from(myth: &Myth) -> Self {
        Self {
            id: myth.id,
            region_id: Some(myth.region_id),
            community_id: myth.community_id,
        }
    }
}
