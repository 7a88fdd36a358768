//! Shared query builders for the myth read path.
//!
//! Every query is written once, generically over the sqlx database type;
//! the Postgres and SQLite stores only choose the executor. Dialect
//! differences are confined to the [`Dialect`] operators.

use sqlx::{Database, Encode, QueryBuilder, Type};

use crate::filter::{push_filters, Dialect, MythFilter};

/// Modulus of the `(id + seed) % N` pseudo-shuffle. Rotating the seed (a
/// day-of-year value upstream) walks the ordering through 23 phases
/// without true randomness, so results stay deterministic and cacheable
/// per seed.
pub const SHUFFLE_MODULUS: i64 = 23;

/// Maximum candidates per region in the diverse selection.
pub const DIVERSE_REGION_CAP: i64 = 2;

/// Columns of a listing row, in `MythSummary` order.
const SUMMARY_COLUMNS: &str = "m.id, m.slug, m.title, m.excerpt, m.category_path, m.image_url, \
     m.latitude, m.longitude, \
     r.slug AS region_slug, r.name AS region_name, \
     c.slug AS community_slug, c.name AS community_name";

/// Columns of the full detail record, in `Myth` order.
const DETAIL_COLUMNS: &str = "m.id, m.slug, m.title, m.excerpt, m.content, \
     m.seo_title, m.seo_description, m.seo_focus_keyword, \
     m.tags_raw, m.focus_keywords_raw, m.category_path, \
     m.image_url, m.image_prompt, m.latitude, m.longitude, \
     m.region_id, m.community_id, m.created_at, m.updated_at, \
     r.slug AS region_slug, r.name AS region_name, \
     c.slug AS community_slug, c.name AS community_name";

/// The region join is mandatory (every myth has one); the community join
/// is LEFT since community membership is optional.
const FROM_MYTHS: &str = "FROM myths m \
     JOIN regions r ON r.id = m.region_id \
     LEFT JOIN communities c ON c.id = m.community_id";

/// Ordering term that floats rows with an image above rows without one,
/// spelled as CASE so both dialects sort it identically.
const IMAGES_FIRST: &str = "CASE WHEN m.image_url IS NULL THEN 1 ELSE 0 END ASC";

/// Append `(m.id + seed) % 23 ASC, m.id ASC`.
fn push_shuffle_order<'args, DB>(qb: &mut QueryBuilder<'args, DB>, seed: i64)
where
    DB: Database,
    i64: Encode<'args, DB> + Type<DB>,
{
    qb.push("(m.id + ");
    qb.push_bind(seed);
    qb.push(format!(") % {SHUFFLE_MODULUS} ASC, m.id ASC"));
}

/// COUNT over the filtered set. Shares the exact predicate of
/// [`list_query`]; since tag filtering is an EXISTS and the joins are
/// one-to-at-most-one, a plain COUNT(*) is already duplicate-free.
pub fn count_query<'args, DB>(filter: &MythFilter, dialect: Dialect) -> QueryBuilder<'args, DB>
where
    DB: Database,
    String: Encode<'args, DB> + Type<DB>,
{
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) {FROM_MYTHS} WHERE 1=1"));
    push_filters(&mut qb, filter, dialect);
    qb
}

/// The filtered, paginated listing page, ordered by title
/// case-insensitively.
pub fn list_query<'args, DB>(
    filter: &MythFilter,
    dialect: Dialect,
    limit: i64,
    offset: i64,
) -> QueryBuilder<'args, DB>
where
    DB: Database,
    i64: Encode<'args, DB> + Type<DB>,
    String: Encode<'args, DB> + Type<DB>,
{
    let mut qb = QueryBuilder::new(format!("SELECT {SUMMARY_COLUMNS} {FROM_MYTHS} WHERE 1=1"));
    push_filters(&mut qb, filter, dialect);
    qb.push(format!(" ORDER BY {}, m.id ASC", dialect.ci_asc("m.title")));
    qb.push(" LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);
    qb
}

/// Single myth by slug with its region and community joined in.
pub fn detail_query<'args, DB>(slug: &str) -> QueryBuilder<'args, DB>
where
    DB: Database,
    String: Encode<'args, DB> + Type<DB>,
{
    let mut qb = QueryBuilder::new(format!("SELECT {DETAIL_COLUMNS} {FROM_MYTHS} WHERE m.slug = "));
    qb.push_bind(slug.to_string());
    qb
}

/// Tags of one myth, name-ascending case-insensitively.
pub fn tags_query<'args, DB>(myth_id: i64, dialect: Dialect) -> QueryBuilder<'args, DB>
where
    DB: Database,
    i64: Encode<'args, DB> + Type<DB>,
{
    let mut qb = QueryBuilder::new(
        "SELECT t.id, t.slug, t.name, t.image_url, t.image_prompt, t.description \
         FROM tags t JOIN myth_tags mt ON mt.tag_id = t.id WHERE mt.myth_id = ",
    );
    qb.push_bind(myth_id);
    qb.push(format!(" ORDER BY {}", dialect.ci_asc("t.name")));
    qb
}

/// Keywords of one myth, in insertion order.
pub fn keywords_query<'args, DB>(myth_id: i64) -> QueryBuilder<'args, DB>
where
    DB: Database,
    i64: Encode<'args, DB> + Type<DB>,
{
    let mut qb =
        QueryBuilder::new("SELECT keyword FROM myth_keywords WHERE myth_id = ");
    qb.push_bind(myth_id);
    qb.push(" ORDER BY id ASC");
    qb
}

/// All regions with live myth counts. LEFT JOIN keeps zero-myth regions.
pub fn regions_sql(dialect: Dialect) -> String {
    format!(
        "SELECT r.id, r.slug, r.name, r.image_url, COUNT(m.id) AS myth_count \
         FROM regions r LEFT JOIN myths m ON m.region_id = r.id \
         GROUP BY r.id, r.slug, r.name, r.image_url \
         ORDER BY {}",
        dialect.ci_asc("r.name")
    )
}

/// All communities with live myth counts. LEFT JOIN keeps zero-myth
/// communities.
pub fn communities_sql(dialect: Dialect) -> String {
    format!(
        "SELECT c.id, c.slug, c.name, c.region_id, c.image_url, COUNT(m.id) AS myth_count \
         FROM communities c LEFT JOIN myths m ON m.community_id = c.id \
         GROUP BY c.id, c.slug, c.name, c.region_id, c.image_url \
         ORDER BY {}",
        dialect.ci_asc("c.name")
    )
}

/// Tags in use, busiest first. INNER JOIN: a tag is only reachable
/// through the association table, so unused tags don't appear.
pub fn tags_with_counts_sql(dialect: Dialect) -> String {
    format!(
        "SELECT t.id, t.slug, t.name, COUNT(mt.myth_id) AS myth_count \
         FROM tags t JOIN myth_tags mt ON mt.tag_id = t.id \
         GROUP BY t.id, t.slug, t.name \
         ORDER BY myth_count DESC, {}",
        dialect.ci_asc("t.name")
    )
}

/// Recommendation candidates for one source myth.
///
/// The pool is prefiltered to myths sharing the region or the community
/// (relevance prefilter, not a global scan), the source itself excluded.
/// Score: +2 same region, +3 same community, additive. Ties break on the
/// pseudo-shuffle so the ordering is deterministic on both backends.
pub fn recommended_query<'args, DB>(
    myth_id: i64,
    region_id: i64,
    community_id: Option<i64>,
    seed: i64,
    limit: i64,
) -> QueryBuilder<'args, DB>
where
    DB: Database,
    i64: Encode<'args, DB> + Type<DB>,
    Option<i64>: Encode<'args, DB> + Type<DB>,
{
    let mut qb = QueryBuilder::new(format!(
        "SELECT {SUMMARY_COLUMNS}, (CASE WHEN m.region_id = "
    ));
    qb.push_bind(region_id);
    qb.push(" THEN 2 ELSE 0 END + CASE WHEN m.community_id = ");
    qb.push_bind(community_id);
    qb.push(format!(" THEN 3 ELSE 0 END) AS score {FROM_MYTHS} WHERE m.id <> "));
    qb.push_bind(myth_id);
    qb.push(" AND (m.region_id = ");
    qb.push_bind(region_id);
    qb.push(" OR m.community_id = ");
    qb.push_bind(community_id);
    qb.push(") ORDER BY score DESC, ");
    push_shuffle_order(&mut qb, seed);
    qb.push(" LIMIT ");
    qb.push_bind(limit);
    qb
}

/// Myths with an image, rotated by the seeded pseudo-shuffle.
pub fn featured_query<'args, DB>(limit: i64, seed: i64) -> QueryBuilder<'args, DB>
where
    DB: Database,
    i64: Encode<'args, DB> + Type<DB>,
{
    let mut qb = QueryBuilder::new(format!(
        "SELECT {SUMMARY_COLUMNS} {FROM_MYTHS} WHERE m.image_url IS NOT NULL ORDER BY "
    ));
    push_shuffle_order(&mut qb, seed);
    qb.push(" LIMIT ");
    qb.push_bind(limit);
    qb
}

/// Cross-region sample: rank myths within each region (images first, then
/// the pseudo-shuffle), keep the top two per region, then apply the same
/// ordering globally.
pub fn diverse_query<'args, DB>(limit: i64, seed: i64) -> QueryBuilder<'args, DB>
where
    DB: Database,
    i64: Encode<'args, DB> + Type<DB>,
{
    let mut qb = QueryBuilder::new(
        "WITH ranked AS ( \
             SELECT m.id AS myth_id, ROW_NUMBER() OVER ( \
                 PARTITION BY m.region_id \
                 ORDER BY CASE WHEN m.image_url IS NULL THEN 1 ELSE 0 END ASC, (m.id + ",
    );
    qb.push_bind(seed);
    qb.push(format!(
        ") % {SHUFFLE_MODULUS} ASC, m.id ASC \
             ) AS region_rank \
             FROM myths m \
         ) \
         SELECT {SUMMARY_COLUMNS} FROM ranked \
         JOIN myths m ON m.id = ranked.myth_id \
         JOIN regions r ON r.id = m.region_id \
         LEFT JOIN communities c ON c.id = m.community_id \
         WHERE ranked.region_rank <= {DIVERSE_REGION_CAP} \
         ORDER BY {IMAGES_FIRST}, "
    ));
    push_shuffle_order(&mut qb, seed);
    qb.push(" LIMIT ");
    qb.push_bind(limit);
    qb
}

/// One region's myths, images first, rotated by the pseudo-shuffle.
pub fn by_region_query<'args, DB>(
    region_slug: &str,
    limit: i64,
    seed: i64,
) -> QueryBuilder<'args, DB>
where
    DB: Database,
    i64: Encode<'args, DB> + Type<DB>,
    String: Encode<'args, DB> + Type<DB>,
{
    let mut qb = QueryBuilder::new(format!("SELECT {SUMMARY_COLUMNS} {FROM_MYTHS} WHERE r.slug = "));
    qb.push_bind(region_slug.to_string());
    qb.push(format!(" ORDER BY {IMAGES_FIRST}, "));
    push_shuffle_order(&mut qb, seed);
    qb.push(" LIMIT ");
    qb.push_bind(limit);
    qb
}

/// The four landing-page aggregates, kept as independent counts.
pub const COUNT_MYTHS_SQL: &str = "SELECT COUNT(*) FROM myths";
pub const COUNT_REGIONS_SQL: &str = "SELECT COUNT(*) FROM regions";
pub const COUNT_MYTHS_WITH_IMAGES_SQL: &str =
    "SELECT COUNT(*) FROM myths WHERE image_url IS NOT NULL";
pub const COUNT_TAGS_SQL: &str = "SELECT COUNT(*) FROM tags";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_orders_by_title_per_dialect() {
        let filter = MythFilter::default();
        let pg = list_query::<sqlx::Postgres>(&filter, Dialect::Postgres, 20, 0);
        assert!(pg.sql().contains("LOWER(m.title) ASC"));

        let lite = list_query::<sqlx::Sqlite>(&filter, Dialect::Sqlite, 20, 0);
        assert!(lite.sql().contains("m.title COLLATE NOCASE ASC"));
    }

    #[test]
    fn count_and_list_share_the_filter_predicate() {
        let filter = MythFilter {
            region: Some("andina".to_string()),
            q: Some("oro".to_string()),
            ..Default::default()
        };
        let count = count_query::<sqlx::Sqlite>(&filter, Dialect::Sqlite);
        let list = list_query::<sqlx::Sqlite>(&filter, Dialect::Sqlite, 20, 0);
        let predicate = count.sql().split_once("WHERE 1=1").unwrap().1.to_string();
        assert!(list.sql().contains(&predicate));
    }

    #[test]
    fn featured_query_excludes_imageless_rows() {
        let qb = featured_query::<sqlx::Sqlite>(12, 5);
        assert!(qb.sql().contains("m.image_url IS NOT NULL"));
        assert!(qb.sql().contains(&format!("% {SHUFFLE_MODULUS} ASC")));
    }

    #[test]
    fn diverse_query_caps_per_region() {
        let qb = diverse_query::<sqlx::Postgres>(9, 0);
        let sql = qb.sql();
        assert!(sql.contains("PARTITION BY m.region_id"));
        assert!(sql.contains(&format!("region_rank <= {DIVERSE_REGION_CAP}")));
    }

    #[test]
    fn recommended_query_excludes_source_and_prefilters() {
        let qb = recommended_query::<sqlx::Postgres>(7, 1, Some(2), 7, 8);
        let sql = qb.sql();
        assert!(sql.contains("m.id <> "));
        assert!(sql.contains("m.region_id = "));
        assert!(sql.contains("OR m.community_id = "));
        assert!(sql.contains("THEN 2 ELSE 0 END"));
        assert!(sql.contains("THEN 3 ELSE 0 END"));
    }
}
