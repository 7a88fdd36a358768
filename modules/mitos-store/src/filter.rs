use mitos_common::ListMythsParams;
use sqlx::{Database, Encode, QueryBuilder, Type};

/// The two SQL dialects the archive runs against. Predicate text is shared;
/// only the case-insensitive operators differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Case-insensitive substring-match operator.
    pub fn ci_like(self) -> &'static str {
        match self {
            Dialect::Postgres => "ILIKE",
            // SQLite LIKE is case-insensitive for ASCII out of the box.
            Dialect::Sqlite => "LIKE",
        }
    }

    /// Case-insensitive ascending ordering expression for a column.
    pub fn ci_asc(self, column: &str) -> String {
        match self {
            Dialect::Postgres => format!("LOWER({column}) ASC"),
            Dialect::Sqlite => format!("{column} COLLATE NOCASE ASC"),
        }
    }
}

/// Columns searched by the free-text `q` filter. A match in any one of
/// them qualifies the myth.
const Q_COLUMNS: &[&str] = &[
    "m.title",
    "m.excerpt",
    "m.content",
    "m.tags_raw",
    "m.focus_keywords_raw",
    "r.name",
    "r.slug",
    "c.name",
    "c.slug",
];

/// Normalized listing filter. Construction via [`MythFilter::from_params`]
/// guarantees every field is either `None` or a trimmed non-empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MythFilter {
    pub region: Option<String>,
    pub community: Option<String>,
    pub tag: Option<String>,
    pub q: Option<String>,
}

impl MythFilter {
    pub fn from_params(params: &ListMythsParams) -> Self {
        Self {
            region: normalize(&params.region),
            community: normalize(&params.community),
            tag: normalize(&params.tag),
            q: normalize(&params.q),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_none() && self.community.is_none() && self.tag.is_none() && self.q.is_none()
    }
}

/// Blank and whitespace-only inputs mean "no filter".
fn normalize(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Append the WHERE clauses for all set filters. The enclosing query must
/// alias `myths` as `m`, `regions` as `r`, and `communities` as `c`, and
/// must already contain a WHERE clause for these to AND onto.
///
/// `region`, `community`, and `tag` each match either the entity's slug or
/// its display name, since callers pass both forms. The tag predicate goes
/// through the association table via EXISTS, so it costs nothing when no
/// tag filter is set and never duplicates rows when one is.
pub fn push_filters<'args, DB>(
    qb: &mut QueryBuilder<'args, DB>,
    filter: &MythFilter,
    dialect: Dialect,
) where
    DB: Database,
    String: Encode<'args, DB> + Type<DB>,
{
    if let Some(region) = &filter.region {
        qb.push(" AND (r.slug = ");
        qb.push_bind(region.clone());
        qb.push(" OR r.name = ");
        qb.push_bind(region.clone());
        qb.push(")");
    }

    if let Some(community) = &filter.community {
        qb.push(" AND (c.slug = ");
        qb.push_bind(community.clone());
        qb.push(" OR c.name = ");
        qb.push_bind(community.clone());
        qb.push(")");
    }

    if let Some(tag) = &filter.tag {
        qb.push(
            " AND EXISTS (SELECT 1 FROM myth_tags mt JOIN tags t ON t.id = mt.tag_id \
             WHERE mt.myth_id = m.id AND (t.slug = ",
        );
        qb.push_bind(tag.clone());
        qb.push(" OR t.name = ");
        qb.push_bind(tag.clone());
        qb.push("))");
    }

    if let Some(q) = &filter.q {
        let pattern = format!("%{q}%");
        let like = dialect.ci_like();
        qb.push(" AND (");
        for (i, column) in Q_COLUMNS.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("{column} {like} "));
            qb.push_bind(pattern.clone());
        }
        qb.push(")");
    }
}
