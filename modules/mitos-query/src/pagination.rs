//! Pure derivation of page-navigation metadata from `{total, limit,
//! offset}` triples. No I/O; the query service's result shape is the only
//! contract.

use serde::{Serialize, Serializer};

/// Number of pages shown without collapsing.
const FULL_WINDOW: i64 = 7;

/// One slot in the page-number strip: either a page number or the
/// collapsed-range marker (serialized as the string `"ellipsis"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(i64),
    Ellipsis,
}

impl Serialize for PageItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageItem::Page(n) => serializer.serialize_i64(*n),
            PageItem::Ellipsis => serializer.serialize_str("ellipsis"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
    pub item_start: i64,
    pub item_end: i64,
    pub page_numbers: Vec<PageItem>,
}

/// Derive navigation metadata for one result page.
pub fn paginate(total: i64, limit: i64, offset: i64) -> Pagination {
    let total = total.max(0);
    let limit = limit.max(1);
    let offset = offset.max(0);

    let current_page = offset / limit + 1;
    let total_pages = (total + limit - 1) / limit;

    Pagination {
        current_page,
        total_pages,
        has_prev: current_page > 1,
        has_next: current_page < total_pages,
        item_start: (offset + 1).min(total),
        item_end: (offset + limit).min(total),
        page_numbers: page_numbers(current_page, total_pages),
    }
}

/// The visible page-number strip. Short ranges are listed in full; long
/// ranges collapse around the current page with ellipsis markers.
fn page_numbers(current_page: i64, total_pages: i64) -> Vec<PageItem> {
    use PageItem::*;

    if total_pages <= FULL_WINDOW {
        return (1..=total_pages).map(Page).collect();
    }

    if current_page <= 4 {
        let mut items: Vec<PageItem> = (1..=5).map(Page).collect();
        items.push(Ellipsis);
        items.push(Page(total_pages));
        return items;
    }

    if current_page >= total_pages - 3 {
        let mut items = vec![Page(1), Ellipsis];
        items.extend((total_pages - 4..=total_pages).map(Page));
        return items;
    }

    vec![
        Page(1),
        Ellipsis,
        Page(current_page - 1),
        Page(current_page),
        Page(current_page + 1),
        Ellipsis,
        Page(total_pages),
    ]
}

/// Build a listing URL for the given target offset, preserving every other
/// active query parameter. `offset` is omitted when it is 0 so the first
/// page keeps its canonical URL.
pub fn page_url(path: &str, params: &[(&str, &str)], offset: i64) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        if *key == "offset" {
            continue;
        }
        query.append_pair(key, value);
    }
    if offset > 0 {
        query.append_pair("offset", &offset.to_string());
    }
    let query = query.finish();

    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

#[cfg(test)]
mod tests {
    use super::PageItem::*;
    use super::*;

    #[test]
    fn middle_page_of_three() {
        let p = paginate(50, 24, 24);
        assert_eq!(p.current_page, 2);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_prev);
        assert!(p.has_next);
        assert_eq!(p.item_start, 25);
        assert_eq!(p.item_end, 48);
        assert_eq!(p.page_numbers, vec![Page(1), Page(2), Page(3)]);
    }

    #[test]
    fn empty_result_set() {
        let p = paginate(0, 20, 0);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_prev);
        assert!(!p.has_next);
        assert_eq!(p.item_start, 0);
        assert_eq!(p.item_end, 0);
        assert!(p.page_numbers.is_empty());
    }

    #[test]
    fn short_range_lists_every_page() {
        let p = paginate(140, 20, 0);
        assert_eq!(p.total_pages, 7);
        assert_eq!(
            p.page_numbers,
            (1..=7).map(Page).collect::<Vec<_>>()
        );
    }

    #[test]
    fn near_start_collapses_the_tail() {
        let p = paginate(200, 20, 0);
        assert_eq!(p.total_pages, 10);
        assert_eq!(
            p.page_numbers,
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(10)]
        );
    }

    #[test]
    fn near_end_collapses_the_head() {
        let p = paginate(200, 20, 180);
        assert_eq!(p.current_page, 10);
        assert_eq!(
            p.page_numbers,
            vec![Page(1), Ellipsis, Page(6), Page(7), Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn middle_collapses_both_sides() {
        let p = paginate(400, 20, 200);
        assert_eq!(p.current_page, 11);
        assert_eq!(p.total_pages, 20);
        assert_eq!(
            p.page_numbers,
            vec![
                Page(1),
                Ellipsis,
                Page(10),
                Page(11),
                Page(12),
                Ellipsis,
                Page(20)
            ]
        );
    }

    #[test]
    fn ellipsis_serializes_as_string_sentinel() {
        let json = serde_json::to_string(&vec![Page(1), Ellipsis, Page(10)]).unwrap();
        assert_eq!(json, r#"[1,"ellipsis",10]"#);
    }

    #[test]
    fn zero_offset_url_has_no_offset_param() {
        let url = page_url("/mitos", &[("region", "amazonas"), ("q", "jaguar")], 0);
        assert_eq!(url, "/mitos?region=amazonas&q=jaguar");
    }

    #[test]
    fn nonzero_offset_is_appended() {
        let url = page_url("/mitos", &[("region", "amazonas")], 40);
        assert_eq!(url, "/mitos?region=amazonas&offset=40");
    }

    #[test]
    fn stale_offset_param_is_replaced() {
        let url = page_url("/mitos", &[("offset", "20"), ("tag", "jaguares")], 0);
        assert_eq!(url, "/mitos?tag=jaguares");
    }

    #[test]
    fn bare_first_page_url_has_no_query_string() {
        assert_eq!(page_url("/mitos", &[], 0), "/mitos");
    }

    #[test]
    fn params_are_percent_encoded() {
        let url = page_url("/mitos", &[("q", "el dorado")], 0);
        assert_eq!(url, "/mitos?q=el+dorado");
    }
}
