//! Cursor pagination for collection → product expansion.
//!
//! The catalog carries the next-page cursor in the `Link` response header as
//! a `page_info` query parameter on the `rel="next"` URL:
//!
//! ```text
//! <https://shop.test/admin/collections/c1/products.json?limit=250&page_info=CURSOR>; rel="next"
//! ```
//!
//! A combined header may also carry a `rel="previous"` entry before the next
//! one; only the next relation matters here.

/// Extracts the `page_info` cursor for the next page from a `Link` header.
///
/// Returns `None` when the header is absent, carries no `rel="next"` entry
/// (last page), or the next URL has no `page_info` parameter.
#[must_use]
pub fn extract_next_cursor(link_header: Option<&str>) -> Option<String> {
    let header = link_header?;

    for segment in header.split(',') {
        let segment = segment.trim();
        if !segment.contains(r#"rel="next""#) {
            continue;
        }

        let start = segment.find('<')? + 1;
        let end = segment.find('>')?;
        if start >= end {
            return None;
        }
        return page_info_param(&segment[start..end]);
    }

    None
}

/// Pulls the `page_info` value out of a URL's query string.
///
/// Cursors are base64url-encoded, so no percent-decoding is needed.
fn page_info_param(url: &str) -> Option<String> {
    let query = &url[url.find('?')? + 1..];
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("page_info=") {
            if !value.is_empty() {
                return Some(value.to_owned());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_header_means_no_next_page() {
        assert!(extract_next_cursor(None).is_none());
        assert!(extract_next_cursor(Some("")).is_none());
    }

    #[test]
    fn extracts_cursor_from_single_next_link() {
        let header = r#"<https://shop.test/admin/collections/c1/products.json?limit=250&page_info=eyJsYXN0X2lkIjo2fQ>; rel="next""#;
        assert_eq!(
            extract_next_cursor(Some(header)).as_deref(),
            Some("eyJsYXN0X2lkIjo2fQ")
        );
    }

    #[test]
    fn picks_next_out_of_combined_prev_and_next() {
        let header = concat!(
            r#"<https://shop.test/x.json?page_info=PREV>; rel="previous", "#,
            r#"<https://shop.test/x.json?page_info=NEXT>; rel="next""#
        );
        assert_eq!(extract_next_cursor(Some(header)).as_deref(), Some("NEXT"));
    }

    #[test]
    fn previous_only_header_yields_none() {
        let header = r#"<https://shop.test/x.json?page_info=PREV>; rel="previous""#;
        assert!(extract_next_cursor(Some(header)).is_none());
    }

    #[test]
    fn next_url_without_page_info_yields_none() {
        let header = r#"<https://shop.test/x.json?limit=250>; rel="next""#;
        assert!(extract_next_cursor(Some(header)).is_none());
    }

    #[test]
    fn page_info_need_not_be_first_parameter() {
        let header = r#"<https://shop.test/x.json?limit=250&page_info=CURSOR123>; rel="next""#;
        assert_eq!(
            extract_next_cursor(Some(header)).as_deref(),
            Some("CURSOR123")
        );
    }
}
