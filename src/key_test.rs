use super::*;

fn page() -> PageLocation {
    PageLocation::new("https://example.test", "/signup", "?step=2")
}

// =============================================================
// PageLocation
// =============================================================

#[test]
fn parse_splits_origin_path_and_query() {
    let loc = PageLocation::parse("https://example.test/signup?step=2");
    assert_eq!(loc, page());
}

#[test]
fn parse_drops_fragment() {
    let loc = PageLocation::parse("https://example.test/signup?step=2#contact");
    assert_eq!(loc.page_identity(), "https://example.test/signup?step=2");
}

#[test]
fn parse_fragment_without_query() {
    let loc = PageLocation::parse("https://example.test/a/b#top");
    assert_eq!(loc.origin(), "https://example.test");
    assert_eq!(loc.path(), "/a/b");
    assert_eq!(loc.query(), "");
}

#[test]
fn parse_bare_origin_gets_root_path() {
    let loc = PageLocation::parse("http://localhost:8080");
    assert_eq!(loc.origin(), "http://localhost:8080");
    assert_eq!(loc.path(), "/");
}

#[test]
fn parse_path_only_href_has_empty_origin() {
    let loc = PageLocation::parse("/form?x=1");
    assert_eq!(loc.origin(), "");
    assert_eq!(loc.path(), "/form");
    assert_eq!(loc.query(), "?x=1");
}

#[test]
fn lone_question_mark_is_empty_query() {
    let loc = PageLocation::parse("https://example.test/p?");
    assert_eq!(loc.query(), "");
}

// =============================================================
// build_key
// =============================================================

#[test]
fn key_concatenates_parts_in_order() {
    let key = build_key(&page(), "contact", "email", "");
    assert_eq!(key.as_str(), "https://example.test/signup?step=2contactemail");
}

#[test]
fn key_appends_prefix_last() {
    let key = build_key(&page(), "contact", "email", "v2");
    assert_eq!(key.as_str(), "https://example.test/signup?step=2contactemailv2");
}

#[test]
fn key_is_deterministic() {
    let a = build_key(&page(), "contact", "email", "p");
    let b = build_key(&page(), "contact", "email", "p");
    assert_eq!(a, b);
}

#[test]
fn key_differs_by_target_id() {
    let a = build_key(&page(), "contact", "email", "");
    let b = build_key(&page(), "billing", "email", "");
    assert_ne!(a, b);
}

#[test]
fn key_differs_by_query_but_not_fragment() {
    let a = build_key(&PageLocation::parse("https://e.test/p?a=1#x"), "f", "n", "");
    let b = build_key(&PageLocation::parse("https://e.test/p?a=1#y"), "f", "n", "");
    let c = build_key(&PageLocation::parse("https://e.test/p?a=2"), "f", "n", "");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn same_named_fields_share_a_key() {
    let a = build_key(&page(), "prefs", "opts[]", "");
    let b = build_key(&page(), "prefs", "opts[]", "");
    assert_eq!(a.to_string(), b.into_string());
}
