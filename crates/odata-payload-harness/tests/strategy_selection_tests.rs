//! Integration tests for per-exchange strategy selection.

mod common;

use odata_payload_harness::{FormatKind, strategy_for_exchange};

#[test]
fn strategy_selection_tests_routes_by_content_type_prefix() {
    let uri = common::service_uri("Customers");
    let cases = [
        ("application/atom+xml;type=feed", FormatKind::Xml),
        ("application/xml", FormatKind::Xml),
        ("application/json;odata=verbose", FormatKind::Json),
        ("text/plain", FormatKind::Text),
        ("application/x-www-form-urlencoded", FormatKind::HtmlForm),
        ("application/octet-stream", FormatKind::Binary),
    ];
    for (content_type, expected) in cases {
        assert_eq!(
            strategy_for_exchange(Some(content_type), &uri).kind(),
            expected,
            "content type {content_type}"
        );
    }
}

#[test]
fn strategy_selection_tests_is_deterministic() {
    let uri = common::service_uri("Customers(1)");
    let first = strategy_for_exchange(Some("application/json"), &uri).kind();
    let second = strategy_for_exchange(Some("application/json"), &uri).kind();
    assert_eq!(first, second);
}

#[test]
fn strategy_selection_tests_media_resources_always_get_binary() {
    let media = common::service_uri("Photos(1)/$value");
    for content_type in ["application/json", "application/xml", "text/plain"] {
        assert_eq!(
            strategy_for_exchange(Some(content_type), &media).kind(),
            FormatKind::Binary,
            "content type {content_type}"
        );
    }
}

#[test]
fn strategy_selection_tests_count_requests_use_the_count_reader() {
    let count = common::service_uri("Customers/$count");
    assert_eq!(
        strategy_for_exchange(Some("text/plain"), &count).kind(),
        FormatKind::Count
    );
    assert_eq!(
        strategy_for_exchange(Some("application/xml"), &count).kind(),
        FormatKind::Xml
    );
}

#[test]
fn strategy_selection_tests_missing_content_type_defaults_to_xml() {
    let uri = common::service_uri("Customers");
    assert_eq!(strategy_for_exchange(None, &uri).kind(), FormatKind::Xml);
}
