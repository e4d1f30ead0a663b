//! Tests for configuration and wire formats.

mod common;

use std::sync::Arc;

use common::ScriptedClient;
use paged_view::{
    Error, FrozenItemPosition, OverlapPolicy, PagedCollectionView, PagingRequest, SortDescriptor,
    SortResetPolicy, ViewConfig,
};

#[test]
fn test_config_builder() {
    let config = ViewConfig::default()
        .with_page_size(25)
        .with_frozen_position(FrozenItemPosition::Trailing)
        .with_overlap_policy(OverlapPolicy::LastCompletionWins)
        .with_sort_reset_policy(SortResetPolicy::AlwaysReset);

    assert_eq!(config.page_size, 25);
    assert_eq!(config.frozen_position, FrozenItemPosition::Trailing);
    assert_eq!(config.overlap_policy, OverlapPolicy::LastCompletionWins);
    assert_eq!(config.sort_reset_policy, SortResetPolicy::AlwaysReset);
}

#[test]
fn test_config_from_settings_json() {
    let config: ViewConfig =
        serde_json::from_str(r#"{"page_size": 25, "frozen_position": "trailing"}"#).unwrap();
    assert_eq!(config.page_size, 25);
    assert_eq!(config.frozen_position, FrozenItemPosition::Trailing);
    assert_eq!(config.overlap_policy, OverlapPolicy::LatestRequestWins);

    let json = serde_json::to_string(&config).unwrap();
    let back: ViewConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_invalid_page_size_from_settings() {
    let config: ViewConfig = serde_json::from_str(r#"{"page_size": 0}"#).unwrap();
    let client = Arc::new(ScriptedClient::new(10));
    let result = PagedCollectionView::with_config(client, config);
    assert!(matches!(result, Err(Error::InvalidPageSize { page_size: 0 })));
}

#[test]
fn test_paging_request_wire_format() {
    let request = PagingRequest::new(
        3,
        8,
        vec![
            SortDescriptor::descending("age"),
            SortDescriptor::ascending("name"),
        ],
    );
    let json = serde_json::to_value(&request).unwrap();

    assert_eq!(json["page_index"], 3);
    assert_eq!(json["page_size"], 8);
    assert_eq!(json["sort_descriptors"][0]["key"], "age");
    assert_eq!(json["sort_descriptors"][0]["direction"], "descending");

    let back: PagingRequest = serde_json::from_value(json).unwrap();
    assert_eq!(back, request);
    assert_eq!(back.offset(), 24);
}
