//! Tests for the current-item cursor.

mod common;

use std::sync::Arc;

use common::{ScriptedClient, init_tracing, record, scripted_view};
use paged_view::{PagedCollectionView, ViewConfig, ViewProperty};

#[tokio::test]
async fn test_position_stays_in_range() {
    let (view, _client) = scripted_view(35);
    view.refresh().await.unwrap();
    let count = view.count() as isize;

    for requested in -3..count + 4 {
        let landed = view.move_current_to_position(requested, true);
        let position = view.current_position();
        let item = view.current_item();

        assert!((-1..=count).contains(&position));
        assert_eq!(landed, (0..count).contains(&requested));
        assert_eq!(item.is_some(), (0..count).contains(&position));
        if requested < 0 {
            assert_eq!(position, -1);
        } else if requested >= count {
            assert_eq!(position, count);
        }
    }
}

#[tokio::test]
async fn test_move_to_same_position_is_noop() {
    let (view, _client) = scripted_view(35);
    view.refresh().await.unwrap();
    assert!(view.move_current_to_position(4, true));

    let changing = record(&view.signals().current_changing);
    assert!(!view.move_current_to_position(4, true));
    assert!(changing.lock().is_empty());
}

#[tokio::test]
async fn test_canceled_move_keeps_position() {
    let (view, _client) = scripted_view(35);
    view.refresh().await.unwrap();
    view.move_current_to_first();
    view.signals().current_changing.connect(|args| args.cancel());

    assert!(!view.move_current_to_position(5, true));
    assert!(!view.move_current_to_next());
    assert!(!view.move_current_to(&7));
    assert_eq!(view.current_position(), 0);
    assert_eq!(view.current_item(), Some(0));

    // A non-cancelable move ignores the cancel request.
    assert!(view.move_current_to_position(5, false));
    assert_eq!(view.current_item(), Some(5));
}

#[tokio::test]
async fn test_move_helpers() {
    let (view, _client) = scripted_view(35);
    view.refresh().await.unwrap();

    assert!(view.move_current_to_last());
    assert_eq!(view.current_item(), Some(9));
    assert!(view.move_current_to_previous());
    assert_eq!(view.current_item(), Some(8));
    assert!(view.move_current_to_next());
    assert_eq!(view.current_item(), Some(9));
    assert!(!view.move_current_to_next());
    assert!(view.is_current_after_last());
    assert!(view.move_current_to_first());
    assert!(!view.move_current_to_previous());
    assert!(view.is_current_before_first());
}

#[tokio::test]
async fn test_page_refresh_resets_cursor() {
    let (view, _client) = scripted_view(35);
    view.refresh().await.unwrap();
    view.move_current_to_position(3, true);

    let changing = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let recv = changing.clone();
    view.signals()
        .current_changing
        .connect(move |args| recv.lock().push(args.is_cancelable()));
    let changed = record(&view.signals().current_changed);
    let properties = record(&view.signals().property_changed);

    view.move_to_page(1).await.unwrap();

    assert_eq!(view.current_position(), -1);
    assert_eq!(view.current_item(), None);
    assert_eq!(*changing.lock(), vec![false]);
    assert_eq!(changed.lock().len(), 1);
    let properties = properties.lock();
    assert!(properties.contains(&ViewProperty::CurrentItem));
    assert!(properties.contains(&ViewProperty::CurrentPosition));
}

#[tokio::test]
async fn test_move_current_to_uses_comparer() {
    init_tracing();
    let client = Arc::new(ScriptedClient::new(35));
    let view = PagedCollectionView::with_comparer(client, ViewConfig::default(), |a: &u32, b: &u32| {
        a % 100 == b % 100
    })
    .unwrap();
    view.refresh().await.unwrap();

    assert!(view.contains(&104));
    assert_eq!(view.index_of(&106), Some(6));
    assert!(view.move_current_to(&103));
    assert_eq!(view.current_item(), Some(3));
    assert!(!view.move_current_to(&3));
    assert!(!view.move_current_to(&150));
}

#[tokio::test]
async fn test_cursor_spans_frozen_items() {
    let (view, _client) = scripted_view(35);
    view.frozen_items().push(100);
    view.refresh().await.unwrap();

    assert!(view.move_current_to_first());
    assert_eq!(view.current_item(), Some(100));
    assert!(view.move_current_to_next());
    assert_eq!(view.current_item(), Some(0));
}
