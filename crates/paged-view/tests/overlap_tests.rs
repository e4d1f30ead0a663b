//! Tests for fetches that overlap in flight.

mod common;

use common::{record, scripted_view, scripted_view_with};
use paged_view::{OverlapPolicy, ViewConfig};

#[tokio::test]
async fn test_latest_request_wins_discards_late_result() {
    let (view, client) = scripted_view(35);
    view.refresh().await.unwrap();
    let pages = record(&view.signals().page_changed);
    let gate = client.gate(1);

    let slow = view.move_to_page(1);
    let fast = async {
        let moved = view.move_to_page(2).await;
        let _ = gate.send(());
        moved
    };
    let (slow, fast) = tokio::join!(slow, fast);

    assert!(slow.unwrap());
    assert!(fast.unwrap());
    assert_eq!(client.requested_pages(), vec![0, 1, 2]);
    assert_eq!(view.page_index(), Some(2));
    assert_eq!(view.items(), (20..30).collect::<Vec<_>>());
    assert_eq!(*pages.lock(), vec![2]);
    assert!(!view.is_page_changing());
}

#[tokio::test]
async fn test_last_completion_wins_applies_every_result() {
    let config = ViewConfig::default().with_overlap_policy(OverlapPolicy::LastCompletionWins);
    let (view, client) = scripted_view_with(35, config);
    view.refresh().await.unwrap();
    let pages = record(&view.signals().page_changed);
    let gate = client.gate(1);

    let slow = view.move_to_page(1);
    let fast = async {
        let moved = view.move_to_page(2).await;
        let _ = gate.send(());
        moved
    };
    let _ = tokio::join!(slow, fast);

    assert_eq!(view.page_index(), Some(1));
    assert_eq!(view.items(), (10..20).collect::<Vec<_>>());
    assert_eq!(*pages.lock(), vec![2, 1]);
}

#[tokio::test]
async fn test_page_stays_changing_until_last_fetch_settles() {
    let (view, client) = scripted_view(35);
    view.refresh().await.unwrap();
    let gate = client.gate(1);

    let slow = view.move_to_page(1);
    let fast = async {
        view.move_to_page(2).await.unwrap();
        let changing = view.is_page_changing();
        let _ = gate.send(());
        changing
    };
    let (_, changing_after_fast) = tokio::join!(slow, fast);

    assert!(changing_after_fast);
    assert!(!view.is_page_changing());
}
