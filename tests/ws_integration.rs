//! Integration tests for the native WebSocket client.
//!
//! These tests connect to the testnet WS server and exercise the full
//! connect → subscribe → receive → unsubscribe → disconnect lifecycle.
//!
//! All tests are `#[ignore]` because they require network access.
//!
//! Run with:
//! ```bash
//! cargo test --test ws_integration -- --ignored
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::timeout;

use lighter_sdk::network::TESTNET_WS_URL;
use lighter_sdk::ws::native::WsClient;
use lighter_sdk::ws::{StreamEvent, WsConfig, WsEvent};

const TEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Known market id on testnet (ETH).
const TEST_MARKET_ID: &str = "0";

fn test_config() -> WsConfig {
    WsConfig {
        url: TESTNET_WS_URL.into(),
        ..Default::default()
    }
}

/// Connect and wait for the `Connected` event.
async fn connected_client() -> WsClient {
    let client = WsClient::new(test_config());
    let ready = client.connect().await.expect("connect should succeed");
    assert!(ready, "connect should report a live connection");
    wait_for_connected(&client).await;
    client
}

async fn wait_for_connected(client: &WsClient) {
    let events = client.events();
    tokio::pin!(events);

    let first = timeout(TEST_TIMEOUT, events.next())
        .await
        .expect("timed out waiting for Connected")
        .expect("event stream ended");

    assert!(
        matches!(first, WsEvent::Connected),
        "first event should be Connected, got: {first:?}"
    );
}

/// Poll until the counter is non-zero or the timeout expires.
async fn wait_for_hits(hits: &Arc<AtomicUsize>) -> usize {
    timeout(TEST_TIMEOUT, async {
        loop {
            let count = hits.load(Ordering::SeqCst);
            if count > 0 {
                return count;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await
    .expect("timed out waiting for callback delivery")
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore]
async fn connect_and_receive_connected_event() {
    let client = connected_client().await;
    assert!(client.is_connected());
    client.disconnect().await.unwrap();
    assert!(!client.is_connected());
}

#[tokio::test]
#[ignore]
async fn connect_is_idempotent() {
    let client = connected_client().await;
    // A second connect on a live client is a no-op.
    assert!(client.connect().await.unwrap());
    client.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn subscribe_order_book_receives_data() {
    let client = connected_client().await;

    let hits = Arc::new(AtomicUsize::new(0));
    let hits2 = hits.clone();
    let accepted = client
        .subscribe("order_book", TEST_MARKET_ID, move |_, _| {
            hits2.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .expect("subscribe should succeed");
    assert!(accepted);

    wait_for_hits(&hits).await;
    client.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn subscribe_receives_ack_before_updates() {
    let client = connected_client().await;

    let first_event: Arc<std::sync::Mutex<Option<StreamEvent>>> =
        Arc::new(std::sync::Mutex::new(None));
    let first_event2 = first_event.clone();
    let hits = Arc::new(AtomicUsize::new(0));
    let hits2 = hits.clone();

    client
        .subscribe("order_book", TEST_MARKET_ID, move |event, _| {
            first_event2.lock().unwrap().get_or_insert(event);
            hits2.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .expect("subscribe should succeed");

    wait_for_hits(&hits).await;
    assert_eq!(
        *first_event.lock().unwrap(),
        Some(StreamEvent::Subscribed),
        "first delivery should be the subscription ack"
    );
    client.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn unsubscribe_stops_delivery() {
    let client = connected_client().await;

    let hits = Arc::new(AtomicUsize::new(0));
    let hits2 = hits.clone();
    client
        .subscribe("trade", TEST_MARKET_ID, move |_, _| {
            hits2.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .expect("subscribe should succeed");

    assert!(client.unsubscribe("trade", TEST_MARKET_ID).await.unwrap());
    let settled = hits.load(Ordering::SeqCst);

    // The connection stays alive and no further deliveries arrive.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(client.is_connected());
    assert_eq!(hits.load(Ordering::SeqCst), settled);

    client.disconnect().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn subscriptions_survive_manual_reconnect() {
    let client = connected_client().await;

    let hits = Arc::new(AtomicUsize::new(0));
    let hits2 = hits.clone();
    client
        .subscribe("order_book", TEST_MARKET_ID, move |_, _| {
            hits2.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .expect("subscribe should succeed");
    wait_for_hits(&hits).await;

    client.disconnect().await.unwrap();
    assert_eq!(client.subscription_counts().await.len(), 1);

    client.connect().await.expect("reconnect should succeed");
    hits.store(0, Ordering::SeqCst);
    wait_for_hits(&hits).await;

    client.close().await.unwrap();
}
