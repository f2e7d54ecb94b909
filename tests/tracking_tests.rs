//! Integration tests for the tracking client façade

mod common;

use common::{CountingProvider, FakeConnector};
use ridelink::protocol::{DriverLocationUpdate, InboundEvent, OutboundEvent};
use ridelink::tracking::TrackingClient;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

fn client(
    provider: CountingProvider,
    connector: FakeConnector,
) -> TrackingClient<CountingProvider, FakeConnector> {
    TrackingClient::new(provider, connector, "127.0.0.1:7440", Duration::from_secs(5))
}

#[tokio::test]
async fn test_malformed_updates_are_dropped() -> anyhow::Result<()> {
    let connector = FakeConnector::new();
    let client = client(CountingProvider::new("tok1"), connector.clone());

    client.update_driver_location("", (15.3, -4.3)).await?;
    client.update_driver_location("t-1", (f64::NAN, -4.3)).await?;
    client
        .update_driver_location("t-1", (15.3, f64::INFINITY))
        .await?;
    client.request_driver_location("").await?;

    assert_eq!(connector.attempts(), 0);
    assert!(connector.take_link().is_none());

    Ok(())
}

#[tokio::test]
async fn test_leave_trip_without_connection_is_a_noop() -> anyhow::Result<()> {
    let connector = FakeConnector::new();
    let client = client(CountingProvider::new("tok1"), connector.clone());

    client.leave_trip("t-1").await?;

    assert_eq!(connector.attempts(), 0);

    Ok(())
}

#[tokio::test]
async fn test_update_after_disconnect_reconnects_with_fresh_credential() -> anyhow::Result<()> {
    let provider = CountingProvider::new("tok1");
    let connector = FakeConnector::new();
    let client = client(provider.clone(), connector.clone());

    client.join_trip("t-7").await?;
    assert_eq!(connector.attempts(), 1);

    // Transport signals loss of connection mid-session
    let link = connector.take_link().expect("first connection");
    link.kill();

    client.update_driver_location("t-7", (15.3, -4.3)).await?;

    // A fresh attempt with a re-fetched credential, then the update
    assert_eq!(connector.attempts(), 2);
    assert_eq!(provider.fetches(), 2);

    let mut link = connector.take_link().expect("second connection");
    let event = timeout(Duration::from_secs(1), link.outbound.recv())
        .await?
        .expect("event");
    assert_eq!(
        event,
        OutboundEvent::DriverLocationUpdate {
            trip_id: "t-7".to_string(),
            coordinates: (15.3, -4.3),
        }
    );

    Ok(())
}

#[tokio::test]
async fn test_location_updates_reach_listeners() -> anyhow::Result<()> {
    let connector = FakeConnector::new();
    let client = client(CountingProvider::new("tok1"), connector.clone());

    let (received_tx, mut received_rx) = mpsc::unbounded_channel();
    let _subscription = client.subscribe_to_driver_location(move |update: &DriverLocationUpdate| {
        let _ = received_tx.send(update.clone());
    });

    client.join_trip("t-7").await?;
    client.request_driver_location("t-7").await?;

    let mut link = connector.take_link().expect("connection");
    let join = timeout(Duration::from_secs(1), link.outbound.recv()).await?;
    assert_eq!(
        join,
        Some(OutboundEvent::JoinTrip {
            trip_id: "t-7".to_string()
        })
    );
    let request = timeout(Duration::from_secs(1), link.outbound.recv()).await?;
    assert_eq!(
        request,
        Some(OutboundEvent::GetDriverLocation {
            trip_id: "t-7".to_string()
        })
    );

    let update = DriverLocationUpdate {
        trip_id: "t-7".to_string(),
        coordinates: Some((15.3, -4.3)),
        updated_at: Some(chrono::Utc::now()),
    };
    link.inbound
        .send(InboundEvent::DriverLocation(update.clone()))
        .await?;

    let delivered = timeout(Duration::from_secs(1), received_rx.recv())
        .await?
        .expect("delivery");
    assert_eq!(delivered, update);

    Ok(())
}

#[tokio::test]
async fn test_error_without_message_gets_fallback_text() -> anyhow::Result<()> {
    let connector = FakeConnector::new();
    let client = client(CountingProvider::new("tok1"), connector.clone());

    let (error_tx, mut error_rx) = mpsc::unbounded_channel();
    let _subscription = client.subscribe_to_errors(move |message: &String| {
        let _ = error_tx.send(message.clone());
    });

    client.join_trip("t-1").await?;
    let link = connector.take_link().expect("connection");

    link.inbound.send(InboundEvent::Error { message: None }).await?;

    let delivered = timeout(Duration::from_secs(1), error_rx.recv())
        .await?
        .expect("delivery");
    assert_eq!(delivered, "realtime channel error");

    Ok(())
}
