//! Driver location tracking client
//!
//! Thin typed façade over a [`Session`] on the `tracking` namespace; an
//! independent instantiation of the same pattern as the chat client, sharing
//! no state with it.

use std::time::Duration;

use crate::auth::TokenProvider;
use crate::config::RealtimeConfig;
use crate::protocol::{DriverLocationUpdate, OutboundEvent};
use crate::session::{Namespace, RoomId, Session, SessionError, Subscription};
use crate::transport::Connector;

/// Client for per-trip driver location rooms
pub struct TrackingClient<P, C> {
    session: Session<P, C>,
}

impl<P: TokenProvider, C: Connector> TrackingClient<P, C> {
    /// Build a tracking client against an explicit endpoint
    pub fn new(
        provider: P,
        connector: C,
        endpoint: impl Into<String>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            session: Session::new(
                provider,
                connector,
                endpoint,
                Namespace::Tracking,
                connect_timeout,
            ),
        }
    }

    /// Build a tracking client from the application config
    pub fn from_config(config: &RealtimeConfig, provider: P, connector: C) -> Self {
        Self::new(
            provider,
            connector,
            config.endpoint_for(Namespace::Tracking),
            config.connect_timeout(),
        )
    }

    /// Receive every driver position update pushed on this session
    pub fn subscribe_to_driver_location(
        &self,
        listener: impl Fn(&DriverLocationUpdate) + Send + Sync + 'static,
    ) -> Subscription {
        self.session.dispatcher().subscribe_locations(listener)
    }

    /// Receive server-pushed error notifications
    pub fn subscribe_to_errors(
        &self,
        listener: impl Fn(&String) + Send + Sync + 'static,
    ) -> Subscription {
        self.session.dispatcher().subscribe_errors(listener)
    }

    /// Join the tracking room for a trip, connecting first if necessary
    pub async fn join_trip(&self, trip_id: &str) -> Result<(), SessionError> {
        self.session.join(&RoomId::Trip(trip_id.to_string())).await
    }

    /// Leave the tracking room for a trip; never connects just to leave
    pub async fn leave_trip(&self, trip_id: &str) -> Result<(), SessionError> {
        self.session.leave(&RoomId::Trip(trip_id.to_string())).await
    }

    /// Publish the driver's current position for a trip
    ///
    /// Dropped without error when the trip id is empty or either coordinate
    /// is not a finite number.
    pub async fn update_driver_location(
        &self,
        trip_id: &str,
        coordinates: (f64, f64),
    ) -> Result<(), SessionError> {
        if trip_id.is_empty() || !is_well_formed(coordinates) {
            tracing::debug!("[tracking] Dropping malformed driver_location_update");
            return Ok(());
        }
        self.session
            .send(OutboundEvent::DriverLocationUpdate {
                trip_id: trip_id.to_string(),
                coordinates,
            })
            .await
    }

    /// Request the last known driver position for a trip
    ///
    /// The answer arrives asynchronously as a `driver_location` event.
    pub async fn request_driver_location(&self, trip_id: &str) -> Result<(), SessionError> {
        if trip_id.is_empty() {
            return Ok(());
        }
        self.session
            .send(OutboundEvent::GetDriverLocation {
                trip_id: trip_id.to_string(),
            })
            .await
    }
}

fn is_well_formed((lat, lng): (f64, f64)) -> bool {
    lat.is_finite() && lng.is_finite()
}
