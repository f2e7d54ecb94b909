//! ridelink - realtime session layer for a ride-hailing client
//!
//! This crate provides the client-side realtime engine, including:
//! - Session management (lazy authenticated connects, coalescing)
//! - Room membership over multiplexed namespaces (chat, tracking)
//! - Event dispatch to dynamically registered listeners
//!
//! # Architecture
//!
//! Each namespace gets one [`session::Session`] owning a single long-lived
//! connection. The typed façades ([`chat::ChatClient`],
//! [`tracking::TrackingClient`]) issue fire-and-forget commands through it and
//! register listeners on its dispatcher. Credentials come from an injected
//! [`auth::TokenProvider`] at connect time; the transport behind
//! [`transport::Connector`] is swappable, with a framed-TCP implementation for
//! production and scripted fakes in tests.

pub mod auth;
pub mod chat;
pub mod config;
pub mod protocol;
pub mod session;
pub mod tracking;
pub mod transport;
