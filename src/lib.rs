//! Payment Relay - Stripe webhook ingestor
//!
//! Verifies signed Stripe deliveries and relays each recognized billing event
//! into the hosted database as a single conditional row update.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
