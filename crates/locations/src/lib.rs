//! Location provider for MistDuel
//!
//! Draws distinct random locations from the catalog and attaches the
//! street-view display URL. Distance and scoring math live in
//! `mistduel-core`; this crate only selects.

pub mod provider;

pub use provider::{LocationError, LocationProvider, street_view_url};
