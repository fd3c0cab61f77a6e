//! Google Places nearby search, used to find candidate venues around a point.

pub mod archetype;
pub mod client;
pub mod error;
pub mod types;

pub use archetype::infer_archetype;
pub use client::PlacesClient;
pub use error::PlacesError;
pub use types::{LatLng, Place};
