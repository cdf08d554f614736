//! Temporal-spatial patch store: the in-memory substrate of a geospatial
//! agent-based simulation engine.
//!
//! A [`replicate::Replicate`] holds the *current* set of mutable
//! [`patch::LivePatch`]es and an archive of immutable, per-step
//! [`timestep::TimeStep`] snapshots. Saving a step freezes the live set;
//! queries against saved steps run through a lazily
//! built [`spatial_index::PatchSpatialIndex`] backed by a process-global
//! disc-offset cache ([`offsets`]).
//!
//! External data (CSV tables, precomputed grids) can seed patch
//! attributes through the [`external`] module.

pub mod config;
pub mod decimal;
pub mod error;
pub mod external;
pub mod geokey;
pub mod geometry;
pub mod lock;
pub mod offsets;
pub mod patch;
pub mod replicate;
pub mod spatial_index;
pub mod telemetry;
pub mod timestep;
pub mod value;

pub use error::{PatchStoreError, Result};
pub use geokey::GeoKey;
pub use geometry::Geometry;
pub use patch::{FrozenPatch, LivePatch, Patch};
pub use replicate::{Query, Replicate};
pub use timestep::TimeStep;
pub use value::{Value, ValueData};
