#![warn(clippy::all, rust_2018_idioms)]
//! Topology measurements and selection cuts for reconstructed events
//!
//! The [`TopologyDriver`] labels the particle tracks of an event,
//! classifies the event and builds a [`TopologyPattern`] holding the
//! measurements of the configured drivers. [`cuts`] select events and
//! measurements on the result.
pub mod builders;
pub mod config;
pub mod cuts;
pub mod drivers;
pub mod error;
pub mod event;
pub mod geometry;
pub mod measurement;
pub mod particle;
pub mod pattern;
pub mod topology;
pub mod units;

pub use config::{Config, Properties};
pub use cuts::{Cut, CutCatalog, CutData, Verdict};
pub use error::{Error, Result};
pub use event::{EventRecord, ParticleTrackData};
pub use pattern::{PatternKind, TopologyData, TopologyPattern};
pub use topology::TopologyDriver;
