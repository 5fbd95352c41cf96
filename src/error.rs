//! Error types for topology measurements and cuts

use thiserror::Error;

use crate::measurement::MeasurementKey;
use crate::particle::{ParticleKind, TrackLabel};

#[derive(Error, Debug)]
pub enum Error {
    #[error("'{0}' is already initialized")]
    AlreadyInitialized(String),

    #[error("'{0}' is not initialized")]
    NotInitialized(String),

    #[error("Missing '{0}' property")]
    MissingProperty(String),

    #[error("Property '{key}' is not of type {expected}")]
    PropertyType { key: String, expected: &'static str },

    #[error("Invalid quantity '{0}'")]
    InvalidQuantity(String),

    #[error("Unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("Unit '{unit}' is not a valid unit for '{key}'")]
    UnitDimension { key: String, unit: String },

    #[error("Missing at least a 'mode.XXX' property")]
    MissingMode,

    #[error("Missing '{0}.min' or '{0}.max' property")]
    MissingBound(String),

    #[error("Invalid value {value} for '{key}'")]
    OutOfRange { key: String, value: f64 },

    #[error("Invalid '{0}.min' > '{0}.max' values")]
    InvertedRange(String),

    #[error("Unknown '{mode}' mode for '{key}'")]
    UnknownRangePolicy { key: String, mode: String },

    #[error("Unknown measurement driver '{0}'")]
    UnknownDriver(String),

    #[error("Unknown cut type '{0}'")]
    UnknownCutType(String),

    #[error("No cut '{0}' has been registered")]
    UnknownCut(String),

    #[error("Invalid measurement key '{0}'")]
    InvalidMeasurementKey(String),

    #[error("Invalid cut data: expected {0}")]
    InvalidCutData(&'static str),

    #[error("Particle track has no {0}")]
    MissingTrackData(&'static str),

    #[error("Unsupported particle pair {0} - {1}")]
    UnsupportedPair(ParticleKind, ParticleKind),

    #[error("No mass for particle kind {0}")]
    UnknownMass(ParticleKind),

    #[error("Vertices have different blur dimensions ({0} and {1})")]
    BlurDimensionMismatch(u8, u8),

    #[error("Missing particle track '{0}'")]
    MissingTrack(TrackLabel),

    #[error("Measurement '{0}' already exists")]
    DuplicateMeasurement(MeasurementKey),

    #[error("Statistics error: {0}")]
    Statistics(#[from] statrs::StatsError),
}

impl Error {
    /// Whether the error comes from incomplete or unsuitable track data
    pub fn is_track_data_error(&self) -> bool {
        matches!(
            self,
            Error::MissingTrackData(_)
                | Error::UnsupportedPair(..)
                | Error::UnknownMass(_)
                | Error::BlurDimensionMismatch(..)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
