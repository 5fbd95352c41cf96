//! Algorithms computing measurements from particle tracks
mod angle;
mod delta_vertices;
mod energy;
mod tof;
mod vertex;

pub use angle::AngleDriver;
pub use delta_vertices::DeltaVerticesDriver;
pub use energy::EnergyDriver;
pub use tof::TofDriver;
pub use vertex::VertexDriver;

use std::sync::Arc;

use log::debug;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use strum::{Display, EnumIter, EnumString};

use crate::config::Properties;
use crate::error::{Error, Result};
use crate::geometry::CalorimeterLocator;

pub type Locator = Arc<dyn CalorimeterLocator + Send + Sync>;

#[derive(Display, EnumIter, EnumString, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum DriverId {
    #[strum(to_string = "AD")]
    Angle,
    #[strum(to_string = "ED")]
    Energy,
    #[strum(to_string = "TOFD")]
    Tof,
    #[strum(to_string = "VD")]
    Vertex,
    #[strum(to_string = "DVD")]
    DeltaVertices,
}

pub trait MeasurementDriver {
    fn id(&self) -> DriverId;

    fn is_initialized(&self) -> bool;

    fn initialize(&mut self, config: &Properties) -> Result<()>;

    fn reset(&mut self);

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::NotInitialized(self.id().to_string()))
        }
    }

    fn ensure_uninitialized(&self) -> Result<()> {
        if self.is_initialized() {
            Err(Error::AlreadyInitialized(self.id().to_string()))
        } else {
            Ok(())
        }
    }
}

/// Upper tail probability of a chi-square with one degree of freedom
pub(crate) fn chi2_probability(chi2: f64) -> Result<f64> {
    if chi2 == f64::INFINITY {
        return Ok(0.);
    }
    let dist = ChiSquared::new(1.)?;
    Ok(dist.sf(chi2))
}

/// The drivers enabled in a configuration
///
/// A driver that is `None` was not configured, and the measurements
/// it would produce are not created.
#[derive(Default)]
pub struct MeasurementDrivers {
    pub angle: Option<AngleDriver>,
    pub energy: Option<EnergyDriver>,
    pub tof: Option<TofDriver>,
    pub vertex: Option<VertexDriver>,
    pub delta_vertices: Option<DeltaVerticesDriver>,
}

impl MeasurementDrivers {
    /// Set up the drivers listed under `drivers`
    ///
    /// Each driver is initialized with the properties under its id,
    /// e.g. `TOFD.sigma_length`.
    pub fn from_config(config: &Properties, locator: Option<Locator>) -> Result<Self> {
        let mut drivers = Self::default();
        if !config.has_key("drivers") {
            return Ok(drivers);
        }
        for name in config.fetch_strings("drivers")? {
            let id: DriverId = name
                .parse()
                .map_err(|_| Error::UnknownDriver(name.to_owned()))?;
            debug!("Initializing measurement driver {id}");
            let driver_config = config.sub(name);
            match id {
                DriverId::Angle => {
                    let mut d = AngleDriver::new();
                    d.initialize(&driver_config)?;
                    drivers.angle = Some(d);
                }
                DriverId::Energy => {
                    let mut d = EnergyDriver::new();
                    d.initialize(&driver_config)?;
                    drivers.energy = Some(d);
                }
                DriverId::Tof => {
                    let mut d = TofDriver::new();
                    if let Some(locator) = &locator {
                        d.set_locator(locator.clone());
                    }
                    d.initialize(&driver_config)?;
                    drivers.tof = Some(d);
                }
                DriverId::Vertex => {
                    let mut d = VertexDriver::new();
                    d.initialize(&driver_config)?;
                    drivers.vertex = Some(d);
                }
                DriverId::DeltaVertices => {
                    let mut d = DeltaVerticesDriver::new();
                    d.initialize(&driver_config)?;
                    drivers.delta_vertices = Some(d);
                }
            }
        }
        Ok(drivers)
    }

    pub fn all() -> Result<Self> {
        let config = Properties::new().with("drivers", vec!["AD", "ED", "TOFD", "VD", "DVD"]);
        Self::from_config(&config, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn chi2() {
        assert_relative_eq!(chi2_probability(0.).unwrap(), 1.);
        assert_relative_eq!(chi2_probability(1.).unwrap(), 0.31731050786291404, max_relative = 1e-9);
        assert_relative_eq!(chi2_probability(0.5).unwrap(), 0.4795001221869535, max_relative = 1e-9);
        assert!(chi2_probability(4.).unwrap() < chi2_probability(1.).unwrap());
        assert_eq!(chi2_probability(f64::INFINITY).unwrap(), 0.);
    }

    #[test]
    fn registry() {
        let config = Properties::new()
            .with("drivers", vec!["AD", "TOFD"])
            .with("TOFD.sigma_length", "0.1 ns");
        let drivers = MeasurementDrivers::from_config(&config, None).unwrap();
        assert!(drivers.angle.is_some());
        assert!(drivers.tof.is_some());
        assert!(drivers.energy.is_none());
        assert!(drivers.vertex.is_none());
        assert!(drivers.delta_vertices.is_none());

        let config = Properties::new().with("drivers", vec!["AD", "XD"]);
        assert!(matches!(
            MeasurementDrivers::from_config(&config, None),
            Err(Error::UnknownDriver(name)) if name == "XD"
        ));

        let drivers = MeasurementDrivers::from_config(&Properties::new(), None).unwrap();
        assert!(drivers.angle.is_none());
    }
}
