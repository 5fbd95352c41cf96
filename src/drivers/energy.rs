use log::debug;

use super::{DriverId, MeasurementDriver};
use crate::config::Properties;
use crate::error::Result;
use crate::measurement::EnergyMeasurement;
use crate::particle::ParticleTrack;

/// Sums the calorimeter energy associated to a track
#[derive(Clone, Debug, Default)]
pub struct EnergyDriver {
    initialized: bool,
}

impl EnergyDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&self, track: &ParticleTrack) -> Result<EnergyMeasurement> {
        self.ensure_initialized()?;
        if !track.has_calorimeter_hits() {
            debug!("Particle track is not associated to any calorimeter hit");
            return Ok(EnergyMeasurement::default());
        }
        let energy = track.calorimeter_hits.iter().map(|hit| hit.energy).sum();
        Ok(EnergyMeasurement::new(energy))
    }
}

impl MeasurementDriver for EnergyDriver {
    fn id(&self) -> DriverId {
        DriverId::Energy
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, _config: &Properties) -> Result<()> {
        self.ensure_uninitialized()?;
        self.initialized = true;
        Ok(())
    }

    fn reset(&mut self) {
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::{CalorimeterHit, ParticleKind};
    use crate::units::KEV;
    use approx::assert_relative_eq;

    fn hit(energy: f64) -> CalorimeterHit {
        CalorimeterHit {
            energy,
            ..Default::default()
        }
    }

    #[test]
    fn sum_of_hits() {
        let mut ed = EnergyDriver::new();
        ed.initialize(&Properties::new()).unwrap();

        let mut electron = ParticleTrack::new(ParticleKind::Electron);
        electron.calorimeter_hits.push(hit(1000. * KEV));
        assert_relative_eq!(ed.process(&electron).unwrap().energy.unwrap(), 1.);

        let mut gamma = ParticleTrack::new(ParticleKind::Gamma);
        gamma.calorimeter_hits.push(hit(500. * KEV));
        gamma.calorimeter_hits.push(hit(1000. * KEV));
        assert_relative_eq!(ed.process(&gamma).unwrap().energy.unwrap(), 1.5);

        let empty = ParticleTrack::new(ParticleKind::Alpha);
        assert!(!ed.process(&empty).unwrap().has_energy());
    }
}
