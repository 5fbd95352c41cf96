use log::{debug, warn};

use super::{chi2_probability, DriverId, Locator, MeasurementDriver};
use crate::config::Properties;
use crate::error::{Error, Result};
use crate::geometry::{Point, Shape};
use crate::measurement::TofMeasurement;
use crate::particle::{CalorimeterHit, ParticleTrack};
use crate::units::{Dimension, C_LIGHT, NS};

/// Default systematic uncertainty on the track length, as a time
pub const DEFAULT_SIGMA_LENGTH: f64 = 0.6 * NS;

/// Time-of-flight consistency of two particles
///
/// Compares the measured calorimeter times with the times expected
/// for a common emission (internal hypothesis) and for a particle
/// crossing the source foil (external hypothesis).
pub struct TofDriver {
    initialized: bool,
    sigma_length: f64,
    locator: Option<Locator>,
}

impl Default for TofDriver {
    fn default() -> Self {
        Self {
            initialized: false,
            sigma_length: DEFAULT_SIGMA_LENGTH,
            locator: None,
        }
    }
}

/// Measured and expected arrival time of one particle
#[derive(Copy, Clone, Debug)]
struct Leg {
    time: f64,
    sigma_time: f64,
    expected_time: f64,
}

impl TofDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Geometry lookup for gamma hits without a matching vertex
    pub fn set_locator(&mut self, locator: Locator) {
        self.locator = Some(locator);
    }

    pub fn sigma_length(&self) -> f64 {
        self.sigma_length
    }

    pub fn process(
        &self,
        track1: &ParticleTrack,
        track2: &ParticleTrack,
    ) -> Result<TofMeasurement> {
        self.ensure_initialized()?;
        let (kind1, kind2) = (track1.kind(), track2.kind());
        if kind1.is_gamma() && kind2.is_gamma() {
            return Err(Error::UnsupportedPair(kind1, kind2));
        }
        if !track1.has_calorimeter_hits() || !track2.has_calorimeter_hits() {
            warn!("Particle tracks must both have calorimeter hits");
            return Ok(TofMeasurement::default());
        }
        match (kind1.is_gamma(), kind2.is_gamma()) {
            (false, false) => self.process_charged(track1, track2),
            (false, true) => self.process_with_gamma(track1, track2),
            (true, false) => self.process_with_gamma(track2, track1),
            (true, true) => unreachable!(),
        }
    }

    fn process_charged(
        &self,
        track1: &ParticleTrack,
        track2: &ParticleTrack,
    ) -> Result<TofMeasurement> {
        let mut tof = TofMeasurement::default();
        let (Some(leg1), Some(leg2)) = (charged_leg(track1)?, charged_leg(track2)?) else {
            return Ok(tof);
        };
        self.push_probabilities(&mut tof, &leg1, &leg2)?;
        Ok(tof)
    }

    fn process_with_gamma(
        &self,
        charged: &ParticleTrack,
        gamma: &ParticleTrack,
    ) -> Result<TofMeasurement> {
        let mut tof = TofMeasurement::default();
        let Some(leg1) = charged_leg(charged)? else {
            return Ok(tof);
        };
        let origin = charged
            .source_foil_vertex()
            .ok_or(Error::MissingTrackData("vertex on the source foil"))?
            .position();
        for hit in &gamma.calorimeter_hits {
            let Some(position) = self.hit_position(gamma, hit) else {
                warn!("No position for gamma calorimeter hit {hit:?}");
                continue;
            };
            let length = (position - origin).norm();
            let leg2 = Leg {
                time: hit.time,
                sigma_time: hit.sigma_time,
                expected_time: length / C_LIGHT,
            };
            self.push_probabilities(&mut tof, &leg1, &leg2)?;
        }
        Ok(tof)
    }

    fn hit_position(&self, gamma: &ParticleTrack, hit: &CalorimeterHit) -> Option<Point> {
        let id = hit.geom_id.as_ref()?;
        gamma
            .vertices
            .iter()
            .find(|v| v.region.is_calorimeter() && v.geom_id.as_ref() == Some(id))
            .map(|v| *v.position())
            .or_else(|| self.locator.as_ref()?.block_position(id))
    }

    fn push_probabilities(&self, tof: &mut TofMeasurement, leg1: &Leg, leg2: &Leg) -> Result<()> {
        let sigma2 = leg1.sigma_time.powi(2) + leg2.sigma_time.powi(2) + self.sigma_length.powi(2);
        let dt = leg1.time - leg2.time;
        let chi2_int = (dt - (leg1.expected_time - leg2.expected_time)).powi(2) / sigma2;
        let chi2_ext = (dt.abs() - (leg1.expected_time + leg2.expected_time)).powi(2) / sigma2;
        debug!("TOF chi2: internal {chi2_int}, external {chi2_ext}");
        if chi2_int.is_nan() || chi2_ext.is_nan() {
            warn!("Undefined TOF chi2 for calorimeter times {} and {}", leg1.time, leg2.time);
            return Ok(());
        }
        tof.internal_probabilities.push(chi2_probability(chi2_int)?);
        tof.external_probabilities.push(chi2_probability(chi2_ext)?);
        Ok(())
    }
}

impl MeasurementDriver for TofDriver {
    fn id(&self) -> DriverId {
        DriverId::Tof
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, config: &Properties) -> Result<()> {
        self.ensure_uninitialized()?;
        const KEY: &str = "sigma_length";
        if config.has_key(KEY) {
            let sigma = config.fetch_quantity(KEY, Dimension::Time, NS)?;
            if sigma <= 0. {
                return Err(Error::OutOfRange {
                    key: KEY.to_owned(),
                    value: sigma,
                });
            }
            self.sigma_length = sigma;
        }
        self.initialized = true;
        Ok(())
    }

    fn reset(&mut self) {
        self.sigma_length = DEFAULT_SIGMA_LENGTH;
        self.initialized = false;
    }
}

/// Velocity in units of c for a given kinetic energy and mass
pub fn beta(energy: f64, mass: f64) -> f64 {
    if mass == 0. {
        return 1.;
    }
    (energy * (energy + 2. * mass)).sqrt() / (energy + mass)
}

fn charged_leg(track: &ParticleTrack) -> Result<Option<Leg>> {
    let Some(hit) = track.calorimeter_hits.first() else {
        return Ok(None);
    };
    let trajectory = track
        .trajectory
        .as_ref()
        .ok_or(Error::MissingTrackData("trajectory"))?;
    let mass = track.kind().mass()?;
    let beta = beta(hit.energy, mass);
    if beta <= 0. || !beta.is_finite() {
        warn!("Invalid particle velocity for energy {}", hit.energy);
        return Ok(None);
    }
    Ok(Some(Leg {
        time: hit.time,
        sigma_time: hit.sigma_time,
        expected_time: trajectory.length() / (beta * C_LIGHT),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::geometry::{BlockPosition, BlockPositions, BlurSpot, GeomId, LineSegment};
    use crate::particle::{ParticleKind, Vertex, VertexRegion, ELECTRON_MASS};
    use crate::units::{CM, KEV};
    use approx::assert_relative_eq;

    fn block() -> GeomId {
        GeomId::new(1302, [0, 1, 4, 6])
    }

    fn hit(time: f64) -> CalorimeterHit {
        CalorimeterHit {
            energy: 1000. * KEV,
            sigma_energy: 80. * KEV,
            time: time * NS,
            sigma_time: 0.05 * NS,
            geom_id: None,
        }
    }

    fn foil_vertex() -> Vertex {
        Vertex::new(BlurSpot::at(Point::zeros()), VertexRegion::SourceFoil)
    }

    fn electron(y: f64, time: f64) -> ParticleTrack {
        let mut e = ParticleTrack::new(ParticleKind::Electron);
        e.vertices.push(foil_vertex());
        e.trajectory = Some(LineSegment::new(Point::zeros(), Point::new(0., y, 0.)).into());
        e.calorimeter_hits.push(hit(time));
        e
    }

    fn gamma(with_calo_vertex: bool) -> ParticleTrack {
        let mut g = ParticleTrack::new(ParticleKind::Gamma);
        g.vertices.push(foil_vertex());
        if with_calo_vertex {
            g.vertices.push(
                Vertex::new(
                    BlurSpot::at(Point::new(45. * CM, 45. * CM, 0.)),
                    VertexRegion::MainCalorimeter,
                )
                .with_geom_id(block()),
            );
        }
        let mut h = hit(2.);
        h.geom_id = Some(block());
        g.calorimeter_hits.push(h);
        g
    }

    fn driver() -> TofDriver {
        let mut tofd = TofDriver::new();
        tofd.initialize(&Properties::new()).unwrap();
        tofd
    }

    #[test]
    fn velocity() {
        assert_eq!(beta(1., 0.), 1.);
        assert_relative_eq!(beta(1., ELECTRON_MASS), 0.94108, max_relative = 1e-4);
        assert!(beta(1e-3, ELECTRON_MASS) < 0.1);
    }

    #[test]
    fn config() {
        let tofd = driver();
        assert_relative_eq!(tofd.sigma_length(), 0.6);
        let mut tofd = TofDriver::new();
        tofd.initialize(&Properties::new().with("sigma_length", "100 ps"))
            .unwrap();
        assert_relative_eq!(tofd.sigma_length(), 0.1);
        let mut tofd = TofDriver::new();
        assert!(tofd
            .initialize(&Properties::new().with("sigma_length", -1.))
            .is_err());
        let mut tofd = TofDriver::new();
        assert!(matches!(
            tofd.initialize(&Properties::new().with("sigma_length", "0 ns")),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn undefined_times() {
        let tofd = driver();
        let e1 = electron(45. * CM, 1.6);
        let mut e2 = electron(-45. * CM, 1.6);
        e2.calorimeter_hits[0].time = f64::NAN;
        let tof = tofd.process(&e1, &e2).unwrap();
        assert!(tof.internal_probabilities.is_empty());
        assert!(tof.external_probabilities.is_empty());
    }

    #[test]
    fn two_electrons() {
        let tofd = driver();
        let e1 = electron(45. * CM, 1.6);
        let e2 = electron(-45. * CM, 1.4);
        let tof = tofd.process(&e1, &e2).unwrap();
        assert_eq!(tof.internal_probabilities.len(), 1);
        assert_eq!(tof.external_probabilities.len(), 1);
        let p_int = tof.internal_probabilities[0];
        let p_ext = tof.external_probabilities[0];
        assert!((0.7..0.8).contains(&p_int));
        assert!((0. ..1e-5).contains(&p_ext));
    }

    #[test]
    fn electron_gamma() {
        let tofd = driver();
        let e1 = electron(45. * CM, 1.6);
        let g = gamma(true);
        let tof = tofd.process(&e1, &g).unwrap();
        assert_eq!(tof.internal_probabilities.len(), 1);
        assert_eq!(tof.external_probabilities.len(), 1);
        for p in tof.internal_probabilities.iter().chain(&tof.external_probabilities) {
            assert!((0. ..=1.).contains(p));
        }
        assert!(tof.internal_probabilities[0] > tof.external_probabilities[0]);

        let swapped = tofd.process(&g, &e1).unwrap();
        assert_eq!(swapped, tof);
    }

    #[test]
    fn gamma_hit_positions() {
        let tofd = driver();
        let e1 = electron(45. * CM, 1.6);
        let g = gamma(false);
        let tof = tofd.process(&e1, &g).unwrap();
        assert!(!tof.has_internal_probabilities());

        let mut tofd = TofDriver::new();
        tofd.set_locator(Arc::new(BlockPositions(vec![BlockPosition {
            geom_id: block(),
            position: Point::new(45. * CM, 45. * CM, 0.),
        }])));
        tofd.initialize(&Properties::new()).unwrap();
        let from_locator = tofd.process(&e1, &g).unwrap();
        let from_vertex = driver().process(&e1, &gamma(true)).unwrap();
        assert_eq!(from_locator, from_vertex);
    }

    #[test]
    fn unsupported() {
        let tofd = driver();
        let g = gamma(true);
        assert!(matches!(
            tofd.process(&g, &g),
            Err(Error::UnsupportedPair(ParticleKind::Gamma, ParticleKind::Gamma))
        ));

        let mut e1 = electron(45. * CM, 1.6);
        let e2 = electron(-45. * CM, 1.4);
        e1.calorimeter_hits.clear();
        assert_eq!(tofd.process(&e1, &e2).unwrap(), TofMeasurement::default());

        let mut e1 = electron(45. * CM, 1.6);
        e1.trajectory = None;
        assert!(matches!(
            tofd.process(&e1, &e2),
            Err(Error::MissingTrackData(_))
        ));
    }
}
