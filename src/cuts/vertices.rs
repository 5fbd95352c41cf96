use super::{require_mode, Check, Cut, CutData, CutType, Quantity, Verdict};
use crate::config::Properties;
use crate::error::{Error, Result};

const AXES: [&str; 3] = ["x", "y", "z"];

/// Selects common vertex measurements
///
/// Distance ranges apply to the separation of the two vertices along
/// each axis.
#[derive(Clone, Debug, Default)]
pub struct VerticesMeasurementCut {
    initialized: bool,
    probability: Check<f64>,
    distance: Check<f64>,
    axis_distances: [Check<f64>; 3],
}

impl VerticesMeasurementCut {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cut for VerticesMeasurementCut {
    fn cut_type(&self) -> CutType {
        CutType::VerticesMeasurement
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, config: &Properties) -> Result<()> {
        self.ensure_uninitialized()?;
        self.probability = Check::parse(config, "vertices_probability", Quantity::Probability)?;
        self.distance = Check::parse(config, "vertices_distance", Quantity::Distance)?;
        for (check, axis) in self.axis_distances.iter_mut().zip(AXES) {
            *check = Check::parse(config, &format!("vertices_distance_{axis}"), Quantity::Distance)?;
        }
        let mut active = vec![self.probability.is_active(), self.distance.is_active()];
        active.extend(self.axis_distances.iter().map(|c| c.is_active()));
        require_mode(&active)?;
        self.initialized = true;
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn accept(&self, data: CutData<'_>) -> Result<Verdict> {
        self.ensure_initialized()?;
        let vertex = data
            .measurement()?
            .as_vertex()
            .ok_or(Error::InvalidCutData("a vertex measurement"))?;
        let probability = vertex.probability.map(|p| [p]);
        let mut checks = self
            .probability
            .evaluate("vertices probability", probability.as_ref().map(|p| &p[..]));
        let distance = vertex.distance;
        let all = distance.map(|d| [d.x, d.y, d.z]);
        checks.extend(self.distance.evaluate("vertices distance", all.as_ref().map(|d| &d[..])));
        for (n, (check, axis)) in self.axis_distances.iter().zip(AXES).enumerate() {
            let value = distance.map(|d| [d[n]]);
            checks.extend(check.evaluate(
                &format!("vertices distance in {axis}"),
                value.as_ref().map(|v| &v[..]),
            ));
        }
        Ok(Verdict::from_checks(checks))
    }
}
