use super::{require_mode, Check, Cut, CutData, CutType, Quantity, Verdict};
use crate::config::Properties;
use crate::error::{Error, Result};

/// Selects angle measurements
#[derive(Clone, Debug, Default)]
pub struct AngleMeasurementCut {
    initialized: bool,
    angle: Check<f64>,
}

impl AngleMeasurementCut {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cut for AngleMeasurementCut {
    fn cut_type(&self) -> CutType {
        CutType::AngleMeasurement
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, config: &Properties) -> Result<()> {
        self.ensure_uninitialized()?;
        self.angle = Check::parse(config, "angle", Quantity::Angle)?;
        require_mode(&[self.angle.is_active()])?;
        self.initialized = true;
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn accept(&self, data: CutData<'_>) -> Result<Verdict> {
        self.ensure_initialized()?;
        let angle = data
            .measurement()?
            .as_angle()
            .ok_or(Error::InvalidCutData("an angle measurement"))?;
        let values = angle.angle.map(|a| [a]);
        let checks = self.angle.evaluate("angle", values.as_ref().map(|v| &v[..]));
        Ok(Verdict::from_checks(checks))
    }
}
