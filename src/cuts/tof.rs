use super::{require_mode, Check, Cut, CutData, CutType, Quantity, Verdict};
use crate::config::Properties;
use crate::error::{Error, Result};

/// Selects time-of-flight measurements on their probabilities
///
/// Probability ranges need a `range_X.mode` of `strict` or `all`.
#[derive(Clone, Debug, Default)]
pub struct TofMeasurementCut {
    initialized: bool,
    internal: Check<f64>,
    external: Check<f64>,
}

impl TofMeasurementCut {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cut for TofMeasurementCut {
    fn cut_type(&self) -> CutType {
        CutType::TofMeasurement
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, config: &Properties) -> Result<()> {
        self.ensure_uninitialized()?;
        self.internal =
            Check::parse_with_policy(config, "internal_probability", Quantity::Probability)?;
        self.external =
            Check::parse_with_policy(config, "external_probability", Quantity::Probability)?;
        require_mode(&[self.internal.is_active(), self.external.is_active()])?;
        self.initialized = true;
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn accept(&self, data: CutData<'_>) -> Result<Verdict> {
        self.ensure_initialized()?;
        let tof = data
            .measurement()?
            .as_tof()
            .ok_or(Error::InvalidCutData("a time-of-flight measurement"))?;
        let mut checks = self
            .internal
            .evaluate("internal probability", Some(tof.internal_probabilities.as_slice()));
        checks.extend(
            self.external
                .evaluate("external probability", Some(tof.external_probabilities.as_slice())),
        );
        Ok(Verdict::from_checks(checks))
    }
}
