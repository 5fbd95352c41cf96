use super::{require_mode, Check, Cut, CutData, CutType, Quantity, Verdict};
use crate::config::Properties;
use crate::error::{Error, Result};

/// Selects energy measurements
#[derive(Clone, Debug, Default)]
pub struct EnergyMeasurementCut {
    initialized: bool,
    energy: Check<f64>,
}

impl EnergyMeasurementCut {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cut for EnergyMeasurementCut {
    fn cut_type(&self) -> CutType {
        CutType::EnergyMeasurement
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, config: &Properties) -> Result<()> {
        self.ensure_uninitialized()?;
        self.energy = Check::parse(config, "energy", Quantity::Energy)?;
        require_mode(&[self.energy.is_active()])?;
        self.initialized = true;
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn accept(&self, data: CutData<'_>) -> Result<Verdict> {
        self.ensure_initialized()?;
        let energy = data
            .measurement()?
            .as_energy()
            .ok_or(Error::InvalidCutData("an energy measurement"))?;
        let values = energy.energy.map(|e| [e]);
        let checks = self.energy.evaluate("energy", values.as_ref().map(|v| &v[..]));
        Ok(Verdict::from_checks(checks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{EnergyMeasurement, Measurement};

    #[test]
    fn energy_range() {
        let mut cut = EnergyMeasurementCut::new();
        cut.initialize(
            &Properties::new()
                .with("mode.range_energy", true)
                .with("range_energy.min", 500.)
                .with("range_energy.max", "3 MeV"),
        )
        .unwrap();
        let verdict = |energy: Option<f64>| {
            let m = Measurement::from(EnergyMeasurement { energy });
            cut.accept(CutData::from(&m)).unwrap()
        };
        assert_eq!(verdict(Some(1.)), Verdict::Accepted);
        assert_eq!(verdict(Some(0.5)), Verdict::Accepted);
        assert_eq!(verdict(Some(0.4)), Verdict::Rejected);
        assert_eq!(verdict(Some(3.2)), Verdict::Rejected);
        assert_eq!(verdict(None), Verdict::Inapplicable);
    }

    #[test]
    fn negative_energy() {
        let mut cut = EnergyMeasurementCut::new();
        let config = Properties::new()
            .with("mode.range_energy", true)
            .with("range_energy.min", -1.);
        assert!(matches!(cut.initialize(&config), Err(Error::OutOfRange { .. })));
        assert!(!cut.is_initialized());
    }
}
