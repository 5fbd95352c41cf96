use log::debug;
use strum::IntoEnumIterator;

use super::{require_mode, Check, Cut, CutData, CutType, Quantity, Verdict};
use crate::config::Properties;
use crate::error::Result;
use crate::event::TD_LABEL;
use crate::pattern::{Observable, PatternKind};

/// Selects events of one topology pattern on its observables
///
/// Events with another pattern, or without topology data, are
/// inapplicable.
#[derive(Clone, Debug)]
pub struct ChannelPatternCut {
    kind: PatternKind,
    cut_type: CutType,
    initialized: bool,
    td_label: String,
    gamma: Check<usize>,
    checks: Vec<(Observable, Check<f64>)>,
}

impl ChannelPatternCut {
    /// Channel cut for `kind`, `None` if no channel selects that pattern
    pub fn new(kind: PatternKind) -> Option<Self> {
        let cut_type = CutType::iter().find(|t| t.channel_pattern() == Some(kind))?;
        Some(Self {
            kind,
            cut_type,
            initialized: false,
            td_label: TD_LABEL.to_owned(),
            gamma: Check::default(),
            checks: Vec::new(),
        })
    }

    pub fn pattern_kind(&self) -> PatternKind {
        self.kind
    }

    /// Observables this channel selects on
    pub fn observables(&self) -> &'static [Observable] {
        use Observable::*;
        match self.kind {
            PatternKind::ElectronPositron => &[
                InternalProbability,
                ExternalProbability,
                VerticesProbability,
                Angle,
            ],
            PatternKind::TwoPositrons => &[
                InternalProbability,
                ExternalProbability,
                VerticesProbability,
                Angle,
                MinimalEnergy,
                MaximalEnergy,
            ],
            PatternKind::TwoElectrons => &[
                InternalProbability,
                ExternalProbability,
                VerticesProbability,
                Angle,
                MinimalEnergy,
                MaximalEnergy,
                DeltaVerticesY,
                DeltaVerticesZ,
            ],
            PatternKind::ElectronGammas | PatternKind::TwoElectronsGammas => {
                &[InternalProbability, ExternalProbability]
            }
            PatternKind::OneElectron | PatternKind::ElectronAlpha => &[],
        }
    }

    fn gamma_checks(&self, n: usize) -> Vec<Option<bool>> {
        let mut checks = Vec::new();
        if self.gamma.has {
            checks.push(Some(n > 0));
        }
        if let Some(range) = &self.gamma.range {
            checks.push(Some(range.contains(n)));
        }
        checks
    }
}

fn quantity(observable: Observable) -> Quantity {
    use Observable::*;
    match observable {
        InternalProbability | ExternalProbability | VerticesProbability => Quantity::Probability,
        Angle => Quantity::Angle,
        MinimalEnergy | MaximalEnergy | EnergySum | EnergyDifference => Quantity::Energy,
        DeltaVerticesY | DeltaVerticesZ => Quantity::Offset,
        AlphaDelayedTime => Quantity::Time,
    }
}

impl Cut for ChannelPatternCut {
    fn cut_type(&self) -> CutType {
        self.cut_type
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, config: &Properties) -> Result<()> {
        self.ensure_uninitialized()?;
        if config.has_key("TD_label") {
            self.td_label = config.fetch_string("TD_label")?.to_owned();
        }
        if self.kind.has_gammas() {
            self.gamma = Check::parse_count(config, "gamma")?;
        }
        let mut checks = Vec::new();
        for &observable in self.observables() {
            let name = observable.to_string();
            let check = Check::parse(config, &name, quantity(observable))?;
            if check.is_active() {
                checks.push((observable, check));
            }
        }
        require_mode(&[self.gamma.is_active(), !checks.is_empty()])?;
        self.checks = checks;
        self.initialized = true;
        Ok(())
    }

    fn reset(&mut self) {
        self.td_label = TD_LABEL.to_owned();
        self.gamma = Check::default();
        self.checks.clear();
        self.initialized = false;
    }

    fn accept(&self, data: CutData<'_>) -> Result<Verdict> {
        self.ensure_initialized()?;
        let td = data.event()?.topology(&self.td_label);
        let Some(pattern) = td.and_then(|td| td.pattern.as_ref()) else {
            debug!("Event has no topology pattern in '{}'", self.td_label);
            return Ok(Verdict::Inapplicable);
        };
        if pattern.kind() != self.kind {
            debug!("Pattern '{}' is not '{}'", pattern.pattern_id(), self.kind);
            return Ok(Verdict::Inapplicable);
        }
        let mut checks = self.gamma_checks(pattern.number_of_gammas());
        for (observable, check) in &self.checks {
            let values = pattern.observable(*observable);
            checks.extend(check.evaluate(&observable.to_string(), values.as_deref()));
        }
        Ok(Verdict::from_checks(checks))
    }
}
