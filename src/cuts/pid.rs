use log::debug;

use super::{Cut, CutData, CutType, Range, Verdict};
use crate::config::Properties;
use crate::error::Result;
use crate::event::PTD_LABEL;
use crate::particle::ParticleKind;

const KINDS: [ParticleKind; 5] = [
    ParticleKind::Electron,
    ParticleKind::Positron,
    ParticleKind::Gamma,
    ParticleKind::Alpha,
    ParticleKind::Undefined,
];

/// Selects events on the number of particles of each kind
///
/// The allowed counts are read from `<kind>_range.min` and
/// `<kind>_range.max`; a missing bound is zero.
#[derive(Clone, Debug)]
pub struct PidCut {
    initialized: bool,
    ptd_label: String,
    ranges: [Range<usize>; 5],
}

impl Default for PidCut {
    fn default() -> Self {
        Self {
            initialized: false,
            ptd_label: PTD_LABEL.to_owned(),
            ranges: [Range::new(Some(0), Some(0)); 5],
        }
    }
}

impl PidCut {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cut for PidCut {
    fn cut_type(&self) -> CutType {
        CutType::Pid
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, config: &Properties) -> Result<()> {
        self.ensure_uninitialized()?;
        if config.has_key("PTD_label") {
            self.ptd_label = config.fetch_string("PTD_label")?.to_owned();
        }
        for (range, kind) in self.ranges.iter_mut().zip(KINDS) {
            *range = Range::parse_count_or_zero(config, &format!("{kind}_range"))?;
        }
        self.initialized = true;
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn accept(&self, data: CutData<'_>) -> Result<Verdict> {
        self.ensure_initialized()?;
        let Some(ptd) = data.event()?.particle_tracks(&self.ptd_label) else {
            debug!("Event record has no '{}' bank", self.ptd_label);
            return Ok(Verdict::Inapplicable);
        };
        let checks = self.ranges.iter().zip(KINDS).map(|(range, kind)| {
            let n = ptd.tracks.iter().filter(|t| t.kind() == kind).count();
            let accepted = range.contains(n);
            if !accepted {
                debug!("Number of {kind} particles {n} out of range");
            }
            Some(accepted)
        });
        Ok(Verdict::from_checks(checks))
    }
}
