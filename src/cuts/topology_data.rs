use log::{debug, warn};

use super::{require_mode, Cut, CutData, CutType, Verdict};
use crate::config::Properties;
use crate::error::Result;
use crate::event::TD_LABEL;

/// Selects events on their topology pattern
#[derive(Clone, Debug)]
pub struct TopologyDataCut {
    initialized: bool,
    td_label: String,
    has_pattern_id: bool,
    pattern_id: Option<String>,
}

impl Default for TopologyDataCut {
    fn default() -> Self {
        Self {
            initialized: false,
            td_label: TD_LABEL.to_owned(),
            has_pattern_id: false,
            pattern_id: None,
        }
    }
}

impl TopologyDataCut {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cut for TopologyDataCut {
    fn cut_type(&self) -> CutType {
        CutType::TopologyData
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, config: &Properties) -> Result<()> {
        self.ensure_uninitialized()?;
        if config.has_key("TD_label") {
            self.td_label = config.fetch_string("TD_label")?.to_owned();
        }
        self.has_pattern_id = config.has_flag("mode.has_pattern_id");
        let pattern_id = config.has_flag("mode.pattern_id");
        require_mode(&[self.has_pattern_id, pattern_id])?;
        if pattern_id {
            self.pattern_id = Some(config.fetch_string("pattern_id.label")?.to_owned());
        }
        self.initialized = true;
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn accept(&self, data: CutData<'_>) -> Result<Verdict> {
        self.ensure_initialized()?;
        let Some(td) = data.event()?.topology(&self.td_label) else {
            warn!("Event record has no '{}' bank", self.td_label);
            return Ok(Verdict::Inapplicable);
        };
        let mut checks = Vec::new();
        if self.has_pattern_id {
            checks.push(Some(td.has_pattern()));
        }
        if let Some(id) = &self.pattern_id {
            let check = td.pattern.as_ref().map(|p| p.pattern_id() == id);
            if check.is_none() {
                debug!("Event has no topology pattern");
            }
            checks.push(check);
        }
        Ok(Verdict::from_checks(checks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::event::EventRecord;
    use crate::pattern::{PatternKind, TopologyData, TopologyPattern};

    fn record(pattern: Option<PatternKind>) -> EventRecord {
        let mut record = EventRecord::new();
        record.insert(
            TD_LABEL,
            TopologyData {
                classification: String::new(),
                pattern: pattern.map(TopologyPattern::new),
            },
        );
        record
    }

    #[test]
    fn pattern_id() {
        let mut cut = TopologyDataCut::new();
        cut.initialize(
            &Properties::new()
                .with("mode.pattern_id", true)
                .with("pattern_id.label", "2e"),
        )
        .unwrap();
        let accept = |r: EventRecord| cut.accept(CutData::from(&r)).unwrap();
        assert_eq!(accept(record(Some(PatternKind::TwoElectrons))), Verdict::Accepted);
        assert_eq!(accept(record(Some(PatternKind::OneElectron))), Verdict::Rejected);
        assert_eq!(accept(record(None)), Verdict::Inapplicable);
        assert_eq!(accept(EventRecord::new()), Verdict::Inapplicable);
    }

    #[test]
    fn has_pattern() {
        let mut cut = TopologyDataCut::new();
        cut.initialize(&Properties::new().with("mode.has_pattern_id", true))
            .unwrap();
        let r = record(None);
        assert_eq!(cut.accept(CutData::from(&r)).unwrap(), Verdict::Rejected);

        let mut cut = TopologyDataCut::new();
        let config = Properties::new().with("mode.pattern_id", true);
        assert!(matches!(cut.initialize(&config), Err(Error::MissingProperty(_))));
    }
}
