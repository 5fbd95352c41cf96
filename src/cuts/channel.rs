use log::debug;

use super::{Cut, CutData, CutRegistry, CutType, SharedCut, Verdict};
use crate::config::Properties;
use crate::error::{Error, Result};
use crate::event::TD_LABEL;
use crate::measurement::MeasurementKey;

struct Selection {
    name: String,
    cut: SharedCut,
    key: MeasurementKey,
}

/// Applies registered measurement cuts to measurements of the topology
/// pattern
///
/// The event is accepted when every cut accepts its measurement.
pub struct ChannelCut {
    initialized: bool,
    registry: CutRegistry,
    td_label: String,
    selections: Vec<Selection>,
}

impl ChannelCut {
    pub fn new(registry: CutRegistry) -> Self {
        Self {
            initialized: false,
            registry,
            td_label: TD_LABEL.to_owned(),
            selections: Vec::new(),
        }
    }

    /// Names of the configured selections, in evaluation order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.selections.iter().map(|s| s.name.as_str())
    }
}

impl Cut for ChannelCut {
    fn cut_type(&self) -> CutType {
        CutType::Channel
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn initialize(&mut self, config: &Properties) -> Result<()> {
        self.ensure_uninitialized()?;
        if config.has_key("TD_label") {
            self.td_label = config.fetch_string("TD_label")?.to_owned();
        }
        let mut selections = Vec::new();
        for name in config.fetch_strings("cuts")? {
            let label = config.fetch_string(&format!("{name}.cut_label"))?;
            let cut = self
                .registry
                .get(label)
                .ok_or_else(|| Error::UnknownCut(label.to_owned()))?
                .clone();
            let key = config
                .fetch_string(&format!("{name}.measurement_label"))?
                .parse()?;
            selections.push(Selection {
                name: name.clone(),
                cut,
                key,
            });
        }
        self.selections = selections;
        self.initialized = true;
        Ok(())
    }

    fn reset(&mut self) {
        self.td_label = TD_LABEL.to_owned();
        self.selections.clear();
        self.initialized = false;
    }

    fn accept(&self, data: CutData<'_>) -> Result<Verdict> {
        self.ensure_initialized()?;
        let td = data.event()?.topology(&self.td_label);
        let Some(pattern) = td.and_then(|td| td.pattern.as_ref()) else {
            debug!("Event has no topology pattern in '{}'", self.td_label);
            return Ok(Verdict::Inapplicable);
        };
        let mut verdict = Verdict::Accepted;
        for selection in &self.selections {
            let Some(measurement) = pattern.measurement(&selection.key) else {
                debug!("Missing measurement '{}'", selection.key);
                return Ok(Verdict::Inapplicable);
            };
            match selection.cut.accept(CutData::from(measurement))? {
                Verdict::Accepted => {}
                Verdict::Rejected => {
                    debug!("Cut '{}' rejected '{}'", selection.name, selection.key);
                    verdict = Verdict::Rejected;
                }
                Verdict::Inapplicable => return Ok(Verdict::Inapplicable),
            }
        }
        Ok(verdict)
    }
}
