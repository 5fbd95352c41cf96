use std::sync::Arc;

use log::{debug, info};

use super::{create_cut, CutData, CutRegistry, CutType, SharedCut, Verdict};
use crate::config::Properties;
use crate::error::{Error, Result};
use crate::event::EventRecord;

/// Named cuts built from configuration
///
/// The `cuts` property lists the cut names in definition order. Each
/// cut is created from its `<name>.type` property and initialized with
/// the remaining `<name>.*` properties. A cut can refer to the cuts
/// defined before it.
#[derive(Clone, Default)]
pub struct CutCatalog {
    names: Vec<String>,
    cuts: CutRegistry,
}

impl CutCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Properties) -> Result<Self> {
        let mut catalog = Self::new();
        if !config.has_key("cuts") {
            debug!("No cuts configured");
            return Ok(catalog);
        }
        for name in config.fetch_strings("cuts")? {
            let cut_config = config.sub(name);
            let cut_type = cut_config.fetch_string("type").map_err(|_| {
                Error::MissingProperty(format!("{name}.type"))
            })?;
            let cut_type: CutType = cut_type
                .parse()
                .map_err(|_| Error::UnknownCutType(cut_type.to_owned()))?;
            let mut cut = create_cut(cut_type, &catalog.cuts)?;
            cut.initialize(&cut_config)?;
            info!("Registered cut '{name}' of type '{cut_type}'");
            catalog.register(name, Arc::from(cut));
        }
        Ok(catalog)
    }

    /// Add a cut, replacing any cut of the same name
    pub fn register(&mut self, name: &str, cut: SharedCut) {
        if self.cuts.insert(name.to_owned(), cut).is_some() {
            debug!("Replaced cut '{name}'");
            self.names.retain(|n| n != name);
        }
        self.names.push(name.to_owned());
    }

    pub fn get(&self, name: &str) -> Option<&SharedCut> {
        self.cuts.get(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Cut names in definition order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(|n| n.as_str())
    }

    /// Verdicts of all event cuts, in definition order
    pub fn accept_event(&self, record: &EventRecord) -> Result<Vec<(String, Verdict)>> {
        let mut verdicts = Vec::new();
        for name in &self.names {
            let Some(cut) = self.cuts.get(name) else {
                continue;
            };
            if !cut.cut_type().is_event_cut() {
                continue;
            }
            let verdict = cut.accept(CutData::from(record))?;
            debug!("Cut '{name}': {verdict}");
            verdicts.push((name.clone(), verdict));
        }
        Ok(verdicts)
    }
}
