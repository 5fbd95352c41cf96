//! Build the topology pattern of a single event and apply cuts.
//!
//!     snemo-topology EVENT.json --config CONFIG.json
//!
//! The event file holds the particle tracks and, optionally, the
//! positions of the calorimeter blocks hit by gammas:
//!
//!     { "tracks": [...], "calorimeter_blocks": [...] }
//!
//! The topology data and the verdicts of all event cuts are printed as
//! JSON.
mod opt;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use snemo_topology::event::{PTD_LABEL, TD_LABEL};
use snemo_topology::geometry::BlockPositions;
use snemo_topology::particle::ParticleTrack;
use snemo_topology::{Config, CutCatalog, EventRecord, ParticleTrackData, TopologyDriver};

use crate::opt::Opt;

#[derive(Debug, Default, Deserialize)]
struct EventFile {
    #[serde(default)]
    tracks: Vec<ParticleTrack>,
    #[serde(default)]
    calorimeter_blocks: BlockPositions,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {path:?}"))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {path:?}"))
}

fn main() -> Result<()> {
    let opt = Opt::parse();

    let env = Env::default().filter_or("SNEMO_TOPOLOGY_LOG", opt.verbosity.as_str());
    env_logger::init_from_env(env);

    debug!("Reading configuration from {:?}", opt.config);
    let config: Config = read_json(&opt.config)?;
    debug!("Reading event from {:?}", opt.event);
    let event: EventFile = read_json(&opt.event)?;

    let mut driver = TopologyDriver::new();
    driver.set_locator(Arc::new(event.calorimeter_blocks));
    driver
        .initialize(&config.topology)
        .context("Failed to initialize topology driver")?;
    let catalog = CutCatalog::from_config(&config.cuts).context("Failed to set up cuts")?;
    info!("{} cuts configured", catalog.len());

    let ptd_label = config.topology.fetch_string("PTD_label").unwrap_or(PTD_LABEL);
    let td_label = config.topology.fetch_string("TD_label").unwrap_or(TD_LABEL);
    let mut record = EventRecord::new();
    record.insert(ptd_label, ParticleTrackData::new(event.tracks));
    driver.process(&mut record)?;
    let verdicts = catalog.accept_event(&record)?;

    let output = json!({
        "topology": record.topology(td_label),
        "cuts": verdicts
            .into_iter()
            .map(|(name, verdict)| json!({ "name": name, "verdict": verdict }))
            .collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
