use approx::assert_relative_eq;
use snemo_topology::geometry::{BlurSpot, LineSegment, Point};
use snemo_topology::measurement::{MeasurementKey, MeasurementKind};
use snemo_topology::particle::{CalorimeterHit, ParticleKind, ParticleTrack, TrackLabel, Vertex, VertexRegion};
use snemo_topology::{Config, CutCatalog, EventRecord, ParticleTrackData, PatternKind, Properties, TopologyDriver, Verdict};

fn track(kind: ParticleKind, y: f64, length: f64, time: f64) -> ParticleTrack {
    let mut t = ParticleTrack::new(kind);
    let start = Point::new(0., y, 0.);
    t.vertices
        .push(Vertex::new(BlurSpot::at(start), VertexRegion::SourceFoil));
    t.trajectory = Some(LineSegment::new(start, Point::new(length, y, 0.)).into());
    t.calorimeter_hits.push(CalorimeterHit {
        energy: 1.,
        sigma_energy: 0.05,
        time,
        sigma_time: 0.05,
        geom_id: None,
    });
    t
}

fn driver(config: Properties) -> TopologyDriver {
    let mut driver = TopologyDriver::new();
    driver.initialize(&config).unwrap();
    driver
}

#[test]
fn tof_two_electrons() {
    let driver = driver(Properties::new().with("drivers", vec!["TOFD", "ED"]));
    let tracks = [
        track(ParticleKind::Electron, 0., 0., 1.6),
        track(ParticleKind::Electron, 5., 0., 1.4),
    ];
    let td = driver.build(&tracks).unwrap();
    assert_eq!(td.classification, "2e");
    let pattern = td.pattern.unwrap();
    assert_eq!(pattern.kind(), PatternKind::TwoElectrons);

    let key = MeasurementKey::pair(MeasurementKind::Tof, TrackLabel::electron(1), TrackLabel::electron(2));
    let tof = pattern.measurement(&key).unwrap().as_tof().unwrap();
    assert_eq!(tof.internal_probabilities.len(), 1);
    assert_eq!(tof.external_probabilities.len(), 1);
    for p in tof.internal_probabilities.iter().chain(&tof.external_probabilities) {
        assert!(p.is_finite());
        assert!((0. ..=1.).contains(p));
    }
    // both hypotheses coincide for tracks of zero length
    assert_relative_eq!(tof.internal_probabilities[0], tof.external_probabilities[0]);

    assert!(!pattern.has_measurement(&MeasurementKey::pair(
        MeasurementKind::Vertex,
        TrackLabel::electron(1),
        TrackLabel::electron(2)
    )));
}

#[test]
fn electron_positron_keeps_electron_measurements() {
    let driver = driver(Properties::new().with("drivers", vec!["AD", "ED", "TOFD", "VD", "DVD"]));
    let e1 = track(ParticleKind::Electron, 0., 435., 1.6);
    let p1 = track(ParticleKind::Positron, 10., 435., 1.5);

    let one_e = driver.build(&[e1.clone()]).unwrap().pattern.unwrap();
    let e1p1 = driver.build(&[p1, e1]).unwrap().pattern.unwrap();
    assert_eq!(e1p1.pattern_id(), "1e1p");
    for (key, measurement) in one_e.measurements() {
        assert_eq!(e1p1.measurement(key), Some(measurement));
    }
    assert_eq!(e1p1.measurements().len(), 8);
}

#[test]
fn unknown_classification() {
    let driver = driver(Properties::new().with("drivers", vec!["ED"]));
    let tracks = [
        track(ParticleKind::Electron, 0., 435., 1.6),
        track(ParticleKind::Positron, 0., 435., 1.6),
        track(ParticleKind::Alpha, 0., 35., 1.6),
    ];
    let td = driver.build(&tracks).unwrap();
    assert_eq!(td.classification, "1e1p1a");
    assert!(!td.has_pattern());
}

#[test]
fn pipeline() {
    let config: Config = serde_json::from_str(
        r#"{
            "topology": {
                "drivers": ["AD", "ED", "TOFD", "VD", "DVD"],
                "TOFD.sigma_length": "0.5 ns"
            },
            "cuts": {
                "cuts": ["is_2e", "close", "low_angle", "selection"],
                "is_2e.type": "topology_data",
                "is_2e.mode.pattern_id": true,
                "is_2e.pattern_id.label": "2e",
                "close.type": "channel_2e",
                "close.mode.range_delta_vertices_y": true,
                "close.range_delta_vertices_y.min": "-5 cm",
                "close.range_delta_vertices_y.max": 50,
                "low_angle.type": "angle_measurement",
                "low_angle.mode.range_angle": true,
                "low_angle.range_angle.max": 10,
                "selection.type": "channel",
                "selection.cuts": ["e1"],
                "selection.e1.cut_label": "low_angle",
                "selection.e1.measurement_label": "angle_e1"
            }
        }"#,
    )
    .unwrap();
    let driver = driver(config.topology.clone());
    let catalog = CutCatalog::from_config(&config.cuts).unwrap();

    let mut record = EventRecord::new();
    let tracks = vec![
        track(ParticleKind::Electron, 0., 435., 1.6),
        track(ParticleKind::Electron, 10., 435., 1.6),
    ];
    record.insert("PTD", ParticleTrackData::new(tracks));
    driver.process(&mut record).unwrap();

    let verdicts = catalog.accept_event(&record).unwrap();
    let names: Vec<_> = verdicts.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["is_2e", "close", "selection"]);
    assert_eq!(verdicts[0].1, Verdict::Accepted);
    assert_eq!(verdicts[1].1, Verdict::Accepted);
    assert_eq!(verdicts[2].1, Verdict::Accepted);
}
