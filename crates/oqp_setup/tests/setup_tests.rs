// Copyright contributors to the openpulse-compiler project
// SPDX-License-Identifier: Apache-2.0

use oqp_setup::{Core, CoreKind, Setup, SetupConfig, SetupError};

const SETUP: &str = r#"{
    "Instruments": {
        "hdawg1": { "type": "HDAWG8", "serial": "DEV8835" },
        "shfqa1": { "type": "SHFQA2", "serial": "DEV12345" }
    },
    "Ports": {
        "ch1": { "instrument": "hdawg1", "core": { "type": "HD", "index": 1, "channels": [1] } },
        "ch2": { "instrument": "hdawg1", "core": { "type": "HD", "index": 2, "channels": [1] } },
        "ro":  { "instrument": "shfqa1", "core": { "type": "QA", "index": 1, "channels": [1] } }
    },
    "Frames": {
        "frame1": { "port": "ch1", "frequency": 5e9 },
        "readout": { "port": "ro" }
    }
}"#;

#[test]
fn ports_and_frames_resolve_to_cores() {
    let setup = SetupConfig::from_json(SETUP).unwrap();
    assert_eq!(setup.core("ch2"), Some(Core::new("hdawg1", 2, CoreKind::Output)));
    assert_eq!(setup.core("frame1"), Some(Core::new("hdawg1", 1, CoreKind::Output)));
    assert_eq!(setup.core("readout"), Some(Core::new("shfqa1", 1, CoreKind::Input)));
    assert_eq!(setup.core("nowhere"), None);
    assert_eq!(setup.frames["readout"].frequency, 0.0);
}

#[test]
fn cores_are_distinct_and_ordered() {
    let setup = SetupConfig::from_json(SETUP).unwrap();
    let cores: Vec<Core> = setup.cores().into_iter().collect();
    assert_eq!(
        cores,
        vec![
            Core::new("hdawg1", 1, CoreKind::Output),
            Core::new("hdawg1", 2, CoreKind::Output),
            Core::new("shfqa1", 1, CoreKind::Input),
        ]
    );
}

#[test]
fn serials() {
    let setup = SetupConfig::from_json(SETUP).unwrap();
    assert_eq!(setup.serial("shfqa1"), Some("DEV12345"));
    assert_eq!(setup.serial("pqsc"), None);
}

#[test]
fn json_round_trip_preserves_setup() {
    let setup = SetupConfig::from_json(SETUP).unwrap();
    let again = SetupConfig::from_json(&setup.to_json().unwrap()).unwrap();
    assert_eq!(setup, again);
}

#[test]
fn unknown_instrument() {
    let json = r#"{
        "Instruments": {},
        "Ports": { "ch1": { "instrument": "hdawg1", "core": { "type": "HD", "index": 1, "channels": [1] } } }
    }"#;
    assert!(matches!(
        SetupConfig::from_json(json),
        Err(SetupError::UnknownInstrument { .. })
    ));
}

#[test]
fn core_index_out_of_range() {
    let json = r#"{
        "Instruments": { "hdawg1": { "type": "HDAWG4", "serial": "DEV1" } },
        "Ports": { "ch1": { "instrument": "hdawg1", "core": { "type": "HD", "index": 3, "channels": [1] } } }
    }"#;
    assert!(matches!(
        SetupConfig::from_json(json),
        Err(SetupError::NoSuchCore { index: 3, .. })
    ));
}

#[test]
fn frame_on_unknown_port() {
    let json = r#"{
        "Instruments": {},
        "Ports": {},
        "Frames": { "f": { "port": "ch9" } }
    }"#;
    assert!(matches!(
        SetupConfig::from_json(json),
        Err(SetupError::UnknownPort { .. })
    ));
}

#[test]
fn malformed_json() {
    assert!(matches!(
        SetupConfig::from_json("{ \"Ports\": 3 }"),
        Err(SetupError::Json(_))
    ));
}
