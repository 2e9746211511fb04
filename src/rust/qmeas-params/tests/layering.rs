// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

use indexmap::IndexMap;
use serde_json::{Value, json};
use tempfile::TempDir;

use qmeas_params::{
    BaseParameterStore, Error, LinkedParameterStore, ParameterStore, ParameterValue,
    PulseDescriptor, SampleIdentity,
};

#[test]
fn test_sample_base_linked_scenario() {
    let root = TempDir::new().unwrap();
    let lab = root.path().join("lab");
    let sample = SampleIdentity::new(&lab, "S1", "qubitA").unwrap();
    assert!(lab.join("S1").join("qubitA").join("parameters").is_dir());

    let base = BaseParameterStore::new(&sample, "base1", [("freq", 5.1e9)])
        .unwrap()
        .into_shared();
    let on_disk = ParameterStore::load_snapshot(base.borrow().file()).unwrap();
    let keys: Vec<_> = on_disk.keys().map(String::as_str).collect();
    assert_eq!(keys, ["timestamp", "sample", "structure", "freq"]);

    let mut sweep = LinkedParameterStore::new(&base, "sweep1", [("power", -10)]).unwrap();
    sweep.update("power", -5).unwrap();
    assert_eq!(sweep.get("power").unwrap().as_f64(), Some(-5.0));

    let err = sweep.update("freq", 5.2e9).unwrap_err();
    assert!(matches!(err, Error::BaseIsImmutable(k) if k == "freq"));
    assert_eq!(sweep.get("freq").unwrap().as_f64(), Some(5.1e9));

    let linked_file = sample
        .parameters_dir()
        .join("base1-LINKED-sweep1.txt");
    let on_disk = ParameterStore::load_snapshot(&linked_file).unwrap();
    assert_eq!(on_disk["power"], json!(-5));
    assert_eq!(on_disk, sweep.local().snapshot().unwrap());
}

#[test]
fn test_many_linked_stores_share_one_base() {
    let root = TempDir::new().unwrap();
    let sample = SampleIdentity::new(root.path(), "S1", "qubitA").unwrap();
    let base = BaseParameterStore::new(&sample, "base1", [("freq", 5.1e9)])
        .unwrap()
        .into_shared();
    let first = LinkedParameterStore::new(&base, "sweep1", [("power", -10)]).unwrap();
    let second = LinkedParameterStore::new(&base, "sweep2", [("power", -20)]).unwrap();

    base.borrow_mut().update("freq", 5.0e9).unwrap();
    assert_eq!(first.get("freq").unwrap().as_f64(), Some(5.0e9));
    assert_eq!(second.get("freq").unwrap().as_f64(), Some(5.0e9));
    assert_eq!(first.get("power").unwrap().as_f64(), Some(-10.0));
    assert_eq!(second.get("power").unwrap().as_f64(), Some(-20.0));
    assert_ne!(first.file(), second.file());
}

#[test]
fn test_key_added_to_base_becomes_immutable_in_linked() {
    let root = TempDir::new().unwrap();
    let sample = SampleIdentity::new(root.path(), "S1", "qubitA").unwrap();
    let base = BaseParameterStore::new(&sample, "base1", [("freq", 5.1e9)])
        .unwrap()
        .into_shared();
    let mut linked = LinkedParameterStore::new(&base, "sweep1", [("phase", 0.1)]).unwrap();

    // Both own the key now; the base wins for writes and the linked store for reads.
    base.borrow_mut().add("phase", 0.2).unwrap();
    assert_eq!(linked.get("phase").unwrap().as_f64(), Some(0.1));
    assert!(matches!(
        linked.update("phase", 0.3),
        Err(Error::BaseIsImmutable(_))
    ));
}

#[test]
fn test_scalar_round_trip() {
    let root = TempDir::new().unwrap();
    let sample = SampleIdentity::new(root.path(), "S1", "qubitA").unwrap();
    let parameters: Vec<(&str, ParameterValue)> = vec![
        ("freq", 5.1e9.into()),
        ("averages", 1024.into()),
        ("enabled", true.into()),
        ("label", "readout".into()),
        ("nothing", ParameterValue::null()),
    ];
    let base = BaseParameterStore::new(&sample, "round trip", parameters).unwrap();

    let on_disk = ParameterStore::load_snapshot(base.file()).unwrap();
    assert_eq!(on_disk, base.store().snapshot().unwrap());
    let reopened = BaseParameterStore::open(&sample, "round trip").unwrap();
    for (key, value) in base.store().iter() {
        assert_eq!(reopened.get(key).unwrap(), value, "{key}");
    }
}

#[test]
fn test_structured_values_are_flattened() {
    let root = TempDir::new().unwrap();
    let sample = SampleIdentity::new(root.path(), "S1", "qubitA").unwrap();
    let mut base = BaseParameterStore::new(&sample, "pulses", Vec::<(String, f64)>::new()).unwrap();

    let pulse = PulseDescriptor {
        uid: "x90".to_string(),
        function: "drag".to_string(),
        length: 40e-9,
        amplitude: 0.8,
        can_compress: true,
        pulse_parameters: Some(IndexMap::from([
            ("sigma".to_string(), json!(0.3)),
            ("beta".to_string(), json!(0.1)),
        ])),
    };
    base.add("x90", pulse).unwrap();
    base.add("reference", sample.clone()).unwrap();

    let on_disk = ParameterStore::load_snapshot(base.file()).unwrap();
    assert_eq!(on_disk["x90"]["function"], json!("drag"));
    assert_eq!(on_disk["x90"]["can_compress"], json!(true));
    assert_eq!(on_disk["x90"]["pulse_parameters"]["beta"], json!(0.1));
    assert_eq!(
        on_disk["reference"],
        json!({
            "directory": root.path().to_string_lossy(),
            "sample": "S1",
            "structure": "qubitA",
        })
    );
    assert!(matches!(base.get("x90").unwrap(), ParameterValue::Pulse(_)));
}

#[test]
fn test_unserializable_value_in_linked_store() {
    struct InstrumentHandle;

    let root = TempDir::new().unwrap();
    let sample = SampleIdentity::new(root.path(), "S1", "qubitA").unwrap();
    let base = BaseParameterStore::new(&sample, "base1", [("freq", 5.1e9)])
        .unwrap()
        .into_shared();
    let mut linked = LinkedParameterStore::new(&base, "sweep1", [("power", -10)]).unwrap();
    linked
        .add("handle", ParameterValue::opaque(InstrumentHandle))
        .unwrap();
    linked.update("power", -5).unwrap();

    // The file still holds the last state that could be serialized.
    let on_disk = ParameterStore::load_snapshot(linked.file()).unwrap();
    assert_eq!(on_disk["power"], json!(-10));
    assert!(!on_disk.contains_key("handle"));
    assert_eq!(linked.get("power").unwrap().as_f64(), Some(-5.0));
    assert!(matches!(
        linked.try_save(),
        Err(Error::NoSerializerDefined(_))
    ));
    assert!(matches!(
        linked.get("handle").unwrap(),
        ParameterValue::Opaque(opaque) if opaque.downcast_ref::<InstrumentHandle>().is_some()
    ));
    assert_eq!(on_disk.get("base"), Some(&Value::from("base1")));
}
