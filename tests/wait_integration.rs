// End-to-end wait flows over the in-memory backend with concurrent writers.
use std::fs;
use std::thread;
use std::time::Duration;

use waitforservice::api::{
    DEFAULT_TARGET, ErrorKind, Matcher, MemoryBackend, PropertyBackend, ReadinessGate,
    wait_for_match,
};

#[test]
fn waits_for_readiness_then_for_value() {
    let temp = tempfile::tempdir().expect("tempdir");
    let marker = temp.path().join("property_service");
    let gate = ReadinessGate::new(&marker).with_interval(Duration::from_millis(5));
    let backend = MemoryBackend::with_properties([("x.y", "stopped")]);

    let writer = {
        let backend = backend.clone();
        let marker = marker.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            fs::write(&marker, b"").expect("marker");
            thread::sleep(Duration::from_millis(30));
            backend.set("unrelated", "running");
            thread::sleep(Duration::from_millis(30));
            backend.set("x.y", "running");
        })
    };

    let matcher = Matcher::new(["x.y"], DEFAULT_TARGET).expect("matcher");
    let found = wait_for_match(&gate, || Ok(backend.clone()), matcher).expect("wait");
    writer.join().expect("join");

    assert_eq!(found.key, "x.y");
    assert_eq!(found.value, "running");
    assert_eq!(found.serial, backend.serial());
    assert!(backend.wait_calls() >= 2);
}

#[test]
fn any_of_several_patterns_releases_the_wait() {
    let temp = tempfile::tempdir().expect("tempdir");
    let marker = temp.path().join("property_service");
    fs::write(&marker, b"").expect("marker");
    let gate = ReadinessGate::new(&marker);
    let backend = MemoryBackend::with_properties([
        ("init.svc.vendor.hwcomposer-2-1", "stopped"),
        ("init.svc.vendor.hwcomposer-2-2", "stopped"),
    ]);

    let writer = {
        let backend = backend.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            backend.set("init.svc.vendor.hwcomposer-2-3", "running");
        })
    };

    let matcher = Matcher::new(
        [
            "init.svc.vendor.hwcomposer-2-1",
            "init.svc.vendor.hwcomposer-2-2",
            "init.svc.vendor.hwcomposer-2-*",
        ],
        DEFAULT_TARGET,
    )
    .expect("matcher");
    let found = wait_for_match(&gate, || Ok(backend.clone()), matcher).expect("wait");
    writer.join().expect("join");

    assert_eq!(found.key, "init.svc.vendor.hwcomposer-2-3");
    assert_eq!(found.pattern, "init.svc.vendor.hwcomposer-2-*");
}

#[test]
fn borrowed_backend_stays_usable_after_wait() {
    let temp = tempfile::tempdir().expect("tempdir");
    let marker = temp.path().join("property_service");
    fs::write(&marker, b"").expect("marker");
    let gate = ReadinessGate::new(&marker);
    let backend = MemoryBackend::with_properties([("sys.boot_completed", "1")]);

    let matcher = Matcher::new(["sys.boot_completed"], "1").expect("matcher");
    let found = wait_for_match(&gate, || Ok(&backend), matcher).expect("wait");
    assert_eq!(found.value, "1");

    let snapshot = backend.snapshot().expect("snapshot");
    assert_eq!(snapshot.len(), 1);
}

#[test]
fn empty_pattern_set_is_rejected_before_waiting() {
    let err = Matcher::new(Vec::<&str>::new(), DEFAULT_TARGET).expect_err("empty");
    assert_eq!(err.kind(), ErrorKind::Usage);
}
