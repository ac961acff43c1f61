#![no_main]

use libfuzzer_sys::fuzz_target;
use runmux_core::observer::RunNotification;
use runmux_core::registry::RunRegistry;
use runmux_core::run_id::RunId;
use std::sync::{Arc, Mutex};

fn run_id(raw: u8) -> RunId {
    RunId::from(format!("r{}", raw % 24))
}

fuzz_target!(|data: &[u8]| {
    if data.len() > 65_536 {
        return;
    }

    let capacity = data.first().map_or(1, |b| usize::from(b % 8) + 1);
    let mut registry = RunRegistry::with_capacity(capacity);

    // the observer must survive any notification sequence
    let seen: Arc<Mutex<Vec<RunNotification>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    registry.attach_observer(Some(Box::new(move |n: RunNotification| {
        sink.lock().unwrap().push(n);
    })));

    for chunk in data[1..].chunks(4) {
        let [op_tag, id_raw, a, b] = match chunk {
            [w, x, y, z] => [*w, *x, *y, *z],
            _ => break,
        };
        let id = run_id(id_raw);
        match op_tag % 5 {
            0 => registry.begin_run(id, format!("Run: {id_raw}")),
            1 => {
                let fragment = String::from_utf8_lossy(&[a, b]).into_owned();
                registry.append_to_run(&id, &fragment);
            }
            2 => registry.set_current_run(&id),
            3 => registry.set_label(&id, format!("L{a}")),
            _ => {
                // detach and re-attach: replay must never panic
                registry.attach_observer(None);
                let sink = seen.clone();
                registry.attach_observer(Some(Box::new(move |n: RunNotification| {
                    sink.lock().unwrap().push(n);
                })));
            }
        }

        // invariants hold after every operation
        assert!(registry.len() <= registry.capacity());
        let labels = registry.labels();
        assert_eq!(labels.len(), registry.len());
        for entry in &labels {
            assert!(registry.contents(&entry.run_id).is_some());
        }
    }

    let stats = registry.stats();
    assert!(stats.tracked as u64 <= stats.total_runs);
});
