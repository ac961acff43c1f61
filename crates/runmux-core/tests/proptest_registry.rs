//! Property-based tests for the registry module.
//!
//! Verifies the bounded multi-run tracker invariants:
//! - Capacity bound: tracked runs never exceed capacity
//! - FIFO eviction: oldest registered run evicted first
//! - Per-run ordering: contents are the concatenation of appends in order
//! - Unknown ids: appends/relabels no-op, selection yields empty contents
//! - Label directory: oldest-first, one entry per tracked run
//! - Selection: mirrors the model through arbitrary operation interleavings

use proptest::prelude::*;
use std::collections::{HashMap, VecDeque};

use runmux_core::registry::RunRegistry;
use runmux_core::run_id::RunId;

// ────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Begin(usize),
    Append(usize, String),
    Select(usize),
    Relabel(usize, String),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..10).prop_map(Op::Begin),
        ((0usize..10), "[a-z\\n]{0,6}").prop_map(|(i, s)| Op::Append(i, s)),
        (0usize..10).prop_map(Op::Select),
        ((0usize..10), "[A-Z]{1,4}").prop_map(|(i, s)| Op::Relabel(i, s)),
    ]
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(arb_op(), 1..200)
}

fn run_id(index: usize) -> RunId {
    RunId::from(format!("r{index}"))
}

// ────────────────────────────────────────────────────────────────────
// Reference model: VecDeque order + HashMap state
// ────────────────────────────────────────────────────────────────────

/// A reference model for the registry using plain collections.
struct RefModel {
    capacity: usize,
    order: VecDeque<String>,
    /// id → (label, contents)
    runs: HashMap<String, (String, String)>,
    current: Option<String>,
}

impl RefModel {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            runs: HashMap::new(),
            current: None,
        }
    }

    fn begin(&mut self, id: &str, label: &str) {
        if self.runs.contains_key(id) {
            self.runs
                .insert(id.to_string(), (label.to_string(), String::new()));
            return;
        }
        self.order.push_back(id.to_string());
        self.runs
            .insert(id.to_string(), (label.to_string(), String::new()));
        while self.order.len() > self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.runs.remove(&evicted);
            }
        }
    }

    fn append(&mut self, id: &str, chunk: &str) {
        if let Some((_, contents)) = self.runs.get_mut(id) {
            contents.push_str(chunk);
        }
    }

    fn select(&mut self, id: &str) {
        self.current = Some(id.to_string());
    }

    fn relabel(&mut self, id: &str, label: &str) {
        if let Some((l, _)) = self.runs.get_mut(id) {
            *l = label.to_string();
        }
    }
}

fn assert_matches_model(registry: &RunRegistry, model: &RefModel) {
    assert!(registry.len() <= registry.capacity());
    assert_eq!(registry.len(), model.order.len());

    let labels = registry.labels();
    let ids: Vec<&str> = labels.iter().map(|e| e.run_id.as_str()).collect();
    let model_ids: Vec<&str> = model.order.iter().map(String::as_str).collect();
    assert_eq!(ids, model_ids, "history order diverged");

    for entry in &labels {
        let (label, contents) = &model.runs[entry.run_id.as_str()];
        assert_eq!(&entry.label, label, "label diverged for {}", entry.run_id);
        assert_eq!(
            registry.contents(&entry.run_id).as_deref(),
            Some(contents.as_str()),
            "contents diverged for {}",
            entry.run_id
        );
    }

    assert_eq!(
        registry.current_run().map(|id| id.as_str().to_string()),
        model.current
    );
}

// ────────────────────────────────────────────────────────────────────
// Reference model checking
// ────────────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn registry_matches_reference_model(capacity in 1usize..8, ops in arb_ops()) {
        let mut registry = RunRegistry::with_capacity(capacity);
        let mut model = RefModel::new(capacity);

        for op in ops {
            match op {
                Op::Begin(i) => {
                    let label = format!("Run: {i}");
                    registry.begin_run(run_id(i), label.clone());
                    model.begin(&format!("r{i}"), &label);
                }
                Op::Append(i, chunk) => {
                    registry.append_to_run(&run_id(i), &chunk);
                    model.append(&format!("r{i}"), &chunk);
                }
                Op::Select(i) => {
                    registry.set_current_run(&run_id(i));
                    model.select(&format!("r{i}"));
                }
                Op::Relabel(i, label) => {
                    registry.set_label(&run_id(i), label.clone());
                    model.relabel(&format!("r{i}"), &label);
                }
            }
            assert_matches_model(&registry, &model);
        }
    }

    #[test]
    fn appends_to_unknown_ids_never_panic(ops in arb_ops()) {
        // no Begin at all: every append/select/relabel hits an unknown id
        let mut registry = RunRegistry::with_capacity(3);
        for op in ops {
            match op {
                Op::Begin(_) => {}
                Op::Append(i, chunk) => registry.append_to_run(&run_id(i), &chunk),
                Op::Select(i) => registry.set_current_run(&run_id(i)),
                Op::Relabel(i, label) => registry.set_label(&run_id(i), label),
            }
        }
        assert!(registry.is_empty());
        assert_eq!(registry.stats().total_chunks, 0);
    }

    #[test]
    fn contents_concatenate_in_append_order(chunks in prop::collection::vec("[a-z]{1,5}", 1..40)) {
        let mut registry = RunRegistry::with_capacity(4);
        registry.begin_run(run_id(0), "Run: 0");
        // interleave unrelated appends
        registry.begin_run(run_id(1), "Run: 1");

        let mut expected = String::new();
        for (n, chunk) in chunks.iter().enumerate() {
            registry.append_to_run(&run_id(0), chunk);
            registry.append_to_run(&run_id(1), &format!("x{n}"));
            expected.push_str(chunk);
        }
        prop_assert_eq!(registry.contents(&run_id(0)).unwrap(), expected);
    }
}
