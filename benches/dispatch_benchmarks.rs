//! Benchmarks for the call paths between managed code and the engine.
//!
//! - Method bind resolution, cached and uncached
//! - Typed pointer calls through class accessors
//! - Variant calls by name
//! - Virtual dispatch from the engine into a script class
//!
//! ```bash
//! cargo bench --bench dispatch_benchmarks
//! ```

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use enginebridge::classes::{Node, NodeVirtual, ObjectVirtual, RefCounted, node};
use enginebridge::{Base, Bridge, EngineClass, ScriptClass, ScriptObject, Variant};
use enginebridge_classdb::ClassDb;

fn setup() -> (Arc<ClassDb>, Arc<Bridge>) {
    let db = Arc::new(ClassDb::with_core_classes().expect("core classes"));
    db.set_record_calls(false);
    let bridge = Bridge::new(db.clone());
    (db, bridge)
}

#[derive(ScriptClass)]
#[script(base = Node, overrides(_process))]
struct Ticker {
    #[allow(dead_code)]
    base: Base<Node>,
    elapsed: f64,
}

impl ObjectVirtual for Ticker {}

impl NodeVirtual for Ticker {
    fn _process(&mut self, delta: f64) {
        self.elapsed += delta;
    }
}

// ============================================================================
// Bind resolution
// ============================================================================

fn bench_bind_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind_resolution");
    let (db, bridge) = setup();

    group.bench_function("cached", |b| {
        bridge.method_bind(&node::keys::ADD_CHILD);
        b.iter(|| black_box(bridge.method_bind(black_box(&node::keys::ADD_CHILD))));
    });

    group.bench_function("uncached", |b| {
        b.iter(|| {
            // A fresh bridge starts with empty caches.
            let bridge = Bridge::new(db.clone());
            black_box(bridge.method_bind(black_box(&node::keys::ADD_CHILD)))
        });
    });

    group.finish();
}

// ============================================================================
// Calls
// ============================================================================

fn bench_calls(c: &mut Criterion) {
    let mut group = c.benchmark_group("calls");
    let (_db, bridge) = setup();
    let parent = Node::new(&bridge);
    for _ in 0..8 {
        parent.add_child(&Node::new(&bridge), None, None);
    }
    let counted = RefCounted::new(&bridge);

    group.bench_function("ptrcall_accessor", |b| {
        b.iter(|| black_box(parent.get_child_count(None)));
    });

    group.bench_function("ptrcall_object_return", |b| {
        b.iter(|| black_box(parent.get_child(black_box(3), None)));
    });

    group.bench_function("varcall_by_name", |b| {
        let args = [Variant::Bool(false)];
        b.iter(|| black_box(parent.call("get_child_count", black_box(&args))));
    });

    group.bench_function("clone_counted", |b| {
        b.iter(|| black_box(counted.clone()));
    });

    group.finish();
}

// ============================================================================
// Virtual dispatch
// ============================================================================

fn bench_virtual_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("virtual_dispatch");
    let (db, bridge) = setup();
    let ticker = ScriptObject::new(&bridge, |base| Ticker { base, elapsed: 0.0 });
    let plain = Node::new(&bridge);
    let process = [Variant::Float(0.016)];

    group.bench_function("declared_override", |b| {
        b.iter(|| black_box(db.call_virtual(ticker.instance_id(), "_process", black_box(&process))));
    });

    group.bench_function("undeclared_override", |b| {
        b.iter(|| black_box(db.call_virtual(ticker.instance_id(), "_ready", &[])));
    });

    group.bench_function("no_script", |b| {
        b.iter(|| black_box(db.call_virtual(plain.instance_id(), "_process", black_box(&process))));
    });

    group.finish();
}

criterion_group!(benches, bench_bind_resolution, bench_calls, bench_virtual_dispatch);
criterion_main!(benches);
