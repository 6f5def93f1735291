//! Benchmarks for mapper lookup and application.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use flowmap::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn fetch_task() -> Task {
    let activity = ActivityMetadata::new("http")
        .with_output("status", DataType::Integer)
        .with_output("body", DataType::Object);
    Task::new("orders", "fetch")
        .with_activity(Arc::new(activity))
        .with_input_mapper(
            MapperDef::new()
                .with_mapping(MappingDef::assign("url", "$.endpoint"))
                .with_mapping(MappingDef::assign("order", "$.order.id"))
                .with_mapping(MappingDef::literal("method", json!("GET"))),
        )
}

fn mapper_benchmark(c: &mut Criterion) {
    let env = MapperEnvironment::build_default();
    let task = fetch_task();

    let flow = SimpleScope::new();
    flow.add_attr("endpoint", DataType::String, json!("https://example.com"));
    flow.add_attr("order", DataType::Object, json!({"id": "o-1"}));

    let task_scope = SimpleScope::new();
    task_scope.add_attr("status", DataType::Integer, json!(200));
    task_scope.add_attr("body", DataType::Object, json!({"ok": true}));

    c.bench_function("input_mapper_lookup", |b| {
        b.iter(|| black_box(env.input_mapper_for(&task)))
    });

    c.bench_function("input_mapper_apply", |b| {
        let Ok(Some(mapper)) = env.input_mapper_for(&task) else {
            return;
        };
        b.iter(|| {
            let out = SimpleScope::new();
            black_box(mapper.apply(&flow, &out))
        })
    });

    c.bench_function("default_output_apply", |b| {
        let Ok(mapper) = env.output_mapper_for(&task) else {
            return;
        };
        b.iter(|| {
            let out = SimpleScope::new();
            black_box(mapper.apply(&task_scope, &out))
        })
    });
}

criterion_group!(benches, mapper_benchmark);
criterion_main!(benches);
