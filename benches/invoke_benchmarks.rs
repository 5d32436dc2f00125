//! Benchmarks for binding expression preparation and invocation.
//!
//! - `prepare`: member resolution, slot assignment, and compilation
//! - `invoke/first_build`: a cold invocation that builds the shape invoker
//! - `invoke/cached`: repeated invocations served from the invoker cache
//!
//! ```bash
//! cargo bench --bench invoke_benchmarks
//! ```

use bindexpr::prelude::*;
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// `Count > 0 ? $source.Title.ToUpper() + " (" + Count + ")" : $context.Fallback`
fn sample_expression() -> ExprRef {
    let count = || ExprNode::ident("Count");
    let title = ExprNode::call(
        Some(ExprNode::member(ExprNode::macro_ref("source"), "Title")),
        "ToUpper",
        vec![],
    );
    let label = [ExprNode::constant(" ("), count(), ExprNode::constant(")")]
        .into_iter()
        .fold(title, |acc, part| ExprNode::binary(BinaryOp::Add, acc, part));
    ExprNode::condition(
        ExprNode::binary(BinaryOp::Greater, count(), ExprNode::constant(0)),
        label,
        ExprNode::member(ExprNode::macro_ref("context"), "Fallback"),
    )
}

fn arguments() -> Vec<ParameterValue> {
    vec![
        ParameterValue::new(3),
        ParameterValue::new("inbox"),
        ParameterValue::new("empty"),
    ]
}

fn prepare_benchmarks(c: &mut Criterion) {
    let expr = sample_expression();
    let mut group = c.benchmark_group("prepare");

    group.bench_function("resolve_members", |b| {
        let mut visitor = MemberExpressionVisitor::new();
        b.iter(|| black_box(visitor.resolve(black_box(&expr), false, None).unwrap()));
    });

    group.bench_function("full_pipeline", |b| {
        let mut pipeline = BindingExpressionCompiler::new();
        b.iter(|| black_box(pipeline.prepare(black_box(&expr), false, None).unwrap()));
    });

    group.finish();
}

fn invoke_benchmarks(c: &mut Criterion) {
    let expr = sample_expression();
    let args = arguments();
    let mut group = c.benchmark_group("invoke");

    group.bench_function("first_build", |b| {
        let mut pipeline = BindingExpressionCompiler::new();
        b.iter_batched(
            || pipeline.prepare(&expr, false, None).unwrap(),
            |prepared| black_box(prepared.invoke(&args, None).unwrap()),
            BatchSize::SmallInput,
        );
    });

    group.bench_function("cached", |b| {
        let prepared = BindingExpressionCompiler::new().prepare(&expr, false, None).unwrap();
        prepared.invoke(&args, None).unwrap();
        b.iter(|| black_box(prepared.invoke(black_box(&args), None).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, prepare_benchmarks, invoke_benchmarks);
criterion_main!(benches);
