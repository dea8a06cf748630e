use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rubac::workflow::{CompiledWorkflow, PolicyDocument};
use rubac::{
    parse, Builtins, DecisionInput, PolicyService, RequestAttributes, ServiceConfig,
    UserAttributes, WorkflowRegistry,
};

/// Policy with a range check and a role check over two params
fn create_policy(id: u64) -> PolicyDocument {
    PolicyDocument::from_json(&format!(
        r#"{{
            "WorkflowID": {id},
            "WorkflowName": "bench {id}",
            "Path": "admin/*",
            "Params": [
                {{ "Name": "ip_address", "Expression": "$request.getIpAddress" }},
                {{ "Name": "user_role", "Expression": "$user.getRole" }}
            ],
            "Rules": [
                {{ "RuleName": "range", "Expression": "ip_range($ip_address, '100.100.100.1/28')" }},
                {{ "RuleName": "role", "Expression": "in($user_role, 'ADMIN', 'SUPER_ADMIN')" }}
            ]
        }}"#
    ))
    .unwrap()
}

/// Benchmark expression parsing
fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for expression in [
        "$user.getRole",
        "$ip_address == '100.100.100.100'",
        "in($user_role, 'ADMIN', 'SUPER_ADMIN', 'OWNER', 'OPERATOR')",
    ] {
        group.bench_with_input(
            BenchmarkId::from_parameter(expression),
            expression,
            |b, expression| b.iter(|| black_box(parse(expression).unwrap())),
        );
    }

    group.finish();
}

/// Benchmark full document compilation
fn bench_compile(c: &mut Criterion) {
    let builtins = Builtins::standard();
    let doc = create_policy(1);

    c.bench_function("compile_workflow", |b| {
        b.iter(|| black_box(CompiledWorkflow::compile(&doc, &builtins).unwrap()))
    });
}

/// Benchmark decisions through the service (hot path)
fn bench_decide(c: &mut Criterion) {
    let decision_counts = vec![100, 1_000, 10_000];

    let builtins = Builtins::standard();
    let workflow = CompiledWorkflow::compile(&create_policy(1), &builtins).unwrap();
    let registry = WorkflowRegistry::from_workflows(vec![workflow], false).unwrap();
    let service = PolicyService::from_registry(registry, builtins, ServiceConfig::default());

    let allowed = DecisionInput::new(
        UserAttributes::new("ADMIN"),
        RequestAttributes::new("100.100.100.5", "/admin/w2"),
    );
    let uncovered = DecisionInput::new(
        UserAttributes::new("USER"),
        RequestAttributes::new("8.8.8.8", "/public/index"),
    );

    let mut group = c.benchmark_group("decide");

    for count in decision_counts {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("rules", count), &count, |b, &count| {
            b.iter(|| {
                for _ in 0..count {
                    black_box(service.decide(&allowed, "1"));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("path_miss", count), &count, |b, &count| {
            b.iter(|| {
                for _ in 0..count {
                    black_box(service.decide(&uncovered, "1"));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_compile, bench_decide);
criterion_main!(benches);
