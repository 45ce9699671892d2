//! Benchmark suite for stalebot.
//!
//! Covers the pure, per-run work:
//! - Classification of a page of issues
//! - Decoding an issue page from its JSON shape
//! - Planning remediation for stale issues
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! cargo bench -- --save-baseline main
//! cargo bench -- --baseline main
//! ```

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use stalebot::model::{decode_issues, Issue};
use stalebot::testing::{issues_response, IssueBuilder};
use stalebot::{classify_all, CommentTemplate, RemediationPlanner, StalenessPolicy};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// A page where every third issue is fresh by label and the rest alternate
/// between old and recent activity.
fn page(size: usize) -> Vec<Issue> {
    (0..size)
        .map(|i| {
            let age = if i % 2 == 0 {
                Duration::days(10)
            } else {
                Duration::minutes(3)
            };
            let mut builder = IssueBuilder::new(&format!("I_{i}"), i as u64)
                .label("pending-update")
                .comment_at(now() - Duration::days(20))
                .comment_at(now() - age);
            if i % 3 == 0 {
                builder = builder.label("customer-replied-to");
            }
            builder.build()
        })
        .collect()
}

fn bench_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify_all");
    let policy = StalenessPolicy::new(Duration::hours(48)).with_fresh_label("customer-replied-to");

    for size in [10usize, 100] {
        let issues = page(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &issues, |b, issues| {
            b.iter(|| classify_all(black_box(issues), &policy, now()));
        });
    }
    group.finish();
}

fn bench_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_issues");

    for size in [10usize, 100] {
        let data = issues_response(&page(size), size as u64, false);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| decode_issues(black_box(data.clone())));
        });
    }
    group.finish();
}

fn bench_planning(c: &mut Criterion) {
    let policy = StalenessPolicy::new(Duration::hours(48));
    let stale = classify_all(&page(100), &policy, now());
    let template = CommentTemplate::new(stalebot::config::DEFAULT_COMMENT);
    let planner = RemediationPlanner::new(
        &template,
        "LA_1".to_string(),
        StdDuration::from_secs(48 * 60 * 60),
        "pending-update",
        None,
    );

    c.bench_function("plan_all_100", |b| {
        b.iter(|| planner.plan_all(black_box(stale.clone())));
    });
}

criterion_group!(benches, bench_classification, bench_decoding, bench_planning);
criterion_main!(benches);
