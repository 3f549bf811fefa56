// Criterion benchmarks for Element Scan

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use element_scan::core::{
    filters::evaluate,
    scanner::{CancelToken, DrawStream, Scanner},
    seed::numbers_for_key,
};
use element_scan::models::{Element, ScanRequest, UserProfile};

fn create_profile() -> UserProfile {
    UserProfile {
        birth_date: NaiveDate::from_ymd_opt(1996, 5, 20).unwrap(),
        lunar_year: 1996,
        element: Element::Water,
        approximate_lunar_year: true,
    }
}

fn create_request(hours: f64) -> ScanRequest {
    let start = NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(18, 30, 0)
        .unwrap();
    ScanRequest::new(start.date(), vec!["07".to_string(), "79".to_string()], start, hours).unwrap()
}

fn bench_numbers_for_key(c: &mut Criterion) {
    c.bench_function("numbers_for_key", |b| {
        b.iter(|| numbers_for_key(black_box("2005199601062024010620241830000779")));
    });
}

fn bench_filter(c: &mut Criterion) {
    let profile = create_profile();
    let request = create_request(0.5);
    let draws: Vec<_> = DrawStream::new(&profile, &request).collect();

    c.bench_function("filter_1800_draws", |b| {
        b.iter(|| {
            let found: Vec<_> = draws
                .iter()
                .filter_map(|d| evaluate(profile.element, d))
                .collect();
            black_box(found)
        });
    });
}

fn bench_scan(c: &mut Criterion) {
    let profile = create_profile();
    let request = create_request(1.0);

    let mut group = c.benchmark_group("scan_one_hour");
    group.sample_size(20);

    for workers in [1usize, 2, 4, 8].iter() {
        let scanner = Scanner::new(600, 256, *workers);
        group.bench_with_input(BenchmarkId::new("workers", workers), workers, |b, &w| {
            b.iter(|| {
                let cancel = CancelToken::new();
                if w > 1 {
                    scanner.run_parallel(black_box(&profile), black_box(&request), &cancel, 0, |_| {})
                } else {
                    scanner.run(black_box(&profile), black_box(&request), &cancel, 0, |_| {})
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_numbers_for_key, bench_filter, bench_scan);

criterion_main!(benches);
