//! Benchmarks for list filtering
//!
//! Run with: cargo bench

use bandup::listing::{Author, CommunityPost, ListQuery, PostCategory, SortKey};
use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn create_posts(count: usize) -> Vec<CommunityPost> {
    let start = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap();
    let categories = PostCategory::all();

    (0..count)
        .map(|i| CommunityPost {
            id: i.to_string(),
            title: format!("Writing task {} practice thread {}", i % 2 + 1, i),
            content: String::new(),
            author: Author {
                id: (i % 50).to_string(),
                name: format!("Member {}", i % 50),
                role: "Member".to_string(),
            },
            category: categories[i % categories.len()],
            tags: Vec::new(),
            likes: (i * 7919 % 1000) as u64,
            comments: (i % 40) as u64,
            created_at: start + Duration::minutes(i as i64 * 13),
            is_pinned: i % 97 == 0,
        })
        .collect()
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for size in [100, 1000, 10000] {
        let posts = create_posts(size);
        group.throughput(Throughput::Elements(size as u64));

        let search = ListQuery::<PostCategory>::new().search("task 1");
        group.bench_function(format!("search_{}", size), |b| {
            b.iter(|| search.apply(black_box(&posts)))
        });

        let faceted = ListQuery::new()
            .search("practice")
            .facet(PostCategory::Questions);
        group.bench_function(format!("search_facet_{}", size), |b| {
            b.iter(|| faceted.apply(black_box(&posts)))
        });
    }

    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");

    for size in [100, 1000, 10000] {
        let posts = create_posts(size);
        group.throughput(Throughput::Elements(size as u64));

        for key in [SortKey::Recent, SortKey::Popular] {
            let query = ListQuery::<PostCategory>::new().sort(key);
            group.bench_function(format!("{:?}_{}", key, size).to_lowercase(), |b| {
                b.iter(|| query.apply(black_box(&posts)))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_filter, bench_sort);
criterion_main!(benches);
