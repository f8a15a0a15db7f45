//! Sitemap parsing throughput

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sitred_core::sitemap;
use std::hint::black_box;

/// Build a sitemap of `count` pages, every other one with two images.
fn generate_sitemap(count: usize) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">"#,
    );
    for i in 0..count {
        xml.push_str("<url>");
        xml.push_str(&format!("<loc>https://example.com/articles/{i}/</loc>"));
        xml.push_str("<lastmod>2024-01-15T10:30:00+00:00</lastmod>");
        if i % 2 == 0 {
            for n in 0..2 {
                xml.push_str(&format!(
                    "<image:image><image:loc>https://example.com/uploads/{i}-{n}.jpg</image:loc></image:image>"
                ));
            }
        }
        xml.push_str("</url>");
    }
    xml.push_str("</urlset>");
    xml
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("sitemap_parse");

    for count in [1_000usize, 10_000, 100_000] {
        let xml = generate_sitemap(count);
        group.throughput(Throughput::Bytes(xml.len() as u64));

        group.bench_with_input(BenchmarkId::new("sync", count), &xml, |b, xml| {
            b.iter(|| sitemap::parse(black_box(xml.as_bytes())));
        });

        group.bench_with_input(BenchmarkId::new("async", count), &xml, |b, xml| {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("Failed to build runtime");
            b.to_async(&runtime)
                .iter(|| sitemap::parse_async(black_box(xml.as_bytes())));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
