//! Benchmarks for markdown to render tree transformation.

#![allow(clippy::format_push_string)] // Benchmark setup code, performance not critical

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quire_renderer::{DocumentRenderer, to_html, tokenize};

/// Generate markdown content with specified structure.
fn generate_markdown(headings: usize, paragraphs_per_section: usize) -> String {
    let mut md = String::with_capacity(headings * 50 + headings * paragraphs_per_section * 200);
    md.push_str("# Document Title\n\n");

    for i in 0..headings {
        md.push_str(&format!("## Section {i}\n\n"));
        for j in 0..paragraphs_per_section {
            md.push_str(&format!(
                "Paragraph {j} in section {i} has **bold**, *italic* and a [link](https://example.com/{i}).\n\n"
            ));
        }
        md.push_str("- item one\n- item two\n\n| a | b |\n|---|:-:|\n| 1 | 2 |\n\n");
    }
    md
}

fn bench_render_simple(c: &mut Criterion) {
    let renderer = DocumentRenderer::new();

    c.bench_function("render_simple_markdown", |b| {
        b.iter(|| renderer.render("# Hello\n\nSimple content."));
    });
}

fn bench_render_pretokenized(c: &mut Criterion) {
    let tokens = tokenize(&generate_markdown(20, 3));
    let renderer = DocumentRenderer::new();

    c.bench_function("render_pretokenized_20_sections", |b| {
        b.iter(|| renderer.render(&tokens));
    });
}

fn bench_render_varying_sizes(c: &mut Criterion) {
    let renderer = DocumentRenderer::new();
    let mut group = c.benchmark_group("render_by_size");

    for (headings, paragraphs) in [(5, 2), (20, 3), (50, 5)] {
        let markdown = generate_markdown(headings, paragraphs);

        let size = markdown.len();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(
            BenchmarkId::new("markdown", format!("{headings}h_{paragraphs}p")),
            &markdown,
            |b, md| b.iter(|| renderer.render(md)),
        );
        group.bench_with_input(
            BenchmarkId::new("html", format!("{headings}h_{paragraphs}p")),
            &markdown,
            |b, md| b.iter(|| renderer.render(md).map(|nodes| to_html(&nodes))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_render_simple,
    bench_render_pretokenized,
    bench_render_varying_sizes
);
criterion_main!(benches);
