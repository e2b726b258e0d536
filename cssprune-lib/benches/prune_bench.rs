extern crate criterion;

use criterion::{criterion_group, criterion_main, Criterion};

use cssprune_lib::parser::document_tree::DocumentTree;
use cssprune_lib::prune;
use cssprune_lib::style::stylesheet::StyleModel;

fn large_document() -> String {
    let mut html = String::with_capacity(4_000_000);
    html.push_str("<div id=\"main\">");
    for i in 0..20_000 {
        html.push_str(&format!(
            "<section class=\"s{}\"><p class=\"item c{}\">Test</p><span>x</span></section>",
            i % 50,
            i % 500
        ));
    }
    html.push_str("</div>");
    html
}

fn large_stylesheet() -> String {
    let mut css = String::with_capacity(1_000_000);
    for i in 0..5_000 {
        css.push_str(&format!(
            ".s{} > .c{}, #main .item.c{} + span {{ color: red; }}\n",
            i % 80,
            i,
            i
        ));
        if i % 100 == 0 {
            css.push_str(&format!("@media (min-width: {}px) {{ .c{} {{ margin: 0 }} }}\n", i, i));
        }
    }
    css
}

fn bench_parse_stylesheet(c: &mut Criterion) {
    let css = large_stylesheet();
    c.bench_function("parse_stylesheet", |b| b.iter(|| StyleModel::parse(&css)));
}

fn bench_build_document(c: &mut Criterion) {
    let html = large_document();
    c.bench_function("build_document", |b| b.iter(|| DocumentTree::from_html(&html)));
}

fn bench_deep_nesting(c: &mut Criterion) {
    let mut deep_html = String::new();
    for _ in 0..1000 {
        deep_html.push_str("<div class=\"wrap\">");
    }
    deep_html.push_str("<p class=\"leaf\">Content</p>");
    for _ in 0..1000 {
        deep_html.push_str("</div>");
    }
    let css = ".wrap .wrap .leaf { color: red } .missing .leaf { color: blue }";

    c.bench_function("deep_nesting", |b| b.iter(|| prune::prune(css, &deep_html)));
}

fn bench_prune(c: &mut Criterion) {
    let document = DocumentTree::from_html(&large_document());
    let css = large_stylesheet();
    c.bench_function("prune_large", |b| {
        b.iter(|| prune::prune_document(&css, &document))
    });
}

criterion_group!(
    benches,
    bench_parse_stylesheet,
    bench_build_document,
    bench_deep_nesting,
    bench_prune
);
criterion_main!(benches);
