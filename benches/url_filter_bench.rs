use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use url_filter_core::{extract_urls, rewrite_html, UrlClassifier, UrlVerdict};

fn sample_document(links: usize) -> String {
    let mut html = String::from("<html><body>\n");
    for i in 0..links {
        let line = match i % 4 {
            0 => format!("<a href=\"https://site{}.example.com/page\">safe</a>\n", i),
            1 => format!("<p>Mirror: https://malware.com/file{}</p>\n", i),
            2 => format!("<img src='http://10.0.0.{}/img.png'>\n", i % 255),
            _ => format!("<a href=\"https://cdn.example.org/setup{}.exe\">dl</a>\n", i),
        };
        html.push_str(&line);
    }
    html.push_str("</body></html>\n");
    html
}

fn bench_classify(c: &mut Criterion) {
    let classifier = UrlClassifier::default();
    let mut group = c.benchmark_group("classify");

    let urls = vec![
        ("safe", "https://www.example.com/articles/2024/rust?page=2"),
        ("blacklisted", "https://malicious.com/login"),
        ("keyword", "https://example.com/free-keygen-download"),
        ("ip", "http://192.168.1.1/admin"),
        ("invalid", "not a url at all"),
    ];

    for (name, url) in urls {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(name), &url, |b, url| {
            b.iter(|| classifier.classify(black_box(url)));
        });
    }
    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_urls");

    for links in [10usize, 100, 1000] {
        let html = sample_document(links);
        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(links), &html, |b, html| {
            b.iter(|| extract_urls(black_box(html)));
        });
    }
    group.finish();
}

fn bench_rewrite(c: &mut Criterion) {
    let classifier = UrlClassifier::default();
    let mut group = c.benchmark_group("rewrite_html");

    for links in [10usize, 100, 1000] {
        let html = sample_document(links);
        let verdicts: Vec<UrlVerdict> = extract_urls(&html)
            .into_iter()
            .map(|url| {
                let verdict = classifier.classify(&url);
                UrlVerdict::new(url, &verdict)
            })
            .collect();

        group.throughput(Throughput::Bytes(html.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(links), &html, |b, html| {
            b.iter(|| rewrite_html(black_box(html), black_box(&verdicts)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_classify, bench_extract, bench_rewrite);
criterion_main!(benches);
