use criterion::{Criterion, SamplingMode, criterion_group, criterion_main};
use jsonextract::{Fragment, Options, StreamExtractor};
use std::env;
use std::hint::black_box;
use std::time::Duration;

fn list_doc(n: usize) -> String {
    let items: Vec<String> = (0..n)
        .map(|i| format!(r#"{{"id": {}, "title": "item {}", "done": false}}"#, i, i))
        .collect();
    format!("```json\n[{}]\n```", items.join(", "))
}

fn bench_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream");
    group.sampling_mode(SamplingMode::Flat);
    if let Some(ss) = env::var("JE_SAMPLE_SIZE").ok().and_then(|v| v.parse::<usize>().ok()) { group.sample_size(ss.max(10)); } else { group.sample_size(10); }
    if let Some(meas) = env::var("JE_MEAS_SEC").ok().and_then(|v| v.parse::<u64>().ok()) { group.measurement_time(Duration::from_secs(meas)); } else { group.measurement_time(Duration::from_secs(6)); }
    if let Some(warm) = env::var("JE_WARMUP_SEC").ok().and_then(|v| v.parse::<u64>().ok()) { group.warm_up_time(Duration::from_secs(warm)); } else { group.warm_up_time(Duration::from_secs(2)); }

    let doc = list_doc(50);
    group.bench_function("list_50_items_16b_chunks", |b| {
        b.iter(|| {
            let mut ex = StreamExtractor::new(Options::default());
            let mut updates = 0usize;
            let bytes = doc.as_bytes();
            let mut start = 0;
            while start < bytes.len() {
                let end = (start + 16).min(bytes.len());
                let out = ex.push_content(black_box(&doc[start..end]));
                updates += out.sequence.len();
                start = end;
            }
            updates += ex.finish().unwrap().sequence.len();
            black_box(updates);
        })
    });

    let args = r#"{"query": "rust streaming json", "limit": 25, "filters": {"lang": ["en", "de"]}}"#;
    group.bench_function("tool_args_char_by_char", |b| {
        b.iter(|| {
            let mut ex = StreamExtractor::new(Options::default());
            ex.push(Fragment::tool_name("search"));
            let mut partials = 0usize;
            for (i, ch) in args.char_indices() {
                let delta = &args[i..i + ch.len_utf8()];
                partials += ex.push(Fragment::tool_args(black_box(delta))).tool_calls.len();
            }
            partials += ex.finish().unwrap().tool_calls.len();
            black_box(partials);
        })
    });

    group.finish();
}

criterion_group!(benches, bench_stream);
criterion_main!(benches);
