use super::*;

// Shared test helpers
fn lcg_sizes(seed: u64, len: usize) -> Vec<usize> {
    let mut x = seed;
    let mut out = Vec::new();
    let mut total = 0usize;
    while total < len {
        // LCG: constants from Numerical Recipes
        x = x.wrapping_mul(1664525).wrapping_add(1013904223);
        // chunk size in [1..16]
        let mut n = (((x >> 24) as usize) % 16) + 1;
        if total + n > len {
            n = len - total;
        }
        out.push(n);
        total += n;
    }
    out
}

fn chunk_by_char(s: &str, sizes: &[usize]) -> Vec<String> {
    let mut res = Vec::new();
    let mut iter = s.chars();
    for &n in sizes {
        let chunk: String = iter.by_ref().take(n).collect();
        if chunk.is_empty() {
            break;
        }
        res.push(chunk);
    }
    // Append remainder if any
    let rest: String = iter.collect();
    if !rest.is_empty() {
        res.push(rest);
    }
    res
}

fn partial(input: &str) -> serde_json::Value {
    recover_to_value(input, RecoveryMode::Partial, &Options::default()).unwrap()
}

fn tolerant(input: &str) -> serde_json::Value {
    recover_to_value(input, RecoveryMode::Tolerant, &Options::default()).unwrap()
}

/// Feed `chunks` as content fragments, collecting every output including the
/// one produced by `finish`.
fn drive(opts: Options, chunks: &[String]) -> (StreamExtractor, Vec<FrameOutput>) {
    let mut ex = StreamExtractor::new(opts);
    let mut outs: Vec<FrameOutput> = chunks.iter().map(|c| ex.push_content(c)).collect();
    outs.push(ex.finish().unwrap());
    (ex, outs)
}

// Submodules (topic-based)
mod buffer_emission;
mod toolcall;
