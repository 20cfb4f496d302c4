use crate::{
    Emission, ExtractError, Fragment, FrameOutput, Options, ResponseShape, SequenceUpdate,
    StreamExtractor, ToolCallUpdate, extract,
};
use serde_json::{Value, json};
use std::env;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};

fn print_help(program: &str) {
    eprintln!(
        "Usage: {prog} [OPTIONS] [INPUT]\n\
         \n\
         INPUT: optional input file. When omitted, reads from stdin.\n\
         \n\
         Options:\n\
           -o, --output FILE         Write output to FILE (default stdout)\n\
               --pretty              Pretty-print the extracted value\n\
               --show-strategy       Report the winning strategy on stderr\n\
               --stream              Feed the input in chunks, print every new value (NDJSON)\n\
               --chunk-size BYTES    Chunk size for --stream (default 64)\n\
               --fragments           Input is NDJSON fragments; print NDJSON events\n\
               --config FILE         Load options from a JSON file\n\
               --no-fence            Disable the fenced code block strategy\n\
               --strict              Drop the tolerant recovery strategy\n\
               --keep-numbers        Keep numbers cut off mid-stream\n\
               --sequence            Treat {{\"key\": [...]}} responses as lists\n\
           -v, --verbose             Debug logging on stderr (-vv for trace)\n\
           -h, --help                Show this help\n",
        prog = program
    );
}

fn usage_error(msg: &str) -> ! {
    eprintln!("{}", msg);
    std::process::exit(2);
}

fn parse_args() -> CliMode {
    let mut args: Vec<String> = env::args().collect();
    let program = args
        .first()
        .cloned()
        .unwrap_or_else(|| "jsonextract".to_string());
    if !args.is_empty() {
        args.remove(0);
    }

    let mut mode = CliMode {
        chunk_size: 64,
        ..CliMode::default()
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help(&program);
                std::process::exit(0);
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    usage_error("Missing FILE for --output");
                }
                mode.output = Some(args[i].clone());
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    usage_error("Missing FILE for --config");
                }
                mode.config = Some(args[i].clone());
            }
            "--chunk-size" => {
                i += 1;
                if i >= args.len() {
                    usage_error("Missing BYTES for --chunk-size");
                }
                mode.chunk_size = match args[i].parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => usage_error(&format!("Invalid chunk size: {}", args[i])),
                };
            }
            "--pretty" => mode.pretty = true,
            "--show-strategy" => mode.show_strategy = true,
            "--stream" => mode.stream = true,
            "--fragments" => mode.fragments = true,
            "--no-fence" => mode.no_fence = true,
            "--strict" => mode.strict = true,
            "--keep-numbers" => mode.keep_numbers = true,
            "--sequence" => mode.sequence = true,
            "-v" | "--verbose" => mode.verbosity += 1,
            "-vv" => mode.verbosity += 2,
            s if s.starts_with('-') => usage_error(&format!("Unknown option: {}", s)),
            path => {
                if mode.input.is_some() {
                    usage_error(&format!("Unexpected extra input: {}", path));
                }
                mode.input = Some(path.to_string());
            }
        }
        i += 1;
    }

    if mode.stream && mode.fragments {
        usage_error("--stream and --fragments are mutually exclusive");
    }
    mode
}

#[derive(Default)]
struct CliMode {
    input: Option<String>,
    output: Option<String>,
    config: Option<String>,
    stream: bool,
    fragments: bool,
    chunk_size: usize,
    pretty: bool,
    show_strategy: bool,
    no_fence: bool,
    strict: bool,
    keep_numbers: bool,
    sequence: bool,
    verbosity: u8,
}

impl CliMode {
    /// Config file first, then the flags on top.
    fn options(&self) -> Result<Options, Box<dyn std::error::Error>> {
        let mut opts = match &self.config {
            Some(path) => Options::from_json_str(&fs::read_to_string(path)?)?,
            None => Options::default(),
        };
        if self.no_fence {
            opts.fenced_code_blocks = false;
        }
        if self.strict {
            opts.strategies = Options::strict().strategies;
        }
        if self.keep_numbers {
            opts.drop_unterminated_numbers = false;
        }
        if self.sequence {
            opts.response_shape = ResponseShape::Sequence;
        }
        Ok(opts)
    }
}

fn init_logging(verbosity: u8) {
    let filter = if env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let filter_str = match verbosity {
            0 => "warn",
            1 => "warn,jsonextract=debug",
            _ => "info,jsonextract=trace",
        };
        tracing_subscriber::EnvFilter::new(filter_str)
    };
    // stdout carries the extracted JSON
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mode = parse_args();
    init_logging(mode.verbosity);
    let opts = mode.options()?;

    let mut out_writer: Box<dyn Write> = if let Some(ref o) = mode.output {
        Box::new(BufWriter::new(File::create(o)?))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    let result = if mode.fragments {
        let reader: Box<dyn BufRead> = match &mode.input {
            Some(path) => Box::new(BufReader::new(File::open(path)?)),
            None => Box::new(BufReader::new(io::stdin())),
        };
        run_fragments(reader, opts, &mut out_writer)
    } else {
        let content = read_input(mode.input.as_deref())?;
        if mode.stream {
            run_stream(&content, mode.chunk_size, opts, &mut out_writer)
        } else {
            run_batch(&content, &opts, &mode, &mut out_writer)
        }
    };
    out_writer.flush()?;
    result
}

fn read_input(path: Option<&str>) -> io::Result<String> {
    match path {
        Some(p) => fs::read_to_string(p),
        None => {
            let mut content = String::new();
            io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}

fn run_batch(
    content: &str,
    opts: &Options,
    mode: &CliMode,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let extracted = extract(content, opts)?;
    if mode.show_strategy {
        eprintln!("strategy: {}", extracted.strategy);
    }
    let s = if mode.pretty {
        serde_json::to_string_pretty(&extracted.value)?
    } else {
        serde_json::to_string(&extracted.value)?
    };
    out.write_all(s.as_bytes())?;
    out.write_all(b"\n")?;
    Ok(())
}

fn run_stream(
    content: &str,
    chunk_size: usize,
    opts: Options,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ex = StreamExtractor::new(opts);
    for chunk in char_chunks(content, chunk_size) {
        if let Some(v) = ex.push_content(chunk).ready_value() {
            write_line(out, v)?;
        }
    }
    if let Some(v) = ex.finish()?.ready_value() {
        write_line(out, v)?;
    }
    Ok(())
}

fn run_fragments(
    reader: Box<dyn BufRead>,
    opts: Options,
    out: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut ex = StreamExtractor::new(opts);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fragment: Fragment = serde_json::from_str(&line)
            .map_err(|e| ExtractError::from_serde("fragment", e))?;
        write_events(out, &ex.push(fragment))?;
    }
    let tail = ex.finish()?;
    write_events(out, &tail)?;
    Ok(())
}

fn write_events(out: &mut dyn Write, output: &FrameOutput) -> io::Result<()> {
    for event in events(output) {
        write_line(out, &event)?;
    }
    Ok(())
}

/// One JSON object per emission, sequence update and tool-call update.
/// Forwards that carry nothing are left out.
fn events(output: &FrameOutput) -> Vec<Value> {
    let mut events = Vec::new();
    match &output.emission {
        Emission::Suppress => events.push(json!({"event": "suppress"})),
        Emission::Ready {
            value, strategy, ..
        } => events.push(json!({"event": "ready", "strategy": strategy, "value": value})),
        Emission::Forward {
            value: Some(value), ..
        } => events.push(json!({"event": "forward", "value": value})),
        Emission::Forward {
            failure: Some(failure),
            ..
        } if !failure.is_empty_input() => {
            events.push(json!({"event": "pending", "error": failure.to_string()}))
        }
        Emission::Forward { .. } => {}
    }
    for update in &output.sequence {
        let name = match update {
            SequenceUpdate::Confirmed(_) => "sequence_confirmed",
            SequenceUpdate::Final(_) => "sequence_final",
        };
        events.push(json!({"event": name, "items": update.items()}));
    }
    for update in &output.tool_calls {
        events.push(match update {
            ToolCallUpdate::Partial(call) => json!({
                "event": "tool_call_partial",
                "name": call.name,
                "arguments": call.arguments,
            }),
            ToolCallUpdate::Final(call) => json!({
                "event": "tool_call_final",
                "name": call.name,
                "arguments": call.arguments,
            }),
            ToolCallUpdate::Invalid { name, error } => json!({
                "event": "tool_call_invalid",
                "name": name,
                "error": error.to_string(),
            }),
        });
    }
    events
}

fn write_line(out: &mut dyn Write, v: &Value) -> io::Result<()> {
    serde_json::to_writer(&mut *out, v)?;
    out.write_all(b"\n")
}

/// Split `s` into pieces of at most `size` bytes without cutting a character.
fn char_chunks(s: &str, size: usize) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    while start < s.len() {
        let mut end = (start + size).min(s.len());
        while !s.is_char_boundary(end) {
            end += 1;
        }
        out.push(&s[start..end]);
        start = end;
    }
    out
}
