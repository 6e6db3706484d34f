//! Tracing subscriber setup shared by the workspace infrastructure services.
//!
//! Behaviour is driven by environment variables:
//!
//! | variable        | values                       | default           |
//! |-----------------|------------------------------|-------------------|
//! | `LOG_LEVEL`     | any `EnvFilter` directive    | `info`            |
//! | `LOG_FORMAT`    | `human`, `json`              | `human`           |
//! | `LOG_OUTPUT`    | `console`, `file`, `both`    | `console`         |
//! | `LOG_FILE_PATH` | path of the rolling log file | `/tmp/ws-infra.log` |
//! | `LOG_TAGS`      | `key:value,...` span filters | none              |
//!
//! With `LOG_TAGS=workspace_id:ws1` only events emitted inside a span that
//! recorded `workspace_id` containing `ws1` are kept.

use std::{
    collections::HashMap,
    env,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{field::Visit, span, Metadata, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::MakeWriter,
    layer::{Context, Layer},
    prelude::*,
    registry,
    util::TryInitError,
    EnvFilter,
};

const DEFAULT_LOG_FILE: &str = "/tmp/ws-infra.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Console,
    File,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// Logging settings resolved from the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    pub file_path: PathBuf,
    pub tags: Vec<Tag>,
}

impl LogSettings {
    pub fn from_env() -> Self {
        let level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Human,
        };
        let output = match env::var("LOG_OUTPUT").as_deref() {
            Ok("file") => LogOutput::File,
            Ok("both") => LogOutput::Both,
            _ => LogOutput::Console,
        };
        let file_path = env::var("LOG_FILE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_FILE));
        let tags = parse_tags(&env::var("LOG_TAGS").unwrap_or_default());

        Self {
            level,
            format,
            output,
            file_path,
            tags,
        }
    }

    /// `RUST_LOG` takes precedence over `LOG_LEVEL` when set.
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }
}

/// Parses `key:value` pairs separated by commas; malformed entries are dropped.
pub fn parse_tags(raw: &str) -> Vec<Tag> {
    raw.split(',')
        .filter_map(|s| {
            let mut parts = s.splitn(2, ':');
            let key = parts.next()?.trim().to_string();
            let value = parts.next()?.trim().to_string();
            if key.is_empty() {
                return None;
            }
            Some(Tag { key, value })
        })
        .collect()
}

// --- Tee writer for console + file output ---
struct Tee<A, B> {
    a: A,
    b: B,
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let res_a = self.a.write(buf);
        let res_b = self.b.write(buf);
        res_a.or(res_b)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.a.flush()?;
        self.b.flush()
    }
}

#[derive(Clone)]
struct MakeTee<A, B> {
    make_a: A,
    make_b: B,
}

impl<'a, A, B> MakeWriter<'a> for MakeTee<A, B>
where
    A: MakeWriter<'a>,
    B: MakeWriter<'a>,
{
    type Writer = Tee<A::Writer, B::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        Tee {
            a: self.make_a.make_writer(),
            b: self.make_b.make_writer(),
        }
    }
}

// --- Span field tag filtering ---
struct TagFilterLayer {
    filters: Vec<Tag>,
}

impl<S> Layer<S> for TagFilterLayer
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut fields = HashMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));
        span.extensions_mut().insert(fields);
    }

    fn enabled(&self, _meta: &Metadata<'_>, ctx: Context<'_, S>) -> bool {
        if self.filters.is_empty() {
            return true;
        }

        // Events outside any span cannot carry tags.
        let Some(scope) = ctx.current_span().id().and_then(|id| ctx.span_scope(id)) else {
            return false;
        };

        let mut all_fields: HashMap<String, String> = HashMap::new();
        for span_ref in scope {
            if let Some(fields) = span_ref.extensions().get::<HashMap<String, String>>() {
                for (k, v) in fields {
                    all_fields.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
        }

        tags_match(&self.filters, &all_fields)
    }
}

fn tags_match(filters: &[Tag], fields: &HashMap<String, String>) -> bool {
    filters.iter().all(|filter| {
        fields
            .get(&filter.key)
            .is_some_and(|value| filter.value == "*" || value.contains(&filter.value))
    })
}

struct FieldVisitor<'a>(&'a mut HashMap<String, String>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

/// Installs the global subscriber described by [`LogSettings::from_env`].
///
/// Returns the guard of the non-blocking file writer when file output is on;
/// it must be kept alive for buffered lines to be flushed.
pub fn try_init_subscriber() -> Result<Option<WorkerGuard>, TryInitError> {
    try_init_with(&LogSettings::from_env())
}

/// Like [`try_init_subscriber`] but ignores an already installed subscriber.
pub fn init_subscriber() -> Option<WorkerGuard> {
    try_init_subscriber().ok().flatten()
}

pub fn try_init_with(settings: &LogSettings) -> Result<Option<WorkerGuard>, TryInitError> {
    let subscriber = registry().with(settings.env_filter()).with(TagFilterLayer {
        filters: settings.tags.clone(),
    });
    let is_json = settings.format == LogFormat::Json;

    match settings.output {
        LogOutput::Console => {
            let fmt_layer = tracing_subscriber::fmt::layer().with_writer(io::stdout);
            if is_json {
                subscriber.with(fmt_layer.json()).try_init()?;
            } else {
                subscriber.with(fmt_layer).try_init()?;
            }
            Ok(None)
        }
        LogOutput::File => {
            let (writer, guard) = file_writer(&settings.file_path);
            let fmt_layer = tracing_subscriber::fmt::layer().with_writer(writer);
            if is_json {
                subscriber.with(fmt_layer.json()).try_init()?;
            } else {
                subscriber.with(fmt_layer).try_init()?;
            }
            Ok(Some(guard))
        }
        LogOutput::Both => {
            let (writer, guard) = file_writer(&settings.file_path);
            let tee = MakeTee {
                make_a: io::stdout,
                make_b: writer,
            };
            let fmt_layer = tracing_subscriber::fmt::layer().with_writer(tee);
            if is_json {
                subscriber.with(fmt_layer.json()).try_init()?;
            } else {
                subscriber.with(fmt_layer).try_init()?;
            }
            Ok(Some(guard))
        }
    }
}

fn file_writer(path: &Path) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard) {
    let dir = path.parent().unwrap_or_else(|| Path::new("/tmp"));
    let file_name = path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("ws-infra.log"));
    let appender = tracing_appender::rolling::daily(dir, file_name);
    tracing_appender::non_blocking(appender)
}
