//! Tracing setup.
//!
//! - **stderr**: diagnostics filtered by `RUST_LOG` (default `warn`), compact format.
//! - **component files** (optional): when a log directory is configured, every
//!   `info`-and-above event is appended to `<dir>/<component>.log`, where the
//!   component is the last path segment of the event target (`architect`,
//!   `coder`, `reviewer`, `manager`, `sandbox`, `generator`, `pipeline`).
//!   Anything else lands in `devteam.log`. These files are write-only.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result, anyhow};
use tracing::Metadata;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const COMPONENTS: &[&str] = &[
    "architect",
    "coder",
    "reviewer",
    "manager",
    "sandbox",
    "generator",
    "pipeline",
];
const FALLBACK_COMPONENT: &str = "devteam";

/// Initialize the global tracing subscriber.
///
/// # Example
/// ```bash
/// RUST_LOG=devteam=debug devteam run
/// ```
pub fn init(log_dir: Option<&Path>) -> Result<()> {
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .compact()
        .with_filter(stderr_filter);

    let file_layer = match log_dir {
        Some(dir) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(ComponentFiles::open(dir)?)
                .with_filter(LevelFilter::INFO),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("install tracing subscriber: {e}"))
}

/// Map an event target to the component log it belongs in.
pub fn component_for_target(target: &str) -> &'static str {
    let last = target.rsplit("::").next().unwrap_or(target);
    COMPONENTS
        .iter()
        .copied()
        .find(|component| *component == last)
        .unwrap_or(FALLBACK_COMPONENT)
}

/// Append-only log files, one per component, opened up front.
#[derive(Debug, Clone)]
pub struct ComponentFiles {
    files: Arc<HashMap<&'static str, Arc<Mutex<File>>>>,
}

impl ComponentFiles {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).with_context(|| format!("create log dir {}", dir.display()))?;
        let mut files = HashMap::new();
        for component in COMPONENTS.iter().copied().chain([FALLBACK_COMPONENT]) {
            let path = dir.join(format!("{component}.log"));
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log file {}", path.display()))?;
            files.insert(component, Arc::new(Mutex::new(file)));
        }
        Ok(Self {
            files: Arc::new(files),
        })
    }

    fn writer(&self, component: &str) -> ComponentWriter {
        ComponentWriter {
            file: self
                .files
                .get(component)
                .or_else(|| self.files.get(FALLBACK_COMPONENT))
                .cloned(),
        }
    }
}

impl<'a> MakeWriter<'a> for ComponentFiles {
    type Writer = ComponentWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer(FALLBACK_COMPONENT)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        self.writer(component_for_target(meta.target()))
    }
}

/// Handle to one component file; each write is a whole formatted event.
pub struct ComponentWriter {
    file: Option<Arc<Mutex<File>>>,
}

impl Write for ComponentWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &self.file {
            Some(file) => file
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .write(buf),
            None => Ok(buf.len()),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match &self.file {
            Some(file) => file
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .write_all(buf),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &self.file {
            Some(file) => file.lock().unwrap_or_else(PoisonError::into_inner).flush(),
            None => Ok(()),
        }
    }
}
