// ─────────────────────────────────────────────────────────────────────
// Symmetroid Kernel — Singular CAS Locus Solver
// ─────────────────────────────────────────────────────────────────────
//! Default `LocusSolver`: renders a Singular script for the pencil,
//! stages it in a scoped temp file, runs the `Singular` executable, and
//! parses the printed solution list.
//!
//! The staged script is a `NamedTempFile`; it is removed when the call
//! returns, on both the success and the error path.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nalgebra::DMatrix;
use tempfile::NamedTempFile;

use symmetroid_pencil::{row_major, Pencil};
use symmetroid_types::{LocusConfig, Point, SymmetroidError, SymmetroidResult};

use crate::discovery::LocusSolver;

/// Built-in script template.
pub const DEFAULT_TEMPLATE: &str = include_str!("../data/singular_script.sing");

/// Lines per printed solution: index line, then three label/value pairs.
const BLOCK_LINES: usize = 7;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn discovery_err(msg: impl Into<String>) -> SymmetroidError {
    SymmetroidError::NodeDiscovery(msg.into())
}

/// Singular-backed singular-locus solver.
#[derive(Debug, Clone, Default)]
pub struct SingularLocus {
    config: LocusConfig,
}

impl SingularLocus {
    pub fn new(config: LocusConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocusConfig {
        &self.config
    }

    /// Configured template file, or the built-in one.
    pub fn template(&self) -> SymmetroidResult<String> {
        match &self.config.template {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                discovery_err(format!("cannot read template {}: {e}", path.display()))
            }),
            None => Ok(DEFAULT_TEMPLATE.to_string()),
        }
    }

    pub fn render_script(&self, pencil: &Pencil) -> SymmetroidResult<String> {
        Ok(render_template(&self.template()?, pencil))
    }

    /// Write `script` to a uniquely named temp file.
    pub fn stage(&self, script: &str) -> SymmetroidResult<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("symmetroid-")
            .suffix(".sing")
            .tempfile()
            .map_err(|e| discovery_err(format!("cannot create staging file: {e}")))?;
        file.write_all(script.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| discovery_err(format!("cannot write staging file: {e}")))?;
        Ok(file)
    }

    /// Run the configured program on `script`, returning its stdout.
    fn run(&self, script: &Path) -> SymmetroidResult<String> {
        let program = &self.config.program;
        let mut child = Command::new(program)
            .args(&self.config.args)
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| discovery_err(format!("cannot spawn '{program}': {e}")))?;

        // Drain both pipes concurrently so a chatty child cannot block.
        let out_reader = child.stdout.take().map(spawn_reader);
        let err_reader = child.stderr.take().map(spawn_reader);

        let deadline = Instant::now() + Duration::from_millis(self.config.timeout_ms);
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(discovery_err(format!(
                        "'{program}' timed out after {} ms",
                        self.config.timeout_ms
                    )));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    return Err(discovery_err(format!("waiting on '{program}' failed: {e}")));
                }
            }
        };

        // A grandchild may still hold the pipes open after the child exits.
        let stdout = collect(out_reader, deadline, program)?;
        let stderr = collect(err_reader, deadline, program)?;
        if !status.success() {
            return Err(discovery_err(format!(
                "'{program}' exited with {status}: {}",
                stderr.trim()
            )));
        }
        Ok(stdout)
    }
}

impl LocusSolver for SingularLocus {
    fn candidates(&self, pencil: &Pencil) -> SymmetroidResult<Vec<Point>> {
        let script = self.render_script(pencil)?;
        let staged = self.stage(&script)?;
        let result = self.run(staged.path()).and_then(|out| parse_output(&out));
        if let Err(e) = staged.close() {
            log::warn!("cannot remove staged locus script: {e}");
        }
        match &result {
            Ok(points) => log::info!("locus solver returned {} real candidates", points.len()),
            Err(e) => log::error!("locus solver failed: {e}"),
        }
        result
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<String>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
}

/// Join a pipe reader, giving up once `deadline` has passed.
fn collect(
    reader: Option<JoinHandle<io::Result<String>>>,
    deadline: Instant,
    program: &str,
) -> SymmetroidResult<String> {
    let Some(handle) = reader else {
        return Ok(String::new());
    };
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return Err(discovery_err(format!(
                "'{program}' output still open at timeout"
            )));
        }
        thread::sleep(POLL_INTERVAL);
    }
    handle
        .join()
        .map_err(|_| discovery_err("output reader panicked"))?
        .map_err(|e| discovery_err(format!("cannot read solver output: {e}")))
}

/// Format one entry for the script: integral values without a decimal point.
fn format_entry(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Comma-separated row-major entries.
pub fn format_matrix(m: &DMatrix<f64>) -> String {
    row_major(m)
        .into_iter()
        .map(format_entry)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Substitute `{n}`, `{A}`, `{B}`, `{C}`, `{D}` in `template`.
pub fn render_template(template: &str, pencil: &Pencil) -> String {
    let [a, b, c, d] = pencil.matrices();
    template
        .replace("{n}", &pencil.dimension().to_string())
        .replace("{A}", &format_matrix(a))
        .replace("{B}", &format_matrix(b))
        .replace("{C}", &format_matrix(c))
        .replace("{D}", &format_matrix(d))
}

fn is_index_line(line: &str) -> bool {
    let t = line.trim();
    t.len() > 3 && t.starts_with('[') && t.ends_with("]:")
}

/// Parse the printed solution list into real points.
///
/// Solutions with a complex coordinate (printed with parentheses) are
/// skipped. Parsing stops at the first line that does not open a new
/// solution, which drops trailing diagnostics.
pub fn parse_output(text: &str) -> SymmetroidResult<Vec<Point>> {
    let start = match text.find("[1]") {
        Some(i) => i,
        None if text.contains("empty list") => return Ok(Vec::new()),
        None => return Err(discovery_err("no solution list in locus solver output")),
    };

    let lines: Vec<&str> = text[start..].lines().collect();
    let mut points = Vec::new();
    let mut i = 0;
    while i + BLOCK_LINES <= lines.len() && is_index_line(lines[i]) {
        let block = &lines[i..i + BLOCK_LINES];
        let solution = i / BLOCK_LINES + 1;
        i += BLOCK_LINES;

        if [1, 3, 5].iter().any(|&k| !is_index_line(block[k])) {
            return Err(discovery_err(format!(
                "malformed solution {solution} in locus solver output"
            )));
        }
        if [2, 4, 6].iter().any(|&k| block[k].contains('(')) {
            continue;
        }

        let mut coords = [0.0; 3];
        for (c, k) in coords.iter_mut().zip([2, 4, 6]) {
            let raw = block[k].trim();
            *c = raw.parse::<f64>().map_err(|e| {
                discovery_err(format!(
                    "cannot parse coordinate '{raw}' of solution {solution}: {e}"
                ))
            })?;
        }
        points.push(Point(coords));
    }
    Ok(points)
}
