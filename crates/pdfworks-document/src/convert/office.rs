// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Office document → PDF through an external headless renderer.
//
// Every conversion runs in its own scratch directory:
//   1. write the upload to <scratch>/input.<ext>
//   2. run the renderer with --outdir <scratch>
//   3. read <scratch>/input.pdf
//   4. remove <scratch> (also on failure, via `TempDir`'s drop)

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pdfworks_core::error::{PdfworksError, Result};
use pdfworks_core::types::{DocumentKind, JobId, TransformOutput, replace_extension};
use tempfile::TempDir;
use tracing::{debug, error, info, instrument, warn};

/// Default wall-clock limit for one renderer run.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// How often a running renderer is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Bytes of renderer stderr kept for error messages.
const STDERR_TAIL_BYTES: usize = 2048;

/// Base name of the staged input; the renderer writes `<stem>.pdf`.
const INPUT_STEM: &str = "input";

/// A backend able to turn an office document on disk into a PDF.
///
/// Implementations must write `<source stem>.pdf` into `out_dir` and must
/// not touch anything outside it.
pub trait OfficeRenderer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Render `source` to PDF inside `out_dir`, blocking until done.
    fn render_pdf(&self, source: &Path, out_dir: &Path) -> Result<()>;
}

// ---------------------------------------------------------------------------
// LibreOffice backend
// ---------------------------------------------------------------------------

/// Runs LibreOffice (`soffice`) headless with an explicit binary path and
/// an explicit output directory.
#[derive(Debug, Clone)]
pub struct SofficeRenderer {
    binary: PathBuf,
    timeout: Duration,
}

impl SofficeRenderer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Wait for `child` to exit, killing it once the deadline passes.
    fn wait_with_deadline(&self, child: &mut Child) -> Result<ExitStatus> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) => {
                    terminate(child);
                    return Err(PdfworksError::Conversion(format!(
                        "cannot poll renderer: {e}"
                    )));
                }
            }
            if Instant::now() >= deadline {
                warn!(timeout = ?self.timeout, "renderer timed out; killing it");
                terminate(child);
                return Err(PdfworksError::Conversion(format!(
                    "renderer timed out after {}s",
                    self.timeout.as_secs_f32()
                )));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Kill the renderer together with anything it forked, then reap it.
///
/// `soffice` is a launcher that starts `soffice.bin`; the renderer runs as
/// the leader of its own process group so the whole group can be signalled.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        let pgid = child.id() as libc::pid_t;
        // SAFETY: `killpg` only sends a signal and touches no memory.
        if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
            let err = std::io::Error::last_os_error();
            debug!(error = %err, "cannot signal renderer process group");
        }
    }
    if let Err(e) = child.kill() {
        debug!(error = %e, "renderer already gone");
    }
    // Reap so no zombie outlives the job.
    if let Err(e) = child.wait() {
        warn!(error = %e, "failed to reap renderer");
    }
}

impl Default for SofficeRenderer {
    fn default() -> Self {
        Self::new("soffice")
    }
}

impl OfficeRenderer for SofficeRenderer {
    fn name(&self) -> &str {
        "soffice"
    }

    #[instrument(skip_all, fields(binary = %self.binary.display()))]
    fn render_pdf(&self, source: &Path, out_dir: &Path) -> Result<()> {
        // A private profile per job: concurrent soffice processes sharing a
        // profile block on each other's lock file.
        let profile = out_dir.join("profile");
        let log_path = out_dir.join("renderer.log");
        let log = File::create(&log_path)?;

        let mut command = Command::new(&self.binary);
        command
            .arg("--headless")
            .arg("--norestore")
            .arg(format!("-env:UserInstallation=file://{}", profile.display()))
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(out_dir)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log));
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command.spawn().map_err(|e| {
            PdfworksError::Conversion(format!(
                "cannot start renderer {}: {e}",
                self.binary.display()
            ))
        })?;

        debug!(pid = child.id(), "renderer started");
        let status = self.wait_with_deadline(&mut child)?;

        if !status.success() {
            let stderr = read_tail(&log_path);
            return Err(PdfworksError::Conversion(format!(
                "renderer exited with {status}: {stderr}"
            )));
        }
        Ok(())
    }
}

fn read_tail(path: &Path) -> String {
    match std::fs::read(path) {
        Ok(bytes) => {
            let start = bytes.len().saturating_sub(STDERR_TAIL_BYTES);
            String::from_utf8_lossy(&bytes[start..]).trim().to_string()
        }
        Err(_) => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Conversion job
// ---------------------------------------------------------------------------

/// One staged conversion. Owns its scratch directory; dropping the job
/// deletes the directory and everything in it.
pub struct ConversionJob {
    id: JobId,
    scratch: TempDir,
    input_path: PathBuf,
}

impl ConversionJob {
    /// Create a fresh scratch directory under `work_root` and write `input`
    /// into it with the extension of `kind`.
    pub fn stage(work_root: &Path, input: &[u8], kind: DocumentKind) -> Result<Self> {
        let id = JobId::new();
        let scratch = tempfile::Builder::new()
            .prefix(&format!("pdfworks-job-{id}-"))
            .tempdir_in(work_root)?;
        let input_path = scratch
            .path()
            .join(format!("{INPUT_STEM}.{}", kind.extension()));
        std::fs::write(&input_path, input)?;

        debug!(job_id = %id, scratch = %scratch.path().display(), "conversion job staged");
        Ok(Self {
            id,
            scratch,
            input_path,
        })
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// Where the renderer is expected to put its PDF.
    pub fn expected_output(&self) -> PathBuf {
        self.scratch.path().join(format!("{INPUT_STEM}.pdf"))
    }

    /// Read the rendered PDF fully into memory.
    pub fn read_output(&self) -> Result<Vec<u8>> {
        let path = self.expected_output();
        std::fs::read(&path).map_err(|e| {
            PdfworksError::Conversion(format!("renderer produced no output ({e})"))
        })
    }

    /// Remove the scratch directory now, logging rather than failing if
    /// the removal goes wrong.
    pub fn cleanup(self) {
        let id = self.id;
        let path = self.scratch.path().to_path_buf();
        match self.scratch.close() {
            Ok(()) => debug!(job_id = %id, "scratch directory removed"),
            Err(e) => error!(job_id = %id, path = %path.display(), error = %e, "failed to remove scratch directory"),
        }
    }
}

// ---------------------------------------------------------------------------
// Word → PDF
// ---------------------------------------------------------------------------

/// Converts Word documents to PDF through an [`OfficeRenderer`].
#[derive(Clone)]
pub struct WordToPdf {
    renderer: Arc<dyn OfficeRenderer>,
    work_root: PathBuf,
}

impl WordToPdf {
    pub fn new(renderer: Arc<dyn OfficeRenderer>, work_root: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            work_root: work_root.into(),
        }
    }

    pub fn renderer_name(&self) -> &str {
        self.renderer.name()
    }

    /// Convert the uploaded `input` (named `filename`) to PDF.
    ///
    /// The output is named after the upload with a `.pdf` extension.
    #[instrument(skip(self, input), fields(bytes_len = input.len(), renderer = self.renderer.name()))]
    pub fn convert(&self, input: &[u8], filename: &str) -> Result<TransformOutput> {
        if input.is_empty() {
            return Err(PdfworksError::Validation("Uploaded file is empty".into()));
        }
        let kind = match DocumentKind::from_filename(filename) {
            Some(DocumentKind::Pdf) => {
                return Err(PdfworksError::Validation(
                    "Expected a Word document, got a PDF".into(),
                ));
            }
            Some(kind) => kind,
            None => DocumentKind::Docx,
        };

        let job = ConversionJob::stage(&self.work_root, input, kind)?;
        let job_id = job.id();
        let result = self
            .renderer
            .render_pdf(job.input_path(), job.scratch_dir())
            .and_then(|()| job.read_output());
        job.cleanup();

        let bytes = result.inspect_err(|e| warn!(%job_id, error = %e, "Word → PDF failed"))?;
        info!(%job_id, output_bytes = bytes.len(), "Word → PDF complete");
        Ok(TransformOutput::pdf(bytes, replace_extension(filename, "pdf")))
    }
}
