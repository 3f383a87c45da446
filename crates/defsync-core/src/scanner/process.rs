//! Run the scanner tool to completion, capturing its output.

use std::ffi::OsStr;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::UpdateError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What the tool printed and how it exited.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Stdout then stderr, for diagnostics.
    pub fn combined(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

/// Output pipe being read on a helper thread.
struct Drain {
    buf: Arc<Mutex<Vec<u8>>>,
    done: mpsc::Receiver<()>,
}

impl Drain {
    fn spawn<R: Read + Send + 'static>(pipe: Option<R>) -> Self {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let (tx, done) = mpsc::channel();
        let sink = Arc::clone(&buf);
        thread::spawn(move || {
            if let Some(mut p) = pipe {
                let mut chunk = [0u8; 8192];
                loop {
                    match p.read(&mut chunk) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => match sink.lock() {
                            Ok(mut b) => b.extend_from_slice(&chunk[..n]),
                            Err(_) => break,
                        },
                    }
                }
            }
            let _ = tx.send(());
        });
        Self { buf, done }
    }

    /// Wait for EOF, but no later than `deadline`. A pipe still held open
    /// by a leftover grandchild yields what was read so far.
    fn collect(self, deadline: Option<Instant>, stream: &str) -> String {
        let finished = match deadline {
            Some(d) => self
                .done
                .recv_timeout(d.saturating_duration_since(Instant::now()))
                .is_ok(),
            None => self.done.recv().is_ok(),
        };
        if !finished {
            tracing::warn!("scanner tool {} still open at deadline; using partial output", stream);
        }
        self.buf
            .lock()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .unwrap_or_default()
    }
}

fn wait_until(child: &mut Child, deadline: Instant) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Spawn `program args...` and wait for it. Pipes are drained on helper
/// threads so the child never blocks on a full pipe. With a `timeout`, the
/// child is killed once it expires, and reading its output stops at the
/// same deadline.
pub fn run<I, S>(program: &Path, args: I, timeout: Option<Duration>) -> Result<ToolOutput, UpdateError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| UpdateError::ToolInvocation {
            tool: program.to_path_buf(),
            source,
        })?;
    let deadline = timeout.map(|t| Instant::now() + t);

    let stdout = Drain::spawn(child.stdout.take());
    let stderr = Drain::spawn(child.stderr.take());

    let waited = match deadline {
        Some(d) => wait_until(&mut child, d),
        None => child.wait().map(Some),
    };
    let status = match waited {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(UpdateError::ToolTimeout {
                tool: program.to_path_buf(),
                timeout: timeout.unwrap_or_default(),
            });
        }
        Err(source) => {
            let _ = child.kill();
            return Err(UpdateError::ToolInvocation {
                tool: program.to_path_buf(),
                source,
            });
        }
    };

    Ok(ToolOutput {
        status,
        stdout: stdout.collect(deadline, "stdout"),
        stderr: stderr.collect(deadline, "stderr"),
    })
}
