//! Running a child process to completion with captured output

use std::{
    io::{self, Read},
    process::{Child, Command, ExitStatus, Stdio},
    sync::{Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{debug, warn};

/// Interval between exit checks while a deadline is armed
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Result of a finished (or killed) child process
#[derive(Debug)]
pub(crate) struct Finished {
    /// Exit status, `None` when the child was killed at the deadline
    pub(crate) status: Option<ExitStatus>,
    /// Stdout followed by stderr, lossily decoded
    pub(crate) output: String,
}

/// Spawn `command` and wait for it, killing it once `timeout` elapses.
///
/// Stdout and stderr are drained on helper threads so a child writing more
/// than a pipe buffer's worth of diagnostics cannot stall against us. After a
/// timeout the readers are abandoned instead of joined: a grandchild that
/// inherited the pipes (a `lessc.cmd` wrapper, a shell script without `exec`)
/// would otherwise keep us waiting until it exits on its own.
pub(crate) fn run(command: &mut Command, timeout: Option<Duration>) -> io::Result<Finished> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    debug!("Running {command:?}");

    let mut child = command.spawn()?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match timeout.and_then(|timeout| deadline(timeout).map(|at| (timeout, at))) {
        Some((timeout, at)) => wait_until(&mut child, timeout, at)?,
        None => Some(child.wait()?),
    };

    let finished = status.is_some();
    let mut output = collect(stdout, finished);
    output.push_str(&collect(stderr, finished));

    Ok(Finished { status, output })
}

/// Instant `timeout` from now, `None` when that is beyond what `Instant` can
/// represent (effectively no deadline)
fn deadline(timeout: Duration) -> Option<Instant> {
    let at = Instant::now().checked_add(timeout);
    if at.is_none() {
        debug!("Timeout of {}s is out of range, waiting without one", timeout.as_secs());
    }
    at
}

fn wait_until(
    child: &mut Child,
    timeout: Duration,
    deadline: Instant,
) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            warn!(
                "Killing process {} after {}s",
                child.id(),
                timeout.as_secs()
            );
            // The child may exit between the last poll and the kill
            if let Err(e) = child.kill() {
                debug!("Kill failed: {e}");
            }
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Output collected so far by a reader thread
#[derive(Debug)]
struct Drain {
    buf: Arc<Mutex<Vec<u8>>>,
    handle: JoinHandle<()>,
}

fn drain<R>(pipe: Option<R>) -> Option<Drain>
where
    R: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        let handle = thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => sink
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        debug!("Failed to read child output: {e}");
                        break;
                    }
                }
            }
        });
        Drain { buf, handle }
    })
}

/// Output of `drain`; waits for end-of-stream only when `wait` is set,
/// otherwise takes whatever has been read so far.
fn collect(drain: Option<Drain>, wait: bool) -> String {
    let Some(Drain { buf, handle }) = drain else {
        return String::new();
    };
    if wait && handle.join().is_err() {
        debug!("Output reader panicked");
    }
    let bytes = buf.lock().unwrap_or_else(PoisonError::into_inner);
    String::from_utf8_lossy(&bytes).into_owned()
}
