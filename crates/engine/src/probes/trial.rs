//! Dev-server startup trial.
//!
//! One cooperative loop races four sources: a stdout read, a stderr read,
//! the child's exit and the trial timer. The first of exit / wait error /
//! timer decides the outcome; output reads only ever append to buffers.
//! On the timer path the child's whole process group is killed and the
//! child reaped before the outcome is returned.

use crate::config::ServerConfig;
use crate::traits::ProgressSink;
use crate::types::{OutputStream, ProgressEvent, ServerTrial, TrialOutcome};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};

const CHUNK_SIZE: usize = 8 * 1024;

/// Start `config.command` in `cwd` and watch it until it exits, fails or
/// `config.timeout()` elapses.
pub async fn run_server_trial(
    config: &ServerConfig,
    cwd: &Path,
    sink: &mut dyn ProgressSink,
) -> ServerTrial {
    let mut trial = ServerTrial {
        command: config.command.clone(),
        outcome: TrialOutcome::TimedOut,
        stdout: String::new(),
        stderr: String::new(),
        pid: None,
    };

    let mut child = match shell_command(&config.command, cwd).spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!(command = %config.command, error = %e, "dev server failed to spawn");
            trial.outcome = TrialOutcome::SpawnFailed {
                message: e.to_string(),
            };
            sink.emit(ProgressEvent::TrialFinished(&trial.outcome));
            return trial;
        }
    };
    trial.pid = child.id();
    tracing::debug!(pid = ?trial.pid, command = %config.command, "dev server spawned");

    let mut pipes = Pipes {
        stdout: child.stdout.take(),
        stderr: child.stderr.take(),
    };

    let timer = tokio::time::sleep(config.timeout());
    tokio::pin!(timer);

    let mut out_chunk = vec![0u8; CHUNK_SIZE];
    let mut err_chunk = vec![0u8; CHUNK_SIZE];

    let outcome = loop {
        tokio::select! {
            n = read_chunk(&mut pipes.stdout, &mut out_chunk) => {
                pipes.record(OutputStream::Stdout, n, &out_chunk, &mut trial, sink);
            }
            n = read_chunk(&mut pipes.stderr, &mut err_chunk) => {
                pipes.record(OutputStream::Stderr, n, &err_chunk, &mut trial, sink);
            }
            status = child.wait() => {
                break match status {
                    Ok(status) => TrialOutcome::Exited { code: status.code() },
                    Err(e) => TrialOutcome::SpawnFailed { message: e.to_string() },
                };
            }
            _ = &mut timer => {
                terminate(&mut child).await;
                break TrialOutcome::TimedOut;
            }
        }
    };
    trial.outcome = outcome;

    // Trailing output still lands in the buffers; the outcome is fixed.
    pipes.drain(config.drain(), &mut trial, sink).await;

    tracing::debug!(outcome = ?trial.outcome, "dev server trial finished");
    sink.emit(ProgressEvent::TrialFinished(&trial.outcome));
    trial
}

fn shell_command(command_line: &str, cwd: &Path) -> Command {
    #[cfg(windows)]
    let mut cmd = {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command_line);
        c
    };
    #[cfg(not(windows))]
    let mut cmd = {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command_line);
        c
    };
    cmd.current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // Own group, so the server the shell (or npm) starts can be killed with it.
    #[cfg(unix)]
    cmd.process_group(0);
    cmd
}

async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Some(pid) = child.id() {
            if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                tracing::warn!(pgid = pid, error = %e, "failed to kill dev server process group");
            }
        }
    }
    // `kill` signals and then waits, so the child is reaped on return.
    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "failed to kill dev server after timeout");
    }
}

struct Pipes<O, E> {
    stdout: Option<O>,
    stderr: Option<E>,
}

impl<O, E> Pipes<O, E>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    fn record(
        &mut self,
        stream: OutputStream,
        read: Option<usize>,
        buf: &[u8],
        trial: &mut ServerTrial,
        sink: &mut dyn ProgressSink,
    ) {
        let Some(n) = read else {
            match stream {
                OutputStream::Stdout => self.stdout = None,
                OutputStream::Stderr => self.stderr = None,
            }
            return;
        };
        let chunk = String::from_utf8_lossy(&buf[..n]);
        match stream {
            OutputStream::Stdout => trial.stdout.push_str(&chunk),
            OutputStream::Stderr => trial.stderr.push_str(&chunk),
        }
        sink.emit(ProgressEvent::TrialOutput {
            stream,
            chunk: &chunk,
        });
    }

    async fn drain(&mut self, grace: Duration, trial: &mut ServerTrial, sink: &mut dyn ProgressSink) {
        let mut out_chunk = vec![0u8; CHUNK_SIZE];
        let mut err_chunk = vec![0u8; CHUNK_SIZE];
        let deadline = tokio::time::sleep(grace);
        tokio::pin!(deadline);

        while self.stdout.is_some() || self.stderr.is_some() {
            tokio::select! {
                n = read_chunk(&mut self.stdout, &mut out_chunk) => {
                    self.record(OutputStream::Stdout, n, &out_chunk, trial, sink);
                }
                n = read_chunk(&mut self.stderr, &mut err_chunk) => {
                    self.record(OutputStream::Stderr, n, &err_chunk, trial, sink);
                }
                _ = &mut deadline => break,
            }
        }
    }
}

/// Read the next chunk from `pipe`. `None` means the pipe closed (or
/// failed); a closed pipe never resolves again so `select!` skips it.
async fn read_chunk<R: AsyncRead + Unpin>(pipe: &mut Option<R>, buf: &mut [u8]) -> Option<usize> {
    let Some(reader) = pipe.as_mut() else {
        return std::future::pending().await;
    };
    match reader.read(buf).await {
        Ok(0) => None,
        Ok(n) => Some(n),
        Err(e) => {
            tracing::debug!(error = %e, "dev server pipe read failed");
            None
        }
    }
}
