//! Process runner - spawns commands with tokio and streams their output

use crate::runner::{
    CommandOutput, CommandRunner, Invocation, OutputCallback, OutputLine, RunnerConfig,
    RunnerError,
};
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// How long output is still collected after the child has exited
const OUTPUT_GRACE: Duration = Duration::from_millis(200);

/// Runs invocations as child processes of this one
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    config: RunnerConfig,
}

impl ProcessRunner {
    /// Create a new process runner
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    fn build_command(&self, invocation: &Invocation) -> Command {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = invocation
            .working_dir
            .as_ref()
            .or(self.config.working_dir.as_ref())
        {
            command.current_dir(dir);
        }

        command
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        callback: Option<&dyn OutputCallback>,
    ) -> Result<CommandOutput, RunnerError> {
        debug!(program = %invocation.program, args = ?invocation.args, "spawning child process");

        let mut child = self
            .build_command(invocation)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(forward_lines(stdout, tx.clone(), OutputLine::Stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(forward_lines(stderr, tx.clone(), OutputLine::Stderr));
        }
        // Channel closes once both readers hit EOF
        drop(tx);

        let drive = async {
            let mut lines = Vec::new();
            let deliver = |line: OutputLine, lines: &mut Vec<OutputLine>| {
                if let Some(cb) = callback {
                    cb.on_line(&line);
                }
                lines.push(line);
            };

            let status = loop {
                tokio::select! {
                    Some(line) = rx.recv() => deliver(line, &mut lines),
                    status = child.wait() => break status?,
                }
            };

            // Background processes the child left behind can hold the pipes
            // open; only wait a moment for output still in flight.
            let grace = sleep(OUTPUT_GRACE);
            tokio::pin!(grace);
            loop {
                tokio::select! {
                    line = rx.recv() => match line {
                        Some(line) => deliver(line, &mut lines),
                        None => break,
                    },
                    _ = &mut grace => {
                        debug!(
                            program = %invocation.program,
                            "output still open after exit, detaching"
                        );
                        break;
                    }
                }
            }

            Ok::<_, std::io::Error>((status, lines))
        };

        let result = match invocation.timeout {
            Some(limit) => timeout(limit, drive).await.map_err(|_| limit),
            None => Ok(drive.await),
        };

        for reader in &readers {
            reader.abort();
        }

        let result = match result {
            Ok(result) => result,
            Err(limit) => {
                warn!(
                    program = %invocation.program,
                    limit = ?limit,
                    "child timed out, killing it"
                );
                return Err(RunnerError::Timeout {
                    program: invocation.program.clone(),
                    limit,
                });
            }
        };

        let (status, lines) = result.map_err(|source| RunnerError::Io {
            program: invocation.program.clone(),
            source,
        })?;

        let exit_code = exit_code(status);
        debug!(program = %invocation.program, exit_code, lines = lines.len(), "child exited");

        Ok(CommandOutput { exit_code, lines })
    }
}

/// Read `reader` line by line into the channel
///
/// Lines are decoded lossily so binary output never stalls the pipe.
fn forward_lines<R>(
    reader: R,
    tx: mpsc::UnboundedSender<OutputLine>,
    wrap: fn(String) -> OutputLine,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf);
                    let text = text.trim_end_matches(['\n', '\r']).to_string();
                    if tx.send(wrap(text)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("failed to read child output: {}", e);
                    break;
                }
            }
        }
    })
}

/// Exit code the way a shell reports it
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
