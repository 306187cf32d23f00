use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use log::{debug, trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command as TokioCommand};
use tokio::time::timeout;

use crate::context::ScrapeContext;
use crate::process::{ProcessError, ProcessResult};

/// Command wrapper for process execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Program to execute
    program: String,

    /// Arguments to pass to the program
    args: Vec<String>,
}

impl Command {
    /// Create a new command
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for arg in args {
            self.args.push(arg.into());
        }
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Spawn the command with stdout and stderr captured.
    ///
    /// On unix the child leads a new process group, so anything it starts is
    /// killed along with it. The group is killed if the returned handle is
    /// dropped before the child has been reaped.
    pub fn spawn(&self) -> ProcessResult<ProcessHandle> {
        debug!("Spawning command: {}", self);

        let mut cmd = TokioCommand::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(ProcessError::Spawn)?;
        let group = child.id();

        Ok(ProcessHandle {
            child,
            group,
            program: self.program.clone(),
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Handle to a running process
pub struct ProcessHandle {
    /// Child process
    child: Child,

    /// Process group led by the child
    group: Option<u32>,

    /// Program name
    program: String,
}

impl ProcessHandle {
    /// Process id, if the child has not been reaped yet
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Drain stdout and stderr and wait for the process to exit
    pub async fn wait_with_output(&mut self) -> ProcessResult<(ExitStatus, String, String)> {
        let stdout = self.child.stdout.take();
        let stderr = self.child.stderr.take();

        let (status, stdout, stderr) = tokio::try_join!(
            async { self.child.wait().await.map_err(ProcessError::Read) },
            read_pipe(stdout),
            read_pipe(stderr),
        )?;

        trace!("[{}] exited with {}, {} bytes of output", self.program, status, stdout.len());
        Ok((status, stdout, stderr))
    }

    /// Kill everything in the child's process group, then reap the child.
    ///
    /// The group is signalled even when the child itself has already been
    /// reaped, since descendants may still hold its output pipes open.
    pub async fn kill(&mut self) -> ProcessResult<()> {
        if let Some(group) = self.group {
            kill_group(group);
        }
        if self.id().is_none() {
            return Ok(());
        }
        self.child.kill().await.map_err(ProcessError::Read)
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if let (Some(group), Some(_)) = (self.group, self.id()) {
            kill_group(group);
        }
    }
}

/// Send SIGKILL to the process group led by `pid`
#[cfg(unix)]
fn kill_group(pid: u32) {
    // SAFETY: killpg has no memory-safety preconditions.
    let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if rc != 0 {
        trace!("killpg({}) failed: {}", pid, std::io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: u32) {}

/// Read a captured pipe to the end, lossily decoded
async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> ProcessResult<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await.map_err(ProcessError::Read)?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Run a command to completion and return its stdout.
///
/// The command is bounded by `limit` and by whatever is left of the scrape
/// context's deadline, whichever is shorter, and is aborted when the scrape
/// is cancelled. On every path other than a clean exit the child is killed
/// and reaped before this returns.
pub async fn run_bounded(
    ctx: &ScrapeContext,
    command: &Command,
    limit: Duration,
) -> ProcessResult<String> {
    if ctx.is_cancelled() {
        return Err(ProcessError::Cancelled);
    }

    let budget = ctx.bound(limit);
    let mut handle = command.spawn()?;

    let result = tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(ProcessError::Cancelled),
        res = timeout(budget, handle.wait_with_output()) => match res {
            Ok(res) => res,
            Err(_) => Err(ProcessError::Timeout(budget)),
        },
    };

    match result {
        Ok((status, stdout, _)) if status.success() => Ok(stdout),
        Ok((status, stdout, stderr)) => {
            debug!("{} output: {}{}", command, stdout, stderr);
            Err(ProcessError::NonZeroExit {
                status,
                output: format!("{}{}", stdout, stderr),
            })
        }
        Err(e) => {
            if let Err(kill_err) = handle.kill().await {
                warn!("Failed to kill {}: {}", command, kill_err);
            }
            Err(e)
        }
    }
}
