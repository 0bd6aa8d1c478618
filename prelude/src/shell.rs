//! Shell command execution.
//!
//! Commands run in their own process group so a timeout or interrupt reaches
//! every process the command started. The host owns SIGINT and forwards it
//! through [`ShellOptions::interrupt`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::Notify;

use crate::error::{PreludeError, Result};
use crate::handle::Prelude;
use crate::text::preview;

const SNAPSHOT_VAR: &str = "DEVLOG_SHELL_SNAPSHOT";
const NO_LOGIN_VAR: &str = "DEVLOG_BASH_NO_LOGIN";
const INTERRUPT_GRACE: Duration = Duration::from_secs(2);
const CODE_KILLED: i32 = -9;
const CODE_INTERRUPTED: i32 = -2;

/// Captured output of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellResult {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; negative signal number when the command was killed.
    pub code: i32,
}

impl ShellResult {
    pub fn succeeded(&self) -> bool {
        self.code == 0
    }
}

/// Renders nothing on success so a notebook cell stays quiet.
impl fmt::Display for ShellResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.succeeded() {
            Ok(())
        } else {
            write!(f, "exit code {}", self.code)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShellOptions {
    /// Working directory, resolved against the session directory.
    pub cwd: Option<PathBuf>,
    pub timeout: Option<Duration>,
    /// Interrupts the running command when notified. SIGINT handling stays
    /// with the host; forward its Ctrl-C here with `notify_one`.
    pub interrupt: Option<Arc<Notify>>,
}

enum Ending {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    Interrupted,
}

#[derive(Clone, Copy)]
enum Stop {
    Interrupt,
    Kill,
}

impl Prelude {
    /// Runs `cmd` with `bash -c` (falling back to `sh`).
    pub async fn run(&self, cmd: &str, opts: &ShellOptions) -> Result<ShellResult> {
        let program = which::which("bash")
            .or_else(|_| which::which("sh"))
            .unwrap_or_else(|_| PathBuf::from("/bin/sh"));
        self.execute(&program, &["-c", cmd], cmd, opts).await
    }

    /// Runs `cmd` through the user's login shell, sourcing the shell
    /// snapshot named by `DEVLOG_SHELL_SNAPSHOT` first.
    pub async fn sh(&self, cmd: &str, opts: &ShellOptions) -> Result<ShellResult> {
        let Some(shell) = self.login_shell() else {
            if cfg!(windows) {
                return self.execute(Path::new("cmd"), &["/c", cmd], cmd, opts).await;
            }
            return Err(PreludeError::NoShell);
        };

        let line = match self.lookup_env(SNAPSHOT_VAR).filter(|s| !s.is_empty()) {
            Some(snapshot) => format!("source '{snapshot}' 2>/dev/null && {cmd}"),
            None => cmd.to_string(),
        };
        let no_login = self
            .lookup_env(NO_LOGIN_VAR)
            .is_some_and(|v| !v.is_empty());
        let args: Vec<&str> = if no_login {
            vec!["-c", line.as_str()]
        } else {
            vec!["-l", "-c", line.as_str()]
        };
        self.execute(&shell, &args, cmd, opts).await
    }

    fn login_shell(&self) -> Option<PathBuf> {
        if let Some(path) = self
            .lookup_env("SHELL")
            .filter(|s| !s.is_empty())
            .and_then(|s| which::which(s).ok())
        {
            return Some(path);
        }
        ["bash", "zsh", "sh"]
            .iter()
            .find_map(|name| which::which(name).ok())
    }

    async fn execute(&self, program: &Path, args: &[&str], shown: &str, opts: &ShellOptions) -> Result<ShellResult> {
        let cwd = match &opts.cwd {
            Some(dir) => self.resolve(dir),
            None => self.cwd().to_path_buf(),
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .envs(self.env_overlay())
            .current_dir(&cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| PreludeError::Spawn {
            program: program.display().to_string(),
            source,
        })?;
        tracing::debug!(program = %program.display(), pid = ?child.id(), "command started");

        let stdout = tokio::spawn(drain(child.stdout.take()));
        let stderr = tokio::spawn(drain(child.stderr.take()));

        let deadline = async {
            match opts.timeout {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        };
        let interrupted = async {
            match &opts.interrupt {
                Some(notify) => notify.notified().await,
                None => std::future::pending().await,
            }
        };
        let ending = tokio::select! {
            status = child.wait() => Ending::Exited(status),
            _ = deadline => Ending::TimedOut,
            _ = interrupted => Ending::Interrupted,
        };

        let code = match ending {
            Ending::Exited(status) => {
                let status = status.map_err(|source| PreludeError::Spawn {
                    program: program.display().to_string(),
                    source,
                })?;
                exit_code(status)
            }
            Ending::TimedOut => {
                tracing::debug!(cmd = %preview(shown, 80), "command timed out");
                signal_group(&mut child, Stop::Kill);
                let _ = child.wait().await;
                CODE_KILLED
            }
            Ending::Interrupted => {
                signal_group(&mut child, Stop::Interrupt);
                if tokio::time::timeout(INTERRUPT_GRACE, child.wait()).await.is_err() {
                    signal_group(&mut child, Stop::Kill);
                    let _ = child.wait().await;
                }
                CODE_INTERRUPTED
            }
        };

        let result = ShellResult {
            stdout: stdout.await.unwrap_or_default(),
            stderr: stderr.await.unwrap_or_default(),
            code,
        };
        let output = if result.stderr.is_empty() {
            result.stdout.clone()
        } else {
            format!("{}{}", result.stdout, result.stderr)
        };
        self.emit(
            "sh",
            json!({
                "cmd": preview(shown, 80),
                "code": result.code,
                "output": preview(&output, 500),
            }),
        );
        Ok(result)
    }
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut r) = reader {
        if let Err(e) = r.read_to_end(&mut buf).await {
            tracing::debug!(error = %e, "output pipe closed early");
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(unix)]
fn signal_group(child: &mut Child, stop: Stop) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    let sig = match stop {
        Stop::Interrupt => Signal::SIGINT,
        Stop::Kill => Signal::SIGKILL,
    };
    if let Err(e) = killpg(Pid::from_raw(pid as i32), sig) {
        tracing::debug!(pid, signal = ?sig, error = %e, "killpg failed");
    }
}

#[cfg(not(unix))]
fn signal_group(child: &mut Child, _stop: Stop) {
    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "kill failed");
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(code) = status.code() {
            code
        } else if let Some(sig) = status.signal() {
            -sig
        } else {
            1
        }
    }
    #[cfg(not(unix))]
    {
        status.code().unwrap_or(1)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::status::MemorySink;
    use pretty_assertions::assert_eq;

    fn session() -> (tempfile::TempDir, Prelude, Arc<MemorySink>) {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(MemorySink::new());
        let p = Prelude::with_cwd(dir.path(), sink.clone());
        (dir, p, sink)
    }

    #[test]
    fn display_is_quiet_on_success() {
        let ok = ShellResult { stdout: "x".into(), stderr: String::new(), code: 0 };
        let bad = ShellResult { code: 3, ..ok.clone() };
        assert!(ok.succeeded());
        assert_eq!(ok.to_string(), "");
        assert_eq!(bad.to_string(), "exit code 3");
    }

    #[tokio::test]
    async fn run_captures_both_streams() {
        let (_d, p, sink) = session();
        let res = p
            .run("echo hi; echo err >&2; exit 3", &ShellOptions::default())
            .await
            .unwrap();
        assert_eq!(res.stdout, "hi\n");
        assert_eq!(res.stderr, "err\n");
        assert_eq!(res.code, 3);
        let ev = sink.last().unwrap();
        assert_eq!(ev.op, "sh");
        assert_eq!(ev.get("output"), Some(&json!("hi\nerr\n")));
    }

    #[tokio::test]
    async fn timeout_kills_process_group() {
        let (_d, p, _s) = session();
        let opts = ShellOptions {
            timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        };
        let res = p.run("sleep 5", &opts).await.unwrap();
        assert_eq!(res.code, CODE_KILLED);
        assert!(!res.succeeded());
    }

    #[tokio::test]
    async fn interrupt_stops_running_command() {
        let (_d, p, _s) = session();
        let notify = Arc::new(Notify::new());
        let opts = ShellOptions {
            interrupt: Some(notify.clone()),
            ..Default::default()
        };
        let trigger = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            notify.notify_one();
        });
        let started = std::time::Instant::now();
        let res = p.run("sleep 30", &opts).await.unwrap();
        trigger.await.unwrap();
        assert_eq!(res.code, CODE_INTERRUPTED);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn commands_see_session_env_and_cwd() {
        let (dir, mut p, _s) = session();
        std::fs::create_dir(dir.path().join("inner")).unwrap();
        p.env_set("DEVLOG_SHELL_TEST_VALUE", "42");
        let res = p
            .run("printf %s \"$DEVLOG_SHELL_TEST_VALUE\"", &ShellOptions::default())
            .await
            .unwrap();
        assert_eq!(res.stdout, "42");

        let opts = ShellOptions { cwd: Some("inner".into()), ..Default::default() };
        let res = p.run("pwd", &opts).await.unwrap();
        assert!(res.stdout.trim_end().ends_with("inner"));
    }

    #[tokio::test]
    async fn sh_without_login_runs_command() {
        let (_d, mut p, _s) = session();
        p.env_set(NO_LOGIN_VAR, "1");
        let res = p.sh("echo ok", &ShellOptions::default()).await.unwrap();
        assert_eq!(res.stdout, "ok\n");
        assert!(res.succeeded());
    }
}
