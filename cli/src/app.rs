//! Wires the parsed arguments to the batch or follow viewer.
use std::future::Future;
use std::io::{self, Write};
use std::path::Path;

use devlog_core::api::{coalesce, follow_file, read_batch, AppConfig, FollowOptions};
use tokio::sync::Notify;

use crate::commands::cli::Args;
use crate::error::CliError;

#[tracing::instrument(name = "cli.run", skip_all, fields(file = %args.file.display(), follow = args.follow))]
pub async fn run(args: &Args, cfg: &AppConfig) -> Result<i32, CliError> {
    if args.follow {
        let opts = FollowOptions::from_config(&cfg.viewer, args.verbose);
        let stdout = io::stdout();
        follow(&args.file, opts, &mut stdout.lock(), ctrl_c()).await?;
    } else {
        let stdout = io::stdout();
        let stderr = io::stderr();
        batch(
            &args.file,
            args.last,
            args.verbose,
            &mut stdout.lock(),
            &mut stderr.lock(),
        )?;
    }
    Ok(0)
}

/// Renders the whole file. Parse errors go to `err` before any output line.
pub fn batch<W: Write, E: Write>(
    path: &Path,
    last: usize,
    verbose: bool,
    out: &mut W,
    err: &mut E,
) -> Result<(), CliError> {
    let parsed = read_batch(path, last)?;
    for e in &parsed.errors {
        writeln!(err, "{e}")?;
    }
    for line in coalesce(&parsed.records, verbose) {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

/// Tails the file until `shutdown` resolves or `out` stops accepting writes.
pub async fn follow<W, S>(
    path: &Path,
    opts: FollowOptions,
    out: &mut W,
    shutdown: S,
) -> Result<(), CliError>
where
    W: Write,
    S: Future<Output = ()>,
{
    let closed = Notify::new();
    let mut failure: Option<io::Error> = None;

    follow_file(
        path,
        opts,
        |line| {
            if failure.is_some() {
                return;
            }
            if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
                failure = Some(e);
                closed.notify_one();
            }
        },
        async {
            tokio::select! {
                _ = shutdown => {}
                _ = closed.notified() => {}
            }
        },
    )
    .await?;

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C; follow until killed");
        std::future::pending::<()>().await;
    }
}
