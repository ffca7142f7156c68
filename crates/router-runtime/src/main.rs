//! # Interaction Router Runtime
//!
//! Reads JSON-lines commands on stdin and writes acknowledgements, replies
//! and command results as JSON lines on stdout. Logs go to stderr.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment (missing secret is fatal)
//! 2. Initialize logging and metrics
//! 3. Wire the dispatcher and register built-in handlers
//! 4. Start the stdout writer
//! 5. Serve stdin until end of input or Ctrl+C
//!
//! Stdin is read on a plain OS thread rather than `tokio::io::stdin`, whose
//! reads park on the blocking pool and would hold runtime shutdown after
//! Ctrl+C until another line arrived.

use anyhow::{Context, Result};
use router_runtime::{run_bridge, RouterConfig, Runtime};
use std::io::{BufRead, BufReader, Read, Write};
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RouterConfig::from_env().context("invalid router configuration")?;
    let _telemetry = router_telemetry::init_telemetry(&config.telemetry)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<serde_json::Value>();
    let runtime = Runtime::build(&config, tx).context("router setup failed")?;

    let writer = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        while let Some(line) = rx.blocking_recv() {
            if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
                error!(error = %e, "stdout closed");
                break;
            }
        }
    });

    info!(
        service = %config.telemetry.service_name,
        max_token_length = config.dispatcher.codec.max_token_length,
        "Router ready, reading commands from stdin"
    );

    tokio::select! {
        result = run_bridge(runtime, line_pipe(std::io::stdin())) => {
            result.context("input loop failed")?;
            info!("End of input");
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received");
        }
    }

    // The runtime (and with it the last sender) is gone; let the writer drain.
    writer.await?;
    Ok(())
}

/// `input` as an async reader fed line by line from a detached thread.
fn line_pipe<R: Read + Send + 'static>(input: R) -> DuplexStream {
    let (reader, mut writer) = tokio::io::duplex(64 * 1024);
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        for line in BufReader::new(input).lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!(error = %e, "input read failed");
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        while let Some(mut line) = rx.recv().await {
            line.push('\n');
            if writer.write_all(line.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    reader
}
