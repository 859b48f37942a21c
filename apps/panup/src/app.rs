//! Wires the client, output sink and upload flow together.

use anyhow::Context;
use panup_openapi::Client;
use panup_protocol::Credentials;
use panup_transfer::SpeedCalculator;
use panup_uploader::{
    FlowStage, GithubOutput, NullSink, OutputSink, UploadConfig, UploadError, UploadEvent,
    UploadFlow,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::Cli;
use crate::config::Config;

/// Runs one upload and prints the resulting link.
///
/// A missing source file fails before any request is made.
pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    anyhow::ensure!(cli.file.is_file(), "file not found: {}", cli.file.display());

    let client = Client::new(&config.client_config()).context("failed to build HTTP client")?;

    let sink: Box<dyn OutputSink> = match std::env::var_os("GITHUB_OUTPUT") {
        Some(path) if !path.is_empty() => {
            debug!(path = ?path, "exporting link to GITHUB_OUTPUT");
            Box::new(GithubOutput::new(path))
        }
        _ => Box::new(NullSink),
    };

    let upload_config = UploadConfig {
        parent_id: cli.parent_id,
        duplicate: config.duplicate,
        slice_concurrency: config.slice_concurrency,
        output_key: config.output_key.clone(),
    };

    let cancel = CancellationToken::new();
    let mut flow = UploadFlow::new(&client, sink.as_ref(), upload_config).with_cancel(cancel.clone());

    let reporter = flow.take_events().map(|rx| tokio::spawn(report_progress(rx)));

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling upload");
                cancel.cancel();
            }
        }
    });

    info!(file = %cli.file.display(), parent_id = cli.parent_id, "uploading");
    let creds = Credentials::new(cli.client_id, cli.client_secret);
    let result = flow.run(&cli.file, &creds).await;

    // Closes the event channel so the reporter finishes.
    drop(flow);
    if let Some(reporter) = reporter {
        let _ = reporter.await;
    }

    match result {
        Ok(outcome) => {
            info!(
                file_id = outcome.file_id,
                reused = outcome.reused,
                sent = outcome.slices_sent,
                skipped = outcome.slices_skipped,
                "upload finished"
            );
            print_banner(&outcome.url);
            Ok(())
        }
        Err(UploadError::Output { url, source }) => {
            print_banner(&url);
            Err(anyhow::Error::new(source).context("failed to write GITHUB_OUTPUT"))
        }
        Err(e) => Err(e.into()),
    }
}

fn print_banner(url: &str) {
    let rule = "=".repeat(30);
    println!("\n{rule}");
    println!("DIRECT LINK: {url}");
    println!("{rule}\n");
}

/// Logs flow events with per-slice throughput.
async fn report_progress(mut events: mpsc::Receiver<UploadEvent>) {
    let speed = SpeedCalculator::default();

    while let Some(event) = events.recv().await {
        match event {
            UploadEvent::Stage(FlowStage::SlicesUploading) => {
                speed.start();
                debug!(stage = %FlowStage::SlicesUploading, "stage");
            }
            UploadEvent::Stage(stage) => debug!(%stage, "stage"),
            UploadEvent::SliceUploaded {
                number,
                total,
                bytes,
                skipped: true,
            } => {
                info!(slice = number, total, bytes, "slice already on server");
            }
            UploadEvent::SliceUploaded {
                number,
                total,
                bytes,
                skipped: false,
            } => {
                speed.add_sample(bytes);
                info!(
                    slice = number,
                    total,
                    bytes,
                    speed = %format_speed(speed.bytes_per_second()),
                    "slice uploaded"
                );
            }
            UploadEvent::Progress(p) => debug!(percent = (p * 100.0).round(), "progress"),
        }
    }

    if speed.total_bytes() > 0 {
        info!(
            bytes = speed.total_bytes(),
            average = %format_speed(speed.average()),
            "transfer done"
        );
    }
}

/// Formats a byte rate as `12.3 MiB/s`.
fn format_speed(bytes_per_second: f64) -> String {
    const UNITS: [&str; 4] = ["B/s", "KiB/s", "MiB/s", "GiB/s"];
    let mut value = bytes_per_second.max(0.0);
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
