//! The upload flow for a single file.

use std::path::Path;

use futures_util::{TryStreamExt, stream};
use panup_openapi::{Error as ApiError, SliceOutcome};
use panup_protocol::{AccessToken, CreateFileRequest, Credentials, SliceForm};
use panup_transfer::{Slice, SliceReader, SourceFile, TransferError, describe_file, slice_count};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::StorageApi;
use crate::error::UploadError;
use crate::output::OutputSink;
use crate::types::{
    FlowStage, Negotiation, PendingUpload, UploadConfig, UploadEvent, UploadOutcome,
};

/// Progress reached once negotiation is done; slices fill up to [`SLICES_DONE`].
const NEGOTIATED: f64 = 0.1;
const SLICES_DONE: f64 = 0.9;

#[derive(Debug, Clone, Copy)]
struct SliceReport {
    number: u32,
    bytes: u64,
    skipped: bool,
}

#[derive(Debug, Default)]
struct SliceTally {
    sent: u32,
    skipped: u32,
    bytes: u64,
}

/// Runs the upload of one file against a [`StorageApi`].
pub struct UploadFlow<'a> {
    api: &'a dyn StorageApi,
    sink: &'a dyn OutputSink,
    config: UploadConfig,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
    cancel: CancellationToken,
}

impl<'a> UploadFlow<'a> {
    pub fn new(api: &'a dyn StorageApi, sink: &'a dyn OutputSink, config: UploadConfig) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            api,
            sink,
            config,
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `cancel` instead of a fresh token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Returns a cancellation token for this upload.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Uploads `path` and returns its direct link.
    ///
    /// Stages run strictly in order and the first failure ends the run.
    /// Nothing is cleaned up server-side on failure.
    pub async fn run(
        &self,
        path: &Path,
        creds: &Credentials,
    ) -> Result<UploadOutcome, UploadError> {
        self.check_cancelled()?;
        self.emit(UploadEvent::Stage(FlowStage::Started));

        debug!(path = %path.display(), "hashing source file");
        let source = tokio::task::spawn_blocking({
            let path = path.to_path_buf();
            move || describe_file(&path)
        })
        .await??;
        info!(
            file = %source.file_name,
            size = source.size,
            md5 = %source.md5,
            "source file ready"
        );

        self.check_cancelled()?;
        let token = self.authenticate(creds).await?;
        self.emit_stage(FlowStage::Authenticated, 0.05);

        self.check_cancelled()?;
        let negotiation = self.negotiate(&token, &source).await?;
        self.emit_stage(FlowStage::Negotiated, NEGOTIATED);

        let reused = matches!(negotiation, Negotiation::Reused { .. });
        let (file_id, tally) = match negotiation {
            Negotiation::Reused { file_id } => {
                info!(file_id, "content already stored, skipping transfer");
                self.emit_stage(FlowStage::Reused, SLICES_DONE);
                (file_id, SliceTally::default())
            }
            Negotiation::PendingUpload(pending) => {
                self.emit(UploadEvent::Stage(FlowStage::SlicesUploading));
                let tally = self.upload_slices(&token, &pending, &source).await?;
                self.emit_stage(FlowStage::SlicesComplete, SLICES_DONE);

                self.check_cancelled()?;
                let file_id = self.finalize(&token, &pending).await?;
                (file_id, tally)
            }
        };
        self.emit_stage(FlowStage::Finalized, 0.95);

        self.check_cancelled()?;
        let url = self.resolve_link(&token, file_id).await?;
        self.emit_stage(FlowStage::LinkResolved, 1.0);
        info!(file_id, %url, "direct link resolved");

        self.sink
            .set_output(&self.config.output_key, &url)
            .map_err(|source| UploadError::Output {
                url: url.clone(),
                source,
            })?;

        Ok(UploadOutcome {
            file_id,
            url,
            reused,
            slices_sent: tally.sent,
            slices_skipped: tally.skipped,
        })
    }

    async fn authenticate(&self, creds: &Credentials) -> Result<AccessToken, UploadError> {
        debug!(client_id = %creds.client_id, "authenticating");
        let resp = self
            .api
            .access_token(creds)
            .await
            .map_err(UploadError::Auth)?;
        if resp.access_token.is_empty() {
            return Err(UploadError::Auth(ApiError::MissingField("accessToken")));
        }
        match resp.expired_at {
            Some(expires_at) => info!(%expires_at, "access token received"),
            None => info!("access token received"),
        }
        Ok(AccessToken::new(resp.access_token))
    }

    async fn negotiate(
        &self,
        token: &AccessToken,
        source: &SourceFile,
    ) -> Result<Negotiation, UploadError> {
        let req = CreateFileRequest {
            parent_file_id: self.config.parent_id,
            filename: source.file_name.clone(),
            etag: source.md5.clone(),
            size: source.size,
            duplicate: self.config.duplicate,
            contain_dir: false,
        };
        info!(
            parent_id = req.parent_file_id,
            filename = %req.filename,
            duplicate = %req.duplicate,
            "negotiating upload"
        );
        let resp = self
            .api
            .create_file(token, &req)
            .await
            .map_err(UploadError::Negotiation)?;
        Negotiation::from_response(resp, self.api.api_base()).map_err(UploadError::Negotiation)
    }

    /// Sends every slice of `source`, at most `slice_concurrency` at a time.
    ///
    /// Slices are read and dispatched in ascending order; with concurrency
    /// above one they may complete out of order.
    async fn upload_slices(
        &self,
        token: &AccessToken,
        pending: &PendingUpload,
        source: &SourceFile,
    ) -> Result<SliceTally, UploadError> {
        let total = slice_count(source.size, pending.slice_size)?;
        let concurrency = self.config.slice_concurrency.max(1);
        info!(
            host = %pending.upload_host,
            slice_size = pending.slice_size,
            slices = total,
            concurrency,
            "uploading slices"
        );

        let reader = tokio::task::spawn_blocking({
            let path = source.path.clone();
            let slice_size = pending.slice_size;
            move || SliceReader::new(&path, slice_size)
        })
        .await??;

        let slices = stream::try_unfold(reader, |mut reader| async move {
            let (reader, next) = tokio::task::spawn_blocking(move || {
                let next = reader.next_slice();
                (reader, next)
            })
            .await?;
            Ok::<_, UploadError>(next?.map(|slice| (slice, reader)))
        });

        let uploads = slices
            .map_ok(|slice| self.send_slice(token, pending, slice))
            .try_buffer_unordered(concurrency);
        let mut uploads = std::pin::pin!(uploads);

        let mut tally = SliceTally::default();
        while let Some(report) = uploads.try_next().await? {
            tally.bytes += report.bytes;
            if report.skipped {
                tally.skipped += 1;
            } else {
                tally.sent += 1;
            }

            self.emit(UploadEvent::SliceUploaded {
                number: report.number,
                total,
                bytes: report.bytes,
                skipped: report.skipped,
            });
            if source.size > 0 {
                let fraction = tally.bytes as f64 / source.size as f64;
                self.emit(UploadEvent::Progress(
                    NEGOTIATED + fraction * (SLICES_DONE - NEGOTIATED),
                ));
            }
        }

        if tally.bytes != source.size {
            return Err(TransferError::InvalidSource(format!(
                "{} changed during upload ({} bytes hashed, {} bytes sent)",
                source.path.display(),
                source.size,
                tally.bytes
            ))
            .into());
        }

        info!(
            sent = tally.sent,
            skipped = tally.skipped,
            bytes = tally.bytes,
            "all slices uploaded"
        );
        Ok(tally)
    }

    async fn send_slice(
        &self,
        token: &AccessToken,
        pending: &PendingUpload,
        slice: Slice,
    ) -> Result<SliceReport, UploadError> {
        self.check_cancelled()?;

        let number = slice.number;
        let bytes = slice.data.len() as u64;
        let form = SliceForm {
            preupload_id: pending.preupload_id.clone(),
            slice_no: number,
            slice_md5: slice.md5,
        };
        debug!(slice = number, bytes, md5 = %form.slice_md5, "sending slice");

        let outcome = self
            .api
            .upload_slice(token, &pending.upload_host, &form, slice.data)
            .await
            .map_err(|source| UploadError::SliceUpload {
                slice_no: number,
                source,
            })?;

        let skipped = outcome == SliceOutcome::AlreadyUploaded;
        if skipped {
            warn!(slice = number, "slice already uploaded, skipping");
        }
        Ok(SliceReport {
            number,
            bytes,
            skipped,
        })
    }

    async fn finalize(
        &self,
        token: &AccessToken,
        pending: &PendingUpload,
    ) -> Result<i64, UploadError> {
        info!(preupload_id = %pending.preupload_id, "finalizing upload");
        let resp = self
            .api
            .upload_complete(token, &pending.upload_host, &pending.preupload_id)
            .await
            .map_err(UploadError::Completion)?;
        if resp.file_id <= 0 {
            return Err(UploadError::Completion(ApiError::MissingField("fileID")));
        }
        if !resp.completed {
            warn!(file_id = resp.file_id, "server did not flag the upload as completed");
        }
        Ok(resp.file_id)
    }

    async fn resolve_link(&self, token: &AccessToken, file_id: i64) -> Result<String, UploadError> {
        debug!(file_id, "resolving direct link");
        let resp = self
            .api
            .direct_link(token, file_id)
            .await
            .map_err(UploadError::LinkResolution)?;
        if resp.url.is_empty() {
            return Err(UploadError::LinkResolution(ApiError::MissingField("url")));
        }
        Ok(resp.url)
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn emit_stage(&self, stage: FlowStage, progress: f64) {
        self.emit(UploadEvent::Stage(stage));
        self.emit(UploadEvent::Progress(progress));
    }

    /// Events are dropped rather than awaited when nobody drains the channel.
    fn emit(&self, event: UploadEvent) {
        if let UploadEvent::Stage(stage) = &event {
            debug!(%stage, "upload stage");
        }
        if let Err(mpsc::error::TrySendError::Full(_)) = self.events_tx.try_send(event) {
            debug!("event channel full, dropping event");
        }
    }
}
