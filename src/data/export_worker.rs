//! Background export.
//!
//! Serializing a large view can take a while, so the payload is built on a
//! worker thread. The request owns a snapshot of the derived rows: filter or
//! sort changes made after the request have no effect on it. Results come
//! back on a channel; there is no cancellation and no timeout.

use crate::data::data_exporter::{DataExporter, ExportData, ExportFormat};
use crate::data::datatable::DataValue;
use crate::error::ExportError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

/// Message posted to the export worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum ExportRequest {
    Write {
        data: Vec<Vec<DataValue>>,
        headers: Vec<String>,
    },
}

impl From<ExportData> for ExportRequest {
    fn from(export: ExportData) -> Self {
        ExportRequest::Write {
            data: export.rows,
            headers: export.headers,
        }
    }
}

/// Message sent back by the export worker
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum ExportUpdate {
    Written {
        filename: String,
        payload: Vec<u8>,
    },
    ExportFailed {
        #[serde(serialize_with = "serialize_error")]
        error: ExportError,
    },
}

fn serialize_error<S: serde::Serializer>(
    error: &ExportError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Turns headers and rows into a downloadable byte stream
pub trait ExportSink: Send + 'static {
    fn extension(&self) -> &str;

    fn write(&self, headers: &[String], rows: &[Vec<DataValue>]) -> Result<Vec<u8>, ExportError>;
}

impl ExportSink for ExportFormat {
    fn extension(&self) -> &str {
        ExportFormat::extension(*self)
    }

    fn write(&self, headers: &[String], rows: &[Vec<DataValue>]) -> Result<Vec<u8>, ExportError> {
        DataExporter::serialize(headers, rows, *self)
    }
}

/// Spawn a background export thread.
///
/// Exactly one update is sent per request. A dropped receiver is ignored.
pub fn spawn_export<S: ExportSink>(
    request: ExportRequest,
    sink: S,
    filename_prefix: impl Into<String>,
    sender: Sender<ExportUpdate>,
) -> JoinHandle<()> {
    let filename_prefix = filename_prefix.into();

    std::thread::spawn(move || {
        let ExportRequest::Write { data, headers } = request;
        tracing::debug!(
            target: "export",
            "Export worker writing {} rows x {} columns",
            data.len(),
            headers.len()
        );

        let update = match sink.write(&headers, &data) {
            Ok(payload) => {
                let filename =
                    DataExporter::export_filename(&filename_prefix, sink.extension(), Utc::now());
                tracing::info!(
                    target: "export",
                    "Export ready: {} ({} bytes)",
                    filename,
                    payload.len()
                );
                ExportUpdate::Written { filename, payload }
            }
            Err(error) => {
                tracing::warn!(target: "export", "Export failed: {}", error);
                ExportUpdate::ExportFailed { error }
            }
        };

        let _ = sender.send(update);
    })
}

/// Spawn an export and hand back the channel its result arrives on
pub fn request_export<S: ExportSink>(
    request: ExportRequest,
    sink: S,
    filename_prefix: impl Into<String>,
) -> Receiver<ExportUpdate> {
    let (sender, receiver) = mpsc::channel();
    spawn_export(request, sink, filename_prefix, sender);
    receiver
}

/// Block until the worker reports, turning a failure into an error
pub fn wait_for_export(receiver: &Receiver<ExportUpdate>) -> Result<(String, Vec<u8>), ExportError> {
    match receiver.recv() {
        Ok(ExportUpdate::Written { filename, payload }) => Ok((filename, payload)),
        Ok(ExportUpdate::ExportFailed { error }) => Err(error),
        Err(_) => Err(ExportError::WorkerDisconnected),
    }
}
