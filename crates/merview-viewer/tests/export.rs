use std::sync::{Arc, Mutex};

use chrono::TimeZone as _;
use chrono::Utc;
use merview_viewer::export::strategy::{PngBlobStrategy, PngDataUrlStrategy};
use merview_viewer::{
    ArtifactExporter, DirectorySink, DownloadPayload, DownloadSink, ExportError, ExportOutcome,
    RasterStrategy,
};
use pretty_assertions::assert_eq;

const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="5" viewBox="0 0 10 5"><rect x="0" y="0" width="5" height="5" fill="#000000"/></svg>"##;

#[derive(Clone, Default)]
struct RecordingSink {
    delivered: Arc<Mutex<Vec<(String, DownloadPayload)>>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<(String, DownloadPayload)> {
        std::mem::take(&mut *self.delivered.lock().expect("sink lock"))
    }
}

impl DownloadSink for RecordingSink {
    fn deliver(&self, file_name: &str, payload: DownloadPayload) -> Result<(), ExportError> {
        self.delivered
            .lock()
            .expect("sink lock")
            .push((file_name.to_string(), payload));
        Ok(())
    }
}

struct FailingSink;

impl DownloadSink for FailingSink {
    fn deliver(&self, _file_name: &str, _payload: DownloadPayload) -> Result<(), ExportError> {
        Err(ExportError::DataUrl)
    }
}

#[derive(Clone, Default)]
struct BrokenStrategy {
    calls: Arc<Mutex<usize>>,
}

impl RasterStrategy for BrokenStrategy {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn serialize(
        &self,
        _pixmap: &tiny_skia::Pixmap,
        _quality: f32,
    ) -> Result<DownloadPayload, ExportError> {
        *self.calls.lock().expect("calls lock") += 1;
        Err(ExportError::serialize(self.name(), "encoder unavailable"))
    }
}

fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5)
        .single()
        .expect("valid date")
}

#[test]
fn empty_markup_touches_nothing() {
    let sink = RecordingSink::default();
    let strategy = BrokenStrategy::default();
    let exporter = ArtifactExporter::new(sink.clone())
        .with_strategies(vec![Box::new(strategy.clone())]);

    assert_eq!(exporter.export(""), ExportOutcome::Empty);
    assert!(sink.take().is_empty());
    assert_eq!(*strategy.calls.lock().expect("calls lock"), 0);
}

#[test]
fn undecodable_markup_never_downloads() {
    let sink = RecordingSink::default();
    let exporter = ArtifactExporter::new(sink.clone());

    assert_eq!(
        exporter.export("graph TD; A-->B"),
        ExportOutcome::DecodeFailed
    );
    assert!(sink.take().is_empty());
}

#[test]
fn primary_strategy_delivers_a_doubled_png_on_white() {
    let sink = RecordingSink::default();
    let exporter = ArtifactExporter::new(sink.clone());

    let outcome = exporter.export_at(SVG, fixed_time());
    assert_eq!(
        outcome,
        ExportOutcome::Delivered {
            file_name: "mermaid-diagram-2025-01-02T03-04-05.png".to_string(),
            strategy: "png-blob",
        }
    );

    let mut delivered = sink.take();
    assert_eq!(delivered.len(), 1);
    let (file_name, payload) = delivered.remove(0);
    assert_eq!(file_name, "mermaid-diagram-2025-01-02T03-04-05.png");
    assert!(matches!(payload, DownloadPayload::Blob { mime: "image/png", .. }));

    let png = image::load_from_memory(&payload.into_bytes().expect("bytes"))
        .expect("png decodes")
        .to_rgba8();
    assert_eq!(png.dimensions(), (20, 10));
    assert_eq!(png.get_pixel(3, 5).0, [0, 0, 0, 255]);
    assert_eq!(png.get_pixel(17, 5).0, [255, 255, 255, 255]);
}

#[test]
fn falls_back_when_the_primary_strategy_fails() {
    let sink = RecordingSink::default();
    let broken = BrokenStrategy::default();
    let exporter = ArtifactExporter::new(sink.clone()).with_strategies(vec![
        Box::new(broken.clone()),
        Box::new(PngDataUrlStrategy),
    ]);

    let outcome = exporter.export_at(SVG, fixed_time());
    assert!(matches!(
        outcome,
        ExportOutcome::Delivered {
            strategy: "png-data-url",
            ..
        }
    ));
    assert_eq!(*broken.calls.lock().expect("calls lock"), 1);

    let delivered = sink.take();
    assert_eq!(delivered.len(), 1);
    assert!(matches!(&delivered[0].1, DownloadPayload::DataUrl(url) if url.starts_with("data:image/png;base64,")));
}

#[test]
fn all_strategies_failing_is_reported() {
    let sink = RecordingSink::default();
    let exporter = ArtifactExporter::new(sink.clone())
        .with_strategies(vec![Box::new(BrokenStrategy::default())]);

    assert_eq!(exporter.export(SVG), ExportOutcome::SerializeFailed);
    assert!(sink.take().is_empty());
}

#[test]
fn delivery_errors_end_the_export() {
    let exporter = ArtifactExporter::new(FailingSink)
        .with_strategies(vec![Box::new(PngBlobStrategy), Box::new(PngDataUrlStrategy)]);

    assert_eq!(
        exporter.export_at(SVG, fixed_time()),
        ExportOutcome::DeliveryFailed {
            file_name: "mermaid-diagram-2025-01-02T03-04-05.png".to_string()
        }
    );
}

#[test]
fn directory_sink_writes_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("exports");
    let exporter = ArtifactExporter::new(DirectorySink::new(&out));

    let outcome = exporter.export_at(SVG, fixed_time());
    assert!(outcome.is_delivered());

    let written = out.join("mermaid-diagram-2025-01-02T03-04-05.png");
    let bytes = std::fs::read(&written).expect("exported file");
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}
