//! Camera capability. The shell owns the actual media stream; the core only
//! sees the three operations below. The stream is a scoped resource: the app
//! must issue `Stop` on every path that leaves the capture step.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub struct Camera<Ev> {
    context: CapabilityContext<CameraOperation, Ev>,
}

impl<Ev> Capability<Ev> for Camera<Ev> {
    type Operation = CameraOperation;
    type MappedSelf<MappedEv> = Camera<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Camera::new(self.context.map_event(f))
    }
}

impl<Ev> Camera<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<CameraOperation, Ev>) -> Self {
        Self { context }
    }

    /// Acquire a stream. Resolves once the device reports frames flowing.
    pub fn start<F>(&self, facing: CameraFacing, make_event: F)
    where
        F: FnOnce(CameraResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(CameraOperation::Start { facing })
                .await;
            context.update_app(make_event(result));
        });
    }

    /// Grab a still frame from the running stream.
    pub fn capture_frame<F>(&self, make_event: F)
    where
        F: FnOnce(CameraResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(CameraOperation::CaptureFrame).await;
            context.update_app(make_event(result));
        });
    }

    /// Release the stream (stop all tracks). The shell acknowledges with
    /// `CameraOutput::Stopped` so the model can record the release.
    pub fn stop<F>(&self, make_event: F)
    where
        F: FnOnce(CameraResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(CameraOperation::Stop).await;
            context.update_app(make_event(result));
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraOperation {
    Start { facing: CameraFacing },
    CaptureFrame,
    Stop,
}

impl Operation for CameraOperation {
    type Output = CameraResult;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraFacing {
    #[default]
    Front,
    Back,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraOutput {
    Started,
    Frame { data: Vec<u8>, mime_type: String },
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera available")]
    Unavailable,
    #[error("camera failed: {0}")]
    Failed(String),
}

pub type CameraResult = Result<CameraOutput, CameraError>;

/// Sniff the frame format from magic bytes; shells are not trusted to report
/// the mime type correctly on every platform.
#[must_use]
pub fn sniff_mime_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if data.starts_with(b"RIFF") && data.len() >= 12 && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_frame_formats() {
        assert_eq!(sniff_mime_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(
            sniff_mime_type(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00]),
            Some("image/png")
        );
        let webp = [b'R', b'I', b'F', b'F', 0, 0, 0, 0, b'W', b'E', b'B', b'P'];
        assert_eq!(sniff_mime_type(&webp), Some("image/webp"));
        assert_eq!(sniff_mime_type(b"plain text"), None);
        assert_eq!(sniff_mime_type(&[]), None);
    }

    #[test]
    fn operations_round_trip_through_serde() {
        let op = CameraOperation::Start { facing: CameraFacing::Front };
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(serde_json::from_str::<CameraOperation>(&json).unwrap(), op);
    }
}
