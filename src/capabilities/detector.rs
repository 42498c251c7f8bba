//! Face-presence detector capability. Detection itself is an external
//! library on the shell side (a tiny face-detection model loaded
//! asynchronously); the core only asks "is there a face in this frame" and
//! gates submission on the answer.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub struct FaceDetector<Ev> {
    context: CapabilityContext<DetectorOperation, Ev>,
}

impl<Ev> Capability<Ev> for FaceDetector<Ev> {
    type Operation = DetectorOperation;
    type MappedSelf<MappedEv> = FaceDetector<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        FaceDetector::new(self.context.map_event(f))
    }
}

impl<Ev> FaceDetector<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<DetectorOperation, Ev>) -> Self {
        Self { context }
    }

    /// Load the detection model. Independent of camera startup; capture is
    /// only enabled once both have completed.
    pub fn load_model<F>(&self, make_event: F)
    where
        F: FnOnce(DetectorResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(DetectorOperation::LoadModel).await;
            context.update_app(make_event(result));
        });
    }

    /// Run detection over a captured frame.
    pub fn detect_faces<F>(&self, image: Vec<u8>, make_event: F)
    where
        F: FnOnce(DetectorResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context
                .request_from_shell(DetectorOperation::DetectFaces { image })
                .await;
            context.update_app(make_event(result));
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorOperation {
    LoadModel,
    DetectFaces { image: Vec<u8> },
}

impl Operation for DetectorOperation {
    type Output = DetectorResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorOutput {
    ModelLoaded,
    Faces { count: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DetectorError {
    #[error("failed to load detection model: {0}")]
    LoadFailed(String),
    #[error("face detection failed: {0}")]
    DetectFailed(String),
    #[error("face detection unavailable on this device")]
    Unavailable,
}

pub type DetectorResult = Result<DetectorOutput, DetectorError>;
