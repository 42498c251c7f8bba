mod camera;
mod detector;

pub use self::camera::{
    sniff_mime_type, Camera, CameraError, CameraFacing, CameraOperation, CameraOutput,
    CameraResult,
};
pub use self::detector::{
    DetectorError, DetectorOperation, DetectorOutput, DetectorResult, FaceDetector,
};

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::app::App;
use crate::event::Event;

// Field types written out in full: the Effect derive reads them
// syntactically and rejects aliases.
#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub camera: Camera<Event>,
    pub detector: FaceDetector<Event>,
}
