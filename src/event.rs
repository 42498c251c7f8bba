//! Everything that can happen to the app: user intent from the shell plus
//! the responses capabilities feed back in. Capability responses arrive
//! pre-normalized (outcome types from [`crate::gateway`], result types from
//! the camera and detector capabilities) so the update loop never touches raw
//! transport values.

use serde::{Deserialize, Serialize};

use crate::capabilities::{CameraResult, DetectorResult};
use crate::gateway::{ApplicationPage, SubmitOutcome};
use crate::model::IdType;
use crate::AppError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // Identity step
    FirstNameChanged(String),
    LastNameChanged(String),
    EmailChanged(String),
    PhoneNumberChanged(String),
    IdTypeSelected(IdType),
    IdNumberChanged(String),

    // Residence step. Selecting higher in the hierarchy cascades defaults
    // downward; the handlers own that logic.
    ProvinceSelected(String),
    CantonSelected(String),
    DistrictSelected(String),
    MonthlyIncomeChanged(String),
    DocumentPicked { data: Vec<u8> },
    DocumentCleared,
    DocumentUploadRequested,
    DocumentUploadFinished(Result<String, AppError>),

    // Wizard navigation
    NextPressed,
    BackPressed,
    CancelPressed,

    // Selfie capture
    CameraStarted(CameraResult),
    FrameCaptured(CameraResult),
    CameraStopped(CameraResult),
    DetectorLoaded(DetectorResult),
    SelfieAnalyzed(DetectorResult),
    CapturePressed,
    RetakePressed,

    // Submission
    SubmitPressed,
    SubmitResponded(SubmitOutcome),
    ResultAcknowledged,

    // Review table
    ApplicationsOpened,
    WizardOpened,
    PageRequested(u32),
    PageLoaded {
        seq: u64,
        result: Result<ApplicationPage, AppError>,
    },
    RecordSelected(String),
    DetailClosed,
}
