use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::validate::{IdentityErrors, ResidenceErrors};
use crate::{AppError, REVIEW_PAGE_SIZE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdType {
    Physical,
    Legal,
    Passport,
}

impl IdType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Legal => "legal",
            Self::Passport => "passport",
        }
    }

    /// Format hint shown in the id-number field for the chosen type.
    #[must_use]
    pub const fn number_placeholder(self) -> &'static str {
        match self {
            Self::Physical | Self::Passport => "1-2345-6789",
            Self::Legal => "3-101-45678",
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to captured image evidence: either the raw data (base64)
/// or a URL on the asset host after upload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvidenceRef {
    Inline(String),
    Hosted(String),
}

impl EvidenceRef {
    #[must_use]
    pub fn as_inline(&self) -> Option<&str> {
        match self {
            Self::Inline(data) => Some(data),
            Self::Hosted(_) => None,
        }
    }

    #[must_use]
    pub fn as_hosted(&self) -> Option<&str> {
        match self {
            Self::Hosted(url) => Some(url),
            Self::Inline(_) => None,
        }
    }
}

// Redact image payloads; base64 blobs are noise and URLs can identify people.
impl fmt::Debug for EvidenceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(data) => write!(f, "EvidenceRef::Inline({} bytes)", data.len()),
            Self::Hosted(_) => f.write_str("EvidenceRef::Hosted([REDACTED])"),
        }
    }
}

/// The in-progress application. Created empty when the wizard mounts, mutated
/// field-by-field through events, snapshotted into a payload on submission.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub id_type: Option<IdType>,
    pub id_number: String,
    pub department: String,
    pub municipality: String,
    pub address: String,
    pub monthly_income: String,
    pub document: Option<EvidenceRef>,
    pub selfie: Option<EvidenceRef>,
}

// Redact debug output because this is applicant PII.
impl fmt::Debug for ApplicationDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationDraft")
            .field("first_name_present", &!self.first_name.is_empty())
            .field("last_name_present", &!self.last_name.is_empty())
            .field("email_present", &!self.email.is_empty())
            .field("phone_number_present", &!self.phone_number.is_empty())
            .field("id_type", &self.id_type)
            .field("id_number_present", &!self.id_number.is_empty())
            .field("department", &self.department)
            .field("municipality", &self.municipality)
            .field("address", &self.address)
            .field("monthly_income_present", &!self.monthly_income.is_empty())
            .field("document_present", &self.document.is_some())
            .field("selfie_present", &self.selfie.is_some())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardStep {
    #[default]
    Identity,
    Residence,
    Selfie,
}

impl WizardStep {
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Identity => 1,
            Self::Residence => 2,
            Self::Selfie => 3,
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Identity => Some(Self::Residence),
            Self::Residence => Some(Self::Selfie),
            Self::Selfie => None,
        }
    }

    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Identity => None,
            Self::Residence => Some(Self::Identity),
            Self::Selfie => Some(Self::Residence),
        }
    }
}

/// One-shot submission guard. `Idle` is the only state from which a network
/// submission may be started; it never returns to `Idle` except through a
/// full cancel/reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitStatus {
    #[default]
    Idle,
    InFlight,
    Settled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitFeedback {
    Success(String),
    Duplicate(String),
    Failure(String),
}

impl SubmitFeedback {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Duplicate(m) | Self::Failure(m) => m,
        }
    }
}

/// Lifecycle of the selfie camera stream. The stream is a scoped device
/// resource: every exit path from the selfie step must move it to `Released`
/// via a Stop operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraPhase {
    #[default]
    Idle,
    Starting,
    Streaming,
    Released,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    #[default]
    Wizard,
    Applications,
}

/// Server-side application record, read-only from this core's perspective.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub id_type: String,
    pub id_number: String,
    pub department: String,
    pub municipality: String,
    pub address: String,
    pub monthly_income: f64,
    #[serde(default)]
    pub document_photos: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewState {
    pub records: Vec<ApplicationRecord>,
    pub total_records: u32,
    pub page: u32,
    pub page_size: u32,
    pub loading: bool,
    /// Sequence number of the newest page fetch; older responses are stale.
    pub latest_seq: u64,
    pub selected_id: Option<String>,
    pub error: Option<AppError>,
}

impl Default for ReviewState {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            total_records: 0,
            page: 1,
            page_size: REVIEW_PAGE_SIZE,
            loading: false,
            latest_seq: 0,
            selected_id: None,
            error: None,
        }
    }
}

impl ReviewState {
    /// `ceil(total_records / page_size)`, at least 1 so page clamping is
    /// well-defined before the first fetch resolves.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 1;
        }
        self.total_records.div_ceil(self.page_size).max(1)
    }

    #[must_use]
    pub fn selected_record(&self) -> Option<&ApplicationRecord> {
        let id = self.selected_id.as_deref()?;
        self.records.iter().find(|r| r.id == id)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Model {
    pub screen: Screen,

    // Wizard
    pub step: WizardStep,
    pub draft: ApplicationDraft,
    pub identity_errors: IdentityErrors,
    pub residence_errors: ResidenceErrors,
    pub document_error: Option<String>,
    pub selfie_error: Option<String>,
    pub uploading_document: bool,

    // Submission
    pub submit: SubmitStatus,
    pub feedback: Option<SubmitFeedback>,
    /// Minted per wizard session; sent as the Idempotency-Key of the one
    /// submission this session may make.
    pub idempotency_key: String,

    // Selfie capture
    pub camera: CameraPhase,
    pub detector_ready: bool,
    pub analyzing_selfie: bool,

    // Review table
    pub review: ReviewState,

    pub active_error: Option<AppError>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            screen: Screen::Wizard,
            step: WizardStep::Identity,
            draft: ApplicationDraft::default(),
            identity_errors: IdentityErrors::default(),
            residence_errors: ResidenceErrors::default(),
            document_error: None,
            selfie_error: None,
            uploading_document: false,
            submit: SubmitStatus::Idle,
            feedback: None,
            idempotency_key: Uuid::new_v4().to_string(),
            camera: CameraPhase::Idle,
            detector_ready: false,
            analyzing_selfie: false,
            review: ReviewState::default(),
            active_error: None,
        }
    }
}

impl Model {
    /// Both async setups must have completed before capture is allowed.
    #[must_use]
    pub fn can_capture(&self) -> bool {
        self.camera == CameraPhase::Streaming && self.detector_ready && !self.analyzing_selfie
    }

    /// Full reset back to an empty step-1 draft. A new idempotency key is
    /// minted, so the next session may submit again.
    pub fn reset_wizard(&mut self) {
        self.step = WizardStep::Identity;
        self.draft = ApplicationDraft::default();
        self.identity_errors = IdentityErrors::default();
        self.residence_errors = ResidenceErrors::default();
        self.document_error = None;
        self.selfie_error = None;
        self.uploading_document = false;
        self.submit = SubmitStatus::Idle;
        self.feedback = None;
        self.idempotency_key = Uuid::new_v4().to_string();
        // detector_ready survives the reset; the model stays loaded across sessions
        self.analyzing_selfie = false;
        self.active_error = None;
    }
}
