//! The update loop. Three-step application wizard (identity, residence and
//! document, selfie and submit) plus the read-only review table. All state
//! transitions live here; the capabilities only carry requests out and feed
//! normalized results back in as events.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capabilities::{
    sniff_mime_type, CameraError, CameraFacing, CameraOutput, Capabilities, DetectorOutput,
};
use crate::event::Event;
use crate::gateway::{self, SubmitOutcome};
use crate::model::{
    ApplicationDraft, ApplicationRecord, CameraPhase, EvidenceRef, IdType, Model, Screen,
    SubmitFeedback, SubmitStatus, WizardStep,
};
use crate::validate::{self, IdentityErrors, ResidenceErrors};
use crate::{cloudinary_upload_url, geography, AppError, ErrorKind, MAX_IMAGE_BYTES};

const TOTAL_STEPS: u8 = 3;

#[derive(Default)]
pub struct App;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub screen: Screen,
    pub wizard: WizardView,
    pub review: ReviewView,
    pub error: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardView {
    pub step: WizardStep,
    pub step_number: u8,
    pub total_steps: u8,
    pub draft: ApplicationDraft,
    /// Format hint for the id-number input, keyed off the selected id type.
    pub id_number_placeholder: String,
    pub identity_errors: IdentityErrors,
    pub residence_errors: ResidenceErrors,
    pub document_error: Option<String>,
    pub provinces: Vec<String>,
    pub cantons: Vec<String>,
    pub districts: Vec<String>,
    pub uploading_document: bool,
    pub camera: CameraPhase,
    pub can_capture: bool,
    pub analyzing_selfie: bool,
    pub selfie_error: Option<String>,
    pub submitting: bool,
    pub feedback: Option<SubmitFeedback>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewView {
    pub records: Vec<ApplicationRecord>,
    pub page: u32,
    pub total_pages: u32,
    pub total_records: u32,
    pub loading: bool,
    pub selected: Option<ApplicationRecord>,
    pub error: Option<String>,
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Self::Event, model: &mut Self::Model, caps: &Self::Capabilities) {
        match event {
            // Identity step
            Event::FirstNameChanged(value) => {
                model.draft.first_name = value;
                Self::touch_identity(model);
            }
            Event::LastNameChanged(value) => {
                model.draft.last_name = value;
                Self::touch_identity(model);
            }
            Event::EmailChanged(value) => {
                model.draft.email = value;
                Self::touch_identity(model);
            }
            Event::PhoneNumberChanged(value) => {
                model.draft.phone_number = value;
                Self::touch_identity(model);
            }
            Event::IdTypeSelected(id_type) => {
                model.draft.id_type = Some(id_type);
                Self::touch_identity(model);
            }
            Event::IdNumberChanged(value) => {
                model.draft.id_number = value;
                Self::touch_identity(model);
            }

            // Residence step. Picking higher in the hierarchy snaps the
            // levels below to the first valid choice so the three selects
            // can never disagree.
            Event::ProvinceSelected(name) => {
                if model.draft.department != name {
                    match geography::default_residence(&name) {
                        Some((canton, district)) => {
                            model.draft.municipality = canton.to_string();
                            model.draft.address = district.to_string();
                        }
                        None => {
                            model.draft.municipality.clear();
                            model.draft.address.clear();
                        }
                    }
                    model.draft.department = name;
                    Self::touch_residence(model);
                }
            }
            Event::CantonSelected(name) => {
                if model.draft.municipality != name {
                    match geography::default_district(&model.draft.department, &name) {
                        Some(district) => model.draft.address = district.to_string(),
                        None => model.draft.address.clear(),
                    }
                    model.draft.municipality = name;
                    Self::touch_residence(model);
                }
            }
            Event::DistrictSelected(name) => {
                model.draft.address = name;
                Self::touch_residence(model);
            }
            Event::MonthlyIncomeChanged(value) => {
                model.draft.monthly_income = value;
                Self::touch_residence(model);
            }
            Event::DocumentPicked { data } => {
                if data.len() > MAX_IMAGE_BYTES {
                    model.document_error = Some(
                        AppError::new(ErrorKind::ImageTooLarge, "document photo too large")
                            .user_facing_message(),
                    );
                } else {
                    model.draft.document = Some(EvidenceRef::Inline(gateway::encode_image(&data)));
                    model.document_error = None;
                    Self::touch_residence(model);
                }
            }
            Event::DocumentCleared => {
                model.draft.document = None;
                model.document_error = None;
            }
            Event::DocumentUploadRequested => self.upload_document(model, caps),
            Event::DocumentUploadFinished(result) => {
                model.uploading_document = false;
                match result {
                    Ok(url) => {
                        model.draft.document = Some(EvidenceRef::Hosted(url));
                        model.document_error = None;
                    }
                    Err(e) => {
                        warn!(error = %e, "document upload failed");
                        model.document_error = Some(e.user_facing_message());
                    }
                }
            }

            // Navigation
            Event::NextPressed => match model.step {
                WizardStep::Identity => {
                    model.identity_errors = validate::identity_errors(&model.draft);
                    if model.identity_errors.is_clear() {
                        model.step = WizardStep::Residence;
                    }
                }
                WizardStep::Residence => {
                    model.residence_errors = validate::residence_errors(&model.draft);
                    if model.residence_errors.is_clear() {
                        model.step = WizardStep::Selfie;
                        Self::start_capture_session(model, caps);
                    }
                }
                // On the last step, advancing is submitting. The status
                // guard keeps this safe next to an explicit submit press.
                WizardStep::Selfie => self.submit(model, caps),
            },
            Event::BackPressed => {
                if let Some(previous) = model.step.previous() {
                    if model.step == WizardStep::Selfie {
                        Self::release_camera(model, caps);
                        model.analyzing_selfie = false;
                    }
                    model.step = previous;
                }
            }
            Event::CancelPressed => {
                Self::release_camera(model, caps);
                model.reset_wizard();
                model.camera = CameraPhase::Idle;
            }

            // Selfie capture
            Event::CameraStarted(result) => match result {
                Ok(CameraOutput::Started) if model.camera == CameraPhase::Starting => {
                    model.camera = CameraPhase::Streaming;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "camera failed to start");
                    model.camera = CameraPhase::Idle;
                    model.selfie_error = Some(camera_error(&e).user_facing_message());
                }
            },
            Event::CapturePressed => {
                if model.can_capture() {
                    // Blocks further captures until the frame resolves.
                    model.analyzing_selfie = true;
                    caps.camera.capture_frame(Event::FrameCaptured);
                }
            }
            Event::FrameCaptured(result) => match result {
                Ok(CameraOutput::Frame { data, .. }) => {
                    if data.len() > MAX_IMAGE_BYTES {
                        model.analyzing_selfie = false;
                        model.selfie_error = Some(
                            AppError::new(ErrorKind::ImageTooLarge, "selfie frame too large")
                                .user_facing_message(),
                        );
                    } else {
                        model.draft.selfie =
                            Some(EvidenceRef::Inline(gateway::encode_image(&data)));
                        model.selfie_error = None;
                        caps.detector.detect_faces(data, Event::SelfieAnalyzed);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    model.analyzing_selfie = false;
                    model.selfie_error = Some(camera_error(&e).user_facing_message());
                }
            },
            Event::SelfieAnalyzed(result) => match result {
                Ok(DetectorOutput::Faces { count }) => {
                    model.analyzing_selfie = false;
                    if count >= 1 {
                        model.selfie_error = None;
                        Self::release_camera(model, caps);
                    } else {
                        model.draft.selfie = None;
                        model.selfie_error = Some(
                            "No face detected. Center your face in the frame and try again."
                                .into(),
                        );
                    }
                }
                Ok(DetectorOutput::ModelLoaded) => {}
                Err(e) => {
                    warn!(error = %e, "selfie analysis failed");
                    model.analyzing_selfie = false;
                    model.draft.selfie = None;
                    model.selfie_error = Some(
                        AppError::new(
                            ErrorKind::FaceDetection,
                            "The photo could not be analyzed. Please try again.",
                        )
                        .user_facing_message(),
                    );
                }
            },
            Event::DetectorLoaded(result) => match result {
                Ok(DetectorOutput::ModelLoaded) => model.detector_ready = true,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "detector model failed to load");
                    model.selfie_error =
                        Some("Face detection could not be initialized. Please try again.".into());
                }
            },
            Event::RetakePressed => {
                if model.step == WizardStep::Selfie {
                    model.draft.selfie = None;
                    model.selfie_error = None;
                    model.analyzing_selfie = false;
                    if !matches!(
                        model.camera,
                        CameraPhase::Starting | CameraPhase::Streaming
                    ) {
                        model.camera = CameraPhase::Starting;
                        caps.camera.start(CameraFacing::Front, Event::CameraStarted);
                    }
                }
            }
            Event::CameraStopped(_) => {
                if matches!(model.camera, CameraPhase::Starting | CameraPhase::Streaming) {
                    model.camera = CameraPhase::Released;
                }
            }

            // Submission
            Event::SubmitPressed => self.submit(model, caps),
            Event::SubmitResponded(outcome) => {
                // The guard settles on every outcome. A failed submission is
                // retried by cancelling and starting a fresh session with a
                // fresh idempotency key.
                model.submit = SubmitStatus::Settled;
                model.feedback = Some(match outcome {
                    SubmitOutcome::Accepted { message } => SubmitFeedback::Success(message),
                    SubmitOutcome::Duplicate => SubmitFeedback::Duplicate(
                        AppError::new(ErrorKind::Conflict, "duplicate application")
                            .user_facing_message(),
                    ),
                    SubmitOutcome::ServerError => SubmitFeedback::Failure(
                        AppError::new(ErrorKind::Internal, "submission rejected")
                            .user_facing_message(),
                    ),
                    SubmitOutcome::NetworkError => SubmitFeedback::Failure(
                        AppError::new(ErrorKind::Network, "submission unreachable")
                            .user_facing_message(),
                    ),
                });
            }
            Event::ResultAcknowledged => {
                let succeeded = model
                    .feedback
                    .as_ref()
                    .is_some_and(SubmitFeedback::is_success);
                model.feedback = None;
                if succeeded {
                    // A fresh session, and over to the review list to see
                    // the new record.
                    Self::release_camera(model, caps);
                    model.reset_wizard();
                    model.camera = CameraPhase::Idle;
                    model.screen = Screen::Applications;
                    Self::request_page(model, caps, 1);
                }
            }

            // Review table
            Event::ApplicationsOpened => {
                Self::release_camera(model, caps);
                model.screen = Screen::Applications;
                Self::request_page(model, caps, 1);
            }
            Event::WizardOpened => {
                model.screen = Screen::Wizard;
            }
            Event::PageRequested(page) => {
                let pages = model.review.total_pages();
                // Re-requesting the shown page is a no-op unless its fetch
                // failed, in which case it is the retry path.
                let same_page = page == model.review.page && model.review.error.is_none();
                if page == 0 || page > pages || same_page {
                    debug!(page, pages, "ignoring page request");
                } else {
                    Self::request_page(model, caps, page);
                }
            }
            Event::PageLoaded { seq, result } => {
                if seq == model.review.latest_seq {
                    model.review.loading = false;
                    match result {
                        Ok(page) => {
                            model.review.records = page.data;
                            model.review.total_records = page.total_records;
                            model.review.error = None;
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to load applications page");
                            model.review.error = Some(e);
                        }
                    }
                } else {
                    debug!(seq, latest = model.review.latest_seq, "discarding stale page");
                }
            }
            Event::RecordSelected(id) => {
                if model.review.records.iter().any(|r| r.id == id) {
                    model.review.selected_id = Some(id);
                }
            }
            Event::DetailClosed => {
                model.review.selected_id = None;
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Self::Model) -> Self::ViewModel {
        let draft = &model.draft;
        let cantons = if draft.department.is_empty() {
            Vec::new()
        } else {
            owned(geography::canton_names(&draft.department))
        };
        let districts = if draft.municipality.is_empty() {
            Vec::new()
        } else {
            owned(geography::district_names(&draft.department, &draft.municipality))
        };

        ViewModel {
            screen: model.screen,
            wizard: WizardView {
                step: model.step,
                step_number: model.step.number(),
                total_steps: TOTAL_STEPS,
                draft: draft.clone(),
                id_number_placeholder: draft
                    .id_type
                    .map(IdType::number_placeholder)
                    .unwrap_or_default()
                    .to_string(),
                identity_errors: model.identity_errors.clone(),
                residence_errors: model.residence_errors.clone(),
                document_error: model.document_error.clone(),
                provinces: owned(geography::province_names()),
                cantons,
                districts,
                uploading_document: model.uploading_document,
                camera: model.camera,
                can_capture: model.can_capture(),
                analyzing_selfie: model.analyzing_selfie,
                selfie_error: model.selfie_error.clone(),
                submitting: model.submit == SubmitStatus::InFlight,
                feedback: model.feedback.clone(),
            },
            review: ReviewView {
                records: model.review.records.clone(),
                page: model.review.page,
                total_pages: model.review.total_pages(),
                total_records: model.review.total_records,
                loading: model.review.loading,
                selected: model.review.selected_record().cloned(),
                error: model.review.error.as_ref().map(AppError::user_facing_message),
            },
            error: model.active_error.as_ref().map(AppError::user_facing_message),
        }
    }
}

impl App {
    /// Re-run a step's validation on edit, but only once its errors have been
    /// surfaced by a Next press. Untouched forms stay clean.
    fn touch_identity(model: &mut Model) {
        if !model.identity_errors.is_clear() {
            model.identity_errors = validate::identity_errors(&model.draft);
        }
    }

    fn touch_residence(model: &mut Model) {
        if !model.residence_errors.is_clear() {
            model.residence_errors = validate::residence_errors(&model.draft);
        }
    }

    /// Camera and detector start in parallel on entering the selfie step;
    /// capture unlocks once both report ready.
    fn start_capture_session(model: &mut Model, caps: &Capabilities) {
        model.camera = CameraPhase::Starting;
        model.selfie_error = None;
        caps.camera.start(CameraFacing::Front, Event::CameraStarted);
        if !model.detector_ready {
            caps.detector.load_model(Event::DetectorLoaded);
        }
    }

    /// Issue a Stop for any live stream. Called on every path that leaves the
    /// selfie step, on cancel, and after an accepted capture.
    fn release_camera(model: &mut Model, caps: &Capabilities) {
        if matches!(model.camera, CameraPhase::Starting | CameraPhase::Streaming) {
            caps.camera.stop(Event::CameraStopped);
            model.camera = CameraPhase::Released;
        }
    }

    fn upload_document(&self, model: &mut Model, caps: &Capabilities) {
        if model.uploading_document {
            return;
        }
        let Some(inline) = model.draft.document.as_ref().and_then(EvidenceRef::as_inline)
        else {
            model.document_error = Some("Attach a document photo before uploading.".into());
            return;
        };
        match gateway::decode_image(inline) {
            Ok(bytes) => {
                model.uploading_document = true;
                model.document_error = None;
                let filename = match sniff_mime_type(&bytes) {
                    Some("image/png") => "document.png",
                    Some("image/webp") => "document.webp",
                    _ => "document.jpg",
                };
                let part = gateway::multipart_image_upload(&bytes, filename);
                caps.http
                    .post(cloudinary_upload_url())
                    .header("content-type", part.content_type.as_str())
                    .body_bytes(part.body)
                    .send(|result| {
                        Event::DocumentUploadFinished(gateway::upload_outcome(result))
                    });
            }
            Err(e) => {
                warn!(error = %e, "stored document was not valid base64");
                model.document_error = Some(e.user_facing_message());
            }
        }
    }

    fn submit(&self, model: &mut Model, caps: &Capabilities) {
        if model.submit != SubmitStatus::Idle {
            debug!(status = ?model.submit, "ignoring submit press");
            return;
        }
        if model.draft.selfie.is_none() {
            model.selfie_error = Some("Take a selfie before submitting.".into());
            return;
        }

        let body = gateway::build_submission(&model.draft).and_then(|payload| {
            serde_json::to_vec(&payload)
                .map_err(|e| AppError::new(ErrorKind::Serialization, e.to_string()))
        });
        match body {
            Ok(body) => {
                // InFlight before the request leaves, so a second press can
                // never race a second submission out.
                model.submit = SubmitStatus::InFlight;
                model.feedback = None;
                model.active_error = None;
                caps.http
                    .post(gateway::submit_url())
                    .header("content-type", "application/json")
                    .header(gateway::IDEMPOTENCY_HEADER, model.idempotency_key.as_str())
                    .body_bytes(body)
                    .send(|result| Event::SubmitResponded(gateway::submit_outcome(result)));
            }
            Err(e) => {
                warn!(error = %e, "submission snapshot failed");
                model.active_error = Some(e);
            }
        }
    }

    fn request_page(model: &mut Model, caps: &Capabilities, page: u32) {
        model.review.loading = true;
        model.review.error = None;
        model.review.page = page;
        model.review.latest_seq += 1;
        let seq = model.review.latest_seq;
        caps.http
            .get(gateway::list_url(page, model.review.page_size))
            .send(move |result| Event::PageLoaded {
                seq,
                result: gateway::list_outcome(result),
            });
    }
}

fn camera_error(e: &CameraError) -> AppError {
    let kind = match e {
        CameraError::PermissionDenied => ErrorKind::CameraPermissionDenied,
        CameraError::Unavailable | CameraError::Failed(_) => ErrorKind::Camera,
    };
    AppError::new(kind, e.to_string())
}

fn owned(names: Vec<&'static str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}
