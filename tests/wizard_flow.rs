//! End-to-end wizard behavior through the public event surface: step gates,
//! the capture session lifecycle, and the one-shot submission guard.

use crux_core::testing::AppTester;
use proptest::prelude::*;

use intake_core::capabilities::{CameraOutput, DetectorOutput};
use intake_core::gateway::SubmitOutcome;
use intake_core::model::{
    ApplicationDraft, CameraPhase, EvidenceRef, IdType, Screen, SubmitFeedback, SubmitStatus,
    WizardStep,
};
use intake_core::{App, Effect, Event, Model};

fn complete_draft() -> ApplicationDraft {
    ApplicationDraft {
        first_name: "Ana".into(),
        last_name: "Lopez".into(),
        email: "ana@x.com".into(),
        phone_number: "88881234".into(),
        id_type: Some(IdType::Physical),
        id_number: "112345678".into(),
        department: "San José".into(),
        municipality: "Central".into(),
        address: "Carmen".into(),
        monthly_income: "1500.00".into(),
        document: Some(EvidenceRef::Inline("ZG9jdW1lbnQ=".into())),
        selfie: Some(EvidenceRef::Inline("c2VsZmll".into())),
    }
}

/// A session sitting on the selfie step with everything in place to submit.
fn ready_to_submit() -> Model {
    Model {
        step: WizardStep::Selfie,
        draft: complete_draft(),
        camera: CameraPhase::Released,
        detector_ready: true,
        ..Model::default()
    }
}

fn http_effects(effects: &[Effect]) -> usize {
    effects.iter().filter(|e| matches!(e, Effect::Http(_))).count()
}

#[test]
fn full_wizard_flow_submits_once_and_resets() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();

    // Step 1: identity.
    for event in [
        Event::FirstNameChanged("Ana".into()),
        Event::LastNameChanged("Lopez".into()),
        Event::EmailChanged("ana@x.com".into()),
        Event::PhoneNumberChanged("88881234".into()),
        Event::IdTypeSelected(IdType::Physical),
        Event::IdNumberChanged("112345678".into()),
    ] {
        app.update(event, &mut model);
    }
    app.update(Event::NextPressed, &mut model);
    assert_eq!(model.step, WizardStep::Residence);

    // Step 2: residence and document.
    app.update(Event::ProvinceSelected("San José".into()), &mut model);
    app.update(Event::MonthlyIncomeChanged("1500.00".into()), &mut model);
    app.update(Event::DocumentPicked { data: vec![0xFF, 0xD8, 0xFF] }, &mut model);
    let update = app.update(Event::NextPressed, &mut model);
    assert_eq!(model.step, WizardStep::Selfie);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Camera(_))));
    assert!(update.effects.iter().any(|e| matches!(e, Effect::FaceDetector(_))));

    // Step 3: capture with the camera streaming and the detector ready.
    app.update(Event::CameraStarted(Ok(CameraOutput::Started)), &mut model);
    app.update(Event::DetectorLoaded(Ok(DetectorOutput::ModelLoaded)), &mut model);
    assert!(model.can_capture());

    app.update(Event::CapturePressed, &mut model);
    let frame = CameraOutput::Frame {
        data: vec![0xFF, 0xD8, 0xFF, 0xE0],
        mime_type: "image/jpeg".into(),
    };
    app.update(Event::FrameCaptured(Ok(frame)), &mut model);
    app.update(
        Event::SelfieAnalyzed(Ok(DetectorOutput::Faces { count: 1 })),
        &mut model,
    );
    assert!(model.draft.selfie.is_some());
    assert_eq!(model.camera, CameraPhase::Released);

    // Submit.
    let update = app.update(Event::SubmitPressed, &mut model);
    assert_eq!(http_effects(&update.effects), 1);
    assert_eq!(model.submit, SubmitStatus::InFlight);

    app.update(
        Event::SubmitResponded(SubmitOutcome::Accepted { message: "Created".into() }),
        &mut model,
    );
    assert!(matches!(model.feedback, Some(SubmitFeedback::Success(_))));

    // Acknowledging the result starts a clean session and lands on the
    // review list.
    let update = app.update(Event::ResultAcknowledged, &mut model);
    assert_eq!(model.step, WizardStep::Identity);
    assert_eq!(model.draft, ApplicationDraft::default());
    assert_eq!(model.submit, SubmitStatus::Idle);
    assert_eq!(model.screen, Screen::Applications);
    assert_eq!(http_effects(&update.effects), 1);
}

#[test]
fn advancing_on_the_final_step_submits() {
    let app = AppTester::<App, Effect>::default();
    let mut model = ready_to_submit();

    let update = app.update(Event::NextPressed, &mut model);
    assert_eq!(model.submit, SubmitStatus::InFlight);
    assert_eq!(http_effects(&update.effects), 1);

    // The guard makes advance and explicit submit interchangeable; neither
    // gets a second request out.
    let update = app.update(Event::SubmitPressed, &mut model);
    assert_eq!(http_effects(&update.effects), 0);
    let update = app.update(Event::NextPressed, &mut model);
    assert_eq!(http_effects(&update.effects), 0);
}

#[test]
fn second_press_while_in_flight_sends_nothing() {
    let app = AppTester::<App, Effect>::default();
    let mut model = ready_to_submit();

    let first = app.update(Event::SubmitPressed, &mut model);
    assert_eq!(http_effects(&first.effects), 1);

    let second = app.update(Event::SubmitPressed, &mut model);
    assert_eq!(http_effects(&second.effects), 0);
    assert_eq!(model.submit, SubmitStatus::InFlight);
}

#[test]
fn settled_session_never_submits_again() {
    let app = AppTester::<App, Effect>::default();
    let mut model = ready_to_submit();

    app.update(Event::SubmitPressed, &mut model);
    app.update(Event::SubmitResponded(SubmitOutcome::ServerError), &mut model);
    assert_eq!(model.submit, SubmitStatus::Settled);
    assert!(matches!(model.feedback, Some(SubmitFeedback::Failure(_))));

    // Neither dismissing the failure nor pressing submit again reaches the
    // network; only a cancel mints a new session.
    app.update(Event::ResultAcknowledged, &mut model);
    let update = app.update(Event::SubmitPressed, &mut model);
    assert_eq!(http_effects(&update.effects), 0);

    app.update(Event::CancelPressed, &mut model);
    assert_eq!(model.submit, SubmitStatus::Idle);
}

#[test]
fn duplicate_result_keeps_wizard_in_place() {
    let app = AppTester::<App, Effect>::default();
    let mut model = ready_to_submit();

    app.update(Event::SubmitPressed, &mut model);
    app.update(Event::SubmitResponded(SubmitOutcome::Duplicate), &mut model);

    assert_eq!(model.screen, Screen::Wizard);
    assert_eq!(model.step, WizardStep::Selfie);
    assert!(matches!(model.feedback, Some(SubmitFeedback::Duplicate(_))));

    let update = app.update(Event::ResultAcknowledged, &mut model);
    assert_eq!(http_effects(&update.effects), 0);
    assert_eq!(model.step, WizardStep::Selfie);
}

#[test]
fn every_exit_path_releases_a_live_stream() {
    let exits = [Event::BackPressed, Event::CancelPressed, Event::ApplicationsOpened];
    for exit in exits {
        let app = AppTester::<App, Effect>::default();
        let mut model = Model {
            step: WizardStep::Selfie,
            draft: complete_draft(),
            camera: CameraPhase::Streaming,
            ..Model::default()
        };

        let update = app.update(exit.clone(), &mut model);
        assert!(
            update.effects.iter().any(|e| matches!(e, Effect::Camera(_))),
            "no stop issued for {exit:?}"
        );
        assert_ne!(model.camera, CameraPhase::Streaming, "stream left live by {exit:?}");
    }
}

#[test]
fn retake_discards_the_selfie_and_restarts_the_stream() {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model {
        step: WizardStep::Selfie,
        draft: complete_draft(),
        camera: CameraPhase::Released,
        detector_ready: true,
        ..Model::default()
    };

    let update = app.update(Event::RetakePressed, &mut model);
    assert!(model.draft.selfie.is_none());
    assert_eq!(model.camera, CameraPhase::Starting);
    assert!(update.effects.iter().any(|e| matches!(e, Effect::Camera(_))));
}

#[test]
fn camera_permission_denial_surfaces_a_message() {
    use intake_core::capabilities::CameraError;

    let app = AppTester::<App, Effect>::default();
    let mut model = Model {
        step: WizardStep::Selfie,
        camera: CameraPhase::Starting,
        ..Model::default()
    };

    app.update(
        Event::CameraStarted(Err(CameraError::PermissionDenied)),
        &mut model,
    );
    assert_eq!(model.camera, CameraPhase::Idle);
    let message = model.selfie_error.as_deref().unwrap_or_default();
    assert!(message.contains("Camera access"), "unexpected message: {message}");
}

proptest! {
    /// However many times submit is pressed, and whenever the response lands
    /// in between, exactly one request goes out per session.
    #[test]
    fn at_most_one_submission_per_session(
        presses in 1usize..12,
        respond_after in prop::option::of(0usize..12),
    ) {
        let app = AppTester::<App, Effect>::default();
        let mut model = ready_to_submit();
        let mut sent = 0;

        for i in 0..presses {
            if respond_after == Some(i) && model.submit == SubmitStatus::InFlight {
                app.update(
                    Event::SubmitResponded(SubmitOutcome::Accepted { message: "ok".into() }),
                    &mut model,
                );
            }
            let update = app.update(Event::SubmitPressed, &mut model);
            sent += http_effects(&update.effects);
        }

        prop_assert_eq!(sent, 1);
    }
}
