//! Single entry point for everything that goes over the wire: payload
//! snapshots, request paths, multipart assembly for the asset host, and the
//! classifiers that normalize every failure mode into one of the outcome
//! kinds the wizard understands. Raw transport errors never leave this
//! module.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{ApplicationDraft, ApplicationRecord, EvidenceRef};
use crate::validate;
use crate::{
    AppError, AppResult, ErrorKind, API_BASE_URL, CLOUDINARY_UPLOAD_PRESET,
    DOCUMENT_UPLOAD_FOLDER,
};

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Your application has been submitted successfully.";

#[must_use]
pub fn submit_url() -> String {
    format!("{API_BASE_URL}/createApplication")
}

#[must_use]
pub fn list_url(page: u32, limit: u32) -> String {
    format!("{API_BASE_URL}/getApplications?page={page}&limit={limit}")
}

#[must_use]
pub fn encode_image(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

pub fn decode_image(data: &str) -> AppResult<Vec<u8>> {
    BASE64
        .decode(data)
        .map_err(|e| AppError::new(ErrorKind::Serialization, e.to_string()))
}

/// Immutable submission snapshot, wire-shaped. Built once from the live
/// draft; the draft itself is never sent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationPayload {
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
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_document_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_document_url: Option<String>,
    pub selfie_base64: String,
}

/// Snapshot the draft for submission. All step validation has already run by
/// the time this is called, but the conversion revalidates what it depends
/// on rather than trusting call order.
pub fn build_submission(draft: &ApplicationDraft) -> AppResult<CreateApplicationPayload> {
    let id_type = draft
        .id_type
        .ok_or_else(|| AppError::new(ErrorKind::Validation, "Identification type is missing"))?;

    let monthly_income = validate::validate_income(&draft.monthly_income)
        .map_err(|reason| AppError::new(ErrorKind::Validation, reason))?;

    let (id_document_base64, id_document_url) = match &draft.document {
        Some(EvidenceRef::Inline(data)) => (Some(data.clone()), None),
        Some(EvidenceRef::Hosted(url)) => (None, Some(url.clone())),
        None => {
            return Err(AppError::new(
                ErrorKind::Validation,
                "Identity document photo is missing",
            ))
        }
    };

    let selfie_base64 = match &draft.selfie {
        Some(EvidenceRef::Inline(data)) => data.clone(),
        Some(EvidenceRef::Hosted(_)) | None => {
            return Err(AppError::new(ErrorKind::Validation, "Selfie is missing"))
        }
    };

    Ok(CreateApplicationPayload {
        first_name: draft.first_name.clone(),
        last_name: draft.last_name.clone(),
        email: draft.email.clone(),
        phone_number: draft.phone_number.clone(),
        id_type: id_type.as_str().to_string(),
        id_number: draft.id_number.clone(),
        department: draft.department.clone(),
        municipality: draft.municipality.clone(),
        address: draft.address.clone(),
        monthly_income,
        id_document_base64,
        id_document_url,
        selfie_base64,
    })
}

/// Normalized result of a submission attempt. Nothing else reaches the
/// wizard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitOutcome {
    Accepted { message: String },
    Duplicate,
    ServerError,
    NetworkError,
}

#[derive(Debug, Deserialize)]
struct SubmitResponseBody {
    #[serde(default)]
    message: Option<String>,
}

#[must_use]
pub fn classify_submit_response(status: u16, body: Option<&[u8]>) -> SubmitOutcome {
    match status {
        200..=299 => {
            let message = body
                .and_then(|b| serde_json::from_slice::<SubmitResponseBody>(b).ok())
                .and_then(|b| b.message)
                .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());
            SubmitOutcome::Accepted { message }
        }
        409 => SubmitOutcome::Duplicate,
        _ => SubmitOutcome::ServerError,
    }
}

/// Adapter from the HTTP capability's result. No-response and transport
/// failures become `NetworkError`.
#[must_use]
pub fn submit_outcome(
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
) -> SubmitOutcome {
    match result {
        Ok(mut response) => {
            let status: u16 = response.status().into();
            let body = response.take_body();
            classify_submit_response(status, body.as_deref())
        }
        Err(_) => SubmitOutcome::NetworkError,
    }
}

/// One page of the review table, as returned by `GET /getApplications`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPage {
    pub data: Vec<ApplicationRecord>,
    pub total_records: u32,
}

pub fn classify_list_response(status: u16, body: Option<&[u8]>) -> AppResult<ApplicationPage> {
    match status {
        200..=299 => {
            let body = body.ok_or_else(|| {
                AppError::new(ErrorKind::Deserialization, "Empty response body")
            })?;
            serde_json::from_slice(body)
                .map_err(|e| AppError::new(ErrorKind::Deserialization, e.to_string()))
        }
        _ => Err(AppError::from_http_status(status, body)),
    }
}

#[must_use]
pub fn list_outcome(
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
) -> Result<ApplicationPage, AppError> {
    match result {
        Ok(mut response) => {
            let status: u16 = response.status().into();
            let body = response.take_body();
            classify_list_response(status, body.as_deref())
        }
        Err(e) => Err(AppError::new(ErrorKind::Network, e.to_string())),
    }
}

/// Assembled multipart/form-data request for the asset host. `crux_http` has
/// no multipart support, so the body is built by hand against the host's
/// documented upload contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartBody {
    pub content_type: String,
    pub body: Vec<u8>,
}

#[must_use]
pub fn multipart_image_upload(file: &[u8], filename: &str) -> MultipartBody {
    let boundary = format!("----intake-{}", Uuid::new_v4().simple());
    multipart_image_upload_with_boundary(file, filename, &boundary)
}

#[must_use]
pub fn multipart_image_upload_with_boundary(
    file: &[u8],
    filename: &str,
    boundary: &str,
) -> MultipartBody {
    let mut body = Vec::with_capacity(file.len() + 512);

    let text_part = |name: &str, value: &str, body: &mut Vec<u8>| {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    };

    text_part("upload_preset", CLOUDINARY_UPLOAD_PRESET, &mut body);
    text_part("folder", DOCUMENT_UPLOAD_FOLDER, &mut body);

    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    MultipartBody {
        content_type: format!("multipart/form-data; boundary={boundary}"),
        body,
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponseBody {
    secure_url: String,
}

pub fn classify_upload_response(status: u16, body: Option<&[u8]>) -> AppResult<String> {
    match status {
        200..=299 => {
            let body = body.ok_or_else(|| {
                AppError::new(ErrorKind::Upload, "Upload response had no body")
            })?;
            serde_json::from_slice::<UploadResponseBody>(body)
                .map(|b| b.secure_url)
                .map_err(|_| AppError::new(ErrorKind::Upload, "Upload response was malformed"))
        }
        _ => Err(AppError::new(ErrorKind::Upload, format!("Upload failed: HTTP {status}"))
            .with_context("http_status", status.to_string())),
    }
}

#[must_use]
pub fn upload_outcome(
    result: crux_http::Result<crux_http::Response<Vec<u8>>>,
) -> Result<String, AppError> {
    match result {
        Ok(mut response) => {
            let status: u16 = response.status().into();
            let body = response.take_body();
            classify_upload_response(status, body.as_deref())
        }
        Err(e) => Err(AppError::new(ErrorKind::Network, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IdType;

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

    #[test]
    fn submission_converts_income_and_passes_fields_through() {
        let payload = build_submission(&complete_draft()).unwrap();
        assert_eq!(payload.first_name, "Ana");
        assert_eq!(payload.last_name, "Lopez");
        assert_eq!(payload.email, "ana@x.com");
        assert_eq!(payload.phone_number, "88881234");
        assert_eq!(payload.id_type, "physical");
        assert_eq!(payload.id_number, "112345678");
        assert_eq!(payload.department, "San José");
        assert_eq!(payload.municipality, "Central");
        assert_eq!(payload.address, "Carmen");
        assert!((payload.monthly_income - 1500.0).abs() < f64::EPSILON);
        assert_eq!(payload.id_document_base64.as_deref(), Some("ZG9jdW1lbnQ="));
        assert_eq!(payload.id_document_url, None);
        assert_eq!(payload.selfie_base64, "c2VsZmll");
    }

    #[test]
    fn hosted_document_uses_url_field() {
        let mut draft = complete_draft();
        draft.document = Some(EvidenceRef::Hosted("https://assets.example/doc.png".into()));
        let payload = build_submission(&draft).unwrap();
        assert_eq!(payload.id_document_base64, None);
        assert_eq!(
            payload.id_document_url.as_deref(),
            Some("https://assets.example/doc.png")
        );

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("idDocumentBase64").is_none());
        assert_eq!(
            json.get("idDocumentUrl").and_then(|v| v.as_str()),
            Some("https://assets.example/doc.png")
        );
    }

    #[test]
    fn payload_uses_camel_case_wire_names() {
        let json = serde_json::to_value(build_submission(&complete_draft()).unwrap()).unwrap();
        for key in [
            "firstName",
            "lastName",
            "email",
            "phoneNumber",
            "idType",
            "idNumber",
            "department",
            "municipality",
            "address",
            "monthlyIncome",
            "idDocumentBase64",
            "selfieBase64",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["monthlyIncome"], serde_json::json!(1500.0));
    }

    #[test]
    fn submission_requires_evidence() {
        let mut no_document = complete_draft();
        no_document.document = None;
        assert_eq!(
            build_submission(&no_document).unwrap_err().kind,
            ErrorKind::Validation
        );

        let mut no_selfie = complete_draft();
        no_selfie.selfie = None;
        assert_eq!(
            build_submission(&no_selfie).unwrap_err().kind,
            ErrorKind::Validation
        );
    }

    #[test]
    fn submit_classification_covers_all_kinds() {
        assert_eq!(
            classify_submit_response(201, Some(br#"{"message":"Created"}"#)),
            SubmitOutcome::Accepted { message: "Created".into() }
        );
        assert_eq!(
            classify_submit_response(200, None),
            SubmitOutcome::Accepted { message: DEFAULT_SUCCESS_MESSAGE.into() }
        );
        assert_eq!(classify_submit_response(409, None), SubmitOutcome::Duplicate);
        assert_eq!(classify_submit_response(500, None), SubmitOutcome::ServerError);
        assert_eq!(classify_submit_response(400, None), SubmitOutcome::ServerError);
    }

    #[test]
    fn list_classification_parses_page() {
        let body = r#"{
            "data": [{
                "id": "a1",
                "firstName": "Ana",
                "lastName": "Lopez",
                "email": "ana@x.com",
                "phoneNumber": "88881234",
                "idType": "physical",
                "idNumber": "112345678",
                "department": "San José",
                "municipality": "Central",
                "address": "Carmen",
                "monthlyIncome": 1500.0
            }],
            "totalRecords": 25
        }"#;
        let page = classify_list_response(200, Some(body.as_bytes())).unwrap();
        assert_eq!(page.total_records, 25);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].first_name, "Ana");
        assert!(page.data[0].document_photos.is_empty());
    }

    #[test]
    fn list_errors_are_normalized() {
        assert_eq!(
            classify_list_response(500, None).unwrap_err().kind,
            ErrorKind::Internal
        );
        assert_eq!(
            classify_list_response(200, Some(b"not json")).unwrap_err().kind,
            ErrorKind::Deserialization
        );
        assert_eq!(
            classify_list_response(200, None).unwrap_err().kind,
            ErrorKind::Deserialization
        );
    }

    #[test]
    fn list_url_carries_page_and_limit() {
        assert_eq!(
            list_url(2, 15),
            format!("{API_BASE_URL}/getApplications?page=2&limit=15")
        );
    }

    #[test]
    fn multipart_body_contains_all_parts_in_order() {
        let part = multipart_image_upload_with_boundary(b"IMAGE", "doc.png", "XYZ");
        let body = String::from_utf8_lossy(&part.body);

        assert_eq!(part.content_type, "multipart/form-data; boundary=XYZ");
        assert!(body.contains("name=\"upload_preset\"\r\n\r\nCreditApp"));
        assert!(body.contains(&format!("name=\"folder\"\r\n\r\n{DOCUMENT_UPLOAD_FOLDER}")));
        assert!(body.contains("name=\"file\"; filename=\"doc.png\""));
        assert!(body.contains("IMAGE"));
        assert!(body.ends_with("--XYZ--\r\n"));

        let preset_at = body.find("upload_preset").unwrap();
        let file_at = body.find("name=\"file\"").unwrap();
        assert!(preset_at < file_at);
    }

    #[test]
    fn upload_classification() {
        let ok = classify_upload_response(
            200,
            Some(br#"{"secure_url":"https://assets.example/x.png"}"#),
        );
        assert_eq!(ok.unwrap(), "https://assets.example/x.png");

        assert_eq!(
            classify_upload_response(200, Some(b"{}")).unwrap_err().kind,
            ErrorKind::Upload
        );
        assert_eq!(classify_upload_response(500, None).unwrap_err().kind, ErrorKind::Upload);
    }

    #[test]
    fn encode_image_round_trips() {
        assert_eq!(encode_image(b"hello"), "aGVsbG8=");
        assert_eq!(decode_image("aGVsbG8=").unwrap(), b"hello");
        assert!(decode_image("not base64!").is_err());
    }
}
