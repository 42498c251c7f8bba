//! Pure, side-effect-free field validators. Each returns `Ok(())` or a
//! human-readable reason; the step aggregators collect reasons per field so
//! the shell can surface them next to the inputs rather than as one blocking
//! error.

use serde::{Deserialize, Serialize};

use crate::geography;
use crate::model::ApplicationDraft;

pub fn require_text(value: &str, reason: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(reason.to_string())
    } else {
        Ok(())
    }
}

/// Minimal `text@text.text` shape check; anything stricter belongs on the
/// server.
pub fn validate_email(value: &str) -> Result<(), String> {
    const REASON: &str = "Enter a valid email address.";

    let value = value.trim();
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(REASON.into());
    }
    let Some((local, domain)) = value.split_once('@') else {
        return Err(REASON.into());
    };
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return Err(REASON.into());
    };
    if local.is_empty() || host.is_empty() || tld.is_empty() {
        return Err(REASON.into());
    }
    Ok(())
}

pub fn validate_digits(value: &str, reason: &str) -> Result<(), String> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(reason.to_string())
    }
}

/// Monthly income: a non-negative decimal with at most two fractional digits.
/// Returns the parsed value so the submission payload can reuse it.
pub fn validate_income(value: &str) -> Result<f64, String> {
    const REASON: &str = "Enter a valid amount.";

    let value = value.trim();
    let (whole, fraction) = match value.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (value, None),
    };

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(REASON.into());
    }
    if let Some(fraction) = fraction {
        if fraction.is_empty()
            || fraction.len() > 2
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(REASON.into());
        }
    }

    value.parse::<f64>().map_err(|_| REASON.to_string())
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityErrors {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub id_type: Option<String>,
    pub id_number: Option<String>,
}

impl IdentityErrors {
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self == &Self::default()
    }
}

#[must_use]
pub fn identity_errors(draft: &ApplicationDraft) -> IdentityErrors {
    IdentityErrors {
        first_name: require_text(&draft.first_name, "First name is required.").err(),
        last_name: require_text(&draft.last_name, "Last name is required.").err(),
        email: validate_email(&draft.email).err(),
        phone_number: validate_digits(
            &draft.phone_number,
            "Phone number must contain only digits.",
        )
        .err(),
        id_type: if draft.id_type.is_none() {
            Some("Select an identification type.".into())
        } else {
            None
        },
        id_number: validate_digits(
            &draft.id_number,
            "Identification number must contain only digits.",
        )
        .err(),
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidenceErrors {
    pub department: Option<String>,
    pub municipality: Option<String>,
    pub address: Option<String>,
    pub monthly_income: Option<String>,
    pub document: Option<String>,
}

impl ResidenceErrors {
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self == &Self::default()
    }
}

#[must_use]
pub fn residence_errors(draft: &ApplicationDraft) -> ResidenceErrors {
    let mut errors = ResidenceErrors {
        monthly_income: validate_income(&draft.monthly_income).err(),
        document: if draft.document.is_none() {
            Some("Identity document photo is required.".into())
        } else {
            None
        },
        ..ResidenceErrors::default()
    };

    if draft.department.is_empty() {
        errors.department = Some("Select a province.".into());
    } else if geography::find_province(&draft.department).is_none() {
        errors.department = Some("Unknown province.".into());
    } else if draft.municipality.is_empty() {
        errors.municipality = Some("Select a canton.".into());
    } else if geography::find_canton(&draft.department, &draft.municipality).is_none() {
        errors.municipality = Some("Canton does not belong to the selected province.".into());
    } else if draft.address.is_empty() {
        errors.address = Some("Select a district.".into());
    } else if !geography::is_valid_residence(&draft.department, &draft.municipality, &draft.address)
    {
        errors.address = Some("District does not belong to the selected canton.".into());
    }

    errors
}
