//! Request body extractors.

use axum::extract::{FromRequest, Request};
use axum::Json;
use portal_core::error::CoreError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

/// JSON body that is deserialized and then checked with [`Validate`].
///
/// Malformed bodies become 400 `BadRequest` instead of axum's plain-text
/// rejection, so every failure uses the same JSON envelope.
///
/// ```ignore
/// async fn create(ValidJson(input): ValidJson<CreateProjectRequest>) -> AppResult<...> { .. }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| AppError::Core(CoreError::Validation(describe(&errors))))?;

        Ok(Self(value))
    }
}

/// Flatten field errors into `field: message` pairs, sorted by field.
fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: invalid value ({})", e.code),
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

/// Deserialize a clearable field: absent stays `None` (via `#[serde(default)]`),
/// `null` becomes `Some(None)` and a value becomes `Some(Some(v))`.
///
/// ```ignore
/// #[serde(default, deserialize_with = "nullable")]
/// pub expiry_date: Option<Option<Timestamp>>,
/// ```
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        note: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_distinguishes_absent_and_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.note, None);

        let cleared: Patch = serde_json::from_str(r#"{"note":null}"#).unwrap();
        assert_eq!(cleared.note, Some(None));

        let set: Patch = serde_json::from_str(r#"{"note":"hi"}"#).unwrap();
        assert_eq!(set.note, Some(Some("hi".to_string())));
    }

    #[derive(Debug, Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "must be at least 3 characters"))]
        username: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_describe_lists_every_field() {
        let sample = Sample {
            username: "ab".into(),
            email: "not-an-email".into(),
        };
        let errors = sample.validate().unwrap_err();
        let message = describe(&errors);
        assert_eq!(
            message,
            "email: invalid value (email); username: must be at least 3 characters"
        );
    }
}
