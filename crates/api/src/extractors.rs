//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, OptionalFromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationErrors};
use wayfare_shared::AppError;

use crate::error::ApiError;

/// JSON body that has passed `validator` checks.
///
/// Malformed JSON and failed checks both come back as `BAD_REQUEST`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = <Json<T> as FromRequest<S>>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::Validation(e.body_text()))?;
        value
            .validate()
            .map_err(|e| AppError::Validation(describe(&e)))?;
        Ok(Self(value))
    }
}

/// A missing body (no `Content-Type`) is `None`; a body that is present
/// must parse and validate.
impl<T, S> OptionalFromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let body = <Json<T> as OptionalFromRequest<S>>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::Validation(e.body_text()))?;
        let Some(Json(value)) = body else {
            return Ok(None);
        };
        value
            .validate()
            .map_err(|e| AppError::Validation(describe(&e)))?;
        Ok(Some(Self(value)))
    }
}

/// Deserializes a field where `null` means "clear" and absence means "keep".
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Flattens field errors into `field: message; field: message`.
fn describe(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: invalid ({})", e.code),
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Body {
        #[validate(length(min = 3, message = "must be at least 3 characters"))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        phone: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_distinguishes_null_from_missing() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        let cleared: Patch = serde_json::from_str(r#"{"phone": null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"phone": "+62 21 555"}"#).unwrap();
        assert_eq!(missing.phone, None);
        assert_eq!(cleared.phone, Some(None));
        assert_eq!(set.phone, Some(Some("+62 21 555".to_string())));
    }

    #[test]
    fn test_describe_lists_every_field() {
        let body = Body {
            name: "ab".into(),
            email: "nope".into(),
        };
        let text = describe(&body.validate().unwrap_err());
        assert_eq!(
            text,
            "email: invalid (email); name: must be at least 3 characters"
        );
    }
}
