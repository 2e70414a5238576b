use crate::error::AppError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use validator::ValidationErrors;

/// Map request-body validation failures onto the registry's error kinds.
///
/// Field priority follows the order the registry itself checks: url, then
/// validity, then shortcode.
pub(crate) fn validation_error(errors: ValidationErrors) -> AppError {
    let fields = errors.field_errors();

    if fields.contains_key("url") {
        AppError::InvalidUrl(errors.to_string())
    } else if fields.contains_key("validity") {
        AppError::InvalidValidity(errors.to_string())
    } else if fields.contains_key("shortcode") {
        AppError::InvalidShortcode(errors.to_string())
    } else {
        AppError::BadRequest(errors.to_string())
    }
}

/// Turn an unreadable JSON body into a 400
pub(crate) fn json_rejection(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

/// Turn unparsable query parameters into a 400
pub(crate) fn query_rejection(rejection: QueryRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

pub(crate) fn path_rejection(rejection: PathRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

/// ASCII form of a stored URL for use as a Location header.
///
/// Re-serialising through `url` percent-encodes and punycodes the target.
pub(crate) fn redirect_location(original_url: &str) -> String {
    url::Url::parse(original_url)
        .map(String::from)
        .unwrap_or_else(|_| original_url.to_string())
}
