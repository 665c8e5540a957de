//! Request body validation
//!
//! Runs in the handlers before any service call, so invalid input never
//! opens a transaction.

use crate::error::ApiError;

/// Longest band name accepted, in characters
pub const MAX_BAND_NAME_CHARS: usize = 255;

/// `nomeBanda`: required, not blank, at most 255 characters
///
/// The name is kept as sent (no trimming).
pub fn validate_band_name(name: Option<String>) -> Result<String, ApiError> {
    let name = name.ok_or_else(|| ApiError::BadRequest("nomeBanda is required".to_string()))?;

    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("nomeBanda must not be blank".to_string()));
    }

    let length = name.chars().count();
    if length > MAX_BAND_NAME_CHARS {
        return Err(ApiError::BadRequest(format!(
            "nomeBanda must be at most {} characters (got {})",
            MAX_BAND_NAME_CHARS, length
        )));
    }

    Ok(name)
}

/// `idArtista`: required
pub fn validate_artist_id(id: Option<i64>) -> Result<i64, ApiError> {
    id.ok_or_else(|| ApiError::BadRequest("idArtista is required".to_string()))
}
