use std::fmt::{Display, Formatter};

use lmdb::Error as LmdbError;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

/// Response envelope shared by the store, the slot backends and the FFI surface.
///
/// Every FFI call answers with one of these serialized as JSON, so hosts only
/// ever parse a single shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppResponse {
    DatabaseError(String),
    SerializationError(String),
    NotFound(String),
    ValidationError(String),
    BadRequest(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl std::error::Error for AppResponse {}

impl From<LmdbError> for AppResponse {
    fn from(err: LmdbError) -> Self {
        match err {
            LmdbError::NotFound => AppResponse::NotFound("Key not found in garden slot".to_string()),
            LmdbError::Corrupted => {
                AppResponse::DatabaseError("Garden database is corrupted".to_string())
            }
            LmdbError::MapFull => {
                AppResponse::DatabaseError("Garden database map is full".to_string())
            }
            LmdbError::Other(code) => {
                AppResponse::DatabaseError(format!("IO error (code {})", code))
            }
            _ => AppResponse::DatabaseError(format!("Database error: {:?}", err)),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AppResponse::Ok(_))
    }
}
