//! Shared response envelope types for API handlers.
//!
//! Read endpoints use a `{ "data": ... }` envelope. Lifecycle mutations return
//! their outcome object directly (`{ "status": "success", ... }`).

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
