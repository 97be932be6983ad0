use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use tandem_core::LinkError;
use tandem_storage::StoreError;

/// HTTP projection of engine failures. Domain rules map onto client
/// statuses with their full message; database errors are logged and
/// flattened to a generic 500 so internals never leak.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Link(link) => {
                let status = match &link {
                    LinkError::SuggestionNotFound(_) | LinkError::TransactionNotFound(_) => {
                        StatusCode::NOT_FOUND
                    }
                    LinkError::AlreadyReviewed(_, _) | LinkError::AlreadyLinked(_) => {
                        StatusCode::CONFLICT
                    }
                    LinkError::SameAccount
                    | LinkError::AmountMismatch(_, _)
                    | LinkError::ZeroAmount => StatusCode::UNPROCESSABLE_ENTITY,
                };
                ApiError {
                    status,
                    message: link.to_string(),
                }
            }
            StoreError::Db(e) => {
                tracing::error!("database error: {e}");
                ApiError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Internal error".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_core::{SuggestionId, SuggestionStatus, TransactionId};

    fn status_for(e: LinkError) -> StatusCode {
        ApiError::from(StoreError::Link(e)).status
    }

    #[test]
    fn not_found_variants_map_to_404() {
        assert_eq!(
            status_for(LinkError::SuggestionNotFound(SuggestionId(1))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(LinkError::TransactionNotFound(TransactionId(1))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn stale_state_variants_map_to_409() {
        assert_eq!(
            status_for(LinkError::AlreadyReviewed(
                SuggestionId(1),
                SuggestionStatus::Accepted
            )),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(LinkError::AlreadyLinked(TransactionId(1))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn validation_variants_map_to_422() {
        assert_eq!(status_for(LinkError::SameAccount), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status_for(LinkError::AmountMismatch(-1, 2)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_for(LinkError::ZeroAmount), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
