use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

/// Terminal JSON error response: `{"error": code, "message": message}`.
pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn error_body_has_code_and_message() {
        let res = json_error(StatusCode::FORBIDDEN, "mandate_not_authorized", "nope");
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({"error": "mandate_not_authorized", "message": "nope"}));
    }
}
