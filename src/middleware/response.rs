use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Wrapper for API responses that automatically adds success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: StatusCode::OK,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            data,
            status_code: StatusCode::CREATED,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return crate::error::ApiError::internal_server_error("Failed to serialize response data")
                    .into_response();
            }
        };

        let envelope = json!({
            "success": true,
            "data": data_value
        });

        (self.status_code, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

/// Rewrites plain-text rejections raised beneath the handlers (body limit,
/// wrong method) into the error envelope
pub async fn envelope_rejections(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if is_json {
        return response;
    }

    match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => {
            crate::error::ApiError::payload_too_large("Request body exceeds the size limit").into_response()
        }
        StatusCode::METHOD_NOT_ALLOWED => {
            let allow = response.headers().get(header::ALLOW).cloned();
            let mut rewritten = crate::error::ApiError::method_not_allowed("Method not allowed").into_response();
            if let Some(allow) = allow {
                rewritten.headers_mut().insert(header::ALLOW, allow);
            }
            rewritten
        }
        _ => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn plain_text_rejections_get_the_error_envelope() {
        let plain = (StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded").into_response();
        let rewritten = envelope_rejections(plain).await;
        assert_eq!(rewritten.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            rewritten.headers().get(header::CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );

        let mut wrong_method = Response::new(Body::empty());
        *wrong_method.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
        wrong_method.headers_mut().insert(header::ALLOW, HeaderValue::from_static("POST"));
        let rewritten = envelope_rejections(wrong_method).await;
        assert_eq!(rewritten.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(rewritten.headers().get(header::ALLOW), Some(&HeaderValue::from_static("POST")));
    }

    #[tokio::test]
    async fn json_and_success_responses_pass_through() {
        let envelope = crate::error::ApiError::not_found("Course not found").into_response();
        let passed = envelope_rejections(envelope).await;
        assert_eq!(passed.status(), StatusCode::NOT_FOUND);

        let ok = ApiResponse::success(serde_json::json!({ "ok": true })).into_response();
        assert_eq!(envelope_rejections(ok).await.status(), StatusCode::OK);
    }
}
