use chrono::Utc;
use serde::Serialize;

pub(crate) mod esp_key_controller;
pub(crate) mod health_check_controller;
pub(crate) mod user_session_controller;

/// Standard JSON envelope returned by every endpoint:
/// `{success, message, data, timestamp}`. Error responses are produced by
/// `crate::error::Error`'s `IntoResponse` with the same shape minus `data`.
#[derive(Debug, Serialize)]
pub(crate) struct ApiResponse<T: Serialize> {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    timestamp: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn message_only(message: &str) -> ApiResponse<()> {
        ApiResponse {
            success: true,
            message: message.to_string(),
            data: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_carries_data_and_timestamp() {
        let response = ApiResponse::success(json!({"keys": []}), "All keys fetched");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], json!(true));
        assert_eq!(value["message"], json!("All keys fetched"));
        assert_eq!(value["data"], json!({"keys": []}));
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn message_only_envelope_omits_data() {
        let response = ApiResponse::<()>::message_only("Key deleted");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], json!(true));
        assert!(value.get("data").is_none());
    }
}
