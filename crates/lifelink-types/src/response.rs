use serde::Serialize;

/// Uniform response envelope. Every endpoint, success or failure, returns
/// `{status, data, message}` with the HTTP status code mirroring `status`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: u16,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            status: 200,
            data: Some(data),
            message: Some(message.into()),
        }
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            status: 201,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

impl Envelope<serde_json::Value> {
    /// Success with no payload, e.g. after a delete.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            status: 200,
            data: None,
            message: Some(message.into()),
        }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        let env = Envelope::ok(vec![1, 2, 3], "ok");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["status"], 200);
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["message"], "ok");
    }

    #[test]
    fn message_only_has_null_data() {
        let env = Envelope::message_only("deleted");
        let json = serde_json::to_value(&env).unwrap();
        assert!(json["data"].is_null());
    }
}
