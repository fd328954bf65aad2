use serde::{Deserialize, Serialize};

/// The envelope every webhook response uses. Notifications must always be answered
/// in the 200 range or the marketplace keeps retrying, so failures are reported in
/// the body rather than the status code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// A MercadoLibre webhook notification. The payload never carries the resource
/// itself, only a pointer to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookNotification {
    /// Resource path, e.g. "/orders/2000003508419500" or "/shipments/43166076282".
    pub resource: String,
    pub topic: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub attempts: Option<i64>,
}

impl WebhookNotification {
    /// The numeric id at the end of the resource path, if there is one.
    pub fn resource_id(&self) -> Option<i64> {
        self.resource.rsplit('/').next().and_then(|id| id.parse::<i64>().ok())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn resource_ids_parse_from_the_path() {
        let n: WebhookNotification = serde_json::from_str(
            r#"{ "resource": "/orders/2000003508419500", "topic": "orders_v2", "user_id": 1, "attempts": 1 }"#,
        )
        .unwrap();
        assert_eq!(n.resource_id(), Some(2000003508419500));
        assert_eq!(n.topic, "orders_v2");
    }

    #[test]
    fn malformed_resources_yield_no_id() {
        let n = WebhookNotification {
            resource: "/orders/not-a-number".to_string(),
            topic: "orders_v2".to_string(),
            user_id: None,
            attempts: None,
        };
        assert_eq!(n.resource_id(), None);
        let empty = WebhookNotification { resource: String::new(), ..n };
        assert_eq!(empty.resource_id(), None);
    }

    #[test]
    fn bare_ids_are_accepted_too() {
        let n = WebhookNotification {
            resource: "43166076282".to_string(),
            topic: "shipments".to_string(),
            user_id: None,
            attempts: None,
        };
        assert_eq!(n.resource_id(), Some(43166076282));
    }
}
