use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The authenticated user as reported by the backend.
///
/// The payload is opaque: whatever JSON the backend sends is kept unchanged.
/// `id` and `username` are read on demand for display.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct User(Value);

impl User {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Field lookup; `None` for non-object payloads
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn id(&self) -> Option<&Value> {
        self.get("id").filter(|id| !id.is_null())
    }

    pub fn username(&self) -> Option<&str> {
        self.get("username").and_then(Value::as_str)
    }

    /// Name for display: username, then id, then a placeholder
    pub fn display_name(&self) -> String {
        if let Some(username) = self.username().filter(|name| !name.is_empty()) {
            return username.to_string();
        }
        match self.id() {
            Some(Value::String(id)) => format!("user #{}", id),
            Some(id) => format!("user #{}", id),
            None => match &self.0 {
                Value::String(name) if !name.is_empty() => name.clone(),
                _ => "unknown user".to_string(),
            },
        }
    }
}

impl From<Value> for User {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_keeps_every_field() {
        let user: User = serde_json::from_value(json!({
            "id": 7,
            "username": "alice",
            "email": "alice@example.com",
            "is_staff": true
        }))
        .expect("user");

        assert_eq!(user.id(), Some(&json!(7)));
        assert_eq!(user.username(), Some("alice"));
        assert_eq!(user.get("email"), Some(&json!("alice@example.com")));
        assert_eq!(user.get("is_staff"), Some(&json!(true)));
    }

    #[test]
    fn test_parse_accepts_any_shape() {
        let uuid: User = serde_json::from_value(json!({"id": "a1b2-uuid", "username": null}))
            .expect("string id");
        assert_eq!(uuid.id(), Some(&json!("a1b2-uuid")));
        assert_eq!(uuid.username(), None);

        let bare: User = serde_json::from_value(json!("alice")).expect("string user");
        assert_eq!(bare.id(), None);
        assert_eq!(bare.as_value(), &json!("alice"));

        let list: User = serde_json::from_value(json!([1, 2])).expect("array user");
        assert_eq!(list.get("id"), None);
    }

    #[test]
    fn test_serializes_unchanged() {
        let raw = json!({"id": "a1b2-uuid", "roles": ["stock"]});
        let user = User::new(raw.clone());
        assert_eq!(serde_json::to_value(&user).expect("serialize"), raw);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(User::new(json!({"id": 1})).display_name(), "user #1");
        assert_eq!(User::new(json!({"id": "a1b2"})).display_name(), "user #a1b2");
        assert_eq!(
            User::new(json!({"id": 1, "username": "bob"})).display_name(),
            "bob"
        );
        assert_eq!(User::new(json!("carol")).display_name(), "carol");
        assert_eq!(User::default().display_name(), "unknown user");
    }
}
