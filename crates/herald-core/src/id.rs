use uuid::Uuid;

/// Generate a unique identifier for notifications, records, and templates.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
