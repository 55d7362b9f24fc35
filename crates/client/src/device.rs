use uuid::Uuid;

/// A fresh device identifier.
///
/// Not a secret; it only attributes a session to this browser profile.
/// `Uuid::new_v4` draws from the OS random source.
pub fn generate_device_id() -> String {
    format!("dev-{}", Uuid::new_v4().simple())
}
