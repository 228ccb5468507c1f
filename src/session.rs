use tracing::info;

/// Signed-in user identity handed to the app by the host environment
///
/// The app only ever reads this; who is logged in is decided outside
/// (the identity provider owns the handshake). Favorite toggling is
/// available only when a session is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub display_name: String,
}

impl Session {
    /// Read the session from `LISTING_USER_ID` / `LISTING_USER_NAME`,
    /// if the host environment provides one
    pub fn from_env() -> Option<Self> {
        let user_id = std::env::var("LISTING_USER_ID").ok()?;
        if user_id.is_empty() {
            return None;
        }
        let display_name =
            std::env::var("LISTING_USER_NAME").unwrap_or_else(|_| user_id.clone());
        info!("Session present for user {}", display_name);
        Some(Session {
            user_id,
            display_name,
        })
    }
}
