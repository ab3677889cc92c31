use std::sync::Arc;

use equipment_store::DatasetStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub store: DatasetStore,
    pub credentials: Credentials,
}

impl AppState {
    pub fn new(store: DatasetStore, credentials: Credentials) -> Self {
        Self { store, credentials }
    }
}

/// The single basic-auth account, kept as digests so comparison is constant-time.
pub struct Credentials {
    username: blake3::Hash,
    password: blake3::Hash,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: blake3::hash(username.as_bytes()),
            password: blake3::hash(password.as_bytes()),
        }
    }

    pub fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = self.username == blake3::hash(username.as_bytes());
        let pass_ok = self.password == blake3::hash(password.as_bytes());
        user_ok & pass_ok
    }
}
