//! Sign-in session
//!
//! Structure:
//! - `SessionStorage`: key/value storage holding one browser's auth state
//! - `AuthSession`: login/logout over that storage, against a fixed allow-list
//! - `SessionRegistry`: all browser sessions, keyed by cookie id, shared in app state
//!
//! This is a demonstration gate: plain-text allow-list, no expiry, no
//! password hashing.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use pensionweb_config::{AuthConfig, UserEntry};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::validate::Validate;

/// Storage key of the authenticated flag
pub const AUTH_KEY: &str = "cimr-authenticated";
/// Storage key of the JSON user record
pub const USER_KEY: &str = "cimr-user";
/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "pensionweb_sid";
/// Role granting administrative pages
pub const ADMIN_ROLE: &str = "ADMIN";

pub const INVALID_CREDENTIALS: &str = "Nom d'utilisateur ou mot de passe invalide";

/// Key/value storage behind one session
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
    /// All stored entries, for the debug page
    fn entries(&self) -> Vec<(String, String)>;
}

/// In-memory storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// The signed-in user as persisted in the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl UserRecord {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

impl Validate for UserRecord {
    fn entity() -> &'static str {
        "user"
    }

    fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("username is required".to_string());
        }
        Ok(())
    }
}

/// Outcome of a sign-in attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
}

impl LoginResult {
    fn accepted(user: UserRecord) -> Self {
        Self {
            success: true,
            error: None,
            user: Some(user),
        }
    }

    fn rejected() -> Self {
        Self {
            success: false,
            error: Some(INVALID_CREDENTIALS.to_string()),
            user: None,
        }
    }
}

/// The credential allow-list
#[derive(Debug, Clone)]
pub struct Credentials {
    users: Vec<UserEntry>,
}

impl Credentials {
    pub fn new(users: Vec<UserEntry>) -> Self {
        Self { users }
    }

    /// Find the user matching both username and password exactly
    pub fn verify(&self, username: &str, password: &str) -> Option<UserRecord> {
        self.users
            .iter()
            .find(|u| u.username == username && u.password == password)
            .map(|u| UserRecord {
                username: u.username.clone(),
                roles: u.roles.clone(),
            })
    }
}

impl From<&AuthConfig> for Credentials {
    fn from(config: &AuthConfig) -> Self {
        Self::new(config.users.clone())
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

/// Authentication state of one browser
#[derive(Debug, Clone, Default)]
pub struct AuthSession<S: SessionStorage = MemoryStorage> {
    storage: S,
}

impl<S: SessionStorage> AuthSession<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Check the pair against the allow-list; storage is only written on success
    pub fn login(&mut self, credentials: &Credentials, username: &str, password: &str) -> LoginResult {
        match credentials.verify(username, password) {
            Some(user) => match serde_json::to_string(&user) {
                Ok(record) => {
                    self.storage.set(AUTH_KEY, "true".to_string());
                    self.storage.set(USER_KEY, record);
                    log::info!("User {} signed in", user.username);
                    LoginResult::accepted(user)
                }
                Err(e) => {
                    log::error!("Could not persist user record: {}", e);
                    LoginResult {
                        success: false,
                        error: Some("Erreur de connexion".to_string()),
                        user: None,
                    }
                }
            },
            None => {
                log::warn!("Rejected sign-in for '{}'", username);
                LoginResult::rejected()
            }
        }
    }

    pub fn logout(&mut self) {
        self.storage.remove(AUTH_KEY);
        self.storage.remove(USER_KEY);
    }

    /// The signed-in user, if any; an unreadable user record clears the session
    pub fn current_user(&mut self) -> Option<UserRecord> {
        if self.storage.get(AUTH_KEY).as_deref() != Some("true") {
            return None;
        }
        let raw = self.storage.get(USER_KEY)?;
        match serde_json::from_str::<UserRecord>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                log::warn!("Discarding corrupt session user record: {}", e);
                self.logout();
                None
            }
        }
    }

    pub fn is_authenticated(&mut self) -> bool {
        self.current_user().is_some()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

/// All browser sessions, keyed by session cookie id
#[derive(Clone)]
pub struct SessionRegistry {
    credentials: Arc<Credentials>,
    sessions: Arc<RwLock<HashMap<String, AuthSession<MemoryStorage>>>>,
}

impl SessionRegistry {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Arc::new(credentials),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Attempt a sign-in; on success returns a freshly issued session id to set as cookie
    pub async fn login(&self, username: &str, password: &str) -> (Option<String>, LoginResult) {
        let mut session: AuthSession = AuthSession::default();
        let result = session.login(&self.credentials, username, password);
        if !result.success {
            return (None, result);
        }

        let id = pensionweb_utils::generate_id();
        self.sessions.write().await.insert(id.clone(), session);
        (Some(id), result)
    }

    pub async fn logout(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.logout();
        }
        sessions.remove(session_id);
    }

    pub async fn current_user(&self, session_id: &str) -> Option<UserRecord> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(session_id)?;
        let user = session.current_user();
        if user.is_none() {
            sessions.remove(session_id);
        }
        user
    }

    /// Stored keys of a session, for the debug page
    pub async fn entries(&self, session_id: &str) -> Vec<(String, String)> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|s| s.storage().entries())
            .unwrap_or_default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

// ==================== Tests ====================
