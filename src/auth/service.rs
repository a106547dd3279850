use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::store::{self, KeyValueStore, StoreError};

use super::domain::{NewUser, ProfileUpdate, StoredCredentials, UserId, UserProfile};

static USER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_user_id() -> UserId {
    let seq = USER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    UserId(format!("user-{}-{seq:04}", Utc::now().timestamp_millis()))
}

/// Tokens are opaque random ids, never derived from time or a counter.
fn next_session_token() -> String {
    format!("sess-{}", Uuid::new_v4())
}

fn profile_key(id: &UserId) -> String {
    format!("user:{}:profile", id.0)
}

fn email_key(email: &str) -> String {
    format!("user:email:{}", email.trim().to_ascii_lowercase())
}

fn session_key(token: &str) -> String {
    format!("session:{token}")
}

/// Registration, login, and bearer-token session lookup over the store.
pub struct SessionService {
    store: Arc<dyn KeyValueStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Create a profile and open a session. The email index key is
    /// reserved atomically so two racing registrations cannot share an
    /// address.
    pub fn register(&self, new_user: NewUser) -> Result<(UserProfile, String), AuthError> {
        let id = next_user_id();
        let credentials = StoredCredentials {
            user_id: id.clone(),
            password: new_user.password,
        };

        let reserved = self.store.set_if_absent(
            &email_key(&new_user.email),
            serde_json::to_value(&credentials).map_err(StoreError::from)?,
        )?;
        if !reserved {
            return Err(AuthError::DuplicateEmail);
        }

        let profile = UserProfile {
            id: id.clone(),
            email: new_user.email,
            name: new_user.name,
            role: new_user.role,
            farm_type: new_user.farm_type,
            location: new_user.location,
            language: new_user.language,
            created_at: Utc::now(),
        };
        store::put_record(self.store.as_ref(), &profile_key(&id), &profile)?;

        let token = self.open_session(&id)?;
        Ok((profile, token))
    }

    /// Direct-equality password check against the stored credentials.
    pub fn login(&self, email: &str, password: &str) -> Result<(UserProfile, String), AuthError> {
        let credentials: StoredCredentials =
            store::get_record(self.store.as_ref(), &email_key(email))?
                .ok_or(AuthError::InvalidCredentials)?;
        if credentials.password != password {
            return Err(AuthError::InvalidCredentials);
        }

        let profile = self
            .profile(&credentials.user_id)?
            .ok_or(AuthError::InvalidCredentials)?;
        let token = self.open_session(&profile.id)?;
        Ok((profile, token))
    }

    pub fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.store.delete(&session_key(token))?;
        Ok(())
    }

    /// Resolve the profile behind a bearer token.
    pub fn current_user(&self, token: &str) -> Result<Option<UserProfile>, AuthError> {
        let user_id = match self.store.get(&session_key(token))? {
            Some(Value::String(id)) => UserId(id),
            _ => return Ok(None),
        };
        Ok(self.profile(&user_id)?)
    }

    pub fn profile(&self, id: &UserId) -> Result<Option<UserProfile>, AuthError> {
        Ok(store::get_record(self.store.as_ref(), &profile_key(id))?)
    }

    /// Apply a partial update to the caller's profile. The merge runs
    /// inside the store's atomic `update`, so two concurrent edits to
    /// different fields cannot clobber each other.
    pub fn update_profile(
        &self,
        id: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, AuthError> {
        self.profile(id)?.ok_or(AuthError::Unauthorized)?;

        let mut merged: Option<UserProfile> = None;
        self.store.update(&profile_key(id), &mut |current| {
            let Some(existing) = current else {
                return Value::Null;
            };
            let mut profile: UserProfile = match serde_json::from_value(existing.clone()) {
                Ok(profile) => profile,
                Err(_) => return existing,
            };
            if let Some(name) = update.name.clone() {
                profile.name = name;
            }
            if let Some(farm_type) = update.farm_type {
                profile.farm_type = Some(farm_type);
            }
            if let Some(location) = update.location.clone() {
                profile.location = location;
            }
            if let Some(language) = update.language.clone() {
                profile.language = language;
            }
            match serde_json::to_value(&profile) {
                Ok(value) => {
                    merged = Some(profile);
                    value
                }
                Err(_) => existing,
            }
        })?;
        merged.ok_or(AuthError::Unauthorized)
    }

    /// Every registered profile, for the analytics scan.
    pub fn all_profiles(&self) -> Result<Vec<UserProfile>, AuthError> {
        let mut profiles = Vec::new();
        for (key, value) in self.store.list_by_prefix("user:")? {
            if !key.ends_with(":profile") {
                continue;
            }
            let profile: UserProfile = serde_json::from_value(value).map_err(StoreError::from)?;
            profiles.push(profile);
        }
        Ok(profiles)
    }

    fn open_session(&self, id: &UserId) -> Result<String, AuthError> {
        let token = next_session_token();
        self.store
            .set(&session_key(&token), Value::String(id.0.clone()))?;
        Ok(token)
    }
}

/// Error raised by the session service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("a user with this email already exists")]
    DuplicateEmail,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("missing or invalid session")]
    Unauthorized,
    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::{FarmType, Role};
    use crate::store::MemoryStore;

    fn service() -> SessionService {
        SessionService::new(Arc::new(MemoryStore::default()))
    }

    fn farmer() -> NewUser {
        NewUser {
            email: "farmer@example.com".to_string(),
            password: "password123".to_string(),
            name: "Rajesh Kumar".to_string(),
            role: Role::Farmer,
            farm_type: Some(FarmType::Poultry),
            location: "Bangalore, Karnataka".to_string(),
            language: "en".to_string(),
        }
    }

    #[test]
    fn register_then_login_round_trips_the_profile() {
        let service = service();
        let (registered, _) = service.register(farmer()).expect("registration succeeds");

        let (logged_in, token) = service
            .login("farmer@example.com", "password123")
            .expect("login succeeds");
        assert_eq!(logged_in, registered);

        let resolved = service
            .current_user(&token)
            .expect("lookup succeeds")
            .expect("session resolves");
        assert_eq!(resolved.id, registered.id);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let service = service();
        service.register(farmer()).expect("first registration");
        match service.register(farmer()) {
            Err(AuthError::DuplicateEmail) => {}
            other => panic!("expected duplicate email error, got {other:?}"),
        }
    }

    #[test]
    fn email_lookup_is_case_insensitive() {
        let service = service();
        service.register(farmer()).expect("registration");
        service
            .login("Farmer@Example.com", "password123")
            .expect("login with different casing");
    }

    #[test]
    fn wrong_password_is_invalid_credentials() {
        let service = service();
        service.register(farmer()).expect("registration");
        match service.login("farmer@example.com", "hunter2") {
            Err(AuthError::InvalidCredentials) => {}
            other => panic!("expected invalid credentials, got {other:?}"),
        }
    }

    #[test]
    fn logout_invalidates_the_session() {
        let service = service();
        let (_, token) = service.register(farmer()).expect("registration");
        service.logout(&token).expect("logout succeeds");
        assert!(service
            .current_user(&token)
            .expect("lookup succeeds")
            .is_none());
    }

    #[test]
    fn session_tokens_are_unique_per_login() {
        let service = service();
        let (_, first) = service.register(farmer()).expect("registration");
        let (_, second) = service
            .login("farmer@example.com", "password123")
            .expect("first login");
        let (_, third) = service
            .login("farmer@example.com", "password123")
            .expect("second login");

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_ne!(first, third);
    }

    #[test]
    fn concurrent_profile_updates_do_not_lose_fields() {
        use std::thread;

        let service = Arc::new(service());
        let (profile, _) = service.register(farmer()).expect("registration");
        let id = profile.id.clone();

        let location_writer = {
            let service = service.clone();
            let id = id.clone();
            thread::spawn(move || {
                for n in 0..50 {
                    service
                        .update_profile(
                            &id,
                            ProfileUpdate {
                                location: Some(format!("location-{n}")),
                                ..ProfileUpdate::default()
                            },
                        )
                        .expect("location update");
                }
            })
        };
        let language_writer = {
            let service = service.clone();
            let id = id.clone();
            thread::spawn(move || {
                for n in 0..50 {
                    service
                        .update_profile(
                            &id,
                            ProfileUpdate {
                                language: Some(format!("language-{n}")),
                                ..ProfileUpdate::default()
                            },
                        )
                        .expect("language update");
                }
            })
        };
        location_writer.join().expect("location thread panicked");
        language_writer.join().expect("language thread panicked");

        let updated = service
            .profile(&id)
            .expect("lookup succeeds")
            .expect("profile present");
        assert_eq!(updated.location, "location-49");
        assert_eq!(updated.language, "language-49");
    }

    #[test]
    fn update_profile_merges_partial_fields() {
        let service = service();
        let (profile, _) = service.register(farmer()).expect("registration");

        let updated = service
            .update_profile(
                &profile.id,
                ProfileUpdate {
                    location: Some("Mysore, Karnataka".to_string()),
                    ..ProfileUpdate::default()
                },
            )
            .expect("update succeeds");
        assert_eq!(updated.location, "Mysore, Karnataka");
        assert_eq!(updated.name, profile.name);
        assert_eq!(updated.farm_type, profile.farm_type);
    }
}
