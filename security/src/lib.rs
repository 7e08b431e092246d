// security/src/lib.rs
//! Hospital registration, admin login and the JWTs that carry an admin's identity.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use lib::clock::Clock;
use lib::errors::PrescriptionError;
use lib::storage_engine::AccountStorage;
use models::errors::ValidationError;
use models::{Actor, Admin, AdminLogin, AdminProfile, AdminRole, Hospital, HospitalRegistration, HospitalSummary};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Access token required")]
    MissingToken,
    #[error("Invalid or expired token: {0}")]
    InvalidToken(String),
    #[error("JWT error: {0}")]
    Jwt(String),
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Storage(#[from] PrescriptionError),
}

impl From<ValidationError> for AuthError {
    fn from(err: ValidationError) -> Self {
        AuthError::Storage(PrescriptionError::Validation(err))
    }
}

/// Claims for JWT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Admin id.
    pub sub: String,
    pub hospital_id: String,
    pub hospital_name: String,
    pub name: String,
    pub email: String,
    pub role: AdminRole,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn actor(&self) -> Result<Actor, AuthError> {
        let parse = |value: &str| {
            Uuid::parse_str(value).map_err(|e| AuthError::InvalidToken(format!("malformed id claim: {}", e)))
        };
        Ok(Actor {
            admin_id: parse(&self.sub)?,
            admin_name: self.name.clone(),
            hospital_id: parse(&self.hospital_id)?,
            hospital_name: self.hospital_name.clone(),
        })
    }
}

/// HMAC keys plus token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        JwtKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Expiry is checked against wall-clock time, so tokens are always stamped with it.
    pub fn issue(&self, admin: &Admin, hospital: &Hospital) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: admin.id.to_string(),
            hospital_id: hospital.id.to_string(),
            hospital_name: hospital.name.clone(),
            name: admin.name.clone(),
            email: admin.email.clone(),
            role: admin.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Jwt(format!("Failed to encode JWT: {}", e)))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub hospital: HospitalSummary,
    pub admin: AdminProfile,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSuccess {
    pub token: String,
    pub admin: AdminProfile,
}

pub struct Authenticator {
    accounts: Arc<dyn AccountStorage>,
    keys: JwtKeys,
    bcrypt_cost: u32,
    clock: Arc<dyn Clock>,
}

impl Authenticator {
    pub fn new(accounts: Arc<dyn AccountStorage>, keys: JwtKeys, bcrypt_cost: u32, clock: Arc<dyn Clock>) -> Self {
        Authenticator {
            accounts,
            keys,
            bcrypt_cost,
            clock,
        }
    }

    /// Creates the hospital and its first admin together.
    pub async fn register_hospital(&self, registration: HospitalRegistration) -> Result<Registration, AuthError> {
        registration.validate()?;
        let now = self.clock.now();
        let hospital = Hospital::from_registration(&registration, now);

        let name = registration.admin_name.clone().unwrap_or_default();
        let email = registration.admin_email.clone().unwrap_or_default();
        let password = registration.admin_password.clone().unwrap_or_default();
        let (hospital_id, cost) = (hospital.id, self.bcrypt_cost);
        let admin = tokio::task::spawn_blocking(move || Admin::new(hospital_id, &name, &email, &password, cost, now))
            .await
            .map_err(PrescriptionError::from)?
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

        self.accounts.register_hospital(&hospital, &admin).await?;
        info!("Registered hospital {} ({}) with admin {}", hospital.name, hospital.id, admin.email);
        Ok(Registration {
            hospital: hospital.summary(),
            admin: admin.profile(&hospital),
        })
    }

    /// Every failed login looks the same to the caller.
    pub async fn login(&self, login: AdminLogin) -> Result<LoginSuccess, AuthError> {
        let mut admin = self
            .accounts
            .get_admin_by_email(&login.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let candidate = admin.clone();
        let password = login.password;
        let matches = tokio::task::spawn_blocking(move || candidate.verify_password(&password))
            .await
            .map_err(PrescriptionError::from)?
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
        if !matches || !admin.is_active {
            warn!("Failed login for {}", admin.email);
            return Err(AuthError::InvalidCredentials);
        }

        let hospital = self.hospital_of(&admin).await?;
        admin.last_login = Some(self.clock.now());
        self.accounts.update_admin(&admin).await?;
        let token = self.keys.issue(&admin, &hospital)?;
        info!("Admin {} logged in", admin.id);
        Ok(LoginSuccess {
            token,
            admin: admin.profile(&hospital),
        })
    }

    pub async fn profile(&self, actor: &Actor) -> Result<AdminProfile, AuthError> {
        let admin = self
            .accounts
            .get_admin(&actor.admin_id)
            .await?
            .ok_or_else(|| PrescriptionError::NotFound(format!("Admin {} not found", actor.admin_id)))?;
        let hospital = self.hospital_of(&admin).await?;
        Ok(admin.profile(&hospital))
    }

    /// Resolves a bearer token to the admin it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<Actor, AuthError> {
        self.keys.validate(token)?.actor()
    }

    async fn hospital_of(&self, admin: &Admin) -> Result<Hospital, AuthError> {
        Ok(self
            .accounts
            .get_hospital(&admin.hospital_id)
            .await?
            .ok_or_else(|| PrescriptionError::NotFound(format!("Hospital {} not found", admin.hospital_id)))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use lib::clock::FixedClock;
    use lib::storage_engine::InMemoryStorage;

    fn registration(email: &str, number: &str, admin_email: &str) -> HospitalRegistration {
        HospitalRegistration {
            name: Some("City Care".into()),
            email: Some(email.into()),
            address: Some("12 MG Road, Pune".into()),
            phone: Some("020 5555 0101".into()),
            registration_number: Some(number.into()),
            admin_name: Some("Anita Desai".into()),
            admin_email: Some(admin_email.into()),
            admin_password: Some("secret123".into()),
        }
    }

    fn authenticator() -> (Authenticator, Arc<InMemoryStorage>) {
        let store = Arc::new(InMemoryStorage::new());
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap()));
        let auth = Authenticator::new(store.clone(), JwtKeys::new("test-secret", 24), 4, clock);
        (auth, store)
    }

    #[tokio::test]
    async fn should_register_then_login_with_token() {
        let (auth, store) = authenticator();
        let registered = auth
            .register_hospital(registration("desk@citycare.in", "MH-001", "Anita@CityCare.in"))
            .await
            .unwrap();
        assert_eq!(registered.admin.email, "anita@citycare.in");
        assert_eq!(registered.admin.hospital.name, "City Care");

        let login = auth
            .login(AdminLogin {
                email: "anita@citycare.in".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap();
        let actor = auth.authenticate(&login.token).unwrap();
        assert_eq!(actor.hospital_id, registered.hospital.id);
        assert_eq!(actor.admin_name, "Anita Desai");

        let stored = store.get_admin(&actor.admin_id).await.unwrap().unwrap();
        assert_eq!(stored.last_login, Some(Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap()));
        assert_eq!(auth.profile(&actor).await.unwrap().id, actor.admin_id);
    }

    #[tokio::test]
    async fn should_reject_duplicate_and_incomplete_registrations() {
        let (auth, _) = authenticator();
        auth.register_hospital(registration("desk@citycare.in", "MH-001", "anita@citycare.in"))
            .await
            .unwrap();
        assert!(matches!(
            auth.register_hospital(registration("other@citycare.in", "MH-002", "anita@citycare.in"))
                .await,
            Err(AuthError::Storage(PrescriptionError::AlreadyExists(_)))
        ));

        let mut incomplete = registration("new@citycare.in", "MH-003", "new@citycare.in");
        incomplete.admin_password = None;
        assert!(matches!(
            auth.register_hospital(incomplete).await,
            Err(AuthError::Storage(PrescriptionError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn should_not_reveal_which_credential_was_wrong() {
        let (auth, _) = authenticator();
        auth.register_hospital(registration("desk@citycare.in", "MH-001", "anita@citycare.in"))
            .await
            .unwrap();
        for (email, password) in [("anita@citycare.in", "wrong"), ("nobody@citycare.in", "secret123")] {
            let err = auth
                .login(AdminLogin {
                    email: email.into(),
                    password: password.into(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
    }

    #[tokio::test]
    async fn should_refuse_deactivated_admins() {
        let (auth, store) = authenticator();
        let registered = auth
            .register_hospital(registration("desk@citycare.in", "MH-001", "anita@citycare.in"))
            .await
            .unwrap();
        let mut admin = store.get_admin(&registered.admin.id).await.unwrap().unwrap();
        admin.is_active = false;
        store.update_admin(&admin).await.unwrap();

        let err = auth
            .login(AdminLogin {
                email: "anita@citycare.in".into(),
                password: "secret123".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn should_reject_tampered_and_expired_tokens() {
        let hospital = Hospital {
            id: Uuid::new_v4(),
            name: "City Care".into(),
            email: "desk@citycare.in".into(),
            address: String::new(),
            phone: String::new(),
            registration_number: "MH-001".into(),
            is_active: true,
            created_at: Utc::now(),
        };
        let admin = Admin::new(hospital.id, "Anita", "anita@citycare.in", "pw", 4, Utc::now()).unwrap();

        let keys = JwtKeys::new("test-secret", 24);
        let token = keys.issue(&admin, &hospital).unwrap();
        assert_eq!(keys.validate(&token).unwrap().actor().unwrap().admin_id, admin.id);

        let other = JwtKeys::new("another-secret", 24);
        assert!(matches!(other.validate(&token), Err(AuthError::InvalidToken(_))));

        let expired = JwtKeys::new("test-secret", -2).issue(&admin, &hospital).unwrap();
        assert!(matches!(keys.validate(&expired), Err(AuthError::InvalidToken(_))));
    }
}
