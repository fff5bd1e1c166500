//! Sign-in and role gating for the admin console.
//!
//! The role check happens here, in the client. Nothing stops a signed-in
//! viewer from calling the hosted store directly; that has to be enforced by
//! row-level policies on the backend.

use std::fmt;

use log::{info, warn};

use crate::backend::{AuthProvider, AuthSession, DataStore, Query, StoreError, value_to_plain};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    Editor,
    Viewer,
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "admin" => Role::Admin,
            "editor" => Role::Editor,
            "viewer" => Role::Viewer,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
            Role::Other(name) => name,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    Store(StoreError),
    Forbidden { role: Role },
    MissingProfile,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Store(e) => write!(f, "{e}"),
            AuthError::Forbidden { role } => {
                write!(f, "role '{role}' is not allowed to use the admin console")
            }
            AuthError::MissingProfile => write!(f, "no profile row for this account"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        AuthError::Store(e)
    }
}

/// A signed-in user whose role passed the allow-list.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSession {
    pub session: AuthSession,
    pub role: Role,
    pub full_name: String,
}

impl AdminSession {
    pub fn user_id(&self) -> &str {
        &self.session.user_id
    }

    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.session.email
        } else {
            &self.full_name
        }
    }
}

/// Reads the `role` column of the caller's `users` row.
pub async fn fetch_role(
    store: &dyn DataStore,
    user_id: &str,
) -> Result<(Role, String), AuthError> {
    let query = Query::table("users").eq("id", user_id).limit(1);
    let profile = store
        .select(&query)
        .await?
        .rows
        .into_iter()
        .next()
        .ok_or(AuthError::MissingProfile)?;
    let role = profile.get("role").map(value_to_plain).unwrap_or_default();
    let name = profile.get("full_name").map(value_to_plain).unwrap_or_default();
    Ok((Role::parse(&role), name))
}

pub fn is_allowed(role: &Role, allowed: &[String]) -> bool {
    allowed.iter().any(|r| r.eq_ignore_ascii_case(role.as_str()))
}

/// Signs in, loads the profile and checks the role. A rejected role signs
/// the session out again.
pub async fn sign_in(
    auth: &dyn AuthProvider,
    store: &dyn DataStore,
    email: &str,
    password: &str,
    allowed: &[String],
) -> Result<AdminSession, AuthError> {
    let session = auth.sign_in(email, password).await?;
    let (role, full_name) = match fetch_role(store, &session.user_id).await {
        Ok(profile) => profile,
        Err(e) => {
            let _ = auth.sign_out(&session).await;
            return Err(e);
        }
    };
    if !is_allowed(&role, allowed) {
        warn!("sign-in refused for {} (role {})", email, role);
        let _ = auth.sign_out(&session).await;
        return Err(AuthError::Forbidden { role });
    }
    info!("signed in as {} ({})", email, role);
    Ok(AdminSession {
        session,
        role,
        full_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStore;
    use crate::backend::seed::{DEMO_EMAIL, DEMO_PASSWORD};
    use crate::test_support::demo_store;

    fn allow() -> Vec<String> {
        vec!["admin".into(), "editor".into()]
    }

    #[tokio::test]
    async fn test_admin_is_let_in() {
        let store = demo_store();
        let admin = sign_in(&*store, &*store, DEMO_EMAIL, DEMO_PASSWORD, &allow())
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.display_name(), "Salma Bennani");
    }

    #[tokio::test]
    async fn test_viewer_is_refused() {
        let store = demo_store();
        let err = sign_in(&*store, &*store, "lecteur@ministere.gov", DEMO_PASSWORD, &allow())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::Forbidden { role: Role::Viewer });
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let store = MemoryStore::new();
        store.add_account("ghost", "ghost@ministere.gov", "pw");
        let err = sign_in(&store, &store, "ghost@ministere.gov", "pw", &allow())
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::MissingProfile);
    }

    #[tokio::test]
    async fn test_bad_password() {
        let store = demo_store();
        let err = sign_in(&*store, &*store, DEMO_EMAIL, "nope", &allow())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(StoreError::Unauthorized(_))));
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse(" Editor "), Role::Editor);
        assert_eq!(Role::parse("auditor"), Role::Other("auditor".into()));
        assert!(is_allowed(&Role::Editor, &allow()));
        assert!(!is_allowed(&Role::Other("auditor".into()), &allow()));
    }
}
