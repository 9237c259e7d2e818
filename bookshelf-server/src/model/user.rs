use std::collections::BTreeSet;

use {
    axum_login::AuthUser,
    serde::{Deserialize, Serialize},
};

/// A signed-in account as the authentication layer knows it.
///
/// `id` and `slug` are both unique per user. `roles` is a set, so a user may
/// hold any number of roles and duplicates collapse.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub slug: String,
    pub login: String,
    pub roles: BTreeSet<String>,
    pub(crate) access_token: String,
}

impl User {
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

// The access token never reaches the logs.
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("slug", &self.slug)
            .field("login", &self.login)
            .field("roles", &self.roles)
            .field("access_token", &"[redacted]")
            .finish()
    }
}

impl AuthUser for User {
    type Id = String;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }

    fn session_auth_hash(&self) -> &[u8] {
        self.access_token.as_bytes()
    }
}

/// The user fields carried for the life of a session and handed to pages and
/// the session endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub slug: String,
    pub roles: BTreeSet<String>,
}

impl SessionUser {
    /// Roles joined for display, in name order.
    #[must_use]
    pub fn roles_label(&self) -> String {
        self.roles.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            slug: user.slug.clone(),
            roles: user.roles.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn user() -> User {
        User {
            id: "7f1c6a52-4a3e-4d8b-9a57-9d1c2f0e8b11".into(),
            slug: "octocat".into(),
            login: "github:octocat".into(),
            roles: ["reader", "admin", "reader"]
                .into_iter()
                .map(String::from)
                .collect(),
            access_token: "gho_secret".into(),
        }
    }

    #[test]
    fn roles_are_a_set() {
        let user = user();
        assert_eq!(user.roles.len(), 2);
        assert!(user.has_role("admin"));
        assert!(user.has_role("reader"));
        assert!(!user.has_role("editor"));
    }

    #[test]
    fn session_user_serializes_id_slug_and_roles() {
        let session_user = SessionUser::from(&user());
        assert_eq!(
            serde_json::to_value(&session_user).unwrap(),
            json!({
                "id": "7f1c6a52-4a3e-4d8b-9a57-9d1c2f0e8b11",
                "slug": "octocat",
                "roles": ["admin", "reader"]
            })
        );
        assert_eq!(session_user.roles_label(), "admin, reader");
    }

    #[test]
    fn auth_hash_follows_access_token() {
        let mut user = user();
        let before = user.session_auth_hash().to_vec();
        user.access_token = "gho_rotated".into();
        assert_ne!(before, user.session_auth_hash());
        assert_eq!(AuthUser::id(&user), user.id);
    }

    #[test]
    fn debug_output_redacts_token() {
        let rendered = format!("{:?}", user());
        assert!(!rendered.contains("gho_secret"));
        assert!(rendered.contains("octocat"));
    }
}
