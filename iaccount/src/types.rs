//! User records, creation payloads, patches, and ledger policy.

use std::time::SystemTime;

use icommon::ExternalId;

/// Local user record keyed by the identity provider's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Surrogate id assigned by the store.
    pub id: i64,
    pub external_id: ExternalId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub photo: String,
    /// May go negative; the ledger only enforces a floor when configured.
    pub credit_balance: i64,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub external_id: ExternalId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub photo: String,
    pub credit_balance: i64,
}

impl NewUser {
    pub fn new(external_id: impl Into<ExternalId>, username: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            email: String::new(),
            username: username.into(),
            first_name: String::new(),
            last_name: String::new(),
            photo: String::new(),
            credit_balance: ProfileDefaults::DEFAULT_STARTING_CREDITS,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_names(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn with_photo(mut self, photo: impl Into<String>) -> Self {
        self.photo = photo.into();
        self
    }

    pub fn with_credit_balance(mut self, credit_balance: i64) -> Self {
        self.credit_balance = credit_balance;
        self
    }
}

/// Profile-update fields; `None` leaves the stored value untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub photo: Option<String>,
}

impl UserPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn photo(mut self, photo: impl Into<String>) -> Self {
        self.photo = Some(photo.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.photo.is_none()
    }

    pub(crate) fn apply_to(&self, record: &mut UserRecord) {
        if let Some(username) = &self.username {
            record.username = username.clone();
        }
        if let Some(first_name) = &self.first_name {
            record.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            record.last_name = last_name.clone();
        }
        if let Some(photo) = &self.photo {
            record.photo = photo.clone();
        }
    }
}

/// Profile data as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdentityProfile {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl IdentityProfile {
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_names(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    /// Email usable as a reconciliation key, if any.
    pub fn reconciliation_email(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(normalize_email)
            .filter(|email| !email.is_empty())
    }
}

/// Fallbacks used when the identity provider leaves profile fields blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDefaults {
    pub placeholder_photo: String,
    pub starting_credits: i64,
    pub username_prefix: String,
    pub username_suffix_len: usize,
}

impl ProfileDefaults {
    pub const DEFAULT_PLACEHOLDER_PHOTO: &'static str = "https://example.com/placeholder.jpg";
    pub const DEFAULT_STARTING_CREDITS: i64 = 10;

    pub fn with_placeholder_photo(mut self, photo: impl Into<String>) -> Self {
        self.placeholder_photo = photo.into();
        self
    }

    pub fn with_starting_credits(mut self, credits: i64) -> Self {
        self.starting_credits = credits;
        self
    }

    /// Builds the creation payload, filling blank profile fields.
    pub fn new_user(&self, external_id: &ExternalId, profile: &IdentityProfile) -> NewUser {
        let username = non_blank(profile.username.as_deref()).unwrap_or_else(|| {
            format!(
                "{}{}",
                self.username_prefix,
                external_id.trailing_chars(self.username_suffix_len)
            )
        });
        let photo = non_blank(profile.avatar_url.as_deref())
            .unwrap_or_else(|| self.placeholder_photo.clone());

        NewUser {
            external_id: external_id.clone(),
            email: profile.reconciliation_email().unwrap_or_default(),
            username,
            first_name: non_blank(profile.first_name.as_deref()).unwrap_or_default(),
            last_name: non_blank(profile.last_name.as_deref()).unwrap_or_default(),
            photo,
            credit_balance: self.starting_credits,
        }
    }
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            placeholder_photo: Self::DEFAULT_PLACEHOLDER_PHOTO.to_string(),
            starting_credits: Self::DEFAULT_STARTING_CREDITS,
            username_prefix: "user".to_string(),
            username_suffix_len: 5,
        }
    }
}

/// Balance rules applied by the credit ledger. No floor unless configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CreditPolicy {
    pub floor: Option<i64>,
}

impl CreditPolicy {
    pub fn with_floor(floor: i64) -> Self {
        Self { floor: Some(floor) }
    }
}

/// Outcome of an atomic balance increment at the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditUpdate {
    Applied(UserRecord),
    Missing,
    BelowFloor { balance: i64 },
}

/// Emails are compared trimmed and ASCII-lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use icommon::ExternalId;

    use super::*;

    #[test]
    fn defaults_synthesize_username_and_placeholder_photo() {
        let defaults = ProfileDefaults::default();
        let user = defaults.new_user(
            &ExternalId::from("user_2NfBq8xK3"),
            &IdentityProfile::default().with_email(" Ada@Example.com "),
        );

        assert_eq!(user.username, "userq8xK3");
        assert_eq!(user.photo, ProfileDefaults::DEFAULT_PLACEHOLDER_PHOTO);
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.credit_balance, 10);
        assert!(user.first_name.is_empty());
    }

    #[test]
    fn defaults_keep_supplied_profile_fields() {
        let profile = IdentityProfile::default()
            .with_username("ada")
            .with_names("Ada", "Lovelace")
            .with_avatar_url("https://img.example.com/ada.png");
        let user = ProfileDefaults::default()
            .with_starting_credits(3)
            .new_user(&ExternalId::from("user_1"), &profile);

        assert_eq!(user.username, "ada");
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.photo, "https://img.example.com/ada.png");
        assert_eq!(user.credit_balance, 3);
        assert!(user.email.is_empty());
    }

    #[test]
    fn blank_email_is_not_a_reconciliation_key() {
        assert_eq!(
            IdentityProfile::default().with_email("   ").reconciliation_email(),
            None
        );
        assert_eq!(IdentityProfile::default().reconciliation_email(), None);
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let patch = UserPatch::new().first_name("Grace");
        assert!(!patch.is_empty());
        assert!(UserPatch::new().is_empty());

        let mut record = UserRecord {
            id: 1,
            external_id: ExternalId::from("user_1"),
            email: "g@example.com".to_string(),
            username: "grace".to_string(),
            first_name: "G".to_string(),
            last_name: "Hopper".to_string(),
            photo: String::new(),
            credit_balance: 0,
            created_at: std::time::UNIX_EPOCH,
            updated_at: std::time::UNIX_EPOCH,
        };
        patch.apply_to(&mut record);

        assert_eq!(record.first_name, "Grace");
        assert_eq!(record.last_name, "Hopper");
    }
}
