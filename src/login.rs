use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Display identity attached to saved records.
///
/// There is no credential behind it: "logging in" only records who is typing
/// so their label can be stamped on the items they save.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserTag {
    /// Display name (falls back to the email when none was given)
    #[serde(default)]
    pub name: String,

    /// Email address (falls back to the name when none was given)
    #[serde(default)]
    pub email: String,
}

/// Login form data
///
/// Used to receive the login panel's fields from the page.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,
}

impl UserTag {
    /// Builds a tag from the login panel.
    ///
    /// # Errors
    /// * Returns [`Error::MissingIdentity`] when both fields are blank
    pub fn from_login(name: &str, email: &str) -> Result<Self> {
        let name = name.trim();
        let email = email.trim();

        if name.is_empty() && email.is_empty() {
            return Err(Error::MissingIdentity);
        }

        let pick = |first: &str, second: &str| {
            if first.is_empty() {
                second.to_string()
            } else {
                first.to_string()
            }
        };

        Ok(UserTag {
            name: pick(name, email),
            email: pick(email, name),
        })
    }

    /// Label shown in the header and stamped on saved items.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_only_login_mirrors_into_email() {
        let tag = UserTag::from_login("Tuấn", "").unwrap();
        assert_eq!(tag.name, "Tuấn");
        assert_eq!(tag.email, "Tuấn");
        assert_eq!(tag.label(), "Tuấn");
    }

    #[test]
    fn email_only_login_mirrors_into_name() {
        let tag = UserTag::from_login("", "tuan@example.com").unwrap();
        assert_eq!(tag.name, "tuan@example.com");
        assert_eq!(tag.label(), "tuan@example.com");
    }

    #[test]
    fn both_fields_are_kept() {
        let tag = UserTag::from_login(" Lan ", "lan@example.com").unwrap();
        assert_eq!(tag.name, "Lan");
        assert_eq!(tag.email, "lan@example.com");
    }

    #[test]
    fn blank_login_is_rejected() {
        assert!(matches!(
            UserTag::from_login("  ", ""),
            Err(Error::MissingIdentity)
        ));
    }

    #[test]
    fn label_falls_back_to_email_for_stored_tags() {
        let tag: UserTag = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert_eq!(tag.label(), "a@b.c");
    }
}
