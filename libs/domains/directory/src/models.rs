use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum::{Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

static NON_BLANK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S").unwrap());

/// Rejects usernames that are blank or carry control characters
fn validate_username(value: &str) -> Result<(), validator::ValidationError> {
    if !NON_BLANK.is_match(value) {
        return Err(validator::ValidationError::new("blank"));
    }
    // Postgres TEXT cannot hold NUL
    if value.chars().any(char::is_control) {
        return Err(validator::ValidationError::new("control_character"));
    }
    Ok(())
}

/// One of the two independently-owned user tables
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[strum(ascii_case_insensitive)]
pub enum Partition {
    A,
    B,
}

impl Partition {
    /// Order in which partitions are scanned and probed
    pub const PROBE_ORDER: [Partition; 2] = [Partition::A, Partition::B];
}

/// A user row as stored in a partition.
///
/// `id` is assigned by the owning partition and is only unique within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
}

/// Request body for create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserInput {
    #[validate(length(min = 1, max = 255), custom(function = "validate_username"))]
    pub username: String,

    #[validate(email, length(max = 255))]
    pub email: String,
}

impl UserInput {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
        }
    }
}

/// A freshly created user and the partition that stored it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreatedUser {
    #[serde(flatten)]
    pub user: User,
    pub partition: Partition,
}

/// Result of a successful fallback update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Updated {
    pub updated_in: Partition,
    pub message: String,
}

impl Updated {
    pub fn new(id: i32, partition: Partition) -> Self {
        Self {
            updated_in: partition,
            message: format!("User {} updated in partition {}", id, partition),
        }
    }
}

/// Result of a successful fallback delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub deleted_from: Partition,
    pub message: String,
}

impl Deleted {
    pub fn new(id: i32, partition: Partition) -> Self {
        Self {
            deleted_from: partition,
            message: format!("User {} deleted from partition {}", id, partition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_partition_parses_case_insensitively() {
        assert_eq!(Partition::from_str("a").unwrap(), Partition::A);
        assert_eq!(Partition::from_str("B").unwrap(), Partition::B);
        assert!(Partition::from_str("c").is_err());
    }

    #[test]
    fn test_user_input_validation() {
        assert!(UserInput::new("alice", "alice@example.com").validate().is_ok());

        let errors = UserInput::new("", "alice@example.com").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));

        let errors = UserInput::new("   ", "alice@example.com").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));

        for name in ["al\u{0}ice", "alice\n", "\u{7f}bob"] {
            let errors = UserInput::new(name, "alice@example.com").validate().unwrap_err();
            assert_eq!(
                errors.field_errors()["username"][0].code,
                "control_character",
                "username {name:?}"
            );
        }
        assert!(UserInput::new("zoë o'neil", "zoe@example.com").validate().is_ok());

        let errors = UserInput::new("alice", "not-an-email").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_created_user_serializes_flat() {
        let created = CreatedUser {
            user: User {
                id: 7,
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
            },
            partition: Partition::B,
        };

        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["username"], "alice");
        assert_eq!(json["partition"], "B");
    }

    #[test]
    fn test_outcomes_use_camel_case_keys() {
        let json = serde_json::to_value(Updated::new(1, Partition::A)).unwrap();
        assert_eq!(json["updatedIn"], "A");
        assert_eq!(json["message"], "User 1 updated in partition A");

        let json = serde_json::to_value(Deleted::new(3, Partition::B)).unwrap();
        assert_eq!(json["deletedFrom"], "B");
    }
}
