use jiff::Timestamp;

/// Identifier type used to address users.
pub type UserId = i64;

/// A stored user as returned by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// User data handed to the persistence layer for a save.
///
/// When `id` is `None` the repository assigns a fresh identifier,
/// otherwise the record stored under `id` is created or replaced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewUser {
    pub id: Option<UserId>,
    pub name: String,
    pub email: Option<String>,
}

impl NewUser {
    /// Creates save data without an identifier.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: None,
        }
    }

    /// Sets the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Pins the identifier the record is saved under.
    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }
}
