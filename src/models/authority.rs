use serde::{Deserialize, Serialize};

/// The built-in emergency services a panic can be directed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorityKind {
    Police,
    Hospital,
    Fire,
}

impl AuthorityKind {
    /// Get the display name for this authority
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Police => "Police",
            Self::Hospital => "Hospital",
            Self::Fire => "Fire Rescue",
        }
    }

    /// Get all authority kinds in catalog order
    pub fn all() -> &'static [AuthorityKind] {
        &[Self::Police, Self::Hospital, Self::Fire]
    }

    /// Parse a user-supplied authority name (CLI argument, lowercase)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "police" => Some(Self::Police),
            "hospital" => Some(Self::Hospital),
            "fire" => Some(Self::Fire),
            _ => None,
        }
    }
}

/// One entry in the built-in emergency-authority catalog.
/// Immutable, not user-editable, and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub kind: AuthorityKind,
    pub name: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    pub email: String,
    pub color: String,
}

impl Authority {
    fn entry(kind: AuthorityKind, phone_number: &str, email: &str, color: &str) -> Self {
        Self {
            kind,
            name: kind.display_name().to_string(),
            phone_number: phone_number.to_string(),
            email: email.to_string(),
            color: color.to_string(),
        }
    }

    /// The full authority catalog, in fixed order.
    pub fn catalog() -> Vec<Authority> {
        AuthorityKind::all().iter().copied().map(Self::for_kind).collect()
    }

    /// Look up a single catalog entry by kind.
    pub fn for_kind(kind: AuthorityKind) -> Authority {
        match kind {
            AuthorityKind::Police => {
                Self::entry(kind, "08109251030", "www.chizihn@gmail.com", "#3F51B5")
            }
            AuthorityKind::Hospital => {
                Self::entry(kind, "08109251030", "www.chizihn@gmail.com", "#E91E63")
            }
            AuthorityKind::Fire => {
                Self::entry(kind, "08109251030", "www.chizihn@gmail.com", "#FF5722")
            }
        }
    }
}
