use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Closed set: every policy check matches on it exhaustively. The serialized
/// form is the human label stored in the `users.role` column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Admin")]
    Admin,
    #[serde(rename = "Stock Controller")]
    StockController,
    #[serde(rename = "Viewer")]
    Viewer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::StockController, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::StockController => "Stock Controller",
            Role::Viewer => "Viewer",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_column_labels() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("stock controller".parse::<Role>().is_err());
    }

    #[test]
    fn serializes_with_spaces() {
        let json = serde_json::to_string(&Role::StockController).unwrap();
        assert_eq!(json, "\"Stock Controller\"");
    }
}
