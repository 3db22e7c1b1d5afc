use crate::db::DatabaseError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde goes through the same strings so snapshots stay readable.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(DoseStatus {
    Taken => "Taken",
    Upcoming => "Upcoming",
    Missed => "Missed",
    Delayed => "Delayed",
});

str_enum!(ApprovalStatus {
    Pending => "Pending",
    Approved => "Approved",
    Rejected => "Rejected",
});

str_enum!(UserRole {
    Patient => "patient",
    Caregiver => "caregiver",
});

impl ApprovalStatus {
    /// Approved and Rejected have no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn dose_status_round_trip() {
        for (variant, s) in [
            (DoseStatus::Taken, "Taken"),
            (DoseStatus::Upcoming, "Upcoming"),
            (DoseStatus::Missed, "Missed"),
            (DoseStatus::Delayed, "Delayed"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(DoseStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn user_role_uses_lowercase_strings() {
        assert_eq!(UserRole::Patient.as_str(), "patient");
        assert_eq!(UserRole::from_str("caregiver").unwrap(), UserRole::Caregiver);
    }

    #[test]
    fn invalid_enum_value_returns_error() {
        let result = ApprovalStatus::from_str("maybe");
        assert!(matches!(
            result,
            Err(DatabaseError::InvalidEnum { ref field, ref value })
                if field == "ApprovalStatus" && value == "maybe"
        ));
    }

    #[test]
    fn serde_uses_display_strings() {
        let json = serde_json::to_string(&ApprovalStatus::Pending).unwrap();
        assert_eq!(json, "\"Pending\"");
        let role: UserRole = serde_json::from_str("\"patient\"").unwrap();
        assert_eq!(role, UserRole::Patient);
        assert!(serde_json::from_str::<DoseStatus>("\"taken\"").is_err());
    }

    #[test]
    fn only_pending_is_open() {
        assert!(!ApprovalStatus::Pending.is_terminal());
        assert!(ApprovalStatus::Approved.is_terminal());
        assert!(ApprovalStatus::Rejected.is_terminal());
    }
}
