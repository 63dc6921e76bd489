use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
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

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Frequency {
    Once => "once",
    Twice => "twice",
    Thrice => "thrice",
    Weekly => "weekly",
    AsNeeded => "as_needed",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn frequency_round_trip() {
        for (variant, s) in [
            (Frequency::Once, "once"),
            (Frequency::Twice, "twice"),
            (Frequency::Thrice, "thrice"),
            (Frequency::Weekly, "weekly"),
            (Frequency::AsNeeded, "as_needed"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Frequency::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn frequency_serializes_as_wire_string() {
        let json = serde_json::to_string(&Frequency::AsNeeded).unwrap();
        assert_eq!(json, "\"as_needed\"");
        let parsed: Frequency = serde_json::from_str("\"thrice\"").unwrap();
        assert_eq!(parsed, Frequency::Thrice);
    }

    #[test]
    fn invalid_frequency_returns_error() {
        assert!(Frequency::from_str("daily").is_err());
        assert!(Frequency::from_str("Once").is_err());
        assert!(Frequency::from_str("").is_err());
    }
}
