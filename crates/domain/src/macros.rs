//! Macro for implementing Display and FromStr for label enums
//!
//! Credential kinds and sensitivity levels are persisted and logged by their
//! string labels. This macro keeps both directions of that mapping in one
//! place, with case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use tollgate_domain::impl_label_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Tier {
//!     Low,
//!     High,
//! }
//!
//! impl_label_conversions!(Tier {
//!     Low => "low",
//!     High => "high",
//! });
//!
//! assert_eq!(Tier::High.to_string(), "high");
//! assert_eq!("LOW".parse::<Tier>().unwrap(), Tier::Low);
//! ```

/// Implements Display and FromStr traits for label enums
///
/// This macro generates:
/// - Display trait: writes the configured label
/// - FromStr trait: parses case-insensitive strings to enum variants
///
/// Labels must be lowercase for parsing to round-trip.
#[macro_export]
macro_rules! impl_label_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
