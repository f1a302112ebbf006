//! Macro for string conversions of persisted enums
//!
//! Status and environment enums are stored as lowercase text in SQLite and
//! accepted from the command line, so each one needs the same `as_str`,
//! `Display` and `FromStr` trio.
//!
//! # Example
//!
//! ```rust
//! use ksef_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Delivery {
//!     Queued,
//!     Delivered,
//! }
//!
//! impl_domain_status_conversions!(Delivery {
//!     Queued => "queued",
//!     Delivered => "delivered",
//! });
//!
//! assert_eq!(Delivery::Queued.as_str(), "queued");
//! assert_eq!(" Delivered ".parse::<Delivery>(), Ok(Delivery::Delivered));
//! ```

/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum.
///
/// Parsing trims surrounding whitespace and ignores ASCII case. Extra aliases
/// can be accepted with `aliases { "prod" => Production }`.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        $crate::impl_domain_status_conversions!(
            $enum_name { $($variant => $str),+ } aliases {}
        );
    };
    (
        $enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }
        aliases { $($alias:literal => $alias_variant:ident),* $(,)? }
    ) => {
        impl $enum_name {
            /// Canonical lowercase representation.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    $($alias => Ok(Self::$alias_variant),)*
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
