//! Permission flags and flag-letter parsing.
//!
//! A permission mask is a set of [`Flags`]. The four operations map to single
//! bits; [`Flags::WRITE`] and [`Flags::RW`] are the usual combinations and
//! [`Flags::DENY`] is the empty mask.
//!
//! | Flag | Bit | Letter |
//! |------|-----|--------|
//! | [`READ`](Flags::READ) | `0x01` | `r` |
//! | [`UPDATE`](Flags::UPDATE) | `0x02` | `u` |
//! | [`CREATE`](Flags::CREATE) | `0x04` | `c` |
//! | [`DELETE`](Flags::DELETE) | `0x08` | `d` |
//!
//! # Example
//!
//! ```
//! use nsguard::flags::{parse_flags, Flags};
//!
//! let mask = parse_flags("cr");
//! assert_eq!(mask, Flags::CREATE | Flags::READ);
//! assert!(mask.allows(Flags::READ));
//! assert!(!mask.allows(Flags::DELETE));
//!
//! // Integer masks keep bits outside the named set
//! let custom = Flags::from(0x31_u32);
//! assert_eq!(custom.bits(), 0x31);
//! ```

use crate::error::GuardError;
use bitflags::bitflags;
use serde_json::Value;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

bitflags! {
    /// Bitmask of permitted operations on a namespace.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Flags: u32 {
        /// Read access
        const READ   = 0x01;
        /// Update existing data
        const UPDATE = 0x02;
        /// Create new data
        const CREATE = 0x04;
        /// Delete data
        const DELETE = 0x08;
        /// UPDATE | CREATE | DELETE
        const WRITE  = Self::UPDATE.bits() | Self::CREATE.bits() | Self::DELETE.bits();
        /// READ | WRITE
        const RW     = Self::READ.bits() | Self::WRITE.bits();
    }
}

/// Letter codes in rendering order.
const LETTERS: [(Flags, char); 4] = [
    (Flags::CREATE, 'c'),
    (Flags::READ, 'r'),
    (Flags::UPDATE, 'u'),
    (Flags::DELETE, 'd'),
];

impl Flags {
    /// Deny all access.
    pub const DENY: Self = Self::empty();

    /// Returns `true` if any bit of `level` is set in this mask.
    #[must_use]
    pub fn allows(self, level: Flags) -> bool {
        self.intersects(level)
    }

    /// Converts an untyped flag value into a mask.
    ///
    /// Integers pass through unchanged, strings are parsed as flag letters and
    /// `null`/`false` mean [`Flags::DENY`]. Anything else is a usage error.
    ///
    /// ```
    /// use nsguard::flags::Flags;
    /// use serde_json::json;
    ///
    /// assert_eq!(Flags::from_value(&json!(15)).unwrap(), Flags::RW);
    /// assert_eq!(Flags::from_value(&json!("ru")).unwrap(), Flags::READ | Flags::UPDATE);
    /// assert!(Flags::from_value(&json!([1])).is_err());
    /// ```
    pub fn from_value(value: &Value) -> Result<Self, GuardError> {
        match value {
            Value::Null | Value::Bool(false) => Ok(Self::DENY),
            Value::Number(n) => n
                .as_u64()
                .and_then(|bits| u32::try_from(bits).ok())
                .map(Self::from_bits_retain)
                .ok_or_else(|| GuardError::InvalidFlags {
                    found: value.to_string(),
                }),
            Value::String(s) => Ok(parse_flags(s)),
            _ => Err(GuardError::InvalidFlags {
                found: value.to_string(),
            }),
        }
    }
}

/// Converts a string of flag letters into a mask.
///
/// Unknown letters are ignored and an empty string yields [`Flags::DENY`].
pub fn parse_flags(letters: &str) -> Flags {
    letters.chars().fold(Flags::DENY, |mask, ch| {
        LETTERS
            .iter()
            .filter(|(_, letter)| *letter == ch)
            .fold(mask, |mask, (flag, _)| mask | *flag)
    })
}

impl From<u32> for Flags {
    fn from(bits: u32) -> Self {
        Self::from_bits_retain(bits)
    }
}

impl FromStr for Flags {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_flags(s))
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, letter) in LETTERS {
            if self.contains(flag) {
                write!(f, "{letter}")?;
            }
        }
        let unnamed = self.bits() & !Self::all().bits();
        if unnamed != 0 {
            write!(f, "+{unnamed:#x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_single_letters() {
        assert_eq!(parse_flags("c"), Flags::CREATE);
        assert_eq!(parse_flags("r"), Flags::READ);
        assert_eq!(parse_flags("u"), Flags::UPDATE);
        assert_eq!(parse_flags("d"), Flags::DELETE);
    }

    #[test]
    fn test_parse_combinations() {
        assert_eq!(parse_flags("cr"), Flags::CREATE | Flags::READ);
        assert_eq!(
            parse_flags("cru"),
            Flags::CREATE | Flags::READ | Flags::UPDATE
        );
        assert_eq!(parse_flags("crud"), Flags::RW);
        assert_eq!(parse_flags("dcu"), Flags::WRITE);
    }

    #[test]
    fn test_parse_empty_and_unknown() {
        assert_eq!(parse_flags(""), Flags::DENY);
        assert_eq!(parse_flags("xyz"), Flags::DENY);
        assert_eq!(parse_flags("rx"), Flags::READ);
    }

    #[test]
    fn test_composite_values() {
        assert_eq!(Flags::WRITE.bits(), 14);
        assert_eq!(Flags::RW.bits(), 15);
        assert_eq!(Flags::DENY.bits(), 0);
    }

    #[test]
    fn test_allows() {
        assert!(Flags::RW.allows(Flags::READ));
        assert!(Flags::WRITE.allows(Flags::UPDATE));
        assert!(!Flags::READ.allows(Flags::WRITE));
        assert!(!Flags::DENY.allows(Flags::READ));
        // any overlapping bit is enough
        assert!(Flags::UPDATE.allows(Flags::WRITE));
    }

    #[test]
    fn test_from_value() {
        assert_eq!(Flags::from_value(&json!(1)).unwrap(), Flags::READ);
        assert_eq!(Flags::from_value(&json!("crud")).unwrap(), Flags::RW);
        assert_eq!(Flags::from_value(&json!(null)).unwrap(), Flags::DENY);
        assert_eq!(Flags::from_value(&json!("")).unwrap(), Flags::DENY);
        assert_eq!(Flags::from_value(&json!(0x40)).unwrap().bits(), 0x40);
    }

    #[test]
    fn test_from_value_rejects_other_types() {
        for bad in [json!(true), json!(-1), json!(1.5), json!([1]), json!({"r": 1})] {
            let err = Flags::from_value(&bad).unwrap_err();
            assert!(matches!(err, GuardError::InvalidFlags { .. }), "{bad}");
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Flags::RW.to_string(), "crud");
        assert_eq!(Flags::READ.to_string(), "r");
        assert_eq!(Flags::DENY.to_string(), "");
        assert_eq!(Flags::from(0x11_u32).to_string(), "r+0x10");
    }

    #[test]
    fn test_from_str() {
        let mask: Flags = "ru".parse().unwrap();
        assert_eq!(mask, Flags::READ | Flags::UPDATE);
    }
}
