//! Object naming rules for Google Cloud Storage.
//!
//! See <https://cloud.google.com/storage/docs/naming-objects>. Every name
//! written to the bucket goes through [`validate_object_name`] first.

use thiserror::Error;

const MIN_OBJECT_NAME_LEN: usize = 1;
const MAX_OBJECT_NAME_LEN: usize = 1024;
const RESERVED_PREFIX: &str = ".well-known/acme-challenge";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameViolation {
    #[error("UTF-8 encoded name too short ({0} bytes)")]
    TooShort(usize),
    #[error("UTF-8 encoded name too long ({0} bytes)")]
    TooLong(usize),
    #[error("disallowed prefix: .well-known/acme-challenge")]
    ReservedPrefix,
    #[error("disallowed name: {0}")]
    ReservedName(String),
    #[error("disallowed character in name: {:#04x}", code_point(.0))]
    DisallowedChar(char),
}

/// Check `name` against the naming rules, first failure wins.
pub fn validate_object_name(name: &str) -> Result<(), NameViolation> {
    let len = name.len();
    if len < MIN_OBJECT_NAME_LEN {
        return Err(NameViolation::TooShort(len));
    }
    if len > MAX_OBJECT_NAME_LEN {
        return Err(NameViolation::TooLong(len));
    }

    if name.starts_with(RESERVED_PREFIX) {
        return Err(NameViolation::ReservedPrefix);
    }

    if name == "." || name == ".." {
        return Err(NameViolation::ReservedName(name.to_string()));
    }

    match name.chars().find(|&c| is_disallowed(c)) {
        Some(c) => Err(NameViolation::DisallowedChar(c)),
        None => Ok(()),
    }
}

fn code_point(c: &char) -> u32 {
    u32::from(*c)
}

fn is_disallowed(c: char) -> bool {
    matches!(
        c,
        '\r' | '\n' | '#' | '[' | ']' | '*' | '?' | '\u{7f}'..='\u{84}' | '\u{86}'..='\u{9f}'
    )
}
