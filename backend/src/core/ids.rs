//! Identity generation and validation
//!
//! Scene nodes carry no stable identity of their own: names are neither unique
//! nor stable. Every proxy, joint, and driver therefore carries a generated
//! identifier as a persisted attribute, and later build phases find objects by
//! that identifier (see `scene::lookup`).
//!
//! Two formats exist:
//! - **Long form** (proxies): UUID v4, hyphenated or simple (32 hex digits)
//! - **Short form** (modules): [`SHORT_UUID_LENGTH`] lowercase hex characters
//!
//! The short form never contains `-`, so a module UUID can lead a composite
//! driver key (`<module_uuid>-<type>-<purpose>`) and be split off positionally.

use uuid::Uuid;

/// Length of the short identifier assigned to modules
pub const SHORT_UUID_LENGTH: usize = 12;

/// Generate a new identifier
///
/// # Arguments
/// * `short` - `false` for the long (proxy) form, `true` for the short (module) form
///
/// # Example
/// ```
/// use rig_framework_core_rs::core::ids::{generate_uuid, is_short_uuid_valid, is_uuid_valid, SHORT_UUID_LENGTH};
///
/// let long = generate_uuid(false);
/// assert!(is_uuid_valid(&long));
///
/// let short = generate_uuid(true);
/// assert!(is_short_uuid_valid(&short, SHORT_UUID_LENGTH));
/// ```
pub fn generate_uuid(short: bool) -> String {
    let uuid = Uuid::new_v4();
    if short {
        let simple = uuid.simple().to_string();
        simple[..SHORT_UUID_LENGTH].to_string()
    } else {
        uuid.to_string()
    }
}

/// Check whether `value` is a long-form identifier
///
/// Accepts the hyphenated (36 chars) and simple (32 chars) renderings only;
/// braced and URN renderings are rejected so stored attributes stay uniform.
pub fn is_uuid_valid(value: &str) -> bool {
    if value.len() != 36 && value.len() != 32 {
        return false;
    }
    Uuid::try_parse(value).is_ok()
}

/// Check whether `value` is a short-form identifier of exactly `length` characters
///
/// Only ASCII alphanumerics are accepted.
pub fn is_short_uuid_valid(value: &str, length: usize) -> bool {
    value.len() == length && value.chars().all(|c| c.is_ascii_alphanumeric())
}
