//! Username to user id mapping.
//!
//! There are no accounts: a player's id is a hash of the name they type,
//! folded into `1..=1000`. Different names can and do collide.

use crate::types::UserId;

/// Upper bound (inclusive) of derived ids.
pub const IDENTITY_BUCKETS: i64 = 1000;

/// Source of the id a submission is recorded under.
pub trait IdentityProvider: Send + Sync {
    fn identify(&self, username: &str) -> UserId;
}

/// Default provider backed by [`derive_user_id`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedIdentity;

impl IdentityProvider for HashedIdentity {
    fn identify(&self, username: &str) -> UserId {
        derive_user_id(username)
    }
}

/// Fold the UTF-16 code units of the trimmed name with `acc * 31 + unit`
/// in wrapping 32-bit signed arithmetic, then map to `1..=1000`.
pub fn derive_user_id(username: &str) -> UserId {
    let acc = username.trim().encode_utf16().fold(0i32, |acc, unit| {
        acc.wrapping_shl(5).wrapping_sub(acc).wrapping_add(i32::from(unit))
    });

    // widen first so i32::MIN has an absolute value
    i64::from(acc).abs() % IDENTITY_BUCKETS + 1
}
