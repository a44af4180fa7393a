//! Owners
//!
//! Shopper identities are issued by the authentication layer; this crate only
//! ever receives an already-authenticated owner id.

use crate::uuids::TypedUuid;

/// Owner marker
#[derive(Debug)]
pub struct Owner;

/// Owner UUID
pub type OwnerUuid = TypedUuid<Owner>;
