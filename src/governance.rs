//! Administrative access control
//!
//! The oracles only need to know whether a caller may register pools.

use ethers::types::Address;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("{0:#x} is not a protocol admin")]
    NotAdmin(Address),
}

/// Capability check consulted before any registry mutation
pub trait AccessControl: Send + Sync {
    fn is_admin(&self, caller: &Address) -> bool;

    fn require_admin(&self, caller: &Address) -> Result<(), AuthorizationError> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(AuthorizationError::NotAdmin(*caller))
        }
    }
}

/// Fixed set of admin addresses, loaded once from configuration
#[derive(Debug, Clone, Default)]
pub struct AdminSet {
    admins: HashSet<Address>,
}

impl AdminSet {
    pub fn new(admins: impl IntoIterator<Item = Address>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.admins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

impl AccessControl for AdminSet {
    fn is_admin(&self, caller: &Address) -> bool {
        self.admins.contains(caller)
    }
}
