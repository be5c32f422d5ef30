//! Authorization rules shared by every API in this module.
//!
//! Authentication (verifying a token) happens at the edge. By the time a request reaches the engine the caller is
//! either a verified [`Caller`] or absent.
use serde::{Deserialize, Serialize};

use crate::{db_types::Order, pe_api::errors::PaymentApiError};

pub const DEFAULT_ADMIN_GROUP: &str = "admin";

/// A verified identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub subject_id: String,
    pub email: String,
    pub groups: Vec<String>,
}

impl Caller {
    pub fn new<S: Into<String>>(subject_id: S, email: S) -> Self {
        Self { subject_id: subject_id.into(), email: email.into(), groups: Vec::new() }
    }

    pub fn with_group<S: Into<String>>(mut self, group: S) -> Self {
        self.groups.push(group.into());
        self
    }

    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

#[derive(Debug, Clone)]
pub struct AccessControl {
    admin_group: String,
}

impl Default for AccessControl {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_GROUP)
    }
}

impl AccessControl {
    pub fn new<S: Into<String>>(admin_group: S) -> Self {
        Self { admin_group: admin_group.into() }
    }

    pub fn admin_group(&self) -> &str {
        &self.admin_group
    }

    pub fn is_admin(&self, caller: &Caller) -> bool {
        caller.is_member_of(&self.admin_group)
    }

    pub fn require_identity<'a>(&self, caller: Option<&'a Caller>) -> Result<&'a Caller, PaymentApiError> {
        caller.ok_or(PaymentApiError::Unauthenticated)
    }

    pub fn require_admin<'a>(&self, caller: Option<&'a Caller>) -> Result<&'a Caller, PaymentApiError> {
        let caller = self.require_identity(caller)?;
        if self.is_admin(caller) {
            Ok(caller)
        } else {
            Err(PaymentApiError::Unauthorized(format!("{} is not a member of the admin group", caller.subject_id)))
        }
    }

    /// Read access to an order (and its payments). Anonymous orders are visible to administrators only; owned orders
    /// to their owner and administrators.
    pub fn check_order_access(&self, caller: &Caller, order: &Order) -> Result<(), PaymentApiError> {
        if self.is_admin(caller) || (!order.is_anonymous() && order.user_id == caller.subject_id) {
            Ok(())
        } else {
            Err(PaymentApiError::Unauthorized(format!("{} may not access order {}", caller.subject_id, order.id)))
        }
    }

    /// Read access to a user's payment history.
    pub fn check_user_access(&self, caller: &Caller, user_id: &str) -> Result<(), PaymentApiError> {
        if self.is_admin(caller) || caller.subject_id == user_id {
            Ok(())
        } else {
            Err(PaymentApiError::Unauthorized(format!(
                "{} may not access the payments of user {user_id}",
                caller.subject_id
            )))
        }
    }
}
