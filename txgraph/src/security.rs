// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Security context of a caller
//!
//! Carries the acting principal (used for changelog attribution) and the
//! per-request flags that steer deletion and notification behavior.

use serde::{Deserialize, Serialize};

/// Identity and request flags of the caller performing a unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    principal: Option<String>,
    super_user: bool,
    cascading_delete: bool,
    transaction_notifications: bool,
}

impl Default for SecurityContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl SecurityContext {
    /// Context of an authenticated user
    pub fn for_user(principal: impl Into<String>) -> Self {
        Self {
            principal: Some(principal.into()),
            super_user: false,
            cascading_delete: false,
            transaction_notifications: true,
        }
    }

    /// Context without a principal
    pub fn anonymous() -> Self {
        Self {
            principal: None,
            super_user: false,
            cascading_delete: false,
            transaction_notifications: true,
        }
    }

    /// Unrestricted context used by maintenance jobs
    pub fn super_user() -> Self {
        Self {
            principal: None,
            super_user: true,
            cascading_delete: false,
            transaction_notifications: true,
        }
    }

    /// Request cascading delete for deletions performed with this context
    pub fn with_cascading_delete(mut self, enabled: bool) -> Self {
        self.cascading_delete = enabled;
        self
    }

    /// Enable or disable listener notification for this context
    pub fn with_transaction_notifications(mut self, enabled: bool) -> Self {
        self.transaction_notifications = enabled;
        self
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    pub fn is_super_user(&self) -> bool {
        self.super_user
    }

    pub fn cascading_delete(&self) -> bool {
        self.cascading_delete
    }

    pub fn transaction_notifications(&self) -> bool {
        self.transaction_notifications
    }
}
