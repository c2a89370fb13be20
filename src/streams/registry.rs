//! Static stream registry
//!
//! Every stream the connector can extract is described here once. The
//! descriptor decides the endpoint, keys and which controller behavior
//! applies, so nothing downstream looks streams up by name at runtime
//! except through [`Resource::from_name`].

use crate::error::{Error, Result};
use crate::pagination::PageShape;
use crate::types::ReplicationMethod;
use std::fmt;
use std::str::FromStr;

/// The ten extractable resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    /// Customer accounts
    Accounts,
    /// Billing info of one account
    BillingInfo,
    /// Line items (adjustments)
    Adjustments,
    /// Coupon redemptions under accounts, subscriptions and invoices
    CouponRedemptions,
    /// Coupons
    Coupons,
    /// Invoices
    Invoices,
    /// Plans
    Plans,
    /// Add-ons of one plan
    PlanAddOns,
    /// Subscriptions
    Subscriptions,
    /// Transactions
    Transactions,
}

impl Resource {
    /// Every resource, in discovery order
    pub const ALL: [Resource; 10] = [
        Resource::Accounts,
        Resource::BillingInfo,
        Resource::Adjustments,
        Resource::CouponRedemptions,
        Resource::Coupons,
        Resource::Invoices,
        Resource::Plans,
        Resource::PlanAddOns,
        Resource::Subscriptions,
        Resource::Transactions,
    ];

    /// Stream name used in catalogs, state and output
    pub fn name(self) -> &'static str {
        self.definition().name
    }

    /// Look a resource up by its stream name
    pub fn from_name(name: &str) -> Option<Self> {
        STREAMS.iter().find(|d| d.name == name).map(|d| d.resource)
    }

    /// Static descriptor
    pub fn definition(self) -> &'static StreamDefinition {
        // STREAMS is indexed in declaration order of the enum
        &STREAMS[self as usize]
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::StreamNotFound {
            stream: s.to_string(),
        })
    }
}

/// How a stream reaches its records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Site-level collection filtered by `begin_time`
    Root,
    /// Nested under each record of one parent; the bookmark follows the
    /// parent's replication key
    Child {
        /// Parent resource
        parent: Resource,
    },
    /// Nested under several parents, each tracked with its own composite
    /// bookmark that is cleared once that parent type is exhausted
    MultiParent {
        /// Parents in visiting order
        parents: &'static [Resource],
    },
}

/// Static description of one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamDefinition {
    /// Resource this describes
    pub resource: Resource,
    /// Stream name
    pub name: &'static str,
    /// Collection segment. For root streams this sits directly under the
    /// site; for nested streams under `{parent}/{parent_id}/`.
    pub endpoint: &'static str,
    /// Primary key fields
    pub primary_key: &'static [&'static str],
    /// Field whose ascending value defines progress
    pub replication_key: &'static str,
    /// Method used when the catalog does not override it
    pub replication_method: ReplicationMethod,
    /// Root, child or multi-parent
    pub kind: StreamKind,
    /// Body layout of the stream's own endpoint
    pub shape: PageShape,
}

impl StreamDefinition {
    /// Whether records are only reachable through a parent
    pub fn is_nested(&self) -> bool {
        !matches!(self.kind, StreamKind::Root)
    }

    /// State key for a pass over `parent`.
    ///
    /// Multi-parent streams use `{parent}_{name}`, everything else the
    /// stream name.
    pub fn bookmark_key(&self, parent: Option<Resource>) -> String {
        match (self.kind, parent) {
            (StreamKind::MultiParent { .. }, Some(parent)) => {
                format!("{}_{}", parent.name(), self.name)
            }
            _ => self.name.to_string(),
        }
    }

    /// Field stored in the bookmark and compared against records.
    ///
    /// A single-parent child tracks its parent's replication key since the
    /// parents are what get filtered by `begin_time`.
    pub fn bookmark_field(&self) -> &'static str {
        match self.kind {
            StreamKind::Child { parent } => parent.definition().replication_key,
            StreamKind::Root | StreamKind::MultiParent { .. } => self.replication_key,
        }
    }
}

const fn root(
    resource: Resource,
    name: &'static str,
    endpoint: &'static str,
    replication_key: &'static str,
) -> StreamDefinition {
    StreamDefinition {
        resource,
        name,
        endpoint,
        primary_key: &["id"],
        replication_key,
        replication_method: ReplicationMethod::Incremental,
        kind: StreamKind::Root,
        shape: PageShape::List,
    }
}

/// Parents visited for coupon redemptions
pub const COUPON_REDEMPTION_PARENTS: [Resource; 3] = [
    Resource::Accounts,
    Resource::Subscriptions,
    Resource::Invoices,
];

/// All stream descriptors, in the declaration order of [`Resource`]
pub static STREAMS: [StreamDefinition; 10] = [
    root(Resource::Accounts, "accounts", "accounts", "updated_at"),
    StreamDefinition {
        resource: Resource::BillingInfo,
        name: "billing_info",
        endpoint: "billing_info",
        primary_key: &["account_id"],
        replication_key: "updated_at",
        replication_method: ReplicationMethod::Incremental,
        kind: StreamKind::Child {
            parent: Resource::Accounts,
        },
        shape: PageShape::Single,
    },
    root(Resource::Adjustments, "adjustments", "line_items", "updated_at"),
    StreamDefinition {
        resource: Resource::CouponRedemptions,
        name: "coupon_redemptions",
        endpoint: "coupon_redemptions",
        primary_key: &["id"],
        replication_key: "created_at",
        replication_method: ReplicationMethod::Incremental,
        kind: StreamKind::MultiParent {
            parents: &COUPON_REDEMPTION_PARENTS,
        },
        shape: PageShape::List,
    },
    root(Resource::Coupons, "coupons", "coupons", "updated_at"),
    root(Resource::Invoices, "invoices", "invoices", "updated_at"),
    root(Resource::Plans, "plans", "plans", "updated_at"),
    StreamDefinition {
        resource: Resource::PlanAddOns,
        name: "plans_add_ons",
        endpoint: "add_ons",
        primary_key: &["id"],
        replication_key: "updated_at",
        replication_method: ReplicationMethod::Incremental,
        kind: StreamKind::Child {
            parent: Resource::Plans,
        },
        shape: PageShape::List,
    },
    root(Resource::Subscriptions, "subscriptions", "subscriptions", "updated_at"),
    root(Resource::Transactions, "transactions", "transactions", "collected_at"),
];
