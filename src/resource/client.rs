//! Resource client
//!
//! Maps each resource onto its site-scoped endpoint. Root collections are
//! filtered by `begin_time`; nested collections are reached one parent at a
//! time and are never time-filtered.

use crate::error::{Error, Result};
use crate::http::{FetchOutcome, HttpClient, QuotaGovernor};
use crate::pagination::{PageShape, RecordPager};
use crate::streams::{Resource, StreamKind, COUPON_REDEMPTION_PARENTS};
use serde_json::Value;
use tracing::warn;
use url::form_urlencoded;

/// Records requested per page
pub const PAGE_SIZE: u32 = 200;

/// Site-scoped accessors for every resource
#[derive(Debug)]
pub struct ResourceClient {
    http: HttpClient,
    governor: QuotaGovernor,
    site_id: String,
}

impl ResourceClient {
    /// Create a client for `subdomain`
    pub fn new(http: HttpClient, governor: QuotaGovernor, subdomain: &str) -> Self {
        Self {
            http,
            governor,
            site_id: format!("subdomain-{subdomain}"),
        }
    }

    /// Site identifier, `subdomain-{subdomain}`
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    /// Relative path of a collection with the standard query.
    ///
    /// `begin` is escaped; `None` omits `begin_time` entirely.
    pub fn collection_path(&self, endpoint: &str, sort: &str, begin: Option<&str>) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("limit", &PAGE_SIZE.to_string());
        query.append_pair("sort", sort);
        if let Some(begin) = begin {
            query.append_pair("begin_time", begin);
        }
        query.append_pair("order", "asc");

        format!("sites/{}/{}?{}", self.site_id, endpoint, query.finish())
    }

    /// Request a single account to verify credentials and site access
    pub async fn first_account(&self) -> Result<FetchOutcome> {
        let path = format!("sites/{}/accounts?limit=1", self.site_id);
        self.http.get(&path).await
    }

    fn nested_path(&self, parent: Resource, parent_id: &str, endpoint: &str, sort: &str) -> String {
        let id: String = form_urlencoded::byte_serialize(parent_id.as_bytes()).collect();
        let nested = format!("{}/{}/{}", parent.definition().endpoint, id, endpoint);
        self.collection_path(&nested, sort, None)
    }

    fn pager(&self, path: String, shape: PageShape) -> RecordPager<'_> {
        RecordPager::new(&self.http, &self.governor, path, shape)
    }

    fn root(&self, resource: Resource, sort: &str, begin: &str) -> RecordPager<'_> {
        let def = resource.definition();
        self.pager(self.collection_path(def.endpoint, sort, Some(begin)), def.shape)
    }

    // ========================================================================
    // Root collections
    // ========================================================================

    /// Accounts changed since `begin`
    pub fn accounts(&self, sort: &str, begin: &str) -> RecordPager<'_> {
        self.root(Resource::Accounts, sort, begin)
    }

    /// Line items changed since `begin`
    pub fn adjustments(&self, sort: &str, begin: &str) -> RecordPager<'_> {
        self.root(Resource::Adjustments, sort, begin)
    }

    /// Coupons changed since `begin`
    pub fn coupons(&self, sort: &str, begin: &str) -> RecordPager<'_> {
        self.root(Resource::Coupons, sort, begin)
    }

    /// Invoices changed since `begin`
    pub fn invoices(&self, sort: &str, begin: &str) -> RecordPager<'_> {
        self.root(Resource::Invoices, sort, begin)
    }

    /// Plans changed since `begin`
    pub fn plans(&self, sort: &str, begin: &str) -> RecordPager<'_> {
        self.root(Resource::Plans, sort, begin)
    }

    /// Subscriptions changed since `begin`
    pub fn subscriptions(&self, sort: &str, begin: &str) -> RecordPager<'_> {
        self.root(Resource::Subscriptions, sort, begin)
    }

    /// Transactions since `begin`
    pub fn transactions(&self, sort: &str, begin: &str) -> RecordPager<'_> {
        self.root(Resource::Transactions, sort, begin)
    }

    // ========================================================================
    // Nested collections
    // ========================================================================

    /// Billing info of one account (a single object)
    pub fn billing_info(&self, account_id: &str, sort: &str) -> RecordPager<'_> {
        let def = Resource::BillingInfo.definition();
        let path = self.nested_path(Resource::Accounts, account_id, def.endpoint, sort);
        self.pager(path, def.shape)
    }

    /// Coupon redemptions of one account, subscription or invoice
    pub fn coupon_redemptions(
        &self,
        parent: Resource,
        parent_id: &str,
        sort: &str,
    ) -> Result<RecordPager<'_>> {
        if !COUPON_REDEMPTION_PARENTS.contains(&parent) {
            return Err(Error::config(format!(
                "coupon_redemptions cannot be read through '{parent}'"
            )));
        }

        let def = Resource::CouponRedemptions.definition();
        let path = self.nested_path(parent, parent_id, def.endpoint, sort);
        Ok(self.pager(path, def.shape))
    }

    /// Add-ons of one plan
    pub fn plan_add_ons(&self, plan_id: &str, sort: &str) -> RecordPager<'_> {
        let def = Resource::PlanAddOns.definition();
        let path = self.nested_path(Resource::Plans, plan_id, def.endpoint, sort);
        self.pager(path, def.shape)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Pager over a root collection
    pub fn records(&self, resource: Resource, sort: &str, begin: &str) -> Result<RecordPager<'_>> {
        match resource {
            Resource::Accounts => Ok(self.accounts(sort, begin)),
            Resource::Adjustments => Ok(self.adjustments(sort, begin)),
            Resource::Coupons => Ok(self.coupons(sort, begin)),
            Resource::Invoices => Ok(self.invoices(sort, begin)),
            Resource::Plans => Ok(self.plans(sort, begin)),
            Resource::Subscriptions => Ok(self.subscriptions(sort, begin)),
            Resource::Transactions => Ok(self.transactions(sort, begin)),
            Resource::BillingInfo | Resource::CouponRedemptions | Resource::PlanAddOns => Err(
                Error::config(format!("'{resource}' is only reachable through a parent")),
            ),
        }
    }

    /// Pager over `resource` nested under one parent record
    pub fn nested(
        &self,
        resource: Resource,
        parent: Resource,
        parent_id: &str,
        sort: &str,
    ) -> Result<RecordPager<'_>> {
        match (resource, parent) {
            (Resource::BillingInfo, Resource::Accounts) => Ok(self.billing_info(parent_id, sort)),
            (Resource::PlanAddOns, Resource::Plans) => Ok(self.plan_add_ons(parent_id, sort)),
            (Resource::CouponRedemptions, parent) => {
                self.coupon_redemptions(parent, parent_id, sort)
            }
            _ => Err(Error::config(format!(
                "'{resource}' cannot be read through '{parent}'"
            ))),
        }
    }

    /// Walk `parent` records changed since `begin`, pairing each with a pager
    /// over its `resource` children.
    pub fn substream(
        &self,
        resource: Resource,
        parent: Resource,
        parent_sort: &str,
        begin: &str,
    ) -> Result<SubstreamPager<'_>> {
        let def = resource.definition();
        let reachable = match def.kind {
            StreamKind::Root => false,
            StreamKind::Child { parent: p } => p == parent,
            StreamKind::MultiParent { parents } => parents.contains(&parent),
        };
        if !reachable {
            return Err(Error::config(format!(
                "'{resource}' cannot be read through '{parent}'"
            )));
        }

        Ok(SubstreamPager {
            client: self,
            resource,
            parent,
            child_sort: def.replication_key,
            parents: self.records(parent, parent_sort, begin)?,
        })
    }
}

/// Parent records paired with pagers over their children
#[derive(Debug)]
pub struct SubstreamPager<'a> {
    client: &'a ResourceClient,
    resource: Resource,
    parent: Resource,
    child_sort: &'static str,
    parents: RecordPager<'a>,
}

impl<'a> SubstreamPager<'a> {
    /// Parent resource being walked
    pub fn parent(&self) -> Resource {
        self.parent
    }

    /// Next parent with its child pager; parents without an `id` are skipped
    pub async fn next_parent(&mut self) -> Result<Option<(Value, RecordPager<'a>)>> {
        while let Some(record) = self.parents.next().await? {
            let Some(id) = record_id(&record) else {
                warn!(
                    "Skipping {} record without an id while reading {}",
                    self.parent, self.resource
                );
                continue;
            };

            let client: &'a ResourceClient = self.client;
            let children = client.nested(self.resource, self.parent, &id, self.child_sort)?;
            return Ok(Some((record, children)));
        }

        Ok(None)
    }
}

fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
