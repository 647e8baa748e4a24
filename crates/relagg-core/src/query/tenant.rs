//! Tenant scoping.

use relagg_proto::Expr;

use crate::catalog::ResourceDef;
use crate::error::{Error, Result};
use crate::security::AggregateContext;

/// Derives tenant predicates from a resource's multitenancy strategy.
pub struct TenantScoper;

impl TenantScoper {
    /// Tenant predicate for the root resource.
    ///
    /// A global resource queried without a tenant is not restricted.
    /// A non-global one fails with `MissingTenant`.
    pub fn root_predicate(resource: &ResourceDef, ctx: &AggregateContext) -> Result<Option<Expr>> {
        let Some(tenancy) = &resource.multitenancy else {
            return Ok(None);
        };
        match &ctx.tenant {
            Some(tenant) => Ok(Some(Expr::eq(tenancy.attribute.clone(), tenant.clone()))),
            None if tenancy.global => Ok(None),
            None => Err(Error::MissingTenant {
                resource: resource.name.clone(),
            }),
        }
    }

    /// Tenant predicate for a resource reached through a join.
    ///
    /// Only non-global multitenant targets are restricted there.
    pub fn hop_predicate(resource: &ResourceDef, ctx: &AggregateContext) -> Result<Option<Expr>> {
        match &resource.multitenancy {
            Some(tenancy) if !tenancy.global => Self::root_predicate(resource, ctx),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttributeDef, Multitenancy, ScalarType};

    fn resource(multitenancy: Option<Multitenancy>) -> ResourceDef {
        let mut resource = ResourceDef::new("Post", "id")
            .with_attribute(AttributeDef::required("id", ScalarType::Integer))
            .with_attribute(AttributeDef::new("org", ScalarType::String));
        resource.multitenancy = multitenancy;
        resource
    }

    #[test]
    fn test_single_tenant_resource() {
        let ctx = AggregateContext::new().with_tenant("foo");
        assert_eq!(TenantScoper::root_predicate(&resource(None), &ctx).unwrap(), None);
    }

    #[test]
    fn test_strict_tenancy() {
        let strict = resource(Some(Multitenancy::attribute("org")));

        let scoped = AggregateContext::new().with_tenant("foo");
        assert_eq!(
            TenantScoper::root_predicate(&strict, &scoped).unwrap(),
            Some(Expr::eq("org", "foo"))
        );
        assert_eq!(
            TenantScoper::hop_predicate(&strict, &scoped).unwrap(),
            Some(Expr::eq("org", "foo"))
        );
        assert!(matches!(
            TenantScoper::root_predicate(&strict, &AggregateContext::new()),
            Err(Error::MissingTenant { .. })
        ));
    }

    #[test]
    fn test_global_tenancy() {
        let global = resource(Some(Multitenancy::attribute("org").global()));

        assert_eq!(
            TenantScoper::root_predicate(&global, &AggregateContext::new()).unwrap(),
            None
        );
        let scoped = AggregateContext::new().with_tenant("foo");
        assert_eq!(
            TenantScoper::root_predicate(&global, &scoped).unwrap(),
            Some(Expr::eq("org", "foo"))
        );
        // Global targets are never scoped at a hop.
        assert_eq!(TenantScoper::hop_predicate(&global, &scoped).unwrap(), None);
    }
}
