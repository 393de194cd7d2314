//! Resource authorization: who may read or write a patient's data.
//!
//! A request is evaluated against a set of [`Requirement`]s. The FHIR
//! resource handler succeeds a requirement when the caller owns the
//! resource (their `hdid` claim matches the resource HDID) or, for
//! requirements that allow it, when the caller holds a matching system
//! scope such as `system/Patient.read`. It never fails a requirement
//! outright: anything it cannot grant is left undecided, and an
//! undecided requirement denies the request.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Hdid;

/// Name of the route parameter or query parameter carrying the resource HDID.
pub const HDID_PARAMETER: &str = "hdid";

// ============================================================================
// Principal
// ============================================================================

/// The authenticated caller as described by their token claims.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayPrincipal {
    /// Token subject.
    pub subject: String,
    /// HDID claim; absent for system clients.
    pub hdid: Option<Hdid>,
    /// Granted scopes, e.g. `system/Patient.read`.
    pub scopes: HashSet<String>,
    /// Realm roles, e.g. `AdminUser`.
    pub roles: HashSet<String>,
}

impl GatewayPrincipal {
    /// Principal for a patient acting on their own data.
    pub fn for_hdid(hdid: impl Into<Hdid>) -> Self {
        let hdid = hdid.into();
        Self {
            subject: hdid.to_string(),
            hdid: Some(hdid),
            ..Self::default()
        }
    }

    /// Add a space-separated scope claim.
    pub fn with_scope_claim(mut self, scope: &str) -> Self {
        self.scopes
            .extend(scope.split_whitespace().map(str::to_string));
        self
    }

    /// Add a role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Whether the principal holds `scope`.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// Whether the principal holds `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

// ============================================================================
// Requirements
// ============================================================================

/// Resource types protected by FHIR-style scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FhirResource {
    Patient,
    Observation,
    Immunization,
    Laboratory,
    Encounter,
    Note,
    MedicationStatement,
}

impl FhirResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "Patient",
            Self::Observation => "Observation",
            Self::Immunization => "Immunization",
            Self::Laboratory => "Laboratory",
            Self::Encounter => "Encounter",
            Self::Note => "Note",
            Self::MedicationStatement => "MedicationStatement",
        }
    }
}

impl fmt::Display for FhirResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of access requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FhirAccessType {
    Read,
    Write,
}

impl FhirAccessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// Where the resource HDID is found on the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FhirResourceLookup {
    /// Route parameter `{hdid}`.
    #[default]
    Route,
    /// Query parameter `?hdid=`.
    Parameter,
}

/// Access to a FHIR resource belonging to some patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FhirRequirement {
    pub resource: FhirResource,
    pub access_type: FhirAccessType,
    pub lookup: FhirResourceLookup,
    /// Whether a system scope may stand in for resource ownership.
    pub supports_system_delegation: bool,
}

impl FhirRequirement {
    /// Requirement looked up from the route, allowing system delegation.
    pub fn new(resource: FhirResource, access_type: FhirAccessType) -> Self {
        Self {
            resource,
            access_type,
            lookup: FhirResourceLookup::Route,
            supports_system_delegation: true,
        }
    }

    pub fn read(resource: FhirResource) -> Self {
        Self::new(resource, FhirAccessType::Read)
    }

    pub fn write(resource: FhirResource) -> Self {
        Self::new(resource, FhirAccessType::Write)
    }

    /// Change where the resource HDID is looked up.
    pub fn with_lookup(mut self, lookup: FhirResourceLookup) -> Self {
        self.lookup = lookup;
        self
    }

    /// Disallow system scopes for this requirement.
    pub fn without_system_delegation(mut self) -> Self {
        self.supports_system_delegation = false;
        self
    }

    /// The system scope that grants this requirement, e.g. `system/Patient.read`.
    pub fn system_scope(&self) -> String {
        format!(
            "system/{}.{}",
            self.resource.as_str(),
            self.access_type.as_str()
        )
    }
}

/// A requirement attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// Access to a patient resource.
    Fhir(FhirRequirement),
    /// Membership of a realm role.
    Role(String),
    /// A requirement handled elsewhere.
    Other(String),
}

/// Resource identifiers taken from the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLocator {
    /// `{hdid}` route parameter.
    pub route_hdid: Option<Hdid>,
    /// `?hdid=` query parameter.
    pub query_hdid: Option<Hdid>,
}

impl ResourceLocator {
    /// Locator for a route-addressed resource.
    pub fn route(hdid: impl Into<Hdid>) -> Self {
        Self {
            route_hdid: Some(hdid.into()),
            query_hdid: None,
        }
    }

    /// Locator for a query-addressed resource.
    pub fn query(hdid: impl Into<Hdid>) -> Self {
        Self {
            route_hdid: None,
            query_hdid: Some(hdid.into()),
        }
    }

    fn resolve(&self, lookup: FhirResourceLookup) -> Option<&Hdid> {
        let hdid = match lookup {
            FhirResourceLookup::Route => self.route_hdid.as_ref(),
            FhirResourceLookup::Parameter => self.query_hdid.as_ref(),
        };
        hdid.filter(|h| !h.is_blank())
    }
}

// ============================================================================
// Handler
// ============================================================================

/// Outcome of evaluating one requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Succeeded,
    NoDecision,
}

/// Grants FHIR requirements by ownership or system scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct FhirResourceAuthorizationHandler;

impl FhirResourceAuthorizationHandler {
    /// Evaluate `requirement` for `principal` against the request resource.
    pub fn evaluate(
        &self,
        principal: &GatewayPrincipal,
        requirement: &Requirement,
        locator: &ResourceLocator,
    ) -> AuthorizationDecision {
        let Requirement::Fhir(fhir) = requirement else {
            return AuthorizationDecision::NoDecision;
        };

        let Some(resource_hdid) = locator.resolve(fhir.lookup) else {
            tracing::warn!(
                resource = %fhir.resource,
                "No resource HDID on request, unable to authorize"
            );
            return AuthorizationDecision::NoDecision;
        };

        if principal.hdid.as_ref() == Some(resource_hdid) {
            tracing::debug!(resource = %fhir.resource, "Authorized as resource owner");
            return AuthorizationDecision::Succeeded;
        }

        if fhir.supports_system_delegation && principal.has_scope(&fhir.system_scope()) {
            tracing::debug!(
                resource = %fhir.resource,
                scope = %fhir.system_scope(),
                "Authorized through system delegation"
            );
            return AuthorizationDecision::Succeeded;
        }

        tracing::debug!(
            resource = %fhir.resource,
            subject = %principal.subject,
            "Not authorized for resource"
        );
        AuthorizationDecision::NoDecision
    }

    /// Mark every requirement in `context` this handler grants.
    pub fn handle(&self, context: &mut AuthorizationContext<'_>, locator: &ResourceLocator) {
        let principal = context.principal;
        let granted: Vec<usize> = context
            .requirements
            .iter()
            .enumerate()
            .filter(|(i, requirement)| {
                !context.succeeded[*i]
                    && self.evaluate(principal, requirement, locator)
                        == AuthorizationDecision::Succeeded
            })
            .map(|(i, _)| i)
            .collect();

        for i in granted {
            context.succeed(i);
        }
    }
}

/// Grants role requirements by membership.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleAuthorizationHandler;

impl RoleAuthorizationHandler {
    pub fn handle(&self, context: &mut AuthorizationContext<'_>) {
        let principal = context.principal;
        let granted: Vec<usize> = context
            .requirements
            .iter()
            .enumerate()
            .filter(|(_, requirement)| {
                matches!(requirement, Requirement::Role(role) if principal.has_role(role))
            })
            .map(|(i, _)| i)
            .collect();

        for i in granted {
            context.succeed(i);
        }
    }
}

/// Requirements of one request and which of them have been granted.
#[derive(Debug)]
pub struct AuthorizationContext<'a> {
    principal: &'a GatewayPrincipal,
    requirements: Vec<Requirement>,
    succeeded: Vec<bool>,
}

impl<'a> AuthorizationContext<'a> {
    pub fn new(principal: &'a GatewayPrincipal, requirements: Vec<Requirement>) -> Self {
        let succeeded = vec![false; requirements.len()];
        Self {
            principal,
            requirements,
            succeeded,
        }
    }

    fn succeed(&mut self, index: usize) {
        self.succeeded[index] = true;
    }

    /// All requirements granted.
    pub fn has_succeeded(&self) -> bool {
        !self.requirements.is_empty() && self.succeeded.iter().all(|s| *s)
    }

    /// Requirements not yet granted.
    pub fn pending_requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements
            .iter()
            .zip(&self.succeeded)
            .filter(|(_, s)| !**s)
            .map(|(r, _)| r)
    }
}

/// Run every handler over `requirements` and report whether access is granted.
pub fn authorize(
    principal: &GatewayPrincipal,
    requirements: Vec<Requirement>,
    locator: &ResourceLocator,
) -> bool {
    let mut context = AuthorizationContext::new(principal, requirements);
    FhirResourceAuthorizationHandler.handle(&mut context, locator);
    RoleAuthorizationHandler.handle(&mut context);
    if context.has_succeeded() {
        return true;
    }

    let pending: Vec<String> = context.pending_requirements().map(|r| format!("{:?}", r)).collect();
    tracing::debug!(subject = %principal.subject, pending = ?pending, "Authorization denied");
    false
}
