//! gateway-core: Core types for the Health Gateway
//!
//! This crate provides:
//! - The [`RequestResult`] envelope and error code translation
//! - Resource authorization rules (owner or system scope)
//! - Per-profile note encryption
//! - DTOs for notes, feedback, communications, agents and health records
//!
//! It performs no I/O. Storage lives in `gateway-store`, HTTP delegates and
//! services in `gateway-server`.

pub mod authorization;
pub mod crypto;
pub mod health;
pub mod result;
pub mod types;

pub use authorization::{
    AuthorizationContext, AuthorizationDecision, FhirAccessType, FhirRequirement, FhirResource,
    FhirResourceAuthorizationHandler, FhirResourceLookup, GatewayPrincipal, Requirement,
    ResourceLocator, RoleAuthorizationHandler, authorize,
};
pub use crypto::{AesCryptoDelegate, CryptoDelegate, CryptoError};
pub use result::{
    ActionType, ErrorTranslator, ErrorType, RequestResult, RequestResultError, ResultType,
    ServiceType,
};
pub use types::*;
