//! Destination safety checks.
//!
//! # Data Flow
//! ```text
//! candidate string
//!     → target.rs (strict parse, scheme allow-list)
//!     → resolver.rs (literal shortcut or one bounded DNS lookup)
//!     → classifier.rs (reserved-range check over ranges.rs)
//!     → VettedTarget (target + the address cleared for it; the only input
//!       the fetcher accepts)
//! ```
//!
//! # Design Decisions
//! - Fail closed: anything unparseable or unresolvable is a rejection
//! - The reserved table is an immutable value shared by `Arc`
//! - Redirect hops go through the same checks as the original target

pub mod classifier;
pub mod ranges;
pub mod resolver;
pub mod target;

pub use classifier::{AddressClassifier, AllowedAddress};
pub use ranges::{ReservedRange, ReservedRanges};
pub use resolver::{AddressFamily, DnsResolver, NameResolver, ResolveError, ResolvedAddress, Resolver};
pub use target::{ParsedTarget, UriValidator};

use std::net::SocketAddr;

use crate::error::ProxyError;

/// A parsed target bound to the address that was cleared for its host.
///
/// Only [`Guard`] builds one, so the pair cannot be mixed up by callers.
#[derive(Debug, Clone)]
pub struct VettedTarget {
    target: ParsedTarget,
    address: AllowedAddress,
}

impl VettedTarget {
    pub fn target(&self) -> &ParsedTarget {
        &self.target
    }

    pub fn address(&self) -> AllowedAddress {
        self.address
    }

    /// Socket address the connection must be dialed to.
    pub fn pin(&self) -> SocketAddr {
        SocketAddr::new(self.address.ip(), self.target.port())
    }
}

/// The parse → resolve → classify sequence, shared by the pipeline and by
/// the fetcher for every redirect hop.
#[derive(Clone)]
pub struct Guard {
    validator: UriValidator,
    resolver: Resolver,
    classifier: AddressClassifier,
}

impl Guard {
    pub fn new(validator: UriValidator, resolver: Resolver, classifier: AddressClassifier) -> Self {
        Self {
            validator,
            resolver,
            classifier,
        }
    }

    pub fn validator(&self) -> &UriValidator {
        &self.validator
    }

    pub fn classifier(&self) -> &AddressClassifier {
        &self.classifier
    }

    /// Run all checks on `candidate`.
    pub async fn vet(&self, candidate: &str) -> Result<VettedTarget, ProxyError> {
        let target = self.validator.parse(candidate)?;
        self.admit(target).await
    }

    /// Resolve and classify an already parsed target.
    pub async fn admit(&self, target: ParsedTarget) -> Result<VettedTarget, ProxyError> {
        let resolved = self.resolver.resolve(target.hostname()).await?;
        let address = self.classifier.admit(target.hostname(), resolved)?;
        Ok(VettedTarget { target, address })
    }
}
