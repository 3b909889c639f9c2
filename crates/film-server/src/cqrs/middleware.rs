//! Marker traits separating writes from reads
//!
//! Every command and query type registered with the mediator implements
//! exactly one of these, so a handler's side effects are visible from its
//! request type alone.

/// A request that may change persisted state
pub trait Command: Send + 'static {}

/// A request that only reads
pub trait Query: Send + 'static {}
