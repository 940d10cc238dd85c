//! Marker traits separating write and read messages
//!
//! Commands mutate state; queries never do. The markers carry no behavior,
//! they just make the intent of each mediator message explicit and let
//! cross-cutting bounds be written against one side.

/// Marker for messages that mutate state
pub trait Command {}

/// Marker for read-only messages
pub trait Query {}
