//! Capture of inbound request bodies to one file per request.
//!
//! Sessions [`push`](AuditQueue::push) an [`AuditRecord`] as soon as a
//! request is parsed; a single drain worker
//! ([`scheduler::run_audit_drain`](crate::scheduler::run_audit_drain)) pops
//! them in order and hands each one to the [`AuditWriter`]. Delivery is
//! best-effort: a record that fails to persist is logged and dropped.

pub mod queue;
pub mod record;
pub mod writer;

pub use queue::AuditQueue;
pub use record::AuditRecord;
pub use writer::{AuditWriteError, AuditWriter};
