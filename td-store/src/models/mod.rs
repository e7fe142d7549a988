//! Typed views over document bodies.
//!
//! Documents are schemaless JSON; these models parse the fields the
//! backend actually reads. Absent fields map to `None` and display-name
//! fallbacks are applied at the call site.

pub mod profile;
pub mod caregiver;
pub mod invitation;
pub mod dose_log;
