//! # Repère core
//!
//! Platform-independent heart of the Repère community bot. Everything in
//! here runs against the ports in [`ports`], so the schedulers and the quiz
//! reconciliation engine can be exercised without a live Discord connection
//! or a real spreadsheet.
//!
//! - [`models`]: persisted state and the value types exchanged with ports
//! - [`expiry`]: periodic revocation of auto-roles that outlived their expiry
//! - [`autorole`]: member-join handling and trigger-based role grants
//! - [`quiz`]: spreadsheet polling and access-role reconciliation
//! - [`sticky`]: keeps a configured message at the bottom of a channel
//! - [`voice`]: join-to-create voice channels
//! - [`mass_grant`]: bulk role grants

pub mod autorole;
pub mod errors;
pub mod expiry;
pub mod locale;
pub mod mass_grant;
pub mod matching;
pub mod mock;
pub mod models;
pub mod ports;
pub mod quiz;
pub mod sticky;
pub mod voice;
