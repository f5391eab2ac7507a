//! Granted-privilege store, scope-chain resolution, throttling and the
//! `Authorization` façade repository commands call into.
//!
//! `forum-core` carries each entity's *required* privilege thresholds;
//! this crate carries what's been *granted* to whom, and the algorithm
//! that reconciles the two (spec 4.4-4.6). Nothing here produces JSON or
//! talks to a journal - that's `forum-repo`'s job.

pub mod facade;
pub mod granted;
pub mod resolver;
pub mod throttle;

pub use facade::Authorization;
pub use granted::{GrantedPrivilegeStore, PrivilegeAccumulator};
pub use resolver::{ForumWidePrivilegeStore, MessageVisibility, Resolver};
pub use throttle::{bucket_for_privilege, ThrottleStore};
