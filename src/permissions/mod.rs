//! Permission system for checking user roles.
//!
//! ```rust,ignore
//! let perms = Permissions::with_owners(config.owner_ids.clone());
//! if perms.is_admin(&update) {
//!     // ...
//! }
//! ```
//!
//! Handlers rarely call this directly; the permission filters in
//! `dispatch::filters` wrap it.

mod checker;

pub use checker::Permissions;
