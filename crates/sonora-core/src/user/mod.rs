//! User domain module.
//!
//! - `model`: the persisted account record and its input/patch types
//! - `validate`: field-format checks for form-handling collaborators

mod model;
pub mod validate;

pub use model::{NewUser, UserRecord, UserUpdate};
