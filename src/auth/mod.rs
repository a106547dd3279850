//! Session collaborator: user profiles, registration, login, and
//! bearer-token session lookup.

pub mod domain;
pub mod router;
pub mod service;

pub use domain::{FarmType, NewUser, ProfileUpdate, Role, UserId, UserProfile};
pub use router::{auth_router, bearer_token, require_user};
pub use service::{AuthError, SessionService};
