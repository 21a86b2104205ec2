// Models module - Database entity representations

pub mod batch;
pub mod credential;
pub mod user;

pub use batch::{BatchStatus, ProductBatch};
pub use credential::VerifiableCredential;
pub use user::{Role, User};
