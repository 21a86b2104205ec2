// Services module - Business logic

pub mod credential_issuer;
pub mod credential_verifier;
pub mod password;
pub mod qr_generator;
pub mod signature;
pub mod token;
