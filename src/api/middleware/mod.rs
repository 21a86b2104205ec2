// Middleware module - Request authentication

pub mod auth;
