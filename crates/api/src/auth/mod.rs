//! Access token verification. Tokens are issued by the identity provider;
//! this server only checks them.

pub mod jwt;
