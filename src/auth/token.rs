//! Token secrets and the grant returned by the authorization-code exchange.

pub mod grant;
pub mod secret;
