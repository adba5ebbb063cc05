//! Access-token models handed between the code exchange, the resolver, and the verify hook.

pub mod token;

pub use token::{grant::*, secret::*};
