pub mod issuer;
pub mod refresher;
