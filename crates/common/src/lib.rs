// kette-common: shared types and wire protocol for the kette workspace

pub mod fingerprint;
pub mod protocol;
pub mod types;
