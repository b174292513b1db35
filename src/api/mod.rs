//! HTTP surface: probe handlers plus the middleware the probe listener runs under.

pub mod probes;
pub mod request_id;
