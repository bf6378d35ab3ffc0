//! Manage DNS records hosted at Hosttech through a provider-agnostic record model.

pub mod dns;
pub mod settings;
