//! Portail library exports: the backend adapters, the admin core and the
//! terminal console.

pub mod backend;
pub mod core;
pub mod tui;

#[cfg(test)]
pub mod test_support;
