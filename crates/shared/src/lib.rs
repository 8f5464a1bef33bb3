pub mod allocation;
pub mod domain;
pub mod error;
pub mod protocol;
pub mod roles;
