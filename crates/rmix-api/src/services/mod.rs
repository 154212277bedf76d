//! Background services.

pub mod registry_sweeper;

pub use registry_sweeper::RegistrySweeper;
