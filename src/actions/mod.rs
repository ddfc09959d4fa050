//! Application actions composing the services into user-facing flows.

pub mod register;

pub use register::{RegisterAction, RegisterInput};
