// Wire types exchanged with the registry backend and the person lookup service

pub mod common;
pub mod person;
pub mod registry;
pub mod user;

pub use common::*;
pub use person::*;
pub use registry::*;
pub use user::*;
