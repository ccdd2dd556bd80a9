// Shared test support code for end-to-end tests.

pub mod common;
pub mod harness;

pub use common::*;
pub use harness::{start, start_with, RecordingSender, TestApp, ADMIN_TOKEN, USER_TOKEN};
