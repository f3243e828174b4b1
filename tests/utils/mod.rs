pub mod logs;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use logs::{expect_level, expect_matching};
#[allow(unused_imports)]
pub use mocks::{MockRoomState, MockSession, MockSessionFactory};
#[allow(unused_imports)]
pub use setup::{encryption_keys_event, member_event, TestSetup, TestSetupBuilder};
