#![allow(dead_code)]

pub mod fake_platform;

pub use fake_platform::FakePlatform;

use dcctl_core::DagsterClient;

/// Client scoped to the fake platform's current deployment.
pub fn client(platform: &FakePlatform) -> DagsterClient {
    DagsterClient::with_executor(platform.executor(), "prod")
}
