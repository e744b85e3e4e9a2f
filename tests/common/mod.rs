pub mod mocks;

#[allow(unused_imports)]
pub use mocks::*;

use rand::distr::{Alphanumeric, SampleString};

/// Random file name, as the other tests name their scratch files.
#[allow(dead_code)]
pub fn random_name() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 16)
}

/// Routes `log` output to the test harness.
#[allow(dead_code)]
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
