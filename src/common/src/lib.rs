pub mod model;
#[cfg(feature = "test-util")]
pub mod test;
pub mod utility;
