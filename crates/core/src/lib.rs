pub mod target;
pub mod transcript;

pub use target::*;
pub use transcript::*;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
