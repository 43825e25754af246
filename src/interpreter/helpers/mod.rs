//! Helper functions shared by the executor and the builtins.

pub mod bytes;
pub mod ifs;
pub mod quoting;
pub mod result;
pub mod shell_constants;
pub mod shellopts;
pub mod xtrace;

pub use result::{test_result, BuiltinResult};
