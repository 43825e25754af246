//! true, false, : - Status-only builtins

use crate::interpreter::helpers::result::BuiltinResult;

/// `true` and `:`: ignore arguments, succeed
pub fn handle_true() -> BuiltinResult {
    BuiltinResult::ok()
}

pub fn handle_false() -> BuiltinResult {
    BuiltinResult::status(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses() {
        assert_eq!(handle_true().exit_code, 0);
        assert_eq!(handle_false().exit_code, 1);
    }
}
