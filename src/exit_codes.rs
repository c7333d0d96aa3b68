//! Exit code constants for the dqueue CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config)
//! - 2: Store unavailable (connection refused, dropped, timed out)
//! - 3: Protocol violation (store replied with unexpected data)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, event log failures.
pub const USER_ERROR: i32 = 1;

/// The shared store could not be reached or timed out.
pub const STORE_UNAVAILABLE: i32 = 2;

/// The shared store returned data in an unexpected shape.
pub const PROTOCOL_VIOLATION: i32 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, USER_ERROR, STORE_UNAVAILABLE, PROTOCOL_VIOLATION];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn success_is_zero() {
        assert_eq!(SUCCESS, 0);
    }
}
