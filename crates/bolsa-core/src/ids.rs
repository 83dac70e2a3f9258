//! UUID helpers.
//!
//! New rows get UUIDv7 identifiers: time-ordered, so index locality follows
//! insertion order.

use uuid::Uuid;

/// Generate a new time-ordered UUIDv7.
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_v7_version() {
        assert_eq!(new_v7().get_version_num(), 7);
    }

    #[test]
    fn test_new_v7_unique() {
        let a = new_v7();
        let b = new_v7();
        assert_ne!(a, b);
    }
}
