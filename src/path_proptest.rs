//! Property-based tests for mapping path functions.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{normalize, paths_overlap, strip_base};
    use proptest::prelude::*;

    proptest! {
        /// Property: a normalized path never contains traversal or empty segments
        #[test]
        fn normalize_output_is_clean(input in "[a-z./\\\\]{0,24}") {
            if let Ok(result) = normalize(&input, true) {
                prop_assert!(!result.starts_with('/'));
                prop_assert!(!result.ends_with('/'));
                for segment in result.split('/').filter(|s| !s.is_empty()) {
                    prop_assert_ne!(segment, "..");
                    prop_assert_ne!(segment, ".");
                }
            }
        }

        /// Property: normalize is idempotent
        #[test]
        fn normalize_is_idempotent(input in "[a-z]{1,5}(/[a-z.]{1,5}){0,4}/?") {
            if let Ok(once) = normalize(&input, true) {
                let twice = normalize(&once, true).unwrap();
                prop_assert_eq!(once, twice);
            }
        }

        /// Property: overlap is symmetric
        #[test]
        fn overlap_is_symmetric(a in "[ab]{1,3}(/[ab]{1,3}){0,3}", b in "[ab]{1,3}(/[ab]{1,3}){0,3}") {
            prop_assert_eq!(paths_overlap(&a, &b), paths_overlap(&b, &a));
        }

        /// Property: every path overlaps itself and its parents
        #[test]
        fn overlap_with_parent(base in "[a-z]{1,4}(/[a-z]{1,4}){0,2}", leaf in "[a-z]{1,4}") {
            let child = format!("{}/{}", base, leaf);
            prop_assert!(paths_overlap(&base, &base));
            prop_assert!(paths_overlap(&base, &child));
        }

        /// Property: strip_base inverts joining
        #[test]
        fn strip_base_inverts_join(base in "[a-z]{1,4}(/[a-z]{1,4}){0,2}", rest in "[a-z]{1,4}(/[a-z]{1,4}){0,2}") {
            let joined = format!("{}/{}", base, rest);
            prop_assert_eq!(strip_base(&joined, &base), Some(rest.as_str()));
        }
    }
}
