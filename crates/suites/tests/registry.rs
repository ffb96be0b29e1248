//! Registration checks for the shipped suites.

use std::collections::HashSet;

use odata_harness::Registry;
use odata_suites::{all_suites, register_all};

#[test]
fn test_every_suite_registers_once() {
    let registry = odata_suites::registry().unwrap();
    assert_eq!(registry.len(), all_suites().len());

    let mut again = Registry::new();
    register_all(&mut again).unwrap();
    assert!(register_all(&mut again).is_err());
}

#[test]
fn test_suite_names_are_unique() {
    let suites = all_suites();
    let names: HashSet<&str> = suites.iter().map(|s| s.name()).collect();
    assert_eq!(names.len(), suites.len());
}

#[test]
fn test_every_suite_is_cited_and_non_empty() {
    for suite in all_suites() {
        assert!(!suite.is_empty(), "{} has no tests", suite.name());
        assert!(
            suite.spec_reference().starts_with("https://docs.oasis-open.org/"),
            "{} has no OASIS reference",
            suite.name()
        );
        for test in suite.tests() {
            assert!(!test.description().is_empty(), "{}/{}", suite.name(), test.name());
        }
    }
}

#[test]
fn test_filter_by_name_is_case_insensitive() {
    let registry = odata_suites::registry().unwrap();
    let filtered = registry
        .filtered(&["batch".to_string(), "METADATA".to_string()])
        .unwrap();
    let names: Vec<&str> = filtered.suites().iter().map(|s| s.name()).collect();
    // registry order, not argument order
    assert_eq!(names, vec!["Metadata", "Batch"]);
}
