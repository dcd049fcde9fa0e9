//! Property-based tests for version ordering and range resolution.
//!
//! - Ordering: the natural comparator is a total order on generated versions
//! - Resolution: the resolved version is accepted and nothing newer is
//! - Exact ranges: `=` never resolves to a different string

use proptest::prelude::*;
use std::cmp::Ordering;
use toolpin_core::version::{VersionRange, natural_cmp, release_cmp, resolve, sort_newest_first};

fn version_strategy() -> impl Strategy<Value = String> {
    (
        0u32..4,
        0u32..25,
        0u32..15,
        prop::option::of(prop_oneof![
            (1u32..12).prop_map(|n| format!("beta.{n}")),
            (1u32..5).prop_map(|n| format!("rc.{n}")),
            Just("alpha".to_string()),
        ]),
    )
        .prop_map(|(major, minor, patch, pre)| match pre {
            Some(pre) => format!("{major}.{minor}.{patch}-{pre}"),
            None => format!("{major}.{minor}.{patch}"),
        })
}

fn range_strategy() -> impl Strategy<Value = String> {
    (prop_oneof![Just('='), Just('~'), Just('^')], version_strategy())
        .prop_map(|(sign, version)| format!("{sign}{version}"))
}

proptest! {
    #[test]
    fn natural_cmp_is_reflexive(v in version_strategy()) {
        prop_assert_eq!(natural_cmp(&v, &v), Ordering::Equal);
    }

    #[test]
    fn natural_cmp_is_antisymmetric(a in version_strategy(), b in version_strategy()) {
        prop_assert_eq!(natural_cmp(&a, &b), natural_cmp(&b, &a).reverse());
    }

    #[test]
    fn natural_cmp_is_transitive(
        a in version_strategy(),
        b in version_strategy(),
        c in version_strategy(),
    ) {
        if natural_cmp(&a, &b) != Ordering::Greater && natural_cmp(&b, &c) != Ordering::Greater {
            prop_assert_ne!(natural_cmp(&a, &c), Ordering::Greater);
        }
    }

    #[test]
    fn release_cmp_is_antisymmetric(a in version_strategy(), b in version_strategy()) {
        prop_assert_eq!(release_cmp(&a, &b), release_cmp(&b, &a).reverse());
    }

    #[test]
    fn resolved_version_is_accepted_and_newest(
        range in range_strategy(),
        known in prop::collection::vec(version_strategy(), 0..12),
    ) {
        let known: Vec<&str> = known.iter().map(String::as_str).collect();
        let parsed = VersionRange::parse(&range).unwrap();

        match resolve(&range, &known).unwrap() {
            Some(found) => {
                prop_assert!(parsed.accepts(found));
                for v in &known {
                    if release_cmp(v, found) == Ordering::Greater {
                        prop_assert!(!parsed.accepts(v), "{} is newer than {} and accepted", v, found);
                    }
                }
            }
            None => {
                prop_assert!(known.iter().all(|v| !parsed.accepts(v)));
            }
        }
    }

    #[test]
    fn exact_range_only_returns_itself(
        version in version_strategy(),
        known in prop::collection::vec(version_strategy(), 0..12),
    ) {
        let known: Vec<&str> = known.iter().map(String::as_str).collect();
        let range = format!("={version}");
        if let Some(found) = resolve(&range, &known).unwrap() {
            prop_assert_eq!(found, version.as_str());
        } else {
            prop_assert!(!known.contains(&version.as_str()));
        }
    }

    #[test]
    fn prerelease_never_matches_stable_request(
        range in version_strategy().prop_filter("stable", |v| !v.contains('-')),
        candidate in version_strategy().prop_filter("prerelease", |v| v.contains('-')),
    ) {
        let parsed = VersionRange::parse(&format!("^{range}")).unwrap();
        prop_assert!(!parsed.accepts(&candidate));
    }

    #[test]
    fn sort_is_input_order_independent(
        mut versions in prop::collection::vec(version_strategy(), 0..12),
    ) {
        let mut reversed = versions.clone();
        reversed.reverse();
        sort_newest_first(&mut versions);
        sort_newest_first(&mut reversed);
        let key = |v: &Vec<String>| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        prop_assert_eq!(key(&versions), key(&reversed));
    }
}
