use std::path::Path;

use proptest::prelude::*;
use gitgate::workspace::shortest_prefixes;

fn dir_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just("a"), Just("b"), Just("a-b"), Just("ab")], 1..4).prop_map(|parts| parts.join("/"))
}

fn contains(ancestor: &str, dir: &str) -> bool {
    Path::new(dir).starts_with(Path::new(ancestor))
}

proptest! {
    #[test]
    fn prefixes_cover_inputs_without_nesting(dirs in proptest::collection::vec(dir_strategy(), 0..12)) {
        let prefixes = shortest_prefixes(&dirs);

        // Every prefix is an input.
        for p in &prefixes {
            prop_assert!(dirs.contains(p));
        }
        // Every input sits inside some prefix.
        for d in &dirs {
            prop_assert!(prefixes.iter().any(|p| contains(p, d)), "{d} uncovered by {prefixes:?}");
        }
        // No prefix contains another.
        for (i, a) in prefixes.iter().enumerate() {
            for (j, b) in prefixes.iter().enumerate() {
                if i != j {
                    prop_assert!(!contains(a, b), "{a} contains {b}");
                }
            }
        }
    }
}

#[test]
fn sibling_with_shared_string_prefix_is_kept() {
    assert_eq!(shortest_prefixes(&["a", "a-b", "a/b"]), vec!["a", "a-b"]);
}
