//! Octal mode strings and attribute inheritance

use proptest::prelude::*;
use treeploy::types::{FileMode, IdSpec, PathAttributes};

fn attributes() -> impl Strategy<Value = PathAttributes> {
    (
        proptest::option::of(0u32..70000),
        proptest::option::of(0u32..70000),
        proptest::option::of(0u32..=0o777),
    )
        .prop_map(|(owner, group, mode)| PathAttributes {
            owner: owner.map(IdSpec::Id),
            group: group.map(IdSpec::Id),
            mode: mode.map(FileMode::from_raw),
        })
}

proptest! {
    #[test]
    fn displayed_mode_parses_back(bits in 0u32..=0o777) {
        let mode = FileMode::from_raw(bits);
        let text = mode.to_string();
        prop_assert!(text.starts_with('0'));
        prop_assert_eq!(text.parse::<FileMode>().unwrap(), mode);
    }

    #[test]
    fn non_octal_digits_are_rejected(text in "0?[0-7]{0,2}[89][0-9]{0,2}") {
        prop_assert!(text.parse::<FileMode>().is_err());
    }

    #[test]
    fn overlay_keeps_explicit_fields(entry in attributes(), defaults in attributes()) {
        let effective = entry.overlay(&defaults);

        prop_assert_eq!(
            &effective.owner,
            if entry.owner.is_some() { &entry.owner } else { &defaults.owner }
        );
        prop_assert_eq!(
            &effective.group,
            if entry.group.is_some() { &entry.group } else { &defaults.group }
        );
        prop_assert_eq!(effective.mode, entry.mode.or(defaults.mode));
    }

    #[test]
    fn overlay_of_empty_entry_is_defaults(defaults in attributes()) {
        prop_assert_eq!(PathAttributes::default().overlay(&defaults), defaults);
    }
}
