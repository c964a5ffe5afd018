//! Filename classification invariants

use proptest::prelude::*;
use std::path::{Path, PathBuf};
use treeploy::deploy::classify::{classify, template_output_path, FileClass};

proptest! {
    #[test]
    fn backup_files_are_always_skipped(stem in "[A-Za-z0-9_.#-]{0,20}") {
        let name = format!("{stem}~");
        prop_assert_eq!(classify(&name), FileClass::Skip);
    }

    #[test]
    fn emacs_autosaves_are_always_skipped(stem in "[A-Za-z0-9_.-]{0,20}") {
        let name = format!("#{stem}#");
        prop_assert_eq!(classify(&name), FileClass::Skip);
        let lock = format!(".#{stem}");
        prop_assert_eq!(classify(&lock), FileClass::Skip);
    }

    #[test]
    fn dot_suffix_makes_a_template(stem in "[a-z][a-z0-9_-]{0,15}(\\.[a-z]{1,4})?") {
        prop_assume!(stem != "tree.yaml" && stem != "tree.yml");
        let name = format!("{stem}.dot");
        prop_assert_eq!(classify(&name), FileClass::Template);
    }

    #[test]
    fn names_without_markers_are_plain(name in "[a-z][a-z0-9_-]{0,15}\\.(txt|conf|sh|json)") {
        prop_assert_eq!(classify(&name), FileClass::Plain);
    }

    #[test]
    fn template_output_drops_exactly_the_suffix(
        dir in "(/[a-z]{1,8}){0,3}",
        stem in "[a-z][a-z0-9_.-]{0,15}",
    ) {
        let dst = PathBuf::from(format!("{dir}/{stem}.dot"));
        let expected = PathBuf::from(format!("{dir}/{stem}"));
        prop_assert_eq!(template_output_path(&dst), expected);
    }

    #[test]
    fn non_templates_keep_their_output_path(name in "[a-z][a-z0-9_-]{0,15}\\.(txt|conf)") {
        let dst = Path::new("/srv").join(&name);
        prop_assert_eq!(template_output_path(&dst), dst.clone());
    }
}
