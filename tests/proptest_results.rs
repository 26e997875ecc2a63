mod proptest_helpers;

use proptest::prelude::*;

use labelstate::model::AcceptAll;
use labelstate::serialize::{
    from_results, parse_result_document, regions_to_results, to_result_string,
};
use labelstate::validation::{validate_results, ValidateOptions};

use proptest_helpers::{arb_messy_entry, arb_result_array, proptest_config};

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn prop_export_is_stable_after_one_pass(entries in arb_result_array()) {
        let first = from_results(&entries, &AcceptAll);
        prop_assert!(first.mismatches.is_empty(), "dropped: {:?}", first.mismatches);
        let exported = regions_to_results(&first.regions, &first.relations);
        prop_assert_eq!(exported.len(), entries.len());

        let second = from_results(&exported, &AcceptAll);
        prop_assert!(second.mismatches.is_empty());
        prop_assert_eq!(regions_to_results(&second.regions, &second.relations), exported);
    }

    #[test]
    fn prop_export_survives_json_text(entries in arb_result_array()) {
        let import = from_results(&entries, &AcceptAll);
        let exported = regions_to_results(&import.regions, &import.relations);
        let text = to_result_string(&exported).expect("serialize");
        let parsed = parse_result_document(&text).expect("parse");
        prop_assert_eq!(parsed, exported);
    }

    #[test]
    fn prop_generated_arrays_validate_clean(entries in arb_result_array()) {
        let report = validate_results(&entries, &AcceptAll, &ValidateOptions::default());
        prop_assert_eq!(report.error_count(), 0, "{}", report);
    }

    #[test]
    fn prop_messy_arrays_never_panic(entries in prop::collection::vec(arb_messy_entry(), 0..10)) {
        let report = validate_results(&entries, &AcceptAll, &ValidateOptions::default());
        let import = from_results(&entries, &AcceptAll);

        // Every drop the import makes is an error the report can show.
        prop_assert_eq!(import.mismatches.len(), import.report.error_count());
        let exported = regions_to_results(&import.regions, &import.relations);
        prop_assert!(exported.len() <= entries.len());
        if entries.is_empty() {
            prop_assert!(report.is_clean());
        }
    }
}
