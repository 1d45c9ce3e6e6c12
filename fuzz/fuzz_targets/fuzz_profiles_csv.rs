#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Rows that parse must either load into a store or fail with an error.
    if let Ok(rows) = bolus_config::parse_profiles_csv(data) {
        let _ = bolus_core::InMemoryProfileStore::from_rows(&rows);
    }
});
