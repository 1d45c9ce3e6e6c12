#![no_main]
use bolus_core::ratio;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let Some(r) = ratio::parse(data) else {
        return;
    };
    assert!(r.is_finite());
    if let Some(text) = ratio::format(Some(r)).filter(|t| t != "1:0") {
        let back = ratio::parse(&text);
        assert!(back.is_some_and(|b| b > 0.0 && b.is_finite()), "{text} did not parse back");
    }
});
