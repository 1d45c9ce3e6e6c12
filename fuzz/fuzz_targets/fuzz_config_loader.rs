#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = toml::from_str::<bolus_config::Config>(data) {
        if cfg.validate().is_ok() {
            // A validated config must always build a calculator.
            let calc = bolus_core::CalculatorCfg::from(&cfg);
            assert!(bolus_core::DoseCalculator::new(calc).is_ok());
        }
    }
});
