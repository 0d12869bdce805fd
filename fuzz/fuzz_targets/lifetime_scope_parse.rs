#![no_main]

use ferrous_ioc::LifetimeScope;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(scope) = text.parse::<LifetimeScope>() {
            // every accepted spelling maps to a label that parses back to itself
            assert_eq!(scope.as_str().parse::<LifetimeScope>().ok(), Some(scope));
        }
    }
});
