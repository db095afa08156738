#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::json;
use structassert_core::{css, pattern, JsonType, TypeRule};

// Arbitrary rule, selector and pattern text must never panic; bad input is
// either a mismatch or a MatchError.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = TypeRule::parse(text);
    let value = json!({"v": text, "n": 1.5, "list": [text]});
    let _ = JsonType::new(&value).matches(&json!({"v": text, "n": text, "list": {"0": text}}));

    let _ = css::to_xpath(text);
    let _ = pattern::compile(text);
});
