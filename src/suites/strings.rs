//! Strings suite: containment, regex and snapshot matchers

use serde_json::json;

use crate::builder::SuiteBuilder;

pub fn register(s: &mut SuiteBuilder<'_>) {
    s.it("concatenates", |t| async move {
        let joined = ["suite", "runner"].join("-");
        t.expect(joined.as_str()).to_be("suite-runner")
    });

    s.it("contains substrings", |t| async move {
        t.expect("hooks and retries").to_contain("retries")?;
        t.expect("hooks and retries").not().to_contain("snapshots")
    });

    s.it("matches patterns", |t| async move {
        t.expect("v1.42.0").to_match(r"^v\d+\.\d+\.\d+$")
    });

    s.it("measures length", |t| async move {
        t.expect(json!(["a", "b", "c"])).to_have_length(3)?;
        t.expect("four").to_have_length(4)
    });

    s.it("renders a stable greeting", |t| async move {
        let greeting = format!("hello, {}", "world");
        t.expect(greeting).to_match_snapshot()
    });

    s.it_skip("handles right-to-left text", |t| async move {
        t.expect("שלום").to_have_length(4)
    });
}
