//! Math suite: arithmetic, table-driven cases and a retried test

use crate::builder::SuiteBuilder;
use crate::error::TestError;
use crate::models::TestOptions;

pub fn register(s: &mut SuiteBuilder<'_>) {
    s.it("adds", |t| async move { t.expect(2 + 2).to_be(4) });

    s.it("divides floats", |t| async move {
        t.expect(7.0 / 2.0).to_equal(3.5)?;
        t.expect(1.0 / 3.0).to_be_less_than(0.34)
    });

    s.it("rejects division by zero", |t| async move {
        let result = 10_i64.checked_div(0);
        t.expect(result).to_be_null()
    });

    s.each(vec![2, 3, 4], "is positive", |t, n: i64| async move {
        t.expect(n).to_be_greater_than(0)
    });

    s.it_with(
        "recovers on retry",
        TestOptions::new().retry(2).tag("flaky"),
        |t| async move {
            if t.attempt() == 1 {
                return Err(TestError::assertion("first attempt always fails"));
            }
            t.expect(t.attempt()).to_be(2)
        },
    );

    s.it_with(
        "finishes within budget",
        TestOptions::new().timeout_ms(500).tag("timing"),
        |t| async move {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            t.expect(true).to_be_truthy()
        },
    );
}
