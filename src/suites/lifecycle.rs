//! Lifecycle suite: hook ordering and context inheritance

use serde_json::Value;

use crate::builder::SuiteBuilder;
use crate::error::TestError;

pub fn register(s: &mut SuiteBuilder<'_>) {
    s.context("service", "inventory");

    s.before_all(|ctx| async move {
        ctx.set("connections", 0);
        Ok(())
    });

    s.before_each(|ctx| async move {
        ctx.update("connections", |current| {
            Value::from(current.and_then(Value::as_i64).unwrap_or(0) + 1)
        });
        Ok(())
    });

    s.it("sees the suite context", |t| async move {
        let service: Option<String> = t.ctx().get_as("service");
        t.expect(service.as_deref()).to_be("inventory")
    });

    s.it("sees beforeEach effects", |t| async move {
        let connections: i64 = t.ctx().get_as("connections").unwrap_or(0);
        t.expect(connections).to_be_greater_than(0)
    });

    s.describe("nested", |s| {
        s.context("service", "billing");

        s.it("overrides inherited keys", |t| async move {
            t.expect(t.ctx().get("service")).to_equal("billing")
        });

        s.it("keeps other inherited keys", |t| async move {
            if !t.ctx().contains("connections") {
                return Err(TestError::assertion("connections missing from context"));
            }
            Ok(())
        });
    });

    s.after_all(|ctx| async move {
        ctx.remove("connections");
        Ok(())
    });
}
