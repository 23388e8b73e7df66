use bootnet_common::document::Value;
use bootnet_common::error::{ErrorKind, Result};
use bootnet_core::ResolvedPlan;

pub fn compile(doc: serde_json::Value) -> Result<ResolvedPlan> {
    bootnet_core::compile(&Value::from(doc))
}

pub fn compile_ok(doc: serde_json::Value) -> ResolvedPlan {
    match compile(doc) {
        Ok(plan) => plan,
        Err(e) => panic!("Expected a plan, received: {e}"),
    }
}

pub fn compile_err(doc: serde_json::Value) -> ErrorKind {
    match compile(doc) {
        Ok(plan) => panic!("Expected an error, received a plan for {:?}", plan.names()),
        Err(e) => e.kind(),
    }
}

pub fn miimon() -> serde_json::Value {
    serde_json::json!({ "frequency": 100, "updelay": 0, "downdelay": 0 })
}

pub fn arp_targets(count: usize) -> serde_json::Value {
    (1..=count).map(|i| format!("10.0.0.{i}/32")).collect()
}
