//! Host tool API boundary. The relay and the wire protocol know nothing of
//! this module; it is the worker's only contact point with the host
//! application's tool-execution surface (§1 "Out of scope").

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::errors::ToolError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One host tool. `validate_args`/`invoke` are the two operations named in
/// §9 "Dynamic dispatch for tool handlers".
pub trait Tool: Send + Sync {
    fn validate_args(&self, args: &BTreeMap<String, Value>) -> Result<(), ToolError>;

    fn invoke<'a>(&'a self, args: &'a BTreeMap<String, Value>) -> BoxFuture<'a, Result<relay_protocol::ResultBundle, ToolError>>;
}

/// Maps tool name to handler. An unknown name yields `tool_not_found`
/// without ever calling into a handler.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    pub fn register(&mut self, name: impl Into<String>, tool: Box<dyn Tool>) {
        self.tools.insert(name.into(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|boxed| boxed.as_ref())
    }
}

/// An in-process stub tool, for tests: echoes the `text` argument back as
/// the sole content item.
pub struct EchoTool;

impl Tool for EchoTool {
    fn validate_args(&self, args: &BTreeMap<String, Value>) -> Result<(), ToolError> {
        match args.get("text") {
            Some(Value::String(_)) => Ok(()),
            _ => Err(ToolError::InvalidArgs("missing string field `text`".to_owned())),
        }
    }

    fn invoke<'a>(&'a self, args: &'a BTreeMap<String, Value>) -> BoxFuture<'a, Result<relay_protocol::ResultBundle, ToolError>> {
        Box::pin(async move {
            let text = match args.get("text") {
                Some(Value::String(s)) => s.clone(),
                _ => return Err(ToolError::InvalidArgs("missing string field `text`".to_owned())),
            };
            Ok(relay_protocol::ResultBundle::text(text))
        })
    }
}
