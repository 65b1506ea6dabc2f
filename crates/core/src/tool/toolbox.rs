use std::pin::Pin;

use parley_model::ModelTool;
use serde_json::Value;
use tracing::Instrument;

use crate::tool::{ToolObject, ToolResult};

/// The set of tools an agent is bound to, in registration order.
#[derive(Default)]
pub struct Toolbox {
    tools: Vec<Box<dyn ToolObject>>,
}

impl Toolbox {
    /// Registers a tool, replacing an earlier one with the same name.
    pub fn add(&mut self, tool: Box<dyn ToolObject>) {
        if let Some(slot) =
            self.tools.iter_mut().find(|t| t.name() == tool.name())
        {
            warn!("tool `{}` registered twice, keeping the last", tool.name());
            *slot = tool;
            return;
        }
        self.tools.push(tool);
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn definitions(&self) -> Vec<ModelTool> {
        self.tools
            .iter()
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect()
    }

    /// Starts executing the named tool, or returns `None` if there is no
    /// such tool.
    pub fn execute(
        &self,
        name: &str,
        arguments: Value,
    ) -> Option<Pin<Box<dyn Future<Output = ToolResult> + Send>>> {
        let Some(tool) = self.tools.iter().find(|tool| tool.name() == name)
        else {
            warn!("tool not found: {name}");
            return None;
        };
        trace!("executing tool `{name}` with args: {arguments}");
        let fut = tool.execute(arguments);
        Some(Box::pin(fut.instrument(debug_span!("tool execute", name))))
    }
}
