// ABOUTME: Tool capability trait and the name-keyed registry the agent dispatches through.
// ABOUTME: Concrete tools (shell, files, web) live outside the core and register here.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::llm::ToolSpec;

/// An executable capability the model can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments, advertised to the model as-is.
    fn schema(&self) -> serde_json::Value;

    /// Run with the raw argument payload from the model. Errors are reported
    /// back to the model as text; they never abort the agent loop.
    async fn run(&self, args: &str) -> anyhow::Result<String>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            schema: self.schema(),
        }
    }
}

/// Name-keyed set of tools. Read-only once handed to an agent.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any previous tool with the same name.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// All tools, sorted by name so prompts and requests are stable.
    pub fn all(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<_> = self.tools.values().cloned().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.all().iter().map(|t| t.spec()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl Tool for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "test tool"
        }

        fn schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }

        async fn run(&self, args: &str) -> anyhow::Result<String> {
            Ok(args.to_string())
        }
    }

    #[test]
    fn lookup_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Named("shell"));
        assert!(registry.get("shell").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_replaces_same_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Named("grep"));
        registry.register(Named("grep"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn specs_are_sorted() {
        let mut registry = ToolRegistry::new();
        registry.register(Named("view"));
        registry.register(Named("file"));
        registry.register(Named("shell"));
        let names: Vec<_> = registry.specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["file", "shell", "view"]);
    }

    #[tokio::test]
    async fn run_passes_raw_args() {
        let tool = Named("echo");
        let out = tool.run(r#"{"text":"hi"}"#).await.unwrap();
        assert_eq!(out, r#"{"text":"hi"}"#);
    }
}
