// ABOUTME: Layered system prompt builder — base instructions, environment, tool list, local notes.
// ABOUTME: Compiles the default from src/prompts/system.md; local notes come from the workspace.

use std::fs;
use std::path::Path;

use crate::tools::ToolRegistry;

/// Compiled-in default instructions.
const DEFAULT_BASE: &str = include_str!("prompts/system.md");

/// Name of the per-project notes file picked up from the working directory.
pub const LOCAL_FILE: &str = ".otter.md";

/// Reads a file if it exists, returning None otherwise.
pub fn read_if_exists(path: &Path) -> Option<String> {
    if path.exists() {
        fs::read_to_string(path).ok()
    } else {
        None
    }
}

/// Assembles the system prompt from layers. Empty layers are skipped.
#[derive(Debug, Clone)]
pub struct SystemPromptBuilder {
    pub base: String,
    pub environment: Option<String>,
    pub tools: Option<String>,
    pub local: Option<String>,
}

impl SystemPromptBuilder {
    /// Creates a builder holding only the compiled-in base layer.
    pub fn new() -> Self {
        Self {
            base: DEFAULT_BASE.to_string(),
            environment: None,
            tools: None,
            local: None,
        }
    }

    /// The full layer stack for an agent working in `workspace`.
    pub fn for_workspace(workspace: &Path, tools: &ToolRegistry) -> Self {
        let mut builder = Self::new();
        builder
            .with_environment(workspace)
            .with_tools(tools)
            .load_local(workspace);
        builder
    }

    /// Describes the working directory, OS and date.
    pub fn with_environment(&mut self, workspace: &Path) -> &mut Self {
        let date = chrono::Local::now().format("%Y-%m-%d").to_string();
        self.environment = Some(environment_section(
            &workspace.display().to_string(),
            std::env::consts::OS,
            &date,
        ));
        self
    }

    /// Lists every registered tool with its description.
    pub fn with_tools(&mut self, registry: &ToolRegistry) -> &mut Self {
        self.tools = if registry.is_empty() {
            None
        } else {
            let lines: Vec<String> = registry
                .all()
                .iter()
                .map(|t| format!("- **{}**: {}", t.name(), t.description()))
                .collect();
            Some(format!("## Available Tools\n\n{}", lines.join("\n")))
        };
        self
    }

    /// Picks up `.otter.md` from `workspace` as the local layer, if present.
    pub fn load_local(&mut self, workspace: &Path) -> &mut Self {
        self.local = read_if_exists(&workspace.join(LOCAL_FILE));
        self
    }

    /// Concatenates all non-empty layers separated by `"\n\n"`.
    pub fn build(&self) -> String {
        let layers: Vec<&str> = [
            Some(self.base.as_str()),
            self.environment.as_deref(),
            self.tools.as_deref(),
            self.local.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

        layers.join("\n\n")
    }
}

impl Default for SystemPromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn environment_section(cwd: &str, os: &str, date: &str) -> String {
    format!(
        "## Environment\n\n- Working directory: {}\n- OS: {}\n- Date: {}",
        cwd, os, date
    )
}
