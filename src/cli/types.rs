use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use database_mcp::stdio::metadata::all_tool_metadata;
use database_mcp::tools::is_mutation;

/// Toolset configuration loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsetConfig {
    /// List of individual tool names to enable
    pub tools: Vec<String>,
}

impl ToolsetConfig {
    /// Load toolset config from JSON file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read toolset file: {}", path.display()))?;

        let config: ToolsetConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse toolset file as JSON: {}", path.display()))?;

        Ok(config)
    }
}

/// Database MCP server - list, read, search, join and edit tables across
/// SQLite, PostgreSQL and MySQL databases from one connection catalog
#[derive(Parser, Debug)]
#[command(name = "database-mcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Connection catalog (JSON object of name -> {url, description})
    ///
    /// Example:
    /// ```json
    /// {
    ///   "school": { "url": "sqlite:///srv/school.db", "description": "Students and courses" }
    /// }
    /// ```
    #[arg(long, value_name = "PATH", env = "DATABASE_CATALOG", default_value = "connections.json")]
    pub catalog: PathBuf,

    /// Enable specific tools by name (comma-separated)
    ///
    /// Example: --tools list_databases,show_data
    ///
    /// If not specified, all tools are enabled.
    #[arg(long, value_delimiter = ',', conflicts_with = "tool")]
    pub tools: Option<Vec<String>>,

    /// Enable specific tool by name (can be specified multiple times)
    ///
    /// Example: --tool list_tables --tool show_data
    #[arg(long = "tool", conflicts_with = "tools")]
    pub tool: Vec<String>,

    /// Load tool names from JSON file: `{"tools": ["list_tables", "show_data"]}`
    #[arg(long, value_name = "PATH", conflicts_with_all = ["tool", "tools"])]
    pub toolset: Option<PathBuf>,

    /// Read-only mode: add_data, update_data, delete_data and create_table
    /// are neither listed nor callable
    #[arg(long, env = "DATABASE_READONLY")]
    pub readonly: bool,

    /// List available tool names and exit
    #[arg(long)]
    pub list_tools: bool,

    /// List the databases in the catalog and exit
    #[arg(long)]
    pub list_databases: bool,
}

impl Cli {
    /// Tool names requested on the command line, before read-only filtering.
    ///
    /// Returns None if no filter specified (enable all tools)
    pub fn requested_tools(&self) -> anyhow::Result<Option<HashSet<String>>> {
        // Priority 1: --toolset (JSON file)
        if let Some(ref path) = self.toolset {
            let config = ToolsetConfig::from_file(path)?;
            return Ok(Some(config.tools.into_iter().collect()));
        }

        // Priority 2: --tools (comma-separated)
        if let Some(tools) = &self.tools {
            return Ok(Some(tools.iter().cloned().collect()));
        }

        // Priority 3: --tool (repeated flags)
        if !self.tool.is_empty() {
            return Ok(Some(self.tool.iter().cloned().collect()));
        }

        Ok(None)
    }

    /// The set of tools the server will expose. `None` means all of them.
    pub fn enabled_tools(&self) -> anyhow::Result<Option<HashSet<String>>> {
        let requested = self.requested_tools()?;
        if !self.readonly {
            return Ok(requested);
        }

        let allowed = match requested {
            Some(tools) => tools.into_iter().filter(|t| !is_mutation(t)).collect(),
            None => available_tools()
                .into_iter()
                .filter(|t| !is_mutation(t))
                .map(str::to_string)
                .collect(),
        };
        Ok(Some(allowed))
    }
}

/// Get all available tool names
pub fn available_tools() -> Vec<&'static str> {
    all_tool_metadata().iter().map(|tool| tool.name).collect()
}
