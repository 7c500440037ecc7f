use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

mod cli;

use cli::Cli;
use database_mcp::catalog::Catalog;
use database_mcp::engine::QueryEngine;
use database_mcp::stdio::DatabaseToolServer;
use database_mcp::stdio::metadata::all_tool_metadata;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    // Handle list-tools flag
    if cli.list_tools {
        println!("Available tools:");
        for tool in all_tool_metadata() {
            println!("  - {} ({})", tool.name, tool.category);
        }
        return Ok(());
    }

    // Get enabled tools from CLI (--tool/--tools/--toolset/--readonly)
    let enabled_tools = cli.enabled_tools()?;

    // VALIDATE IMMEDIATELY - before loading the catalog
    if let Some(ref tools) = enabled_tools {
        let available = cli::available_tools();
        let invalid: Vec<_> = tools
            .iter()
            .filter(|tool| !available.contains(&tool.as_str()))
            .collect();

        if !invalid.is_empty() {
            eprintln!("Error: Invalid tool names specified:");
            for tool in &invalid {
                eprintln!("  - {tool}");
            }
            eprintln!();
            eprintln!("Available tools:");
            for tool in available {
                eprintln!("  - {tool}");
            }
            eprintln!();
            eprintln!("Tip: Use --list-tools to see all available tools");
            return Err(anyhow::anyhow!("Invalid tool names specified"));
        }
    }

    let catalog = Arc::new(Catalog::from_file(&cli.catalog)?);
    for descriptor in catalog.iter() {
        log::debug!(
            "Catalog entry '{}': {} at {}",
            descriptor.name,
            descriptor.dialect(),
            descriptor.redacted_url()
        );
    }

    let engine = Arc::new(QueryEngine::new(catalog));

    // Handle list-databases flag
    if cli.list_databases {
        println!("{}", engine.list_databases().text());
        return Ok(());
    }

    if cli.readonly {
        log::info!("Read-only mode: mutation tools are disabled");
    }

    let server = DatabaseToolServer::new(engine, enabled_tools);

    tokio::select! {
        result = server.serve_stdio() => result?,
        () = wait_for_interrupt() => {
            log::info!("Received interrupt signal, shutting down");
        }
    }

    Ok(())
}

/// Wait for interrupt signal (cross-platform)
#[cfg(unix)]
async fn wait_for_interrupt() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm_result = signal(SignalKind::terminate());
    let mut sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result.as_mut(), sigint_result.as_mut()) {
        (Ok(sigterm), Ok(sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {}
                _ = sigint.recv() => {}
            }
        }
        (Ok(sigterm), Err(_)) => {
            let _ = sigterm.recv().await;
        }
        (Err(_), Ok(sigint)) => {
            let _ = sigint.recv().await;
        }
        (Err(_), Err(_)) => {
            let () = std::future::pending().await;
        }
    }
}

/// Wait for interrupt signal (cross-platform)
#[cfg(windows)]
async fn wait_for_interrupt() {
    use tokio::signal::windows;

    match windows::ctrl_c() {
        Ok(mut ctrl_c) => {
            let _ = ctrl_c.recv().await;
        }
        Err(_) => {
            let () = std::future::pending().await;
        }
    }
}
