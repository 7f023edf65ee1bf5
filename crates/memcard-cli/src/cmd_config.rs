use crate::config::{parse_value, read_config, write_config, Config};
use clap::Subcommand;
use memcard_store::ProjectPaths;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. max_size)
        key: String,
        /// Config value (true/false/number/string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values, defaults included
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, paths: &ProjectPaths) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(paths, &key, &value),
        ConfigCmd::Get { key } => get(paths, &key),
        ConfigCmd::List => list(paths),
    }
}

// ── Command Implementations ──

/// `memcard config set <key> <value>`
pub fn set(paths: &ProjectPaths, key: &str, value: &str) -> anyhow::Result<()> {
    let mut map = read_config(&paths.config_json)?;
    map.insert(key.to_string(), parse_value(value));
    // Reject unknown keys and ill-typed values before touching the file.
    Config::from_map(map.clone())?;
    write_config(&paths.config_json, &map)?;
    println!("{key} = {value}");
    Ok(())
}

/// `memcard config get <key>`
pub fn get(paths: &ProjectPaths, key: &str) -> anyhow::Result<()> {
    let effective = effective(paths)?;
    match effective.get(key) {
        Some(val) => println!("{}", display(val)),
        None => anyhow::bail!("unknown config key \"{key}\""),
    }
    Ok(())
}

/// `memcard config list`
pub fn list(paths: &ProjectPaths) -> anyhow::Result<()> {
    let stored = read_config(&paths.config_json)?;
    for (k, v) in &effective(paths)? {
        let origin = if stored.contains_key(k) { "" } else { "  (default)" };
        println!("{k} = {}{origin}", display(v));
    }
    Ok(())
}

fn effective(paths: &ProjectPaths) -> anyhow::Result<serde_json::Map<String, serde_json::Value>> {
    let config = Config::load(paths)?;
    match serde_json::to_value(config)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("config did not serialize to an object"),
    }
}

fn display(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
