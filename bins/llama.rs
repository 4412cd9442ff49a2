use std::{process::ExitCode, sync::Arc};

use anyhow::{anyhow, bail, Context};
use configs::{AppConfig, LogFormat, SubstrateKind};
use dotenvy::dotenv;
use llama_store::{Field, JsonFileSubstrate, KeyValueSubstrate, MemorySubstrate, NamespacedStore, Untyped};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

const USAGE: &str = "usage: llama <namespace> <keys|catalog|get <key>|set <key> <json>|delete <key>>";

fn init_logging(format: LogFormat) {
    // load .env first so RUST_LOG is honoured
    dotenv().ok();
    match format {
        LogFormat::Compact => common::utils::logging::init_logging_default(),
        LogFormat::Json => common::utils::logging::init_logging_json(),
    }
    info!(service = "llama", event = "logger_init", "tracing subscriber initialized");
}

fn open_substrate(cfg: &AppConfig) -> anyhow::Result<Arc<dyn KeyValueSubstrate>> {
    match cfg.substrate.kind {
        SubstrateKind::Memory => {
            let substrate = match cfg.substrate.quota_bytes {
                Some(limit) => MemorySubstrate::with_quota(limit),
                None => MemorySubstrate::new(),
            };
            warn!(service = "llama", event = "ephemeral_substrate", "memory substrate does not outlive this run");
            Ok(Arc::new(substrate))
        }
        SubstrateKind::File => {
            let path = cfg.substrate.path.as_deref().ok_or_else(|| anyhow!("substrate.path missing"))?;
            let substrate = JsonFileSubstrate::open(path).with_context(|| format!("opening {path}"))?;
            Ok(Arc::new(substrate))
        }
    }
}

fn run(cfg: &AppConfig, args: &[String]) -> anyhow::Result<()> {
    let (namespace, command, rest) = match args {
        [namespace, command, rest @ ..] => (namespace.as_str(), command.as_str(), rest),
        _ => bail!(USAGE),
    };

    let mut store = NamespacedStore::<Untyped>::open(open_substrate(cfg)?, namespace)?;
    info!(
        service = "llama",
        event = "namespace_open",
        namespace = store.namespace_name(),
        restored = store.restored(),
        "namespace opened"
    );

    match (command, rest) {
        ("keys", []) => {
            for key in store.known_keys()? {
                println!("{key}");
            }
        }
        ("catalog", []) => {
            println!("{}", serde_json::to_string_pretty(store.catalog())?);
        }
        ("get", [key]) => {
            let field: Field<Untyped, Value> = Field::named(key.as_str());
            // absent keys print `null`, matching the store's not-an-error contract
            println!("{}", store.get(&field)?.unwrap_or(Value::Null));
        }
        ("set", [key, raw]) => {
            let value: Value = serde_json::from_str(raw).with_context(|| format!("`{raw}` is not JSON"))?;
            store.set(&Field::named(key.as_str()), &value)?;
            info!(service = "llama", event = "set", key = key.as_str(), "value stored");
        }
        ("delete", [key]) => {
            store.delete(&Field::<Untyped, Value>::named(key.as_str()))?;
            info!(service = "llama", event = "delete", key = key.as_str(), "value deleted");
        }
        _ => bail!(USAGE),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cfg = match AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("invalid configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(cfg.logging.format);

    let run_id = Uuid::new_v4();
    let version = env!("CARGO_PKG_VERSION");
    info!(service = "llama", event = "start", %run_id, version, substrate = ?cfg.substrate.kind, "llama starting");

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&cfg, &args) {
        Ok(()) => {
            info!(service = "llama", event = "stop", %run_id, "llama finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "llama", event = "run_failed", %run_id, error = %format!("{e:#}"), "command failed");
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use configs::SubstrateConfig;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn file_config(path: &std::path::Path) -> AppConfig {
        AppConfig {
            substrate: SubstrateConfig {
                kind: SubstrateKind::File,
                path: Some(path.display().to_string()),
                quota_bytes: None,
            },
            ..AppConfig::default()
        }
    }

    #[test]
    fn get_of_absent_key_succeeds() -> anyhow::Result<()> {
        let tmp = std::env::temp_dir().join(format!("llama_cli_{}.json", Uuid::new_v4()));
        let cfg = file_config(&tmp);

        run(&cfg, &args(&["s", "get", "missing"]))?;
        run(&cfg, &args(&["s", "set", "age", "22"]))?;
        run(&cfg, &args(&["s", "get", "age"]))?;
        run(&cfg, &args(&["s", "delete", "age"]))?;
        run(&cfg, &args(&["s", "get", "age"]))?;

        let _ = std::fs::remove_file(&tmp);
        Ok(())
    }

    #[test]
    fn rejects_malformed_commands() {
        let tmp = std::env::temp_dir().join(format!("llama_cli_{}.json", Uuid::new_v4()));
        let cfg = file_config(&tmp);
        assert!(run(&cfg, &args(&["s"])).is_err());
        assert!(run(&cfg, &args(&["s", "set", "k", "{not json"])).is_err());
        assert!(run(&cfg, &args(&["s", "frobnicate"])).is_err());
        let _ = std::fs::remove_file(&tmp);
    }
}
