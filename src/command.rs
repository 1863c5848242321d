//! Command-line commands for the settings host.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde_json::Value;

use appsettings::cache::SnapshotCache;
use appsettings::database::RecordStore;
use appsettings::{SettingsStore, TypeTag};

pub const USAGE: &str = "\
usage: appsettings <command>

commands:
  list                          print every setting
  get <path> [default]          print one setting
  set <path> <value> [type]     store a setting (value is JSON, else a string)
  delete <path>                 remove a setting
  flush                         remove every setting
  render <file.json>            resolve %key% / %key|default% placeholders";

/// One invocation of the host binary.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    List,
    Get { path: String, default: Option<Value> },
    Set { path: String, value: Value, kind: Option<TypeTag> },
    Delete { path: String },
    Flush,
    Render { file: PathBuf },
}

/// Parse a raw argument as JSON, falling back to a plain string.
fn parse_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

impl Command {
    /// Parse the arguments following the program name.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let Some(name) = args.next() else {
            bail!("missing command\n\n{USAGE}");
        };
        let required = |args: &mut dyn Iterator<Item = String>, what: &str| {
            args.next()
                .with_context(|| format!("`{name}` needs a {what}\n\n{USAGE}"))
        };

        let command = match name.as_str() {
            "list" => Command::List,
            "get" => Command::Get {
                path: required(&mut args, "path")?,
                default: args.next().map(parse_value),
            },
            "set" => Command::Set {
                path: required(&mut args, "path")?,
                value: parse_value(required(&mut args, "value")?),
                // unknown type names fall back to detection
                kind: args.next().and_then(|kind| TypeTag::from_name(&kind)),
            },
            "delete" => Command::Delete {
                path: required(&mut args, "path")?,
            },
            "flush" => Command::Flush,
            "render" => Command::Render {
                file: required(&mut args, "file")?.into(),
            },
            other => bail!("unknown command `{other}`\n\n{USAGE}"),
        };

        Ok(command)
    }

    /// Run against `store`, returning what to print.
    pub async fn run<S, C>(self, store: &SettingsStore<S, C>) -> Result<String>
    where
        S: RecordStore,
        C: SnapshotCache,
    {
        let output = match self {
            Command::List => {
                let settings = store.get_all().await?;
                serde_json::to_string_pretty(&*settings)?
            }
            Command::Get { path, default } => {
                let value = store.get(&path, default, false).await?;
                serde_json::to_string_pretty(&value.unwrap_or(Value::Null))?
            }
            Command::Set { path, value, kind } => {
                store.set(&path, value, kind).await?;
                format!("set {path}")
            }
            Command::Delete { path } => {
                store.delete(&path).await?;
                format!("deleted {path}")
            }
            Command::Flush => {
                store.flush().await?;
                "flushed".to_string()
            }
            Command::Render { file } => {
                let raw = tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("reading {}", file.display()))?;
                let template: Value = serde_json::from_str(&raw)
                    .with_context(|| format!("parsing {}", file.display()))?;
                serde_json::to_string_pretty(&store.interpolate(template).await?)?
            }
        };

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appsettings::database::MemoryRecordStore;
    use appsettings::SettingsOptions;
    use serde_json::json;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(args("list")).unwrap(), Command::List);
        assert_eq!(
            Command::parse(args("get mail.port 25")).unwrap(),
            Command::Get { path: "mail.port".to_string(), default: Some(json!(25)) }
        );
        assert_eq!(
            Command::parse(args("set name hello")).unwrap(),
            Command::Set { path: "name".to_string(), value: json!("hello"), kind: None }
        );
        assert_eq!(
            Command::parse(args("set port 8080 string")).unwrap(),
            Command::Set {
                path: "port".to_string(),
                value: json!(8080),
                kind: Some(TypeTag::String),
            }
        );
        assert_eq!(
            Command::parse(args("set port 8080 datetime")).unwrap(),
            Command::Set { path: "port".to_string(), value: json!(8080), kind: None }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse(args("")).is_err());
        assert!(Command::parse(args("get")).is_err());
        assert!(Command::parse(args("set only_path")).is_err());
        assert!(Command::parse(args("explode")).is_err());
    }

    #[tokio::test]
    async fn test_run_round() {
        let store =
            SettingsStore::new(MemoryRecordStore::new(), SettingsOptions::default()).unwrap();

        Command::parse(args(r#"set mail {"port":25}"#)).unwrap().run(&store).await.unwrap();
        let out = Command::parse(args("get mail.port")).unwrap().run(&store).await.unwrap();
        assert_eq!(out, "25");

        Command::Delete { path: "mail".to_string() }.run(&store).await.unwrap();
        let out = Command::parse(args("get mail.port 7")).unwrap().run(&store).await.unwrap();
        assert_eq!(out, "7");

        let out = Command::List.run(&store).await.unwrap();
        assert_eq!(out, "{}");
    }
}
