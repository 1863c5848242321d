//! Placeholder interpolation for host configuration documents.
//!
//! String values of the form `%key|default%` resolve to the setting at
//! `key`, or `default` when absent. `%key%` resolves to the setting when
//! present and is left untouched otherwise. The whole string is replaced,
//! so a placeholder may yield a number, bool or object.

use serde_json::Value;

use crate::cache::SnapshotCache;
use crate::database::RecordStore;
use crate::error::Result;

use super::{SettingsMap, SettingsStore, path};

#[derive(Debug, PartialEq, Eq)]
enum Placeholder<'a> {
    WithDefault { key: &'a str, default: &'a str },
    Plain { key: &'a str },
}

fn parse(text: &str) -> Option<Placeholder<'_>> {
    let start = text.find('%')?;
    let body = &text[start + 1..];

    if let Some(bar) = body.find('|')
        && let Some(end) = body[bar + 1..].find('%')
    {
        return Some(Placeholder::WithDefault {
            key: &body[..bar],
            default: &body[bar + 1..bar + 1 + end],
        });
    }

    body.find('%').map(|end| Placeholder::Plain { key: &body[..end] })
}

/// Resolve placeholders in `template` against `settings`.
pub fn interpolate(settings: &SettingsMap, template: Value) -> Value {
    match template {
        Value::String(text) => match parse(&text) {
            Some(Placeholder::WithDefault { key, default }) => path::lookup(settings, key)
                .cloned()
                .unwrap_or_else(|| Value::String(default.to_string())),
            Some(Placeholder::Plain { key }) => match path::lookup(settings, key) {
                Some(value) => value.clone(),
                None => Value::String(text),
            },
            None => Value::String(text),
        },
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| interpolate(settings, item))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, interpolate(settings, v)))
                .collect(),
        ),
        other => other,
    }
}

impl<S: RecordStore, C: SnapshotCache> SettingsStore<S, C> {
    /// Resolve `%key%` and `%key|default%` placeholders in a JSON document.
    pub async fn interpolate(&self, template: Value) -> Result<Value> {
        let settings = self.get_all().await?;
        Ok(interpolate(&settings, template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryRecordStore;
    use crate::settings::SettingsOptions;
    use serde_json::json;

    #[test]
    fn test_parse() {
        assert_eq!(
            parse("%mail.host|localhost%"),
            Some(Placeholder::WithDefault { key: "mail.host", default: "localhost" })
        );
        assert_eq!(parse("%mail.host%"), Some(Placeholder::Plain { key: "mail.host" }));
        assert_eq!(
            parse("smtp://%host|mx%/"),
            Some(Placeholder::WithDefault { key: "host", default: "mx" })
        );
        assert_eq!(parse("%key|%"), Some(Placeholder::WithDefault { key: "key", default: "" }));
        assert_eq!(parse("100%"), None);
        assert_eq!(parse("plain"), None);
    }

    #[tokio::test]
    async fn test_interpolate_document() {
        let store =
            SettingsStore::new(MemoryRecordStore::new(), SettingsOptions::default()).unwrap();
        store.set("mail", json!({"host": "mx.example.org", "port": 587}), None).await.unwrap();
        store.set("debug", true, None).await.unwrap();

        let template = json!({
            "mailer": {
                "host": "%mail.host|localhost%",
                "port": "%mail.port%",
                "user": "%mail.user|nobody%",
                "password": "%mail.password%",
            },
            "debug": ["%debug%", 1, null],
            "name": "app",
        });

        let rendered = store.interpolate(template).await.unwrap();
        assert_eq!(
            rendered,
            json!({
                "mailer": {
                    "host": "mx.example.org",
                    "port": 587,
                    "user": "nobody",
                    "password": "%mail.password%",
                },
                "debug": [true, 1, null],
                "name": "app",
            })
        );
    }
}
