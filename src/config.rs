use anyhow::{Context, Result};
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use toml_edit::{value, Array, DocumentMut, Item, Table};

static CONFIG: OnceCell<AdminConfig> = OnceCell::new();

/// Loads the config on first use; later calls return the loaded config.
pub fn init(path: &Path) -> Result<&'static AdminConfig> {
    CONFIG.get_or_try_init(|| AdminConfig::load(path))
}

trait ConfigSerializeDefault {
    fn fix_config(self, name: &str, doc: &mut DocumentMut);
}

macro_rules! impl_simple_default {
    ( $( $type:ty ),* ) => {
        $(
            impl ConfigSerializeDefault for $type {
                fn fix_config(self, name: &str, doc: &mut DocumentMut) {
                    doc.entry(name).or_insert_with(|| value(self));
                }
            }
        )*
    }
}

impl_simple_default!(String, i64, bool);

impl ConfigSerializeDefault for IndexMap<String, String> {
    fn fix_config(self, name: &str, doc: &mut DocumentMut) {
        doc.entry(name).or_insert_with(|| {
            let mut table = Table::new();
            for (key, replacement) in self {
                table.insert(&key, value(replacement));
            }
            Item::Table(table)
        });
    }
}

impl ConfigSerializeDefault for IndexMap<String, Vec<String>> {
    fn fix_config(self, name: &str, doc: &mut DocumentMut) {
        doc.entry(name).or_insert_with(|| {
            let mut table = Table::new();
            for (player, permissions) in self {
                table.insert(&player, value(permissions.into_iter().collect::<Array>()));
            }
            Item::Table(table)
        });
    }
}

macro_rules! gen_config {
    (
        $( $(#[$doc:meta])* $name:ident: $type:ty = $default:expr),*
    ) => {
        #[derive(Debug, Serialize, Deserialize)]
        pub struct AdminConfig {
            $(
                $(#[$doc])*
                pub $name: $type,
            )*
        }

        impl AdminConfig {
            /// Reads `config_file`, writing back any keys that are missing
            /// with their default values.
            pub fn load(config_file: &Path) -> Result<AdminConfig> {
                let str = fs::read_to_string(config_file).unwrap_or_default();
                let mut doc = str
                    .parse::<DocumentMut>()
                    .with_context(|| format!("Failed to parse {}", config_file.display()))?;

                $(
                    <$type as ConfigSerializeDefault>::fix_config($default, stringify!($name), &mut doc);
                )*

                let patched = doc.to_string();
                if str != patched {
                    let mut file = fs::OpenOptions::new()
                        .create(true)
                        .write(true)
                        .truncate(true)
                        .open(config_file)
                        .with_context(|| format!("Failed to open {}", config_file.display()))?;
                    write!(file, "{}", patched)?;
                }

                toml::from_str(&patched)
                    .with_context(|| format!("Invalid config in {}", config_file.display()))
            }
        }
    };
}

gen_config! {
    /// Name replies from the console are attributed to.
    console_name: String = "Console".to_string(),
    /// Upper bound on how many completions are printed.
    max_suggestions: i64 = 20,
    /// Textual aliases expanded before a line is parsed.
    command_aliases: IndexMap<String, String> = IndexMap::from([
        ("gmc".to_string(), "gamemode creative {}".to_string()),
        ("gms".to_string(), "gamemode survival {}".to_string()),
    ]),
    /// Known players and their permission nodes. A node starting with `-`
    /// revokes the permission.
    players: IndexMap<String, Vec<String>> = IndexMap::new()
}
