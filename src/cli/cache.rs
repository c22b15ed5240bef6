//! Cache inspection commands: `key` and `clear-cache`

use std::process::ExitCode;

use crate::cache::CacheStore;
use crate::config::MfenConfig;
use crate::mfen::Mfen;

use super::{check_config, display_path, EXIT_ERROR, EXIT_SUCCESS};

/// Print the cache key and location the render of `config` would use.
pub fn run_key(config: &MfenConfig, json: bool) -> ExitCode {
    if let Err(code) = check_config(config) {
        return code;
    }

    let (key, encoding) = match Mfen::from_config(config).cache_key(config) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("Error {}: {}", e.code(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let store = CacheStore::new(&config.cache.dir, config.cache.public_location.clone());
    let location = store.location_for(&key, encoding.mime);
    let cached = config.cache.enabled && location.path.is_file();

    if json {
        let value = serde_json::json!({
            "key": key.as_str(),
            "path": location.path.display().to_string(),
            "location": location.public,
            "mime": encoding.mime.mime_type(),
            "cached": cached,
        });
        match serde_json::to_string_pretty(&value) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else {
        println!("key:      {}", key);
        println!("path:     {}", display_path(&location.path));
        println!("location: {}", location.public);
        println!("cached:   {}", if cached { "yes" } else { "no" });
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Remove every cached image from the configured cache directory.
pub fn run_clear_cache(config: &MfenConfig) -> ExitCode {
    let store = CacheStore::new(&config.cache.dir, config.cache.public_location.clone());
    match store.clear() {
        Ok(removed) => {
            println!("Removed {} cached image(s) from {}", removed, display_path(store.dir()));
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
