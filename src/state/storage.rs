//! Durable key/value storage behind the session.
//!
//! Backends:
//! - `MemoryStorage`: process-local, used by tests and throwaway sessions.
//! - `FileStorage`: a small JSON object on disk, used by the CLI.
//! - `LocalStorage` / `DocumentCookie` (feature `browser`): the window's
//!   `localStorage` and `document.cookie`. Require a browser environment.
//!
//! Cookie mirrors are write-only from this crate's point of view: the session
//! only ever expires a cookie, it never sets one.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// TRAITS
// =============================================================================

/// String key/value store that survives restarts.
pub trait Storage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// A place collaborators may read session state from as a cookie.
pub trait CookieMirror: Send + Sync {
    /// Invalidate the cookie `name`. Missing cookies are not an error.
    fn expire(&self, name: &str);
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items().remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// JSON object file. Created on first write, deleted once it holds no keys.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Like `read_all`, but an unparseable file counts as empty so the next
    /// write replaces it instead of failing forever.
    fn read_for_write(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.read_all() {
            Err(StorageError::Json(e)) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding corrupt storage file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Write to a sibling temp file and rename it over the target, so a
    /// crash mid-write leaves the previous contents intact.
    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if items.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(items)?;
        let temp = self.temp_path();
        std::fs::write(&temp, text)?;
        if let Err(e) = std::fs::rename(&temp, &self.path) {
            if let Err(cleanup) = std::fs::remove_file(&temp) {
                tracing::debug!(path = %temp.display(), error = %cleanup, "temp file cleanup failed");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.read_for_write()?;
        items.insert(key.to_owned(), value.to_owned());
        self.write_all(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.read_for_write()?;
        items.remove(key);
        self.write_all(&items)
    }
}

// =============================================================================
// COOKIE JAR MIRROR
// =============================================================================

/// Cookie mirror over the `reqwest` jar the gateway sends cookies from.
pub struct JarMirror {
    jar: Arc<reqwest::cookie::Jar>,
    url: reqwest::Url,
}

impl JarMirror {
    #[must_use]
    pub fn new(jar: Arc<reqwest::cookie::Jar>, url: reqwest::Url) -> Self {
        Self { jar, url }
    }
}

impl CookieMirror for JarMirror {
    fn expire(&self, name: &str) {
        self.jar.add_cookie_str(&format!("{name}=; Max-Age=0; Path=/"), &self.url);
    }
}

// =============================================================================
// BROWSER
// =============================================================================

#[cfg(feature = "browser")]
pub use browser::{DocumentCookie, LocalStorage};

#[cfg(feature = "browser")]
mod browser {
    use wasm_bindgen::JsCast;

    use super::{CookieMirror, Storage, StorageError};

    fn js_err(value: &wasm_bindgen::JsValue) -> StorageError {
        StorageError::Unavailable(format!("{value:?}"))
    }

    fn local_storage() -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".to_owned()))?;
        window
            .local_storage()
            .map_err(|e| js_err(&e))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_owned()))
    }

    /// The window's `localStorage`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LocalStorage;

    impl Storage for LocalStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
            local_storage()?.get_item(key).map_err(|e| js_err(&e))
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            local_storage()?.set_item(key, value).map_err(|e| js_err(&e))
        }

        fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            local_storage()?.remove_item(key).map_err(|e| js_err(&e))
        }
    }

    /// `document.cookie` for the current page.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct DocumentCookie;

    impl CookieMirror for DocumentCookie {
        fn expire(&self, name: &str) {
            let Some(doc) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            if let Ok(html) = doc.dyn_into::<web_sys::HtmlDocument>() {
                let _ = html.set_cookie(&format!("{name}=; Max-Age=0; path=/"));
            }
        }
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
