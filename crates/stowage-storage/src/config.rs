use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for a [`FileArea`](crate::FileArea).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAreaConfig {
    /// Directory holding one file per namespace.
    pub root: PathBuf,
    /// File extension appended to each namespace, without the dot.
    pub extension: String,
}

impl Default for FileAreaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(".stowage"),
            extension: "json".to_string(),
        }
    }
}

impl FileAreaConfig {
    /// Default configuration rooted at `root`.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }
}

/// Configuration for a [`ReactiveStorage`](crate::ReactiveStorage).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactiveConfig {
    /// Capacity of the broadcast channel handed to subscribers.
    pub channel_capacity: usize,
}

impl Default for ReactiveConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs() {
        let f = FileAreaConfig::default();
        assert_eq!(f.root, PathBuf::from(".stowage"));
        assert_eq!(f.extension, "json");
        assert_eq!(ReactiveConfig::default().channel_capacity, 256);
    }

    #[test]
    fn file_area_config_at_keeps_extension() {
        let f = FileAreaConfig::at("/tmp/data");
        assert_eq!(f.root, PathBuf::from("/tmp/data"));
        assert_eq!(f.extension, "json");
    }

    #[test]
    fn config_round_trips_through_json() {
        let c = ReactiveConfig { channel_capacity: 8 };
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(serde_json::from_str::<ReactiveConfig>(&json).unwrap(), c);
    }
}
