//! Version information for promptrelay.

/// promptrelay version from Cargo.toml
pub const PROMPTRELAY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version information for the running relay.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VersionInfo {
    pub promptrelay: &'static str,
    /// Worker invocation, e.g. `ollama run idea-refiner`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<String>,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            promptrelay: PROMPTRELAY_VERSION,
            worker: None,
        }
    }
}

impl VersionInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_worker(mut self, worker: String) -> Self {
        self.worker = Some(worker);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_info_has_crate_version() {
        let info = VersionInfo::new();
        assert_eq!(info.promptrelay, PROMPTRELAY_VERSION);
        assert!(info.worker.is_none());
    }

    #[test]
    fn version_info_serializes_minimal() {
        let info = VersionInfo {
            promptrelay: "0.1.0",
            worker: None,
        };
        insta::assert_json_snapshot!(info, @r#"
        {
          "promptrelay": "0.1.0"
        }
        "#);
    }

    #[test]
    fn version_info_serializes_worker() {
        let info = VersionInfo {
            promptrelay: "0.1.0",
            worker: None,
        }
        .with_worker("ollama run idea-refiner".to_string());
        insta::assert_json_snapshot!(info, @r#"
        {
          "promptrelay": "0.1.0",
          "worker": "ollama run idea-refiner"
        }
        "#);
    }
}
