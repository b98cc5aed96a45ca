//! # Run configuration
//!
//! JSON configuration for the export binary. Every field is optional and falls back to its
//! default, so `{}` is a valid configuration.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::*;
use crate::mcmanamon;
use crate::output::OutputConfig;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub output: OutputConfig,
    pub matcher: mcmanamon::Params
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Read and parse a JSON configuration file.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let config_err = |message: String| Error::Config {
        path: path.to_path_buf(),
        message
    };

    let contents = fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;

    serde_json::from_str(&contents).map_err(|e| config_err(e.to_string()))
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_gives_defaults() {
        let config: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.output.suffix, "_disp");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "output": {{ "extension": "bmp" }}, "matcher": {{ "max_disparity": 32, "correlation_window_size": [5, 7] }} }}"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.output.suffix, "_disp");
        assert_eq!(config.output.extension, "bmp");
        assert_eq!(config.matcher.max_disparity, 32);
        assert_eq!(config.matcher.correlation_window_size, (5, 7));
        assert_eq!(config.matcher.min_disparity, 0);
    }

    #[test]
    fn malformed_config_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ \"output\": 3 }}").unwrap();

        assert!(matches!(load_config(file.path()), Err(Error::Config { .. })));
        assert!(matches!(
            load_config(Path::new("no/such/config.json")),
            Err(Error::Config { .. })
        ));
    }
}
