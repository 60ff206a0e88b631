use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;

use crate::error::Error;

/// Compiler and machine settings, e.g.
///
/// ```yaml
/// vec4: false
/// global_size: 3072
/// stack_size: 1024
/// max_steps: 100000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keep `vec4` values as single leaves and use the vec4 instructions.
    pub vec4: bool,
    /// Global memory, in words.
    pub global_size: u32,
    /// Stack, in words.
    pub stack_size: u32,
    /// Abort a run after this many instructions.
    pub max_steps: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            vec4: false,
            global_size: emu::model::GLOBAL_SIZE,
            stack_size: emu::model::STACK_SIZE,
            max_steps: None,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Error> {
        let file = File::open(path)?;
        Ok(serde_yaml::from_reader(BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Config = serde_yaml::from_str("max_steps: 500\n").unwrap();
        assert_eq!(config.max_steps, Some(500));
        assert_eq!(config.global_size, 3072);
        assert_eq!(config.stack_size, 1024);
        assert!(!config.vec4);
    }
}
