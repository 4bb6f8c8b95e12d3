use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub composer: ComposerConfig,
    #[serde(default)]
    pub record: RecordConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Ancestor levels the structural path may climb, counting the node itself.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_attribute_allow_list")]
    pub attribute_allow_list: Vec<String>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            attribute_allow_list: default_attribute_allow_list(),
        }
    }
}

fn default_max_depth() -> usize {
    5
}

fn default_attribute_allow_list() -> Vec<String> {
    [
        "name",
        "data-testid",
        "role",
        "type",
        "aria-label",
        "value",
        "placeholder",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_max_ancestor_depth")]
    pub max_ancestor_depth: usize,
    #[serde(default = "default_landmark_tags")]
    pub landmark_tags: Vec<String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_ancestor_depth: default_max_ancestor_depth(),
            landmark_tags: default_landmark_tags(),
        }
    }
}

fn default_max_ancestor_depth() -> usize {
    4
}

fn default_landmark_tags() -> Vec<String> {
    ["form", "main", "section", "article", "tr"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_dynamic_window_ms")]
    pub dynamic_window_ms: u64,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            dynamic_window_ms: default_dynamic_window_ms(),
            capacity: default_capacity(),
        }
    }
}

fn default_dynamic_window_ms() -> u64 {
    2000
}

fn default_capacity() -> usize {
    10_000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposerConfig {
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    /// Checked in order; the first present attribute wins.
    #[serde(default = "default_test_id_attributes")]
    pub test_id_attributes: Vec<String>,
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: default_wait_timeout_ms(),
            test_id_attributes: default_test_id_attributes(),
            max_text_length: default_max_text_length(),
        }
    }
}

fn default_wait_timeout_ms() -> u64 {
    5000
}

fn default_test_id_attributes() -> Vec<String> {
    ["data-testid", "data-test-id", "data-test", "data-cy", "data-qa"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_text_length() -> usize {
    80
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordConfig {
    #[serde(default = "default_max_snapshot_chars")]
    pub max_snapshot_chars: usize,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            max_snapshot_chars: default_max_snapshot_chars(),
        }
    }
}

fn default_max_snapshot_chars() -> usize {
    2000
}
