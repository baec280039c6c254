//! Run configuration shared by the rule sets.

/// Base of the centralized output layout unless overridden.
pub const DEFAULT_OUTPUT_ROOT: &str = "D:\\Temp\\Slns\\";

/// Everything a run needs to know besides the root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// `PlatformToolset` override (e.g. `v100`). Empty counts as absent.
    pub toolset: Option<String>,
    /// Directory the output/intermediate/log templates are rooted at. Kept
    /// verbatim; a trailing separator is expected.
    pub output_root: String,
    /// Test-framework include/library settings, when requested.
    pub test_framework: Option<TestFramework>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            toolset: None,
            output_root: DEFAULT_OUTPUT_ROOT.to_string(),
            test_framework: None,
        }
    }
}

impl Options {
    pub fn toolset(&self) -> Option<&str> {
        self.toolset.as_deref().filter(|t| !t.is_empty())
    }
}

/// Semicolon-delimited lists written as-is; nothing here splits or checks them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestFramework {
    pub include_dirs: String,
    pub release: LinkSettings,
    pub debug: LinkSettings,
}

/// Linker settings for one configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSettings {
    pub library_dirs: String,
    pub dependencies: String,
    pub ignored_libraries: String,
}
