//! Interpreter configuration

/// Default limit on nested user function calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

/// Settings shared by the command line, the REPL and embedders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Nested user function calls allowed before aborting
    pub max_call_depth: usize,
    /// Print diagnostics as one-line `Error: ... (line, column)` text
    pub plain_diagnostics: bool,
    /// Colorize rendered diagnostics
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            plain_diagnostics: false,
            color: true,
        }
    }
}

impl Config {
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_plain_diagnostics(mut self, plain: bool) -> Self {
        self.plain_diagnostics = plain;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
        assert!(!config.plain_diagnostics);
        assert!(config.color);
    }

    #[test]
    fn test_builders() {
        let config = Config::default()
            .with_max_call_depth(5)
            .with_plain_diagnostics(true)
            .with_color(false);
        assert_eq!(config.max_call_depth, 5);
        assert!(config.plain_diagnostics);
        assert!(!config.color);
    }
}
