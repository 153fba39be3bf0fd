//! ANSI palette for JSON output.

/// jq-style colors. Empty strings when disabled.
#[derive(Clone, Copy, Debug)]
pub struct Colors {
    pub key: &'static str,
    pub string: &'static str,
    pub literal: &'static str,
    pub punct: &'static str,
    pub reset: &'static str,
}

impl Default for Colors {
    fn default() -> Self {
        Self::OFF
    }
}

impl Colors {
    pub const ON: Self = Self {
        key: "\x1b[34;1m",
        string: "\x1b[32m",
        literal: "\x1b[2m",
        punct: "\x1b[1m",
        reset: "\x1b[0m",
    };

    pub const OFF: Self = Self {
        key: "",
        string: "",
        literal: "",
        punct: "",
        reset: "",
    };

    pub fn new(enabled: bool) -> Self {
        if enabled { Self::ON } else { Self::OFF }
    }

    pub fn is_enabled(&self) -> bool {
        !self.reset.is_empty()
    }
}
