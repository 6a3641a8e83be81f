//! ANSI styling for dump output.
//!
//! Colors are named by role:
//! - `header`: section titles (blue)
//! - `name`: query and symbol names (green)
//! - `note`: the trailing stats line (dim)

#[derive(Clone, Copy, Debug)]
pub struct Colors {
    pub header: &'static str,
    pub name: &'static str,
    pub note: &'static str,
    pub reset: &'static str,
}

impl Default for Colors {
    fn default() -> Self {
        Self::OFF
    }
}

impl Colors {
    pub const ON: Self = Self {
        header: "\x1b[34m",
        name: "\x1b[32m",
        note: "\x1b[2m",
        reset: "\x1b[0m",
    };

    pub const OFF: Self = Self {
        header: "",
        name: "",
        note: "",
        reset: "",
    };

    pub fn new(enabled: bool) -> Self {
        if enabled { Self::ON } else { Self::OFF }
    }

    pub fn is_enabled(&self) -> bool {
        !self.reset.is_empty()
    }
}
