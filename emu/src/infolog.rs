use std::fmt::Display;

/// Append-only diagnostics and print output of one compiled program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoLog {
    text: String,
}

impl InfoLog {
    pub fn error(&mut self, msg: impl Display) {
        self.text.push_str(&format!("Error: {msg}\n"));
    }

    pub fn warning(&mut self, msg: impl Display) {
        self.text.push_str(&format!("Warning: {msg}\n"));
    }

    pub fn print(&mut self, msg: impl Display) {
        self.text.push_str(&format!("{msg}\n"));
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes() {
        let mut log = InfoLog::default();
        assert!(log.is_empty());
        log.error("x: undeclared identifier");
        log.warning("unused");
        log.print(2.5);
        assert_eq!(
            log.text(),
            "Error: x: undeclared identifier\nWarning: unused\n2.5\n"
        );
    }
}
