//!
//! Structured records of the recoverable problems met during a conversion.
//!

use std::fmt;

/// Category of a recoverable problem.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Degenerate faces, mismatched array lengths, out of range indices.
    Shape,
    /// An attribute too wide or not numeric enough to fit a channel.
    Type,
    /// Two attributes wanting the same channel.
    Conflict,
    /// Lossy but expected conversions.
    Info,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Path of the mesh node.
    pub path: String,
    /// The attribute involved, if any.
    pub attribute: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attr) => write!(f, "{} [{}]: {}", self.path, attr, self.message),
            None => write!(f, "{}: {}", self.path, self.message),
        }
    }
}

/// Diagnostics collected over one conversion call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    path: String,
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Start collecting diagnostics for the node at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Diagnostics {
            path: path.into(),
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, kind: DiagnosticKind, attribute: Option<&str>, message: impl Into<String>) {
        self.records.push(Diagnostic {
            kind,
            path: self.path.clone(),
            attribute: attribute.map(str::to_string),
            message: message.into(),
        });
    }

    pub fn shape(&mut self, attribute: Option<&str>, message: impl Into<String>) {
        self.push(DiagnosticKind::Shape, attribute, message);
    }

    pub fn type_mismatch(&mut self, attribute: &str, message: impl Into<String>) {
        self.push(DiagnosticKind::Type, Some(attribute), message);
    }

    pub fn conflict(&mut self, attribute: &str, message: impl Into<String>) {
        self.push(DiagnosticKind::Conflict, Some(attribute), message);
    }

    pub fn info(&mut self, attribute: Option<&str>, message: impl Into<String>) {
        self.push(DiagnosticKind::Info, attribute, message);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.records.iter()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(move |d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Forward every record to the `log` facade.
    pub fn emit(&self) {
        for d in &self.records {
            match d.kind {
                DiagnosticKind::Info => log::info!("{}", d),
                _ => log::warn!("{}", d),
            }
        }
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_carry_context() {
        let mut diags = Diagnostics::new("/root/mesh");
        diags.conflict("uv", "channel 1 is already used by st");
        diags.info(None, "removed 2 unused vertices");
        assert_eq!(diags.len(), 2);
        assert_eq!(diags.of_kind(DiagnosticKind::Conflict).count(), 1);
        let first = diags.iter().next().unwrap();
        assert_eq!(first.to_string(), "/root/mesh [uv]: channel 1 is already used by st");
        diags.emit();
    }
}
