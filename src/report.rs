use std::fmt;

/// What a single upsert did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The element already held the desired value (or is add-only and present).
    Skipped,
    Updated,
    Added,
}

impl Outcome {
    pub fn is_change(self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

/// One reported outcome: which element, in which block, and what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Element as shown to the operator, e.g. `<OutDir />`.
    pub element: String,
    /// Configuration of the enclosing block, e.g. `Debug|Win32`.
    pub block: Option<String>,
    pub outcome: Outcome,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::Skipped => write!(f, "\tSkipping setting {}, already existed.", self.element)?,
            Outcome::Updated => write!(f, "\t{} was updated successfully.", self.element)?,
            Outcome::Added => write!(f, "\t{} was added successfully.", self.element)?,
        }
        if let Some(block) = &self.block {
            write!(f, " [{block}]")?;
        }
        Ok(())
    }
}

/// Outcomes accumulated across all rule steps of one file.
///
/// The save decision is taken once, from this accumulator, after the rule
/// set has finished (or failed).
#[derive(Debug, Default, Clone)]
pub struct Report {
    changes: Vec<Change>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, element: impl Into<String>, block: Option<&str>, outcome: Outcome) {
        self.changes.push(Change {
            element: element.into(),
            block: block.map(String::from),
            outcome,
        });
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// True once any upsert reported `Updated` or `Added`.
    pub fn needs_save(&self) -> bool {
        self.changes.iter().any(|c| c.outcome.is_change())
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.changes.iter().filter(|c| c.outcome == outcome).count()
    }

    /// Number of recorded changes, used as a rollback mark.
    pub(crate) fn len(&self) -> usize {
        self.changes.len()
    }

    /// Drop everything recorded after `mark`.
    pub(crate) fn truncate(&mut self, mark: usize) {
        self.changes.truncate(mark);
    }
}
