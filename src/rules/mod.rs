//! Rule sets for the two project dialects and the extension dispatcher.

pub mod managed;
pub mod native;

use std::path::Path;

use tracing::{debug_span, warn};

use crate::error::ProjectError;
use crate::options::Options;
use crate::project::{Block, Project};
use crate::report::{Outcome, Report};

/// Project dialect, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `.vcxproj`
    Native,
    /// `.csproj`
    Managed,
}

impl Dialect {
    /// `None` for any extension without a rule set; such files are skipped.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("vcxproj") {
            Some(Self::Native)
        } else if ext.eq_ignore_ascii_case("csproj") {
            Some(Self::Managed)
        } else {
            None
        }
    }

    /// Run this dialect's rule set. On error, edits from steps that had
    /// already completed stay in `project` and in `report`.
    pub fn apply(
        self,
        project: &mut Project,
        options: &Options,
        report: &mut Report,
    ) -> Result<(), ProjectError> {
        match self {
            Self::Native => native::apply(project, options, report),
            Self::Managed => managed::apply(project, options, report),
        }
    }
}

/// Run one rule step. A failing step leaves neither edits nor outcomes
/// behind.
pub(crate) fn step<F>(
    name: &str,
    project: &mut Project,
    report: &mut Report,
    rule: F,
) -> Result<(), ProjectError>
where
    F: FnOnce(&mut Project, &mut Report) -> Result<(), ProjectError>,
{
    let _span = debug_span!("step", name).entered();
    let checkpoint = project.checkpoint();
    let mark = report.len();

    rule(project, report).inspect_err(|err| {
        warn!(step = name, error = %err, "rule step failed, discarding its edits");
        project.rollback(checkpoint);
        report.truncate(mark);
    })
}

/// Upsert `<name>` under `block` and record the outcome.
pub(crate) fn set(
    project: &mut Project,
    report: &mut Report,
    block: &Block,
    name: &str,
    value: &str,
) -> Result<Outcome, ProjectError> {
    let outcome = project.upsert(block, name, value)?;
    report.record(format!("<{name} />"), block.label().as_deref(), outcome);
    Ok(outcome)
}

/// Add `<name>` under `block` when absent and record the outcome.
pub(crate) fn add(
    project: &mut Project,
    report: &mut Report,
    block: &Block,
    name: &str,
    value: &str,
) -> Result<Outcome, ProjectError> {
    let outcome = project.insert_if_absent(block, name, value)?;
    report.record(format!("<{name} />"), block.label().as_deref(), outcome);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::Selector;

    #[test]
    fn dialect_by_extension() {
        assert_eq!(Dialect::from_path(Path::new("a/b.vcxproj")), Some(Dialect::Native));
        assert_eq!(Dialect::from_path(Path::new("B.VCXPROJ")), Some(Dialect::Native));
        assert_eq!(Dialect::from_path(Path::new("c.csproj")), Some(Dialect::Managed));
        assert_eq!(Dialect::from_path(Path::new("c.CsProj")), Some(Dialect::Managed));
        assert_eq!(Dialect::from_path(Path::new("d.vbproj")), None);
        assert_eq!(Dialect::from_path(Path::new("e.vcxproj.filters")), None);
        assert_eq!(Dialect::from_path(Path::new("vcxproj")), None);
    }

    #[test]
    fn failing_step_discards_only_its_own_edits() {
        let mut project = Project::parse(
            "<Project xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\">\n  <PropertyGroup Condition=\"'$(Configuration)'=='A'\" />\n</Project>",
        )
        .unwrap();
        let mut report = Report::new();
        let groups = Selector::ConditionPrefix("'$(Configuration)'");

        step("first", &mut project, &mut report, |p, r| {
            for block in p.blocks(groups)? {
                set(p, r, &block, "Kept", "1")?;
            }
            Ok(())
        })
        .unwrap();

        let err = step("second", &mut project, &mut report, |p, r| {
            for block in p.blocks(groups)? {
                set(p, r, &block, "Dropped", "2")?;
                set(p, r, &block.child("Missing"), "X", "3")?;
            }
            Ok(())
        })
        .unwrap_err();

        assert_eq!(err.element(), Some("Missing"));
        assert!(project.source().contains("<Kept>1</Kept>"));
        assert!(!project.source().contains("Dropped"));
        assert_eq!(report.changes().len(), 1);
        assert!(report.needs_save());
    }

    #[test]
    fn add_reports_existing_as_skipped() {
        let mut project = Project::parse(
            "<Project xmlns=\"http://schemas.microsoft.com/developer/msbuild/2003\">\
             <PropertyGroup Condition=\"'$(Configuration)'=='A'\"><X>old</X></PropertyGroup>\
             </Project>",
        )
        .unwrap();
        let mut report = Report::new();
        let block = project
            .blocks(Selector::ConditionPrefix("'$(Configuration)'"))
            .unwrap()
            .remove(0);
        assert_eq!(add(&mut project, &mut report, &block, "X", "new").unwrap(), Outcome::Skipped);
        assert_eq!(report.changes()[0].to_string(), "\tSkipping setting <X />, already existed.");
    }
}
