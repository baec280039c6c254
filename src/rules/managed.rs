//! Rules for managed projects (`.csproj`).
//!
//! Every configuration/platform property group gets `OutputPath` set to the
//! shared layout. `BaseIntermediateOutputPath` and `IntermediateOutputPath`
//! are only ever added: once present, whatever value they hold is kept.

use crate::error::ProjectError;
use crate::options::Options;
use crate::project::Project;
use crate::report::Report;
use crate::select::Selector;

use super::{add, set, step};

/// Any `'$(Configuration)|$(Platform)' == '...'` group, whatever the values.
pub const CONDITION_PREFIX: &str = "'$(Configuration)|$(Platform)'";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub output_path: String,
    pub base_intermediate_output_path: String,
    pub intermediate_output_path: String,
}

impl Templates {
    pub fn new(output_root: &str) -> Self {
        let root = format!("{output_root}CS_$(SolutionName)\\$(ProjectName)\\");
        Self {
            output_path: format!("{root}bin\\$(Configuration)"),
            base_intermediate_output_path: format!("{root}obj\\"),
            intermediate_output_path: "$(BaseIntermediateOutputPath)$(Configuration)\\$(Platform)\\"
                .to_string(),
        }
    }
}

pub fn apply(
    project: &mut Project,
    options: &Options,
    report: &mut Report,
) -> Result<(), ProjectError> {
    let templates = Templates::new(&options.output_root);

    step("output paths", project, report, |p, r| {
        for block in p.blocks(Selector::ConditionPrefix(CONDITION_PREFIX))? {
            set(p, r, &block, "OutputPath", &templates.output_path)?;
            add(
                p,
                r,
                &block,
                "BaseIntermediateOutputPath",
                &templates.base_intermediate_output_path,
            )?;
            add(p, r, &block, "IntermediateOutputPath", &templates.intermediate_output_path)?;
        }
        Ok(())
    })
}
