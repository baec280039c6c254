//! Rules for native C++ projects (`.vcxproj`).
//!
//! Steps, in order, each aborting the rest on failure:
//!
//! 1. `PlatformToolset` in the labelled configuration groups (only with an override)
//! 2. `OutDir` / `IntDir` in the unlabelled configuration groups
//! 3. `BuildLog/Path` in the item-definition groups
//! 4. test-framework include, library and dependency settings (only when requested)
//!
//! Only the `Debug|Win32` and `Release|Win32` configurations are touched.

use crate::error::ProjectError;
use crate::options::{LinkSettings, Options, TestFramework};
use crate::project::{Block, Project};
use crate::report::{Outcome, Report};
use crate::select::Selector;

use super::{set, step};

pub const CONDITION_DEBUG: &str = "'$(Configuration)|$(Platform)'=='Debug|Win32'";
pub const CONDITION_RELEASE: &str = "'$(Configuration)|$(Platform)'=='Release|Win32'";

const BOTH: &[&str] = &[CONDITION_DEBUG, CONDITION_RELEASE];
const DEBUG_ONLY: &[&str] = &[CONDITION_DEBUG];
const RELEASE_ONLY: &[&str] = &[CONDITION_RELEASE];

/// Keeps the inherited linker inputs in an `AdditionalDependencies` list.
pub const DEPENDENCIES_MARKER: &str = "%(AdditionalDependencies)";

const DEPENDENCIES: &str = "AdditionalDependencies";

/// Target values. `$(...)` tokens are left for MSBuild to expand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    pub out_dir: String,
    pub int_dir: String,
    pub build_log: String,
}

impl Templates {
    pub fn new(output_root: &str) -> Self {
        let root = format!("{output_root}CPP_$(SolutionName)\\$(ProjectName)\\");
        Self {
            out_dir: format!("{root}$(OutputType)\\$(Configuration)\\$(PlatformShortName)\\"),
            int_dir: format!("{root}IntDir_$(IntDir)$(PlatformShortName)\\"),
            build_log: format!("{root}log\\$(PlatformShortName)\\$(MSBuildProjectName).log"),
        }
    }
}

pub fn apply(
    project: &mut Project,
    options: &Options,
    report: &mut Report,
) -> Result<(), ProjectError> {
    let templates = Templates::new(&options.output_root);

    if let Some(toolset) = options.toolset() {
        step("platform toolset", project, report, |p, r| set_toolset(p, r, toolset))?;
    }
    step("output directories", project, report, |p, r| set_output_dirs(p, r, &templates))?;
    step("build log", project, report, |p, r| set_build_log(p, r, &templates.build_log))?;
    if let Some(test_framework) = &options.test_framework {
        step("test framework", project, report, |p, r| {
            set_test_framework(p, r, test_framework)
        })?;
    }

    Ok(())
}

fn set_toolset(
    project: &mut Project,
    report: &mut Report,
    toolset: &str,
) -> Result<(), ProjectError> {
    for block in project.blocks(Selector::ConfigurationLabel(BOTH))? {
        set(project, report, &block, "PlatformToolset", toolset)?;
    }
    Ok(())
}

fn set_output_dirs(
    project: &mut Project,
    report: &mut Report,
    templates: &Templates,
) -> Result<(), ProjectError> {
    for block in project.blocks(Selector::ConfigurationNoLabel(BOTH))? {
        set(project, report, &block, "OutDir", &templates.out_dir)?;
        set(project, report, &block, "IntDir", &templates.int_dir)?;
    }
    Ok(())
}

fn set_build_log(
    project: &mut Project,
    report: &mut Report,
    path: &str,
) -> Result<(), ProjectError> {
    for block in project.blocks(Selector::ItemDefinitions(BOTH))? {
        let label = block.label();
        let wrapper = project.insert_if_absent(&block, "BuildLog", "")?;
        let outcome = project.upsert(&block.child("BuildLog"), "Path", path)?;

        let element = match (wrapper, outcome) {
            (Outcome::Skipped, Outcome::Added) => "<Path /> in <BuildLog />",
            _ => "<BuildLog><Path></Path></BuildLog>",
        };
        report.record(element, label.as_deref(), outcome);
    }
    Ok(())
}

fn set_test_framework(
    project: &mut Project,
    report: &mut Report,
    settings: &TestFramework,
) -> Result<(), ProjectError> {
    let compile = Selector::AnyDepth { tag: "ClCompile", conditions: BOTH };
    for block in project.blocks(compile)? {
        set(project, report, &block, "AdditionalIncludeDirectories", &settings.include_dirs)?;
    }

    set_link(project, report, RELEASE_ONLY, &settings.release)?;
    set_link(project, report, DEBUG_ONLY, &settings.debug)?;
    Ok(())
}

fn set_link(
    project: &mut Project,
    report: &mut Report,
    conditions: &'static [&'static str],
    settings: &LinkSettings,
) -> Result<(), ProjectError> {
    let link = Selector::AnyDepth { tag: "Link", conditions };
    for block in project.blocks(link)? {
        let ignored = &settings.ignored_libraries;
        set(project, report, &block, "AdditionalLibraryDirectories", &settings.library_dirs)?;
        set_dependencies(project, report, &block, &settings.dependencies)?;
        set(project, report, &block, "IgnoreSpecificDefaultLibraries", ignored)?;
    }
    Ok(())
}

/// Upsert the dependency list, treating `deps` with the marker already
/// appended as equal, then make sure the marker is present.
fn set_dependencies(
    project: &mut Project,
    report: &mut Report,
    block: &Block,
    deps: &str,
) -> Result<(), ProjectError> {
    let label = block.label();

    let current = project.child_text(block, DEPENDENCIES)?;
    if current.as_deref() == Some(with_marker(deps).as_str()) {
        report.record(format!("<{DEPENDENCIES} />"), label.as_deref(), Outcome::Skipped);
    } else {
        set(project, report, block, DEPENDENCIES, deps)?;
    }

    let current = project.child_text(block, DEPENDENCIES)?.unwrap_or_default();
    if !has_marker(&current) {
        project.upsert(block, DEPENDENCIES, &with_marker(&current))?;
        report.record(
            format!("{DEPENDENCIES_MARKER} in <{DEPENDENCIES} />"),
            label.as_deref(),
            Outcome::Added,
        );
    }
    Ok(())
}

fn has_marker(list: &str) -> bool {
    list.split(';').any(|entry| entry.trim() == DEPENDENCIES_MARKER)
}

/// An empty list still gets the separator: `;%(AdditionalDependencies)`.
fn with_marker(list: &str) -> String {
    if has_marker(list) {
        list.to_string()
    } else {
        format!("{list};{DEPENDENCIES_MARKER}")
    }
}
