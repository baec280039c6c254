//! Predicates that pick the settings blocks a rule applies to.
//!
//! All selectors are read-only, keep document order and may match nothing.
//! Only elements in the MSBuild 2003 namespace are considered, so SDK-style
//! projects (no namespace) match nothing. Conditions are compared as literal
//! strings and never evaluated. The property-group selectors ignore leading
//! spaces in `Condition`; the item-definition selectors compare it exactly.

use std::fmt;

use roxmltree::{Document, Node};

/// Namespace every element of a classic MSBuild project lives in.
pub const MSBUILD_NS: &str = "http://schemas.microsoft.com/developer/msbuild/2003";

/// `Label` value carried by the `<PropertyGroup>` that holds `PlatformToolset`.
pub const CONFIGURATION_LABEL: &str = "Configuration";

/// `<tag>` in the MSBuild namespace, whatever prefix the source uses for it.
pub(crate) fn is_msbuild_element(node: &Node, tag: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == tag
        && node.tag_name().namespace() == Some(MSBUILD_NS)
}

fn condition_trimmed_in(node: &Node, allowed: &[&str]) -> bool {
    node.attribute("Condition")
        .is_some_and(|c| allowed.contains(&c.trim_start_matches(' ')))
}

fn condition_exact_in(node: &Node, allowed: &[&str]) -> bool {
    node.attribute("Condition").is_some_and(|c| allowed.contains(&c))
}

fn top_level<'a, 'input>(
    doc: &'a Document<'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    let root = doc.root_element();
    is_msbuild_element(&root, "Project")
        .then(|| root.children().filter(move |n| is_msbuild_element(n, tag)))
        .into_iter()
        .flatten()
}

/// `<PropertyGroup Label="Configuration">` blocks under one of `allowed`.
pub fn by_configuration_label<'a, 'input>(
    doc: &'a Document<'input>,
    allowed: &[&str],
) -> Vec<Node<'a, 'input>> {
    top_level(doc, "PropertyGroup")
        .filter(|n| condition_trimmed_in(n, allowed))
        .filter(|n| n.attribute("Label") == Some(CONFIGURATION_LABEL))
        .collect()
}

/// `<PropertyGroup>` blocks under one of `allowed` that carry no `Label` at all.
pub fn by_configuration_no_label<'a, 'input>(
    doc: &'a Document<'input>,
    allowed: &[&str],
) -> Vec<Node<'a, 'input>> {
    top_level(doc, "PropertyGroup")
        .filter(|n| condition_trimmed_in(n, allowed))
        .filter(|n| n.attribute("Label").is_none())
        .collect()
}

/// Top-level `<ItemDefinitionGroup>` blocks under one of `allowed`.
pub fn item_definitions<'a, 'input>(
    doc: &'a Document<'input>,
    allowed: &[&str],
) -> Vec<Node<'a, 'input>> {
    top_level(doc, "ItemDefinitionGroup")
        .filter(|n| condition_exact_in(n, allowed))
        .collect()
}

/// `<tag>` elements at any depth whose immediate parent is conditioned on one
/// of `allowed` (`<ClCompile>` and `<Link>` sit inside `<ItemDefinitionGroup>`).
pub fn by_configuration_any_depth<'a, 'input>(
    doc: &'a Document<'input>,
    tag: &str,
    allowed: &[&str],
) -> Vec<Node<'a, 'input>> {
    doc.descendants()
        .filter(|n| is_msbuild_element(n, tag))
        .filter(|n| n.parent_element().is_some_and(|p| condition_exact_in(&p, allowed)))
        .collect()
}

/// `<PropertyGroup>` blocks whose condition starts with `prefix`.
pub fn by_condition_prefix<'a, 'input>(
    doc: &'a Document<'input>,
    prefix: &str,
) -> Vec<Node<'a, 'input>> {
    top_level(doc, "PropertyGroup")
        .filter(|n| {
            n.attribute("Condition")
                .is_some_and(|c| c.trim_start_matches(' ').starts_with(prefix))
        })
        .collect()
}

/// A selector that can be re-run after every edit.
///
/// Edits only ever add or change elements *inside* matched blocks, so the
/// n-th match stays the same block for the lifetime of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    ConfigurationLabel(&'static [&'static str]),
    ConfigurationNoLabel(&'static [&'static str]),
    ItemDefinitions(&'static [&'static str]),
    AnyDepth {
        tag: &'static str,
        conditions: &'static [&'static str],
    },
    ConditionPrefix(&'static str),
}

impl Selector {
    pub fn select<'a, 'input>(&self, doc: &'a Document<'input>) -> Vec<Node<'a, 'input>> {
        match *self {
            Self::ConfigurationLabel(allowed) => by_configuration_label(doc, allowed),
            Self::ConfigurationNoLabel(allowed) => by_configuration_no_label(doc, allowed),
            Self::ItemDefinitions(allowed) => item_definitions(doc, allowed),
            Self::AnyDepth { tag, conditions } => by_configuration_any_depth(doc, tag, conditions),
            Self::ConditionPrefix(prefix) => by_condition_prefix(doc, prefix),
        }
    }

    /// Tag of the blocks this selector yields.
    pub fn tag(&self) -> &'static str {
        match *self {
            Self::ConfigurationLabel(_)
            | Self::ConfigurationNoLabel(_)
            | Self::ConditionPrefix(_) => "PropertyGroup",
            Self::ItemDefinitions(_) => "ItemDefinitionGroup",
            Self::AnyDepth { tag, .. } => tag,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigurationLabel(_) => write!(f, "labelled <PropertyGroup>"),
            Self::ConfigurationNoLabel(_) => write!(f, "unlabelled <PropertyGroup>"),
            Self::ItemDefinitions(_) => write!(f, "<ItemDefinitionGroup>"),
            Self::AnyDepth { tag, .. } => write!(f, "<{tag}>"),
            Self::ConditionPrefix(_) => write!(f, "conditional <PropertyGroup>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBUG: &str = "'$(Configuration)|$(Platform)'=='Debug|Win32'";
    const RELEASE: &str = "'$(Configuration)|$(Platform)'=='Release|Win32'";
    const BOTH: &[&str] = &[DEBUG, RELEASE];

    const DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Project DefaultTargets="Build" xmlns="http://schemas.microsoft.com/developer/msbuild/2003">
  <PropertyGroup Label="Globals">
    <ProjectGuid>{0}</ProjectGuid>
  </PropertyGroup>
  <PropertyGroup Condition="'$(Configuration)|$(Platform)'=='Debug|Win32'" Label="Configuration">
    <ConfigurationType>Application</ConfigurationType>
  </PropertyGroup>
  <PropertyGroup Condition="  '$(Configuration)|$(Platform)'=='Release|Win32'" Label="Configuration">
    <ConfigurationType>Application</ConfigurationType>
  </PropertyGroup>
  <PropertyGroup Condition="'$(Configuration)|$(Platform)'=='Debug|x64'" Label="Configuration" />
  <PropertyGroup Condition="'$(Configuration)|$(Platform)'=='Debug|Win32'">
    <LinkIncremental>true</LinkIncremental>
  </PropertyGroup>
  <PropertyGroup Condition="'$(Configuration)|$(Platform)'=='Release|Win32'">
    <LinkIncremental>false</LinkIncremental>
  </PropertyGroup>
  <ItemDefinitionGroup Condition="'$(Configuration)|$(Platform)'=='Debug|Win32'">
    <ClCompile><Optimization>Disabled</Optimization></ClCompile>
    <Link><GenerateDebugInformation>true</GenerateDebugInformation></Link>
  </ItemDefinitionGroup>
  <ItemDefinitionGroup Condition="'$(Configuration)|$(Platform)'=='Release|Win32'">
    <ClCompile><Optimization>MaxSpeed</Optimization></ClCompile>
    <Link><OptimizeReferences>true</OptimizeReferences></Link>
  </ItemDefinitionGroup>
  <ItemGroup>
    <ClCompile Include="main.cpp" />
  </ItemGroup>
</Project>"#;

    fn conditions(nodes: &[Node]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| n.attribute("Condition").unwrap_or("").trim().to_string())
            .collect()
    }

    #[test]
    fn label_selector_matches_only_labelled_groups() {
        let doc = Document::parse(DOC).unwrap();
        let found = by_configuration_label(&doc, BOTH);
        assert_eq!(conditions(&found), vec![DEBUG, RELEASE]);
        assert!(found.iter().all(|n| n.attribute("Label") == Some("Configuration")));
    }

    #[test]
    fn no_label_selector_never_returns_labelled_groups() {
        let doc = Document::parse(DOC).unwrap();
        let found = by_configuration_no_label(&doc, BOTH);
        assert_eq!(conditions(&found), vec![DEBUG, RELEASE]);
        assert!(found.iter().all(|n| n.attribute("Label").is_none()));
    }

    #[test]
    fn label_selectors_are_disjoint() {
        let doc = Document::parse(DOC).unwrap();
        let labelled = by_configuration_label(&doc, BOTH);
        let unlabelled = by_configuration_no_label(&doc, BOTH);
        assert!(labelled.iter().all(|a| unlabelled.iter().all(|b| a.id() != b.id())));
    }

    #[test]
    fn restricting_conditions_narrows_matches() {
        let doc = Document::parse(DOC).unwrap();
        let found = by_configuration_no_label(&doc, &[RELEASE]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].children().find(|n| n.is_element()).unwrap().text(), Some("false"));
    }

    #[test]
    fn any_depth_requires_conditioned_parent() {
        let doc = Document::parse(DOC).unwrap();
        // The <ClCompile Include="main.cpp"/> item sits in an unconditioned ItemGroup.
        let compile = by_configuration_any_depth(&doc, "ClCompile", BOTH);
        assert_eq!(compile.len(), 2);
        assert!(compile.iter().all(|n| n.attribute("Include").is_none()));

        let debug_link = by_configuration_any_depth(&doc, "Link", &[DEBUG]);
        assert_eq!(debug_link.len(), 1);
        assert_eq!(
            debug_link[0].first_element_child().unwrap().tag_name().name(),
            "GenerateDebugInformation"
        );
    }

    #[test]
    fn item_definitions_by_condition() {
        let doc = Document::parse(DOC).unwrap();
        assert_eq!(item_definitions(&doc, BOTH).len(), 2);
        assert!(item_definitions(&doc, &["'$(Configuration)'=='Other'"]).is_empty());
    }

    #[test]
    fn prefix_selector_ignores_specific_values() {
        let doc = Document::parse(DOC).unwrap();
        let found = by_condition_prefix(&doc, "'$(Configuration)|$(Platform)'");
        // Debug|Win32 and Release|Win32 (labelled + unlabelled) plus Debug|x64.
        assert_eq!(found.len(), 5);
        assert!(by_condition_prefix(&doc, "'$(Platform)'").is_empty());
    }

    #[test]
    fn selector_enum_dispatches() {
        static BOTH_STATIC: &[&str] = &[DEBUG, RELEASE];
        let doc = Document::parse(DOC).unwrap();
        let sel = Selector::AnyDepth { tag: "Link", conditions: BOTH_STATIC };
        assert_eq!(sel.select(&doc).len(), 2);
        assert_eq!(sel.tag(), "Link");
        assert_eq!(Selector::ItemDefinitions(BOTH_STATIC).tag(), "ItemDefinitionGroup");
        assert_eq!(
            Selector::ConfigurationLabel(BOTH_STATIC).to_string(),
            "labelled <PropertyGroup>"
        );
    }

    #[test]
    fn sdk_style_projects_match_nothing() {
        let sdk = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup Condition="'$(Configuration)|$(Platform)'=='Debug|Win32'">
    <Link />
  </PropertyGroup>
</Project>"#;
        let doc = Document::parse(sdk).unwrap();
        assert!(by_condition_prefix(&doc, "'$(Configuration)|$(Platform)'").is_empty());
        assert!(by_configuration_no_label(&doc, BOTH).is_empty());
        assert!(by_configuration_any_depth(&doc, "Link", BOTH).is_empty());
    }

    #[test]
    fn prefixed_namespace_is_recognised() {
        let prefixed = format!(
            r#"<m:Project xmlns:m="{MSBUILD_NS}">
  <m:PropertyGroup Condition="{DEBUG}" />
  <PropertyGroup Condition="{RELEASE}" />
</m:Project>"#
        );
        let doc = Document::parse(&prefixed).unwrap();
        let found = by_configuration_no_label(&doc, BOTH);
        assert_eq!(conditions(&found), vec![DEBUG]);
    }

    #[test]
    fn item_definition_conditions_are_not_trimmed() {
        let padded = format!(
            r#"<Project xmlns="{MSBUILD_NS}">
  <ItemDefinitionGroup Condition=" {DEBUG}">
    <Link />
  </ItemDefinitionGroup>
  <PropertyGroup Condition=" {DEBUG}" />
</Project>"#
        );
        let doc = Document::parse(&padded).unwrap();
        assert!(item_definitions(&doc, BOTH).is_empty());
        assert!(by_configuration_any_depth(&doc, "Link", BOTH).is_empty());
        assert_eq!(by_configuration_no_label(&doc, BOTH).len(), 1);
    }

    #[test]
    fn empty_document_matches_nothing() {
        let doc = Document::parse("<Project />").unwrap();
        assert!(by_configuration_label(&doc, BOTH).is_empty());
        assert!(by_configuration_any_depth(&doc, "Link", BOTH).is_empty());
        assert!(by_condition_prefix(&doc, "'").is_empty());
    }
}
