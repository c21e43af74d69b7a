mod common;

use assert2::{check, let_assert};
use common::TempWorkspace;
use sphinx_index_mcp::build::source::{build_from_dir, collect};
use sphinx_index_mcp::index::{jsdump, validate};
use sphinx_index_mcp::search::{ResultKind, SearchEngine};
use sphinx_index_mcp::tools::build::build_index;

const UTILS_RST: &str = "\
CCC utility functions
=====================

.. py:module:: ccc.utils

.. py:function:: to_str(x)

   Function to decode string.

.. py:function:: wavg(dataframe, avg_name, weight_name)

   Computes a weighted average.
";

const CALCULATOR_RST: &str = "\
Cost of Capital Calculator
==========================

.. py:currentmodule:: ccc.calculator

.. py:class:: Calculator(p=None, assets=None)

   .. py:method:: calc_all()

      Computes the cost of capital and effective tax rates.

   .. py:property:: data_year
";

const GUIDE_MD: &str = "\
# Overview and Assumptions

The model computes the user cost of capital for depreciable assets.

## Inventories

Inventories are valued with FIFO or LIFO accounting.
";

fn docs_tree() -> TempWorkspace {
    let workspace = TempWorkspace::new();
    workspace.create_file("content/api/utils.rst", UTILS_RST);
    workspace.create_file("content/api/calculator.rst", CALCULATOR_RST);
    workspace.create_file("content/CCC_guide.md", GUIDE_MD);
    workspace.create_file("_build/html/stale.md", "# Stale output");
    workspace
}

/// Test: Built indexes pass every structural check.
#[test]
fn built_index_validates() {
    let workspace = docs_tree();
    let_assert!(Ok(index) = build_from_dir(workspace.path()));
    let report = validate(&index);
    check!(report.is_valid(), "unexpected issues: {:?}", report.issues);
    check!(report.issues.is_empty());
    check!(
        index.docnames == ["content/CCC_guide", "content/api/calculator", "content/api/utils"]
    );
    check!(index.filenames[0] == "content/CCC_guide.md");
}

/// Test: Directives become objects with resolved anchors.
#[test]
fn built_index_objects() {
    let workspace = docs_tree();
    let_assert!(Ok(index) = build_from_dir(workspace.path()));

    let_assert!(Some(module) = index.find_object("ccc.utils"));
    check!(module.anchor == "module-ccc.utils");
    check!(module.entry.priority == 0);

    let_assert!(Some(method) = index.find_object("ccc.calculator.Calculator.calc_all"));
    check!(method.label() == "Python method");
    check!(method.entry.doc == 1);

    check!(index.find_object("ccc.calculator.Calculator.data_year").is_some());
    // currentmodule does not declare a module object
    check!(index.find_object("ccc.calculator").is_none());
}

/// Test: Built indexes answer queries like generated ones.
#[test]
fn built_index_is_searchable() {
    let workspace = docs_tree();
    let_assert!(Ok(index) = build_from_dir(workspace.path()));
    let engine = SearchEngine::default();

    let results = engine.search(&index, "wavg", 5);
    let_assert!(Some(top) = results.first());
    check!(top.title == "ccc.utils.wavg");
    check!(top.url() == "content/api/utils.html#ccc.utils.wavg");

    let results = engine.search(&index, "inventories", 10);
    let section = results.iter().find(|r| r.kind == ResultKind::Section);
    let_assert!(Some(section) = section);
    check!(section.title == "Overview and Assumptions > Inventories");
    check!(section.url() == "content/CCC_guide.html#inventories");
}

/// Test: The written file loads back unchanged.
#[test]
fn build_index_writes_file() {
    let workspace = docs_tree();
    let output = workspace.path().join("out");
    std::fs::create_dir_all(&output).unwrap();

    let_assert!(Ok((path, stats)) = build_index(workspace.path(), &output));
    check!(path == output.join("searchindex.js"));
    check!(stats.documents == 3);

    let_assert!(Ok(loaded) = jsdump::load(&path));
    let_assert!(Ok(fresh) = build_from_dir(workspace.path()));
    check!(loaded == fresh);
}

/// Test: A missing source directory is an error.
#[test]
fn build_index_requires_directory() {
    let workspace = TempWorkspace::new();
    let_assert!(Err(err) = build_index(&workspace.path().join("nope"), workspace.path()));
    check!(err.to_string().contains("not a directory"));
}

/// Test: Ignored and underscore directories are skipped.
#[test]
fn collect_skips_build_output() {
    let workspace = docs_tree();
    let_assert!(Ok(pages) = collect(workspace.path()));
    check!(pages.len() == 3);
    check!(pages.iter().all(|page| !page.docname.starts_with("_build")));
}
