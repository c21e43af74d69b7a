mod common;

use assert2::{check, let_assert};
use common::{IndexWorkspace, TempWorkspace, ccc_active, ccc_workspace};
use rstest::rstest;
use sphinx_index_mcp::tools::{
    BuildIndexRequest, ListDocumentsRequest, LookupRequest, SearchRequest, SetIndexRequest,
    ValidateRequest, handle_build_index, handle_list_documents, handle_lookup, handle_search,
    handle_set_index, handle_validate,
};

// --- set_index ---

/// Test: Setting the index reports its contents.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn set_index_reports_stats(ccc_workspace: IndexWorkspace) {
    let request = SetIndexRequest {
        path: ccc_workspace.index_path().display().to_string(),
    };
    let result = handle_set_index(&ccc_workspace.state, request).await;
    let_assert!(Ok(output) = result);
    check!(output.contains("Search index set:"));
    check!(output.contains("16 documents, 67 objects (5 types)"));
    check!(ccc_workspace.state.active().await.is_some());
}

/// Test: The HTML build directory is accepted in place of the file.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn set_index_accepts_directory(ccc_workspace: IndexWorkspace) {
    let request = SetIndexRequest {
        path: ccc_workspace.workspace.path().join("html").display().to_string(),
    };
    let_assert!(Ok(_) = handle_set_index(&ccc_workspace.state, request).await);
    let_assert!(Some(active) = ccc_workspace.state.active().await);
    check!(active.ends_with("searchindex.js"));
}

/// Test: A missing index is reported, not panicked on.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn set_index_missing_file(ccc_workspace: IndexWorkspace) {
    let request = SetIndexRequest {
        path: ccc_workspace.workspace.path().join("absent.js").display().to_string(),
    };
    let_assert!(Err(message) = handle_set_index(&ccc_workspace.state, request).await);
    check!(message.contains("not found"));
}

// --- search_docs ---

/// Test: Searching without any index explains how to configure one.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_without_index(ccc_workspace: IndexWorkspace) {
    let request = SearchRequest {
        query: "Calculator".to_string(),
        index: None,
        limit: Some(5),
    };
    let_assert!(Err(message) = handle_search(&ccc_workspace.state, request).await);
    check!(message.contains("set_index"));
}

/// Test: An explicit index works without an active one.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_with_explicit_index(ccc_workspace: IndexWorkspace) {
    let request = SearchRequest {
        query: "Calculator".to_string(),
        index: ccc_workspace.index_arg(),
        limit: Some(5),
    };
    let_assert!(Ok(output) = handle_search(&ccc_workspace.state, request).await);
    check!(output.contains("1. `ccc.calculator.Calculator` (object) - score: 16"));
    check!(output.contains("content/api/calculator.html#ccc.calculator.Calculator"));
}

/// Test: The active index is used by default.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_uses_active_index(#[future(awt)] ccc_active: IndexWorkspace) {
    let request = SearchRequest {
        query: "depreciation -inventory".to_string(),
        index: None,
        limit: None,
    };
    let_assert!(Ok(output) = handle_search(&ccc_active.state, request).await);
    check!(output.contains("`Parameters` (page)"));
    check!(!output.contains("`Overview and Assumptions` (page)"));
}

/// Test: No-match queries return tips rather than an error.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_no_results(#[future(awt)] ccc_active: IndexWorkspace) {
    let request = SearchRequest {
        query: "zyzzyva".to_string(),
        index: None,
        limit: None,
    };
    let_assert!(Ok(output) = handle_search(&ccc_active.state, request).await);
    check!(output.contains("No results found"));
}

/// Test: A zero limit still returns the best match.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_zero_limit(#[future(awt)] ccc_active: IndexWorkspace) {
    let request = SearchRequest {
        query: "Calculator".to_string(),
        index: None,
        limit: Some(0),
    };
    let_assert!(Ok(output) = handle_search(&ccc_active.state, request).await);
    check!(output.contains("1. `ccc.calculator.Calculator`"));
    check!(!output.contains("2. "));
}

/// Test: Empty queries are rejected.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_empty_query(#[future(awt)] ccc_active: IndexWorkspace) {
    let request = SearchRequest {
        query: "  ".to_string(),
        index: None,
        limit: None,
    };
    check!(handle_search(&ccc_active.state, request).await.is_err());
}

// --- lookup_object ---

/// Test: Lookup shows the object's page, URL and members.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lookup_class(#[future(awt)] ccc_active: IndexWorkspace) {
    let request = LookupRequest {
        name: "Calculator".to_string(),
        index: None,
        limit: None,
    };
    let_assert!(Ok(output) = handle_lookup(&ccc_active.state, request).await);
    check!(output.contains("## `ccc.calculator.Calculator`"));
    check!(output.contains("- Type: Python class"));
    check!(output.contains("- URL: content/api/calculator.html#ccc.calculator.Calculator"));
    check!(output.contains("Members (18):"));
    check!(output.contains("  - calc_all"));
}

/// Test: Unknown names get suggestions.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lookup_suggests(#[future(awt)] ccc_active: IndexWorkspace) {
    let request = LookupRequest {
        name: "ccc.utils.wavgg".to_string(),
        index: None,
        limit: Some(3),
    };
    let_assert!(Ok(output) = handle_lookup(&ccc_active.state, request).await);
    check!(output.contains("Did you mean"));
    check!(output.contains("`ccc.utils.wavg`"));
}

/// Test: Ambiguous short names list every match.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lookup_ambiguous(#[future(awt)] ccc_active: IndexWorkspace) {
    let request = LookupRequest {
        name: "data_year".to_string(),
        index: None,
        limit: None,
    };
    let_assert!(Ok(output) = handle_lookup(&ccc_active.state, request).await);
    check!(output.starts_with("2 objects match 'data_year'"));
    check!(output.contains("ccc.data.Assets.data_year"));
}

// --- list_documents ---

/// Test: Documents are listed with an optional filter.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_documents_filtered(#[future(awt)] ccc_active: IndexWorkspace) {
    let request = ListDocumentsRequest {
        index: None,
        filter: None,
    };
    let_assert!(Ok(output) = handle_list_documents(&ccc_active.state, request).await);
    check!(output.starts_with("Documents (16 of 16)"));

    let request = ListDocumentsRequest {
        index: None,
        filter: Some("api/".to_string()),
    };
    let_assert!(Ok(output) = handle_list_documents(&ccc_active.state, request).await);
    check!(output.starts_with("Documents (8 of 16)"));
    check!(output.contains("Cost of Capital Calculator (`content/api/calculator.rst`)"));
    check!(!output.contains("License"));
}

// --- validate_index ---

/// Test: The shipped index validates cleanly.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn validate_shipped_index(#[future(awt)] ccc_active: IndexWorkspace) {
    let_assert!(
        Ok(output) = handle_validate(&ccc_active.state, ValidateRequest { index: None }).await
    );
    check!(output.contains("✓ No issues found"));
}

/// Test: A broken index is reported with its problems.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn validate_broken_index(ccc_workspace: IndexWorkspace) {
    ccc_workspace.workspace.create_file(
        "broken/searchindex.js",
        r#"Search.setIndex({docnames:["a","b"],envversion:{},filenames:["a.rst"],objects:{},objnames:{},objtypes:{},terms:{tax:[0,5]},titles:["A","B"],titleterms:{}})"#,
    );
    let request = ValidateRequest {
        index: Some(
            ccc_workspace
                .workspace
                .path()
                .join("broken/searchindex.js")
                .display()
                .to_string(),
        ),
    };
    let_assert!(Ok(output) = handle_validate(&ccc_workspace.state, request).await);
    check!(output.contains("✗ Invalid: 2 errors"));
    check!(output.contains("filenames has 1 entries but docnames has 2"));
    check!(output.contains("references document 5"));
}

// --- build_index ---

/// Test: Building writes an index that can then be searched.
#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn build_then_search(ccc_workspace: IndexWorkspace) {
    let sources = TempWorkspace::new();
    sources.create_file(
        "api.rst",
        "API\n===\n\n.. py:module:: pkg\n\n.. py:function:: compute_rate(x)\n\n   Computes a rate.\n",
    );
    let output = ccc_workspace.workspace.path().join("built/searchindex.js");

    let request = BuildIndexRequest {
        source: sources.path().display().to_string(),
        output: output.display().to_string(),
    };
    let_assert!(Ok(message) = handle_build_index(request).await);
    check!(message.contains("1 documents, 2 objects"));

    let request = SearchRequest {
        query: "compute_rate".to_string(),
        index: Some(output.display().to_string()),
        limit: None,
    };
    let_assert!(Ok(found) = handle_search(&ccc_workspace.state, request).await);
    check!(found.contains("`pkg.compute_rate` (object)"));
}
