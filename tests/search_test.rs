mod common;

use assert2::{check, let_assert};
use common::ccc_index;
use rstest::rstest;
use sphinx_index_mcp::index::SearchIndex;
use sphinx_index_mcp::search::{ResultKind, SearchEngine, Scorer};

// --- Object ranking ---

/// Test: An exact class name outranks partial and member matches.
#[rstest]
fn exact_object_name_ranks_first(ccc_index: SearchIndex) {
    let results = SearchEngine::default().search(&ccc_index, "Calculator", 10);
    let_assert!(Some(top) = results.first());
    check!(top.kind == ResultKind::Object);
    check!(top.title == "ccc.calculator.Calculator");
    check!(top.score == 16);
    check!(top.url() == "content/api/calculator.html#ccc.calculator.Calculator");
    check!(top.description.as_deref() == Some("Python class, in Cost of Capital Calculator"));

    let partial = results
        .iter()
        .find(|r| r.title == "ccc.get_taxcalc_rates.get_calculator");
    let_assert!(Some(partial) = partial);
    check!(partial.score == 11);
}

/// Test: Module objects get the important-priority bonus.
#[rstest]
fn module_priority_bonus(ccc_index: SearchIndex) {
    let results = SearchEngine::default().search(&ccc_index, "utils", 5);
    let_assert!(Some(top) = results.first());
    check!(top.title == "ccc.utils");
    check!(top.score == 26);
    check!(top.url() == "content/api/utils.html#module-ccc.utils");
}

/// Test: Short function names are found through the object inventory.
#[rstest]
fn finds_function_by_short_name(ccc_index: SearchIndex) {
    let results = SearchEngine::default().search(&ccc_index, "wavg", 10);
    let_assert!([object, page, ..] = results.as_slice());
    check!(object.title == "ccc.utils.wavg");
    check!(object.score == 16);
    check!(page.kind == ResultKind::Page);
    check!(page.docname == "content/api/utils");
}

// --- Term ranking ---

/// Test: Pages with the word in their title outrank pages mentioning it.
#[rstest]
fn title_hits_outrank_body_hits(ccc_index: SearchIndex) {
    let results = SearchEngine::default().search(&ccc_index, "tax", 50);
    let pages: Vec<_> = results
        .iter()
        .filter(|r| r.kind == ResultKind::Page)
        .collect();
    check!(pages.len() == 12);
    check!(pages[0].score == 15);
    check!(pages[1].score == 15);
    let titled: Vec<usize> = pages[..2].iter().map(|r| r.doc).collect();
    check!(titled.contains(&0) && titled.contains(&4));
    check!(pages[2..].iter().all(|r| r.score == 5));
}

/// Test: Excluded words remove pages containing them.
#[rstest]
fn excluded_terms_remove_documents(ccc_index: SearchIndex) {
    let engine = SearchEngine::default();
    let all = engine.search(&ccc_index, "depreciation", 50);
    let all_docs: Vec<usize> = all
        .iter()
        .filter(|r| r.kind == ResultKind::Page)
        .map(|r| r.doc)
        .collect();
    check!(all_docs.contains(&0));
    check!(all_docs.contains(&11));

    let filtered = engine.search(&ccc_index, "depreciation -inventory", 50);
    let docs: Vec<usize> = filtered
        .iter()
        .filter(|r| r.kind == ResultKind::Page)
        .map(|r| r.doc)
        .collect();
    check!(docs == [5]);
}

/// Test: Every search term must match a page.
#[rstest]
fn all_terms_required(ccc_index: SearchIndex) {
    let results = SearchEngine::default().search(&ccc_index, "depreciation land", 50);
    let mut docs: Vec<usize> = results
        .iter()
        .filter(|r| r.kind == ResultKind::Page)
        .map(|r| r.doc)
        .collect();
    docs.sort_unstable();
    check!(docs == [0, 1, 2, 11]);
}

/// Test: Unknown words and stop words give no results.
#[rstest]
#[case("zyzzyva")]
#[case("the and of")]
#[case("   ")]
fn empty_results(ccc_index: SearchIndex, #[case] query: &str) {
    check!(SearchEngine::default().search(&ccc_index, query, 10).is_empty());
}

/// Test: Results are capped at the limit.
#[rstest]
fn respects_limit(ccc_index: SearchIndex) {
    check!(SearchEngine::default().search(&ccc_index, "tax", 3).len() == 3);
}

/// Test: Custom weights change the ranking.
#[rstest]
fn custom_scorer(ccc_index: SearchIndex) {
    let scorer = Scorer {
        title: 1,
        ..Scorer::default()
    };
    let results = SearchEngine::new(scorer).search(&ccc_index, "tax", 50);
    let pages: Vec<_> = results
        .iter()
        .filter(|r| r.kind == ResultKind::Page)
        .collect();
    let title_only: Vec<_> = pages.iter().filter(|r| r.score == 1).map(|r| r.doc).collect();
    check!(title_only.len() == 2);
    check!(title_only.contains(&0) && title_only.contains(&4));
    check!(pages[0].score == 5);
}

// --- Object lookup ---

/// Test: Lookup works on full and short names, case-insensitively.
#[rstest]
#[case("ccc.utils.wavg", "ccc.utils.wavg")]
#[case("wavg", "ccc.utils.wavg")]
#[case("SPECIFICATION", "ccc.parameters.Specification")]
fn find_objects(ccc_index: SearchIndex, #[case] name: &str, #[case] expected: &str) {
    let found = SearchEngine::default().find_objects(&ccc_index, name);
    let_assert!([object] = found.as_slice());
    check!(object.fullname == expected);
}

/// Test: A name shared by several classes returns all of them.
#[rstest]
fn ambiguous_short_name(ccc_index: SearchIndex) {
    let found = SearchEngine::default().find_objects(&ccc_index, "data_year");
    let mut names: Vec<_> = found.iter().map(|o| o.fullname.as_str()).collect();
    names.sort_unstable();
    check!(names == ["ccc.calculator.Calculator.data_year", "ccc.data.Assets.data_year"]);
}

/// Test: Misspelled names get close suggestions.
#[rstest]
fn suggests_close_names(ccc_index: SearchIndex) {
    let engine = SearchEngine::default();
    check!(engine.find_objects(&ccc_index, "Calculater").is_empty());
    let suggestions = engine.suggest_objects(&ccc_index, "Calculater", 3);
    let_assert!(Some(best) = suggestions.first());
    check!(best.fullname == "ccc.calculator.Calculator");
    check!(best.score > 0.9);
}
