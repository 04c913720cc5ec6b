mod common;

use anyhow::Result;
use common::{write_encrypted_pdf, write_pdf, write_workbook, Cell, Sheet};
use docscout::search::extract::{ContentExtractor, ExtractOptions, Extractors, SpreadsheetExtractor};
use docscout::search::{CandidateFile, FileEvaluator};
use docscout::{
    CancellationToken, FileResult, FileType, KeywordLogic, ScanState, SearchConfig, SearchEngine,
    SearchReport,
};
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn config(root: &Path, keyword1: &str) -> SearchConfig {
    SearchConfig {
        root_path: root.to_path_buf(),
        keyword1: keyword1.to_string(),
        thread_count: NonZeroUsize::new(1).unwrap(),
        ..SearchConfig::default()
    }
}

fn run(config: &SearchConfig) -> Result<SearchReport> {
    let engine = SearchEngine::new();
    let report = engine.start_with_config(config)?.collect();
    assert!(report.errors.is_empty(), "unexpected errors: {:?}", report.errors);
    Ok(report)
}

fn invoice_book(root: &Path) -> Result<()> {
    write_workbook(
        &root.join("book.xlsx"),
        &[Sheet::new(
            "Sheet1",
            vec![
                ("A1", Cell::Text("Customer")),
                ("A3", Cell::Number(42.0)),
                ("B3", Cell::Text("Invoice")),
            ],
        )],
    )
}

#[test]
fn test_single_keyword_in_workbook() -> Result<()> {
    let dir = tempdir()?;
    invoice_book(dir.path())?;

    let report = run(&config(dir.path(), "Invoice"))?;

    assert_eq!(report.file_results.len(), 1);
    let result = &report.file_results[0];
    assert_eq!(result.file_type, FileType::Excel);
    assert_eq!(result.total_match_count, 1);
    assert!(result.display_location.contains("Sheet1"));
    assert!(result.display_location.contains("B3"));
    assert_eq!(report.completed, Some(1));
    Ok(())
}

#[test]
fn test_or_logic_matches_second_keyword() -> Result<()> {
    let dir = tempdir()?;
    invoice_book(dir.path())?;

    let mut config = config(dir.path(), "foo");
    config.keyword2 = "Invoice".to_string();
    config.logic = KeywordLogic::Or;
    let report = run(&config)?;

    assert_eq!(report.file_results.len(), 1);
    let result = &report.file_results[0];
    assert_eq!(result.keyword1_count, 0);
    assert_eq!(result.keyword2_count, 1);
    assert_eq!(result.display_location, "Sheet 'Sheet1', Cell B3 (keyword 2)");
    Ok(())
}

#[test]
fn test_and_logic_requires_both_keywords() -> Result<()> {
    let dir = tempdir()?;
    invoice_book(dir.path())?;

    let mut config = config(dir.path(), "Invoice");
    config.keyword2 = "Receipt".to_string();
    config.logic = KeywordLogic::And;
    let report = run(&config)?;

    assert!(report.file_results.is_empty());
    assert_eq!(report.completed, Some(0));
    assert_eq!(report.progress, (1, 1));
    Ok(())
}

#[test]
fn test_hidden_sheets_are_skipped() -> Result<()> {
    let dir = tempdir()?;
    write_workbook(
        &dir.path().join("secret.xlsx"),
        &[
            Sheet::new("Visible", vec![("A1", Cell::Text("nothing here"))]),
            Sheet::new("Stash", vec![("C9", Cell::Text("Invoice"))]).hidden(),
        ],
    )?;

    let report = run(&config(dir.path(), "Invoice"))?;
    assert!(report.file_results.is_empty());
    Ok(())
}

#[test]
fn test_formula_text_only_when_not_content_only() -> Result<()> {
    let dir = tempdir()?;
    write_workbook(
        &dir.path().join("totals.xlsx"),
        &[Sheet::new(
            "Totals",
            vec![("D4", Cell::Formula("CONCATENATE(\"Inv\",\"oice\")", "Invoice"))],
        )],
    )?;

    let cached = run(&config(dir.path(), "Invoice"))?;
    assert_eq!(cached.file_results.len(), 1);
    assert!(cached.file_results[0].display_location.contains("Cell D4"));

    let mut formulas = config(dir.path(), "CONCATENATE");
    formulas.content_only = false;
    let report = run(&formulas)?;
    assert_eq!(report.file_results.len(), 1);

    formulas.keyword1 = "Invoice".to_string();
    assert!(run(&formulas)?.file_results.is_empty());
    Ok(())
}

#[test]
fn test_pdf_pages_are_labelled_from_one() -> Result<()> {
    let dir = tempdir()?;
    write_pdf(
        &dir.path().join("statement.pdf"),
        &["Opening balance", "Receipt 1001\nReceipt 1002", "Closing"],
    )?;

    let report = run(&config(dir.path(), "receipt"))?;

    assert_eq!(report.file_results.len(), 1);
    let result = &report.file_results[0];
    assert_eq!(result.file_type, FileType::Pdf);
    assert_eq!(result.total_match_count, 2);
    assert_eq!(result.display_location, "Page 2 (keyword 1)");
    Ok(())
}

#[test]
fn test_case_sensitive_and_whole_word() -> Result<()> {
    let dir = tempdir()?;
    write_pdf(&dir.path().join("pets.pdf"), &["concatenate cat category Cat"])?;

    let mut config = config(dir.path(), "cat");
    config.whole_word = true;
    let report = run(&config)?;
    assert_eq!(report.file_results[0].total_match_count, 2);

    config.case_sensitive = true;
    let report = run(&config)?;
    assert_eq!(report.file_results[0].total_match_count, 1);

    config.whole_word = false;
    let report = run(&config)?;
    assert_eq!(report.file_results[0].total_match_count, 3);
    Ok(())
}

#[test]
fn test_broken_files_do_not_stop_the_scan() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("a_corrupt.xlsx"), b"not a workbook")?;
    fs::write(dir.path().join("b_corrupt.pdf"), b"not a pdf")?;
    write_pdf(&dir.path().join("c_empty.pdf"), &[])?;
    write_pdf(&dir.path().join("d_good.pdf"), &["Invoice"])?;

    let report = run(&config(dir.path(), "Invoice"))?;

    assert_eq!(report.progress, (4, 4));
    assert_eq!(report.file_results.len(), 1);
    assert!(report.file_results[0].path.ends_with("d_good.pdf"));

    let summary = report.summary.unwrap();
    assert_eq!(summary.state, ScanState::Completed);
    assert_eq!(summary.stats.files_failed, 3);
    Ok(())
}

#[test]
fn test_failed_files_carry_diagnostics() -> Result<()> {
    let dir = tempdir()?;
    let corrupt = dir.path().join("corrupt.xlsx");
    let empty = dir.path().join("empty.pdf");
    fs::write(&corrupt, b"not a workbook")?;
    write_pdf(&empty, &[])?;

    let criteria = config(dir.path(), "Invoice").validate()?;
    let evaluator = FileEvaluator::new(&criteria, Arc::new(Extractors::default()));
    let cancel = CancellationToken::new();

    let evaluate = |path: &Path, file_type: FileType| -> FileResult {
        let candidate = CandidateFile {
            path: path.to_path_buf(),
            file_type,
        };
        evaluator.evaluate(&candidate, &cancel).unwrap()
    };

    let result = evaluate(&corrupt, FileType::Excel);
    assert!(!result.matched);
    assert_eq!(result.diagnostic.as_deref(), Some("UnreadableFile"));

    let result = evaluate(&empty, FileType::Pdf);
    assert!(!result.matched);
    assert_eq!(result.diagnostic.as_deref(), Some("EmptyDocument"));
    assert!(result.display_location.starts_with("EmptyDocument"));
    Ok(())
}

#[test]
fn test_encrypted_pdf_is_protected_and_scan_continues() -> Result<()> {
    let dir = tempdir()?;
    let locked = dir.path().join("a_locked.pdf");
    write_encrypted_pdf(&locked, &["Invoice"])?;
    write_pdf(&dir.path().join("b_open.pdf"), &["Invoice"])?;

    let criteria = config(dir.path(), "Invoice").validate()?;
    let evaluator = FileEvaluator::new(&criteria, Arc::new(Extractors::default()));
    let candidate = CandidateFile {
        path: locked,
        file_type: FileType::Pdf,
    };
    let result = evaluator.evaluate(&candidate, &CancellationToken::new()).unwrap();
    assert!(!result.matched);
    assert_eq!(result.diagnostic.as_deref(), Some("ProtectedDocument"));

    let report = run(&config(dir.path(), "Invoice"))?;
    assert_eq!(report.progress, (2, 2));
    assert_eq!(report.matched_paths(), vec![dir.path().join("b_open.pdf")]);
    assert_eq!(report.summary.unwrap().stats.files_failed, 1);
    Ok(())
}

#[test]
fn test_date_and_boolean_cells_read_as_displayed() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("ledger.xlsx");
    write_workbook(
        &path,
        &[Sheet::new(
            "Ledger",
            vec![
                ("A1", Cell::Date(45306.0)),
                ("B1", Cell::Bool(true)),
                ("C1", Cell::Number(3.5)),
            ],
        )],
    )?;

    let units: Vec<(String, String)> = SpreadsheetExtractor
        .open(&path, ExtractOptions::default())?
        .map(|unit| unit.map(|u| (u.label, u.text)))
        .collect::<Result<_, _>>()?;
    assert_eq!(
        units,
        vec![
            ("Sheet 'Ledger', Cell A1".to_string(), "2024-01-15 00:00:00".to_string()),
            ("Sheet 'Ledger', Cell B1".to_string(), "True".to_string()),
            ("Sheet 'Ledger', Cell C1".to_string(), "3.5".to_string()),
        ]
    );

    let report = run(&config(dir.path(), "2024"))?;
    assert_eq!(report.matched_paths(), vec![path.clone()]);
    assert!(report.file_results[0].display_location.contains("A1"));

    let report = run(&config(dir.path(), "45306"))?;
    assert!(report.file_results.is_empty());
    Ok(())
}

#[test]
fn test_lock_files_and_other_types_are_ignored() -> Result<()> {
    let dir = tempdir()?;
    invoice_book(dir.path())?;
    fs::copy(dir.path().join("book.xlsx"), dir.path().join("~$book.xlsx"))?;
    fs::write(dir.path().join("notes.txt"), "Invoice")?;

    let report = run(&config(dir.path(), "Invoice"))?;
    assert_eq!(report.matched_paths(), vec![dir.path().join("book.xlsx")]);
    assert_eq!(report.progress, (1, 1));
    Ok(())
}

#[test]
fn test_recursion_and_type_filter() -> Result<()> {
    let dir = tempdir()?;
    let nested = dir.path().join("2023").join("q4");
    fs::create_dir_all(&nested)?;
    write_pdf(&dir.path().join("top.pdf"), &["Invoice"])?;
    write_pdf(&nested.join("deep.pdf"), &["Invoice"])?;
    invoice_book(&nested)?;

    let mut config = config(dir.path(), "Invoice");
    assert_eq!(run(&config)?.file_results.len(), 3);

    config.file_type = docscout::FileTypeFilter::Pdf;
    assert_eq!(run(&config)?.file_results.len(), 2);

    config.recurse = false;
    assert_eq!(run(&config)?.matched_paths(), vec![dir.path().join("top.pdf")]);
    Ok(())
}

#[test]
fn test_repeated_scans_agree() -> Result<()> {
    let dir = tempdir()?;
    invoice_book(dir.path())?;
    write_pdf(&dir.path().join("one.pdf"), &["Invoice Invoice", "Invoice"])?;
    write_pdf(&dir.path().join("two.pdf"), &["nothing"])?;

    let mut config = config(dir.path(), "invoice");
    let first = run(&config)?;
    let second = run(&config)?;
    assert_eq!(first.file_results, second.file_results);

    config.thread_count = NonZeroUsize::new(4).unwrap();
    let mut parallel = run(&config)?;
    let mut sequential = first;
    parallel.sort_by_matches();
    sequential.sort_by_matches();
    assert_eq!(parallel.file_results, sequential.file_results);
    assert_eq!(sequential.file_results[0].total_match_count, 3);
    Ok(())
}
