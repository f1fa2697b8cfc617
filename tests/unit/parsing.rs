// tests/unit/parsing.rs
//! M documents and dataflow labels.

use fabric_governance::mquery::{clean_name, parse, workspace_dataflow_label};
use pretty_assertions::assert_eq;

fn pairs(document: &str) -> Vec<(String, String)> {
    parse(document)
        .into_iter()
        .map(|block| (block.name, block.expression))
        .collect()
}

#[test]
fn two_queries_in_document_order() {
    let document =
        "section Section1;\nshared Query1 = let a = 1 in a;\nshared #\"Query 2\" = let b = 2 in b;";
    assert_eq!(
        pairs(document),
        vec![
            ("Query1".to_string(), "let a = 1 in a".to_string()),
            ("Query 2".to_string(), "let b = 2 in b".to_string()),
        ]
    );
}

#[test]
fn escaped_legacy_documents_are_unescaped() {
    let document = r#"section Section1;\r\nshared Source = Csv.Document(\"a,b\");"#;
    assert_eq!(
        pairs(document),
        vec![("Source".to_string(), "Csv.Document(\"a,b\")".to_string())]
    );
}

#[test]
fn document_without_section_has_no_queries() {
    assert!(parse("let x = 1 in x").is_empty());
}

#[test]
fn labels_use_cleaned_names() {
    assert_eq!(clean_name("Sales [EU] / Ops"), "Sales (EU)   Ops");
    assert_eq!(workspace_dataflow_label("Finance", "GL_Load"), "Finance ~ GL Load");
}
