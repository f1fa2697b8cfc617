//! Lexical scan of DAX expressions for object references.
//!
//! Recognizes `'Table'[Object]`, `Table[Object]`, `[Object]`, `'Table'`
//! and bare identifiers that are not function calls. String literals and
//! comments are skipped. Resolution against the model happens elsewhere.

use once_cell::sync::Lazy;
use regex::Regex;

static DAX_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
          (?P<string>"(?:[^"]|"")*")
        | (?P<comment>//[^\n]*|--[^\n]*|/\*(?s:.*?)\*/)
        | '(?P<qtable>(?:[^']|'')+)'(?:\s*\[(?P<qcol>(?:[^\]]|\]\])+)\])?
        | (?P<ident>[A-Za-z_][A-Za-z0-9_]*)(?:\s*\[(?P<icol>(?:[^\]]|\]\])+)\]|\s*(?P<call>\())?
        | \[(?P<bcol>(?:[^\]]|\]\])+)\]
        "#,
    )
    .expect("Failed to compile DAX token regex - this is a bug in the code")
});

/// One syntactic reference found in an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaxReference {
    /// `'Table'[Object]` or `Table[Object]`.
    Qualified { table: String, object: String },
    /// `[Object]`.
    Unqualified { object: String },
    /// `'Table'`.
    Table { table: String },
    /// A bare identifier that may name a table.
    Identifier { name: String },
}

/// References in source order, duplicates removed.
pub fn scan_references(expression: &str) -> Vec<DaxReference> {
    let mut found: Vec<DaxReference> = Vec::new();

    for caps in DAX_TOKEN.captures_iter(expression) {
        let reference = if caps.name("string").is_some() || caps.name("comment").is_some() {
            continue;
        } else if let Some(table) = caps.name("qtable") {
            let table = table.as_str().replace("''", "'");
            match caps.name("qcol") {
                Some(col) => DaxReference::Qualified {
                    table,
                    object: unbracket(col.as_str()),
                },
                None => DaxReference::Table { table },
            }
        } else if let Some(ident) = caps.name("ident") {
            if caps.name("call").is_some() {
                continue;
            }
            match caps.name("icol") {
                Some(col) => DaxReference::Qualified {
                    table: ident.as_str().to_string(),
                    object: unbracket(col.as_str()),
                },
                None => DaxReference::Identifier {
                    name: ident.as_str().to_string(),
                },
            }
        } else if let Some(col) = caps.name("bcol") {
            DaxReference::Unqualified {
                object: unbracket(col.as_str()),
            }
        } else {
            continue;
        };

        if !found.contains(&reference) {
            found.push(reference);
        }
    }

    found
}

fn unbracket(raw: &str) -> String {
    raw.replace("]]", "]").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn qualified_and_unqualified_references() {
        let refs = scan_references("CALCULATE([Total Sales], 'Sales Order'[Channel] = \"Web\", Dates[Year] = 2024)");
        assert_eq!(
            refs,
            vec![
                DaxReference::Unqualified { object: "Total Sales".into() },
                DaxReference::Qualified { table: "Sales Order".into(), object: "Channel".into() },
                DaxReference::Qualified { table: "Dates".into(), object: "Year".into() },
            ]
        );
    }

    #[test]
    fn strings_and_comments_are_ignored() {
        let refs = scan_references("// [Ignored]\n\"[AlsoIgnored]\" & [Kept] /* 'Nope'[X] */ -- Sales[Y]");
        assert_eq!(refs, vec![DaxReference::Unqualified { object: "Kept".into() }]);
    }

    #[test]
    fn table_references_and_functions() {
        let refs = scan_references("COUNTROWS ( 'Customer' ) + COUNTROWS(Product)");
        assert_eq!(
            refs,
            vec![
                DaxReference::Table { table: "Customer".into() },
                DaxReference::Identifier { name: "Product".into() },
            ]
        );
    }

    #[test]
    fn duplicates_collapse() {
        let refs = scan_references("[A] + [A] * 'T'[B] - 'T'[B]");
        assert_eq!(refs.len(), 2);
    }
}
