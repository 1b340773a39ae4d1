use nhxtree::model::{AnnotatedTree, MissingTagError, NhxTree};
use nhxtree::nhx::NhxParser;
use nhxtree::parser::ParsingErrorType;
use nhxtree::{parse_nhx_reader, parse_nhx_str};
use std::io::{self, Read};

/// Example tree from the NHX description
const ADH_TREE: &str = "\
    (((ADH2:0.1[&&NHX:S=human:E=1.1.1.1], ADH1:0.11[&&NHX:S=human:E=1.1.1.1]\
    ):0.05[&&NHX:S=Primates:E=1.1.1.1:D=Y:B=100],ADHY:0.1[&&NHX:S=nematode:E=1.1.1.1]\
    ,ADHX:0.12[&&NHX:S=insect:E=1.1.1.1]):0.1[&&NHX:S=Metazoa:E=1.1.1.1:D=N]\
    ,(ADH4:0.09[&&NHX:S=yeast:E=1.1.1.1],ADH3:0.13[&&NHX:S=yeast:E=1.1.1.1]\
    ,ADH2:0.12[&&NHX:S=yeast:E=1.1.1.1],ADH1:0.11[&&NHX:S=yeast:E=1.1.1.1]\
    ):0.1[&&NHX:S=Fungi])[&&NHX:E=1.1.1.1:D=N]; ";

fn assert_structure(tree: &NhxTree) {
    assert!(tree.is_valid());
    let roots: Vec<_> = (0..tree.nb_nodes())
        .filter(|&n| tree.parent(n).is_none())
        .collect();
    assert_eq!(roots, vec![tree.root()]);
    for node in 0..tree.nb_nodes() {
        if let Some(parent) = tree.parent(node) {
            let occurrences = tree.children(parent).iter().filter(|&&c| c == node).count();
            assert_eq!(occurrences, 1);
        }
    }
}

// --- TESTS NHX STRING PARSING ---
#[test]
fn test_small_labeled_tree() {
    let tree = parse_nhx_str("(A:1,B:2)C:3;").unwrap();
    assert_structure(&tree);

    assert_eq!(tree.nb_nodes(), 3);
    assert_eq!(tree.root(), 0);
    assert_eq!(tree.children(0), &[1, 2]);

    assert_eq!(tree.tag(1, "name").unwrap(), "A");
    assert_eq!(tree.tag(1, "length").unwrap(), "1");
    assert_eq!(tree.tag(2, "name").unwrap(), "B");
    assert_eq!(tree.tag(2, "length").unwrap(), "2");
    assert_eq!(tree.tag(0, "name").unwrap(), "C");
    assert_eq!(tree.tag(0, "length").unwrap(), "3");
}

#[test]
fn test_annotations() {
    let tree = parse_nhx_str("(A[&&NHX:S=x:E=y],B);").unwrap();
    assert_structure(&tree);

    assert_eq!(tree.nb_nodes(), 3);
    assert_eq!(tree.tag(1, "S").unwrap(), "x");
    assert_eq!(tree.tag(1, "E").unwrap(), "y");
    assert_eq!(
        tree.tag(2, "S"),
        Err(MissingTagError {
            node: 2,
            name: "S".to_string()
        })
    );
}

#[test]
fn test_single_unlabeled_node() {
    let tree = parse_nhx_str(";").unwrap();
    assert_structure(&tree);

    assert_eq!(tree.nb_nodes(), 1);
    assert_eq!(tree.root(), 0);
    assert_eq!(tree.parent(0), None);
    assert!(tree.children(0).is_empty());
    assert!(tree.tags(0).is_empty());
}

#[test]
fn test_adh_example_tree() {
    let tree = parse_nhx_str(ADH_TREE).unwrap();
    assert_structure(&tree);

    assert_eq!(tree.nb_nodes(), 12);
    assert_eq!(tree.tag(3, "name").unwrap(), "ADH2");
    assert_eq!(tree.tag(3, "length").unwrap(), "0.1");
    assert_eq!(tree.tag(3, "S").unwrap(), "human");
    assert_eq!(tree.parent(6), Some(1));
    assert_eq!(tree.children(7), &[8, 9, 10, 11]);
    assert_eq!(tree.root(), 0);

    // Clade labels follow their closing parenthesis
    assert_eq!(tree.tag(2, "length").unwrap(), "0.05");
    assert_eq!(tree.tag(2, "B").unwrap(), "100");
    assert_eq!(tree.tag(7, "S").unwrap(), "Fungi");
    assert_eq!(tree.tag(0, "D").unwrap(), "N");
    assert!(tree.tag(0, "name").is_err());
    assert_eq!(tree.num_leaves(), 8);
}

#[test]
fn test_internal_names_and_lengths() {
    let tree = parse_nhx_str("((A,B)AB:0.5,(C,D)CD:0.7)root;").unwrap();
    assert_structure(&tree);

    assert_eq!(tree.nb_nodes(), 7);
    assert_eq!(tree.name(0), Some("root"));
    assert_eq!(tree.name(1), Some("AB"));
    assert_eq!(tree.length(1), Some("0.5"));
    assert_eq!(tree.name(4), Some("CD"));
    assert_eq!(tree.children(4), &[5, 6]);
}

#[test]
fn test_empty_leaves() {
    let tree = parse_nhx_str("(,(,));").unwrap();
    assert_structure(&tree);

    assert_eq!(tree.nb_nodes(), 5);
    assert_eq!(tree.children(0), &[1, 2]);
    assert_eq!(tree.children(2), &[3, 4]);
    assert!((0..5).all(|n| tree.tags(n).is_empty()));
}

#[test]
fn test_multifurcation_and_unary_clade() {
    let tree = parse_nhx_str("((A),B,C,D);").unwrap();
    assert_structure(&tree);

    assert_eq!(tree.children(0), &[1, 3, 4, 5]);
    assert_eq!(tree.children(1), &[2]);
    assert!(tree.is_leaf(2));
}

#[test]
fn test_length_only_and_scientific_notation() {
    let tree = parse_nhx_str("(:1e-5,B:2.5E+3):0;");
    // '+' is not an identifier character
    assert!(tree.is_err());

    let tree = parse_nhx_str("(:1e-5,B:2.5E3):0;").unwrap();
    assert_eq!(tree.length(1), Some("1e-5"));
    assert!(tree.name(1).is_none());
    assert_eq!(tree.length(2), Some("2.5E3"));
    assert_eq!(tree.length(0), Some("0"));
}

#[test]
fn test_comments_and_whitespace_are_ignored() {
    let plain = parse_nhx_str("(A:1[&&NHX:S=x],B:2)C;").unwrap();
    let spaced = parse_nhx_str(
        " [tree one]\n( A [leaf]\t: 1 [&&NHX:S=x] ,\r\n B:2 [why not] ) C ; [trailing]\n",
    )
    .unwrap();
    assert_eq!(plain, spaced);
}

#[test]
fn test_annotation_key_may_overwrite_name() {
    let tree = parse_nhx_str("A[&&NHX:name=B];").unwrap();
    assert_eq!(tree.name(0), Some("B"));
}

#[test]
fn test_empty_annotation_block_and_stray_separators() {
    let tree = parse_nhx_str("(A[&&NHX:],B[&&NHX::S=x::]);").unwrap();
    assert_eq!(tree.tags(1).len(), 1);
    assert_eq!(tree.tag(2, "S").unwrap(), "x");
}

#[test]
fn test_deeply_nested_tree() {
    let depth = 100_000;
    let nhx = format!("{}A{};", "(".repeat(depth), ")".repeat(depth));
    let tree = parse_nhx_str(&nhx).unwrap();

    assert_eq!(tree.nb_nodes(), depth + 1);
    assert_eq!(tree.name(depth), Some("A"));
    assert_eq!(tree.parent(depth), Some(depth - 1));
}

#[test]
fn test_determinism() {
    let first = parse_nhx_str(ADH_TREE).unwrap();
    let second = parse_nhx_str(ADH_TREE).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parse_reader() {
    let tree = parse_nhx_reader(ADH_TREE.as_bytes()).unwrap();
    assert_eq!(tree.nb_nodes(), 12);
}

#[test]
fn test_parse_reader_invalid_utf8() {
    let error = parse_nhx_reader(&b"((A,B),(C,D\xFF));"[..]).unwrap_err();
    assert!(error.is_lexical());
    assert_eq!(error.position(), Some(11));
    assert_eq!(error.context().caret(), 11);
    assert!(error.to_string().contains("invalid UTF-8 byte 0xFF at position 11"));

    // Multi-byte characters before the invalid byte count once
    let error = parse_nhx_reader("(Ä,".as_bytes().chain(&b"\xFE)"[..])).unwrap_err();
    assert_eq!(error.position(), Some(3));
}

#[test]
fn test_parse_reader_io_error_has_no_position() {
    struct FailingReader;
    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device unplugged"))
        }
    }

    let error = parse_nhx_reader(FailingReader).unwrap_err();
    assert_eq!(error.kind(), &ParsingErrorType::IoError("device unplugged".to_string()));
    assert_eq!(error.position(), None);
    assert_eq!(error.to_string(), "IO error - device unplugged");

    let mut parser = NhxParser::new();
    assert!(parser.parse_reader(FailingReader).is_err());
    assert!(!parser.is_used());
}

#[test]
fn test_wide_multifurcation() {
    let nb_leaves = 100_000;
    let nhx = format!("({}A);", "A,".repeat(nb_leaves - 1));
    let tree = parse_nhx_str(&nhx).unwrap();

    assert_eq!(tree.nb_nodes(), nb_leaves + 1);
    assert_eq!(tree.children(0).len(), nb_leaves);
    assert_eq!(tree.num_leaves(), nb_leaves);
}

// --- TESTS NHX PARSER ---
#[test]
fn test_parser_holds_tree_until_reset() {
    let mut parser = NhxParser::new().with_node_capacity(12);
    let nb_nodes = parser.parse_reader(ADH_TREE.as_bytes()).unwrap().nb_nodes();
    assert_eq!(nb_nodes, 12);
    assert_eq!(parser.tree().unwrap().nb_nodes(), 12);

    let error = parser.parse_str("(A,B);").unwrap_err();
    assert_eq!(error.kind(), &ParsingErrorType::ParserExhausted);
    assert_eq!(error.position(), None);

    parser.reset();
    let tree = parser.parse_str("(A,B);").unwrap();
    assert_eq!(tree.nb_nodes(), 3);
    assert_eq!(parser.into_tree().unwrap().nb_nodes(), 3);
}

#[test]
fn test_failed_parse_keeps_no_tree() {
    let mut parser = NhxParser::new();
    assert!(parser.parse_str("(A,B").is_err());
    assert!(parser.tree().is_none());
    assert!(parser.is_used());

    let mut parser = NhxParser::new().with_context_radius(3);
    let error = parser.parse_reader(&b"(A,\xFFB);"[..]).unwrap_err();
    assert_eq!(error.position(), Some(3));
    assert_eq!(error.context().caret(), 3);
    assert!(parser.is_used());
    assert!(parser.tree().is_none());
}

// --- TESTS ERRORS ---
#[test]
fn test_error_unclosed_parenthesis() {
    let error = parse_nhx_str("(A:1,B:2;").unwrap_err();
    assert!(error.is_grammar());
    assert_eq!(error.position(), Some(8));
    assert!(error.to_string().contains("at position 8"));
}

#[test]
fn test_error_unmatched_close_parenthesis() {
    let error = parse_nhx_str("(A,B));").unwrap_err();
    assert!(error.is_grammar());
    assert_eq!(error.position(), Some(5));
}

#[test]
fn test_error_end_of_input() {
    let error = parse_nhx_str("(A,B").unwrap_err();
    assert!(error.is_lexical());
    assert_eq!(error.position(), Some(4));

    let error = parse_nhx_str("").unwrap_err();
    assert!(error.is_lexical());
    assert_eq!(error.position(), Some(0));
}

#[test]
fn test_error_invalid_character() {
    let error = parse_nhx_str("(A,B*);").unwrap_err();
    assert!(error.is_lexical());
    assert_eq!(error.position(), Some(4));
    assert!(error.to_string().contains("'*'"));
    assert_eq!(error.context().window(), "(A,B*);");
    assert_eq!(error.context().caret(), 4);
}

#[test]
fn test_error_position_counts_characters() {
    let error = parse_nhx_str("(Ä,B);").unwrap_err();
    assert!(error.is_lexical());
    assert_eq!(error.position(), Some(1));

    let error = parse_nhx_str("([é]A,B)*;").unwrap_err();
    assert_eq!(error.position(), Some(8));
}

#[test]
fn test_error_unclosed_comment() {
    let error = parse_nhx_str("(A,B)[oops;").unwrap_err();
    assert!(error.is_lexical());
    assert_eq!(error.position(), Some(5));
    assert!(error.to_string().contains("unclosed comment"));
}

#[test]
fn test_error_missing_branch_length() {
    let error = parse_nhx_str("(A:,B);").unwrap_err();
    assert!(error.is_grammar());
    assert_eq!(error.position(), Some(3));
}

#[test]
fn test_error_malformed_annotation() {
    let error = parse_nhx_str("(A[&&NHX:S=],B);").unwrap_err();
    assert!(error.is_grammar());
    assert_eq!(error.position(), Some(11));

    let error = parse_nhx_str("(A[&&NHX:S x],B);").unwrap_err();
    assert!(error.is_grammar());
    assert_eq!(error.position(), Some(11));

    let error = parse_nhx_str("(A[&&NHX:S=x,B);").unwrap_err();
    assert!(error.is_grammar());
    assert_eq!(error.position(), Some(12));
}

#[test]
fn test_error_top_level_sibling() {
    let error = parse_nhx_str("A,B;").unwrap_err();
    assert!(error.is_grammar());
    assert_eq!(error.position(), Some(1));
}

#[test]
fn test_error_trailing_input() {
    let error = parse_nhx_str("(A,B);(C,D);").unwrap_err();
    assert!(error.is_grammar());
    assert_eq!(error.position(), Some(6));
}

#[test]
fn test_error_context_window_is_bounded() {
    let nhx = format!("({},B:2;", "A,".repeat(40));
    let mut parser = NhxParser::new().with_context_radius(5);
    let error = parser.parse_str(&nhx).unwrap_err();
    assert_eq!(error.position(), Some(nhx.len() - 1));
    assert_eq!(error.context().window(), ",,B:2;");
    assert_eq!(error.context().caret(), 5);
}

#[test]
fn test_error_long_token_is_truncated() {
    let nhx = format!("(A:1 {});", "x".repeat(50));
    let error = parse_nhx_str(&nhx).unwrap_err();
    assert_eq!(
        error.kind(),
        &ParsingErrorType::GrammarError(format!(
            "expected ',', ')' or ';' but found '{}...'",
            "x".repeat(20)
        ))
    );
    assert_eq!(error.position(), Some(5));
}
