//! Property tests for syntactic roundtrip (AST -> pretty -> parse -> AST)
//!
//! The pretty-printer braces every definition and parenthesizes every group,
//! so reparsing its output must reproduce the exact same tree.


use daiquiri::{parse, pretty_print, Expression};
use generators::*;
use proptest::prelude::*;

fn roundtrip(expr: &Expression) -> Result<(), String> {
    let printed = pretty_print(expr);
    let reparsed =
        parse(&printed).map_err(|e| format!("Reparse failed: {}\nPrinted: {}", e, printed))?;
    if &reparsed != expr {
        return Err(format!(
            "AST mismatch\n  Printed:   {}\n  Original:  {:?}\n  Reparsed:  {:?}",
            printed, expr, reparsed
        ));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn test_pretty_print_roundtrips(expr in arb_expression()) {
        roundtrip(&expr).map_err(TestCaseError::fail)?;
    }

    #[test]
    fn test_printing_is_idempotent(expr in arb_expression()) {
        let once = pretty_print(&expr);
        let reparsed = parse(&once).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(pretty_print(&reparsed), once);
    }

    #[test]
    fn test_values_roundtrip_inside_predicates(value in arb_value(), key in arb_key()) {
        let source = format!("{{component: C({} = {})}}", key, value);
        let expr = parse(&source).map_err(|e| TestCaseError::fail(format!("{}\n{}", source, e)))?;
        let expected = Expression::from(daiquiri::Definition::component_with(
            "C",
            vec![daiquiri::Predicate::new(key, daiquiri::Comparator::Eq, value)],
        ));
        prop_assert_eq!(expr, expected);
    }
}

/// Hand-written sources survive parse -> print -> parse
#[test]
fn test_roundtrip_examples() {
    let sources = [
        "{entity: Foo}",
        "entity: Foo | component: Bar",
        "{entity: A, component: B, set: c} | ({entity: D} & {entity: E})",
        "{component: C(a.b = \"c\", b.c = 'e', a.b != false, items.0.name >= -1.5e3)}",
        "((({entity: Deep})))",
    ];
    for source in sources {
        let expr = parse(source).unwrap_or_else(|e| panic!("{}: {}", source, e));
        roundtrip(&expr).unwrap();
    }
}
