//! Pretty-printer for Daiquiri expressions
//!
//! Renders an AST back to canonical query text: every definition braced,
//! every group parenthesized, single spaces around operators. Reparsing the
//! output yields the same AST.

use crate::ast::*;

/// A pretty-printer accumulating query text
#[derive(Default)]
pub struct Pretty {
    output: String,
}

impl Pretty {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.output
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }
}

// ============ Pretty-printing implementations ============

impl Pretty {
    pub fn expression(&mut self, expr: &Expression) {
        self.operand(&expr.first);
        for (op, operand) in &expr.rest {
            self.write(" ");
            self.write(op.symbol());
            self.write(" ");
            self.operand(operand);
        }
    }

    pub fn operand(&mut self, operand: &Operand) {
        match operand {
            Operand::Definition(def) => {
                self.write("{");
                self.definition(def);
                self.write("}");
            }
            Operand::Group(inner) => {
                self.write("(");
                self.expression(inner);
                self.write(")");
            }
        }
    }

    pub fn definition(&mut self, def: &Definition) {
        match def {
            Definition::Entity(name) => {
                self.write("entity: ");
                self.write(name);
            }
            Definition::Set(name) => {
                self.write("set: ");
                self.write(name);
            }
            Definition::Component { name, predicates } => {
                self.write("component: ");
                self.write(name);
                if !predicates.is_empty() {
                    let rendered: Vec<String> = predicates.iter().map(|p| p.to_string()).collect();
                    self.write("(");
                    self.write(&rendered.join(", "));
                    self.write(")");
                }
            }
        }
    }
}

/// Render an expression as canonical query text
pub fn pretty_print(expr: &Expression) -> String {
    let mut p = Pretty::new();
    p.expression(expr);
    p.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_definitions() {
        let expr = Expression::from(Definition::entity("Foo"))
            .then(Operator::Or, Definition::set("bar"))
            .then(
                Operator::And,
                Definition::component_with(
                    "Pos",
                    vec![
                        Predicate::new("x.y", Comparator::Gte, 2.5),
                        Predicate::new("label", Comparator::Neq, "a \"b\"\n"),
                    ],
                ),
            );
        assert_eq!(
            pretty_print(&expr),
            r#"{entity: Foo} | {set: bar} & {component: Pos(x.y >= 2.5, label != "a \"b\"\n")}"#
        );
    }

    #[test]
    fn test_print_groups_and_literals() {
        let inner = Expression::from(Definition::component("A")).then(
            Operator::And,
            Definition::component_with(
                "B",
                vec![
                    Predicate::new("n", Comparator::Eq, Value::Null),
                    Predicate::new("f", Comparator::Eq, false),
                    Predicate::new("i", Comparator::Lt, -3),
                ],
            ),
        );
        let expr =
            Expression::single(Operand::from(inner)).then(Operator::Or, Definition::entity("C"));
        assert_eq!(
            pretty_print(&expr),
            "({component: A} & {component: B(n = null, f = false, i < -3)}) | {entity: C}"
        );
    }
}
