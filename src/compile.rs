//! Query compiler: parsed expressions → shared bucket graph.
//!
//! Each statement sequence is reordered into postfix with the shunting-yard
//! algorithm (`&` binds tighter than `|`, both left-associative), then
//! reduced left to right into pairwise groups. [`BucketGraph::group`]
//! flattens and deduplicates as groups are built, so
//! `{entity: A} & {entity: B} & {entity: C}` ends up as one three-way group
//! regardless of how the pairs were formed.
//!
//! `set: name` compiles the named query in place. Because every bucket is
//! looked up by canonical hash, the result is the very bucket the named
//! query itself resolves to.

use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexMap;
use log::debug;

use crate::ast::{Definition, Expression, Operand, Operator};
use crate::bucket::{BucketGraph, BucketId, Leaf};
use crate::error::{Error, Result};

/// One step of a postfix (reverse Polish) sequence
#[derive(Clone, Copy, Debug)]
enum Postfix<'e> {
    Operand(&'e Operand),
    Operator(Operator),
}

/// Reorder an infix statement sequence into postfix
fn to_postfix(expression: &Expression) -> Vec<Postfix<'_>> {
    let mut output = Vec::with_capacity(expression.rest.len() * 2 + 1);
    let mut operators: Vec<Operator> = Vec::new();

    output.push(Postfix::Operand(&expression.first));
    for (op, operand) in &expression.rest {
        while let Some(&top) = operators.last() {
            if top.precedence() < op.precedence() {
                break;
            }
            output.push(Postfix::Operator(top));
            operators.pop();
        }
        operators.push(*op);
        output.push(Postfix::Operand(operand));
    }
    while let Some(op) = operators.pop() {
        output.push(Postfix::Operator(op));
    }

    output
}

/// Compiles named queries into a [`BucketGraph`].
///
/// Holds the table of all parsed queries so `set:` references can be
/// expanded on demand, and a stack of the names currently being compiled
/// to reject circular references.
pub struct Compiler<'a, K> {
    queries: &'a IndexMap<String, Expression>,
    graph: &'a mut BucketGraph<K>,
    compiled: HashMap<String, BucketId>,
    resolving: Vec<String>,
}

impl<'a, K: Eq + Hash + Clone> Compiler<'a, K> {
    pub fn new(queries: &'a IndexMap<String, Expression>, graph: &'a mut BucketGraph<K>) -> Self {
        Self {
            queries,
            graph,
            compiled: HashMap::new(),
            resolving: Vec::new(),
        }
    }

    /// Compile every query in table order, returning each name's root bucket
    pub fn compile_all(mut self) -> Result<IndexMap<String, BucketId>> {
        let queries = self.queries;
        let mut named = IndexMap::with_capacity(queries.len());
        for name in queries.keys() {
            let root = self.compile_named(name)?;
            named.insert(name.clone(), root);
        }
        Ok(named)
    }

    /// Compile one named query (and, transitively, the sets it references)
    pub fn compile_named(&mut self, name: &str) -> Result<BucketId> {
        if self.resolving.iter().any(|active| active == name) {
            return Err(Error::CircularSetReference(name.to_string()));
        }
        if let Some(&root) = self.compiled.get(name) {
            return Ok(root);
        }

        let queries = self.queries;
        let expression = queries
            .get(name)
            .ok_or_else(|| Error::UndefinedBucket(name.to_string()))?;

        self.resolving.push(name.to_string());
        let result = self.compile_expression(expression);
        self.resolving.pop();

        let root = result?;
        debug!(
            "compiled query '{}' to {}",
            name,
            self.graph.bucket(root).hash()
        );
        self.compiled.insert(name.to_string(), root);
        Ok(root)
    }

    /// Compile an anonymous expression (a whole query or a parenthesized group)
    pub fn compile_expression(&mut self, expression: &Expression) -> Result<BucketId> {
        let mut stack: Vec<BucketId> = Vec::new();

        for step in to_postfix(expression) {
            match step {
                Postfix::Operand(operand) => {
                    let bucket = self.compile_operand(operand)?;
                    stack.push(bucket);
                }
                Postfix::Operator(op) => {
                    let rhs = stack.pop().ok_or(Error::EmptyGroup)?;
                    let lhs = stack.pop().ok_or(Error::EmptyGroup)?;
                    let group = self.graph.group(op, [lhs, rhs])?;
                    stack.push(group);
                }
            }
        }

        stack.pop().ok_or(Error::EmptyGroup)
    }

    fn compile_operand(&mut self, operand: &Operand) -> Result<BucketId> {
        match operand {
            Operand::Group(inner) => self.compile_expression(inner),
            Operand::Definition(Definition::Entity(name)) => {
                Ok(self.graph.leaf(Leaf::Entity(name.clone())))
            }
            Operand::Definition(Definition::Component { name, predicates }) => {
                Ok(self.graph.leaf(Leaf::Component {
                    name: name.clone(),
                    predicates: predicates.clone(),
                }))
            }
            Operand::Definition(Definition::Set(name)) => {
                if !self.queries.contains_key(name) {
                    return Err(Error::UndefinedSetReference {
                        name: name.clone(),
                        referenced_by: self.resolving.last().cloned().unwrap_or_default(),
                    });
                }
                self.compile_named(name)
            }
        }
    }
}
