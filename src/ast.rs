//! Abstract Syntax Tree for Daiquiri queries
//!
//! A query is a flat infix sequence `operand (op operand)*`. Precedence is
//! not resolved here; the compiler applies it.

use std::fmt;

/// A parsed query or parenthesized sub-expression.
///
/// The `first`/`rest` split makes the operand/operator alternation part of
/// the type, so a malformed sequence cannot be constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    pub first: Operand,
    pub rest: Vec<(Operator, Operand)>,
}

impl Expression {
    /// An expression consisting of a single operand
    pub fn single(operand: Operand) -> Self {
        Self {
            first: operand,
            rest: Vec::new(),
        }
    }

    /// Append `op operand` to the sequence
    pub fn push(&mut self, op: Operator, operand: Operand) {
        self.rest.push((op, operand));
    }

    /// Chain `op operand` onto the sequence (builder form of [`Expression::push`])
    pub fn then(mut self, op: Operator, operand: impl Into<Operand>) -> Self {
        self.push(op, operand.into());
        self
    }

    /// Operands in source order
    pub fn operands(&self) -> impl Iterator<Item = &Operand> {
        std::iter::once(&self.first).chain(self.rest.iter().map(|(_, operand)| operand))
    }

    /// Names referenced through `set:` anywhere in this expression
    pub fn set_references(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for operand in self.operands() {
            match operand {
                Operand::Definition(Definition::Set(name)) => names.push(name.as_str()),
                Operand::Definition(_) => {}
                Operand::Group(inner) => names.extend(inner.set_references()),
            }
        }
        names
    }
}

impl From<Definition> for Expression {
    fn from(definition: Definition) -> Self {
        Expression::single(Operand::Definition(definition))
    }
}

/// One operand in a statement sequence
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// `{entity: Foo}`, `component: Bar(...)`, `{set: baz}`
    Definition(Definition),

    /// `( ... )`
    Group(Box<Expression>),
}

impl From<Definition> for Operand {
    fn from(definition: Definition) -> Self {
        Operand::Definition(definition)
    }
}

impl From<Expression> for Operand {
    fn from(expression: Expression) -> Self {
        Operand::Group(Box::new(expression))
    }
}

/// Binary operators. `&` binds tighter than `|`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    /// Binding strength used by the shunting-yard pass
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Or => 0,
            Operator::And => 1,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::And => "&",
            Operator::Or => "|",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A leaf definition
#[derive(Clone, Debug, PartialEq)]
pub enum Definition {
    /// `entity: Name` - records tagged with the entity type
    Entity(String),

    /// `component: Name` or `component: Name(key op value, ...)`
    Component {
        name: String,
        predicates: Vec<Predicate>,
    },

    /// `set: name` - another named query
    Set(String),
}

impl Definition {
    pub fn entity(name: impl Into<String>) -> Self {
        Definition::Entity(name.into())
    }

    pub fn component(name: impl Into<String>) -> Self {
        Definition::Component {
            name: name.into(),
            predicates: Vec::new(),
        }
    }

    pub fn component_with(name: impl Into<String>, predicates: Vec<Predicate>) -> Self {
        Definition::Component {
            name: name.into(),
            predicates,
        }
    }

    pub fn set(name: impl Into<String>) -> Self {
        Definition::Set(name.into())
    }
}

/// A component attribute comparison: `key op value`
///
/// The key is a dotted path (`a.b.c`) and is opaque to the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    pub key: String,
    pub op: Comparator,
    pub value: Value,
}

impl Predicate {
    pub fn new(key: impl Into<String>, op: Comparator, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            op,
            value: value.into(),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.key, self.op.symbol(), self.value)
    }
}

/// Attribute comparison operators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Comparator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparator {
    /// Surface syntax
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Neq => "!=",
            Comparator::Lt => "<",
            Comparator::Lte => "<=",
            Comparator::Gt => ">",
            Comparator::Gte => ">=",
        }
    }

    /// Stable name used in canonical hashes
    pub fn name(self) -> &'static str {
        match self {
            Comparator::Eq => "eq",
            Comparator::Neq => "neq",
            Comparator::Lt => "lt",
            Comparator::Lte => "lte",
            Comparator::Gt => "gt",
            Comparator::Gte => "gte",
        }
    }
}

/// A JSON literal: the only values a predicate may compare against
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

/// Renders the value as a JSON literal
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write_json_string(f, s),
        }
    }
}

fn write_json_string(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{08}' => f.write_str("\\b")?,
            '\u{0C}' => f.write_str("\\f")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}
