//! Sandboxed evaluator for parsed overlay scripts
//!
//! Runs the statement tree from [`super::parser`] against a private table
//! arena. No functions exist inside the sandbox: a call that is actually
//! reached is a runtime error, so guarded engine hooks such as
//! `if not TILEZED then ... end` parse fine but never run.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{Error, Result};

use super::parser::{BinaryOp, Expr, Field, Stmt, StmtKind};
use super::table::{LuaTable, LuaTableKeyValue};

/// Global the script can test to know it runs inside the editor tooling.
pub const EDITOR_SENTINEL: &str = "TILEZED";

/// Deepest table nesting [`Interpreter::to_lua_table`] will extract.
pub const MAX_TABLE_DEPTH: usize = 100;

/// Index of a table in the interpreter's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(usize);

/// Runtime values
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Table(TableId),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::Str(_) => "string",
            Value::Table(_) => "table",
        }
    }

    fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }
}

/// Table keys. Integral floats are stored as `Int` so `t[1]` and `t[1.0]` agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Int(i64),
    Float(u64),
    Str(String),
    Bool(bool),
    Table(TableId),
}

type TableData = IndexMap<Key, Value>;

/// Result of running a block
enum Flow {
    Normal,
    Return(Value),
}

/// One evaluation of one chunk.
///
/// Owns every table the script creates; dropping the interpreter frees them.
#[derive(Debug)]
pub struct Interpreter {
    tables: Vec<TableData>,
    globals: HashMap<String, Value>,
    scopes: Vec<HashMap<String, Value>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Create an interpreter with the editor sentinel set.
    pub fn new() -> Self {
        let mut globals = HashMap::new();
        globals.insert(EDITOR_SENTINEL.to_string(), Value::Bool(true));
        Self {
            tables: Vec::new(),
            globals,
            scopes: Vec::new(),
        }
    }

    /// Run a chunk and return the value of its `return` statement (or nil).
    pub fn run(&mut self, chunk: &[Stmt]) -> Result<Value> {
        self.scopes.push(HashMap::new());
        let flow = self.exec_block(chunk);
        self.scopes.pop();
        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }

    /// Value of a global variable after [`Interpreter::run`].
    pub fn global(&self, name: &str) -> Value {
        self.globals.get(name).cloned().unwrap_or(Value::Nil)
    }

    fn exec_block(&mut self, block: &[Stmt]) -> Result<Flow> {
        for stmt in block {
            if let Flow::Return(value) = self.exec(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_scoped(&mut self, block: &[Stmt]) -> Result<Flow> {
        self.scopes.push(HashMap::new());
        let flow = self.exec_block(block);
        self.scopes.pop();
        flow
    }

    fn exec(&mut self, stmt: &Stmt) -> Result<Flow> {
        let at_line = |e: Error| match e {
            Error::LuaRuntime(message) if !message.starts_with("line ") => {
                Error::LuaRuntime(format!("line {}: {message}", stmt.line))
            }
            other => other,
        };

        match &stmt.kind {
            StmtKind::Local { name, value } => {
                let value = match value {
                    Some(expr) => self.eval(expr).map_err(at_line)?,
                    None => Value::Nil,
                };
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(name.clone(), value);
                }
            }
            StmtKind::Assign { target, value } => {
                let value = self.eval(value).map_err(at_line)?;
                self.assign(target, value).map_err(at_line)?;
            }
            StmtKind::Call(call) => {
                self.eval(call).map_err(at_line)?;
            }
            StmtKind::If {
                branches,
                otherwise,
            } => {
                for (condition, body) in branches {
                    if self.eval(condition).map_err(at_line)?.is_truthy() {
                        return self.exec_scoped(body);
                    }
                }
                if let Some(body) = otherwise {
                    return self.exec_scoped(body);
                }
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr).map_err(at_line)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn assign(&mut self, target: &Expr, value: Value) -> Result<()> {
        match target {
            Expr::Name(name) => {
                for scope in self.scopes.iter_mut().rev() {
                    if let Some(slot) = scope.get_mut(name) {
                        *slot = value;
                        return Ok(());
                    }
                }
                if value == Value::Nil {
                    self.globals.remove(name);
                } else {
                    self.globals.insert(name.clone(), value);
                }
                Ok(())
            }
            Expr::Index { target, key } => {
                let table = self.eval(target)?;
                let Value::Table(id) = table else {
                    return Err(runtime(format!(
                        "attempt to index a {} value{}",
                        table.type_name(),
                        describe_target(target)
                    )));
                };
                let key = self.eval(key)?;
                self.raw_set(id, key, value)
            }
            _ => Err(runtime("cannot assign to this expression")),
        }
    }

    fn lookup(&self, name: &str) -> Value {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return value.clone();
            }
        }
        self.global(name)
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value> {
        Ok(match expr {
            Expr::Nil => Value::Nil,
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Int(i) => Value::Int(*i),
            Expr::Float(f) => Value::Float(*f),
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::Name(name) => self.lookup(name),
            Expr::Index { target, key } => {
                let table = self.eval(target)?;
                let Value::Table(id) = table else {
                    return Err(runtime(format!(
                        "attempt to index a {} value{}",
                        table.type_name(),
                        describe_target(target)
                    )));
                };
                let key = self.eval(key)?;
                self.raw_get(id, &key)
            }
            Expr::Call { callee, method, .. } => {
                let name = match method {
                    Some(method) => format!("method '{method}'"),
                    None => match callee.as_ref() {
                        Expr::Name(name) => format!("'{name}'"),
                        _ => "a value".to_string(),
                    },
                };
                return Err(runtime(format!(
                    "attempt to call {name}: function calls are not supported"
                )));
            }
            Expr::Table(fields) => self.construct(fields)?,
            Expr::Not(inner) => Value::Bool(!self.eval(inner)?.is_truthy()),
            Expr::Neg(inner) => match self.eval(inner)? {
                Value::Int(i) => Value::Int(i.wrapping_neg()),
                Value::Float(f) => Value::Float(-f),
                other => {
                    return Err(runtime(format!(
                        "attempt to perform arithmetic on a {} value",
                        other.type_name()
                    )));
                }
            },
            Expr::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs)?,
        })
    }

    fn binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value> {
        let left = self.eval(lhs)?;
        match op {
            BinaryOp::And => {
                if left.is_truthy() {
                    self.eval(rhs)
                } else {
                    Ok(left)
                }
            }
            BinaryOp::Or => {
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval(rhs)
                }
            }
            BinaryOp::Eq => Ok(Value::Bool(raw_equal(&left, &self.eval(rhs)?))),
            BinaryOp::NotEq => Ok(Value::Bool(!raw_equal(&left, &self.eval(rhs)?))),
            BinaryOp::Concat => {
                let right = self.eval(rhs)?;
                match (concat_text(&left), concat_text(&right)) {
                    (Some(a), Some(b)) => Ok(Value::Str(a + &b)),
                    _ => {
                        let bad = if concat_text(&left).is_none() { &left } else { &right };
                        Err(runtime(format!(
                            "attempt to concatenate a {} value",
                            bad.type_name()
                        )))
                    }
                }
            }
        }
    }

    fn construct(&mut self, fields: &[Field]) -> Result<Value> {
        let id = self.new_table();
        let mut next_index = 1;

        for field in fields {
            match field {
                Field::Positional(expr) => {
                    let value = self.eval(expr)?;
                    self.raw_set(id, Value::Int(next_index), value)?;
                    next_index += 1;
                }
                Field::Keyed(key, value) => {
                    let key = self.eval(key)?;
                    let value = self.eval(value)?;
                    self.raw_set(id, key, value)?;
                }
            }
        }

        Ok(Value::Table(id))
    }

    fn new_table(&mut self) -> TableId {
        self.tables.push(TableData::new());
        TableId(self.tables.len() - 1)
    }

    fn raw_get(&self, id: TableId, key: &Value) -> Value {
        let Ok(key) = to_key(key.clone()) else {
            return Value::Nil;
        };
        self.tables[id.0].get(&key).cloned().unwrap_or(Value::Nil)
    }

    fn raw_set(&mut self, id: TableId, key: Value, value: Value) -> Result<()> {
        let key = to_key(key)?;
        let table = &mut self.tables[id.0];
        if value == Value::Nil {
            table.shift_remove(&key);
        } else {
            // Existing keys keep their position.
            table.insert(key, value);
        }
        Ok(())
    }

    /// Convert a table value into the generic [`LuaTable`] tree.
    ///
    /// The sequence part (`1..n` without gaps) comes first in index order,
    /// then every other key in insertion order.
    pub fn to_lua_table(&self, id: TableId) -> Result<LuaTable> {
        let mut visiting = Vec::new();
        self.convert(id, &mut visiting)
    }

    fn convert(&self, id: TableId, visiting: &mut Vec<TableId>) -> Result<LuaTable> {
        if visiting.contains(&id) {
            return Err(runtime("table contains a reference to itself"));
        }
        if visiting.len() >= MAX_TABLE_DEPTH {
            return Err(runtime("tables are nested too deeply"));
        }
        visiting.push(id);

        let data = &self.tables[id.0];
        let mut sequence_len = 0;
        while data.contains_key(&Key::Int(sequence_len + 1)) {
            sequence_len += 1;
        }

        let mut table = LuaTable::new();
        for index in 1..=sequence_len {
            if let Some(value) = data.get(&Key::Int(index)) {
                table.push(self.convert_pair(index.to_string(), value, visiting)?);
            }
        }
        for (key, value) in data {
            if matches!(key, Key::Int(i) if (1..=sequence_len).contains(i)) {
                continue;
            }
            table.push(self.convert_pair(key_text(key), value, visiting)?);
        }

        visiting.pop();
        Ok(table)
    }

    fn convert_pair(
        &self,
        key: String,
        value: &Value,
        visiting: &mut Vec<TableId>,
    ) -> Result<LuaTableKeyValue> {
        Ok(match value {
            Value::Table(id) => LuaTableKeyValue::table(key, self.convert(*id, visiting)?),
            scalar => LuaTableKeyValue::string(key, scalar_text(scalar)),
        })
    }
}

fn runtime(message: impl Into<String>) -> Error {
    Error::LuaRuntime(message.into())
}

fn describe_target(expr: &Expr) -> String {
    match expr {
        Expr::Name(name) => format!(" (global '{name}')"),
        Expr::Index { key, .. } => match key.as_ref() {
            Expr::Str(field) => format!(" (field '{field}')"),
            _ => String::new(),
        },
        _ => String::new(),
    }
}

fn to_key(value: Value) -> Result<Key> {
    match value {
        Value::Nil => Err(runtime("table index is nil")),
        Value::Bool(b) => Ok(Key::Bool(b)),
        Value::Int(i) => Ok(Key::Int(i)),
        Value::Float(f) if f.is_nan() => Err(runtime("table index is NaN")),
        Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.007_199_254_740_992e15 => {
            Ok(Key::Int(f as i64))
        }
        Value::Float(f) => Ok(Key::Float(f.to_bits())),
        Value::Str(s) => Ok(Key::Str(s)),
        Value::Table(id) => Ok(Key::Table(id)),
    }
}

fn key_text(key: &Key) -> String {
    match key {
        Key::Int(i) => i.to_string(),
        Key::Float(bits) => format_float(f64::from_bits(*bits)),
        Key::Str(s) => s.clone(),
        Key::Bool(b) => b.to_string(),
        Key::Table(id) => format!("table: {}", id.0),
    }
}

/// Textual form of a scalar, as Lua's `tostring` would print it.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Str(s) => s.clone(),
        Value::Table(id) => format!("table: {}", id.0),
    }
}

fn concat_text(value: &Value) -> Option<String> {
    match value {
        Value::Int(_) | Value::Float(_) | Value::Str(_) => Some(scalar_text(value)),
        _ => None,
    }
}

fn format_float(f: f64) -> String {
    if f.is_infinite() {
        (if f > 0.0 { "inf" } else { "-inf" }).to_string()
    } else if f.is_nan() {
        "nan".to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

fn raw_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => *i as f64 == *f,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua::lexer::Lexer;
    use crate::lua::parser::Parser;

    fn run(source: &str) -> Result<(Interpreter, Value)> {
        let tokens = Lexer::new(source).tokenize()?;
        let chunk = Parser::new(tokens).parse_chunk()?;
        let mut interpreter = Interpreter::new();
        let value = interpreter.run(&chunk)?;
        Ok((interpreter, value))
    }

    fn returned_table(source: &str) -> LuaTable {
        let (interpreter, value) = run(source).unwrap();
        let Value::Table(id) = value else {
            panic!("expected a table, got {value:?}");
        };
        interpreter.to_lua_table(id).unwrap()
    }

    #[test]
    fn test_guarded_call_is_skipped() {
        let table = returned_table(
            "local m = {}\nm.VERSION = 1\nif not TILEZED then\n  getContainerOverlays():addOverlays(m)\nend\nreturn m",
        );
        assert_eq!(table.get_string("VERSION"), Some("1"));
    }

    #[test]
    fn test_reached_call_is_runtime_error() {
        let err = run("if TILEZED then\n  register(1)\nend").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 2"), "{message}");
        assert!(message.contains("'register'"), "{message}");
    }

    #[test]
    fn test_reassignment_replaces_in_place() {
        let table = returned_table("local t = {}\nt.a = 1\nt.b = 2\nt.a = 3\nreturn t");
        let pairs: Vec<_> = table
            .iter()
            .map(|kv| (kv.key.as_str(), kv.as_str().unwrap()))
            .collect();
        assert_eq!(pairs, [("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_nil_assignment_removes_key() {
        let table = returned_table("local t = { a = 1, b = 2 }\nt.a = nil\nreturn t");
        assert!(table.find("a").is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_sequence_part_comes_first() {
        let table = returned_table("return { name = 'x', [2] = 'b', [1] = 'a', [5] = 'e' }");
        let keys: Vec<_> = table.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, ["1", "2", "name", "5"]);
    }

    #[test]
    fn test_scalar_coercion() {
        let table = returned_table("return { i = 3, f = 2.5, g = 4.0, b = true, n = -7, s = 'a' .. 1 }");
        assert_eq!(table.get_string("i"), Some("3"));
        assert_eq!(table.get_string("f"), Some("2.5"));
        assert_eq!(table.get_string("g"), Some("4.0"));
        assert_eq!(table.get_string("b"), Some("true"));
        assert_eq!(table.get_string("n"), Some("-7"));
        assert_eq!(table.get_string("s"), Some("a1"));
    }

    #[test]
    fn test_globals_survive_run() {
        let (interpreter, value) = run("overlayMap = {}\noverlayMap['a'] = {}").unwrap();
        assert_eq!(value, Value::Nil);
        assert!(matches!(interpreter.global("overlayMap"), Value::Table(_)));
        assert_eq!(interpreter.global(EDITOR_SENTINEL), Value::Bool(true));
    }

    #[test]
    fn test_locals_are_not_globals() {
        let (interpreter, _) = run("local overlayMap = {}").unwrap();
        assert_eq!(interpreter.global("overlayMap"), Value::Nil);
    }

    #[test]
    fn test_indexing_nil_is_runtime_error() {
        let err = run("missing.field = 1").unwrap_err();
        assert!(err.to_string().contains("attempt to index a nil value"));
    }

    #[test]
    fn test_deep_table_chain_is_rejected() {
        let mut source = String::from("local t0 = {}\n");
        for i in 1..=5_000 {
            source.push_str(&format!("local t{i} = {{ t{} }}\n", i - 1));
        }
        source.push_str("return t5000");

        let (interpreter, value) = run(&source).unwrap();
        let Value::Table(id) = value else {
            panic!("expected a table");
        };
        let err = interpreter.to_lua_table(id).unwrap_err();
        assert!(err.to_string().contains("nested too deeply"), "{err}");
    }

    #[test]
    fn test_self_reference_is_rejected() {
        let (interpreter, value) = run("local t = {}\nt.me = t\nreturn t").unwrap();
        let Value::Table(id) = value else {
            panic!("expected a table");
        };
        assert!(interpreter.to_lua_table(id).is_err());
    }
}
