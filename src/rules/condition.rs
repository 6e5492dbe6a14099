//! Trigger-condition expression language
//!
//! Conditions are short strings authored in content files, evaluated against
//! a (source unit, target position, board) triple. The language is small and
//! deliberately literal-minded:
//!
//! - a parenthesized group is evaluated as its own expression
//! - a level containing `&&` is an AND over its `&&`-separated parts
//! - otherwise a level containing `||` is an OR over its parts
//! - otherwise exactly one comparison (`<= >= < > == !=`), numeric when both
//!   sides are numbers, string-wise otherwise
//! - otherwise a lone token, true iff it reads `true`
//!
//! Because `&&` splitting runs before `||` splitting there is no operator
//! precedence table: `a && b || c` groups as `a && (b || c)`. Content mixing
//! both operators at one level without parentheses gets this grouping, not
//! the conventional one. Kept as-is; see the quirk tests below.
//!
//! Expressions are parsed once into an AST when the ability is built;
//! evaluation is pure and allocation-light. Malformed expressions are
//! non-fatal: they keep their parse error and evaluate to `false`.

use crate::board::BoardState;
use crate::core::{AbilityId, Position, Unit};
use crate::rules::cooldown::CooldownLedger;
use std::fmt;

/// Everything a condition can see
pub struct EvalContext<'a> {
    pub board: &'a BoardState,
    pub ledger: &'a CooldownLedger,
    pub source: &'a Unit,
    pub target: Position,
}

/// Board-derived variables available to expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VarKind {
    StraightDistance,
    Distance,
    DiagonalDistance,
    MoveRange,
    AttackRange,
    Enemy,
    FaceDown,
    EnemyOrFaceDown,
    Empty,
    Ally,
    PathBlocked,
    DiagonalBlocked,
    Blocked,
}

/// A leaf operand: a variable, ledger counter, number, or bare word
#[derive(Debug, Clone, PartialEq)]
enum Term {
    Var(VarKind),
    TurnCounter(AbilityId),
    Number(i64),
    Word(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Le,
    Ge,
    Lt,
    Gt,
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq)]
enum Ast {
    /// Short-circuit AND over the `&&`-separated parts of one level
    All(Vec<Ast>),
    /// Short-circuit OR over the `||`-separated parts of one level
    Any(Vec<Ast>),
    Cmp { lhs: Term, op: CmpOp, rhs: Term },
    Atom(Term),
}

/// Evaluated operand value
enum Value {
    Num(i64),
    Word(String),
}

impl Value {
    fn from_bool(b: bool) -> Value {
        Value::Word(if b { "true" } else { "false" }.to_string())
    }

    fn as_num(&self) -> Option<i64> {
        match self {
            Value::Num(n) => Some(*n),
            Value::Word(w) => w.trim().parse().ok(),
        }
    }

    fn render(&self) -> String {
        match self {
            Value::Num(n) => n.to_string(),
            Value::Word(w) => w.clone(),
        }
    }
}

/// A compiled condition expression
///
/// Holds the source text and the parse result. An empty source is always
/// true; a source that failed to parse is always false.
#[derive(Debug, Clone)]
pub struct ConditionExpr {
    source: String,
    compiled: Compiled,
}

#[derive(Debug, Clone)]
enum Compiled {
    AlwaysTrue,
    Parsed(Ast),
    Invalid(String),
}

impl ConditionExpr {
    pub fn new(source: &str) -> Self {
        let trimmed = source.trim();
        let compiled = if trimmed.is_empty() {
            Compiled::AlwaysTrue
        } else {
            match parse_expr(trimmed) {
                Ok(ast) => Compiled::Parsed(ast),
                Err(err) => Compiled::Invalid(err),
            }
        };
        ConditionExpr {
            source: trimmed.to_string(),
            compiled,
        }
    }

    /// The empty condition, satisfied everywhere
    pub fn always_true() -> Self {
        ConditionExpr::new("")
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parse failure message, if the source was malformed
    pub fn parse_error(&self) -> Option<&str> {
        match &self.compiled {
            Compiled::Invalid(err) => Some(err),
            _ => None,
        }
    }

    /// Evaluate against a context. Pure: no side effects on board state.
    pub fn evaluate(&self, ctx: &EvalContext) -> bool {
        match &self.compiled {
            Compiled::AlwaysTrue => true,
            Compiled::Parsed(ast) => eval_ast(ast, ctx),
            Compiled::Invalid(_) => false,
        }
    }
}

impl fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

type ParseResult<T> = std::result::Result<T, String>;

fn parse_expr(s: &str) -> ParseResult<Ast> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty subexpression".to_string());
    }

    // && before || at every level; this ordering is the whole precedence story
    if let Some(parts) = split_top_level(s, "&&")? {
        let parsed: ParseResult<Vec<Ast>> = parts.iter().map(|p| parse_expr(p)).collect();
        return Ok(Ast::All(parsed?));
    }
    if let Some(parts) = split_top_level(s, "||")? {
        let parsed: ParseResult<Vec<Ast>> = parts.iter().map(|p| parse_expr(p)).collect();
        return Ok(Ast::Any(parsed?));
    }

    if let Some(inner) = strip_outer_parens(s)? {
        return parse_expr(inner);
    }

    if let Some((lhs, op, rhs)) = split_comparison(s)? {
        return Ok(Ast::Cmp {
            lhs: parse_term(lhs)?,
            op,
            rhs: parse_term(rhs)?,
        });
    }

    Ok(Ast::Atom(parse_term(s)?))
}

/// Split on a two-character operator at parenthesis depth zero
///
/// Returns None when the operator does not occur at this level.
fn split_top_level<'a>(s: &'a str, sep: &str) -> ParseResult<Option<Vec<&'a str>>> {
    let bytes = s.as_bytes();
    let sep_bytes = sep.as_bytes();
    let mut depth: i32 = 0;
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(format!("unbalanced parentheses in '{s}'"));
                }
            }
            _ => {
                if depth == 0 && bytes[i..].starts_with(sep_bytes) {
                    parts.push(&s[start..i]);
                    i += sep_bytes.len();
                    start = i;
                    continue;
                }
            }
        }
        i += 1;
    }
    if depth != 0 {
        return Err(format!("unbalanced parentheses in '{s}'"));
    }
    if parts.is_empty() {
        return Ok(None);
    }
    parts.push(&s[start..]);
    if parts.iter().any(|p| p.trim().is_empty()) {
        return Err(format!("dangling '{sep}' in '{s}'"));
    }
    Ok(Some(parts))
}

/// Strip one pair of parentheses wrapping the whole expression
fn strip_outer_parens(s: &str) -> ParseResult<Option<&str>> {
    if !s.starts_with('(') {
        return Ok(None);
    }
    let bytes = s.as_bytes();
    let mut depth = 0;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return if i == bytes.len() - 1 {
                        Ok(Some(&s[1..i]))
                    } else {
                        // a closing paren before the end means the parens do
                        // not wrap the whole expression
                        Ok(None)
                    };
                }
            }
            _ => {}
        }
    }
    Err(format!("unbalanced parentheses in '{s}'"))
}

/// Find exactly one comparison operator; more than one is malformed
fn split_comparison(s: &str) -> ParseResult<Option<(&str, CmpOp, &str)>> {
    let bytes = s.as_bytes();
    let mut found: Option<(usize, usize, CmpOp)> = None;
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        let two = if i + 1 < bytes.len() {
            &s[i..i + 2]
        } else {
            ""
        };
        let hit = match two {
            "<=" => Some((2, CmpOp::Le)),
            ">=" => Some((2, CmpOp::Ge)),
            "==" => Some((2, CmpOp::Eq)),
            "!=" => Some((2, CmpOp::Ne)),
            _ => match bytes[i] {
                b'<' => Some((1, CmpOp::Lt)),
                b'>' => Some((1, CmpOp::Gt)),
                _ => None,
            },
        };
        if let Some((len, op)) = hit {
            count += 1;
            if found.is_none() {
                found = Some((i, len, op));
            }
            i += len;
        } else {
            i += 1;
        }
    }
    match (found, count) {
        (None, _) => Ok(None),
        (Some((at, len, op)), 1) => Ok(Some((&s[..at], op, &s[at + len..]))),
        (Some(_), n) => Err(format!("{n} comparison operators in '{s}'")),
    }
}

fn parse_term(s: &str) -> ParseResult<Term> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty operand".to_string());
    }
    if s.contains('(') || s.contains(')') {
        return Err(format!("parenthesized operand '{s}'"));
    }
    if let Some(rest) = s.strip_prefix("TurnCounter[") {
        let id = rest
            .strip_suffix(']')
            .ok_or_else(|| format!("unterminated TurnCounter in '{s}'"))?;
        return Ok(Term::TurnCounter(AbilityId::new(id.trim())));
    }
    let var = match s {
        "StraightDistance" => Some(VarKind::StraightDistance),
        "Distance" => Some(VarKind::Distance),
        "DiagonalDistance" => Some(VarKind::DiagonalDistance),
        "MoveRange" => Some(VarKind::MoveRange),
        "AttackRange" => Some(VarKind::AttackRange),
        "Enemy" => Some(VarKind::Enemy),
        "FaceDown" => Some(VarKind::FaceDown),
        "EnemyOrFaceDown" => Some(VarKind::EnemyOrFaceDown),
        "Empty" => Some(VarKind::Empty),
        "Ally" => Some(VarKind::Ally),
        "PathBlocked" => Some(VarKind::PathBlocked),
        "DiagonalBlocked" => Some(VarKind::DiagonalBlocked),
        "Blocked" => Some(VarKind::Blocked),
        _ => None,
    };
    if let Some(kind) = var {
        return Ok(Term::Var(kind));
    }
    if let Ok(n) = s.parse::<i64>() {
        return Ok(Term::Number(n));
    }
    // unrecognized words survive as their own spelling and compare as strings
    Ok(Term::Word(s.to_string()))
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn eval_ast(ast: &Ast, ctx: &EvalContext) -> bool {
    match ast {
        Ast::All(parts) => parts.iter().all(|p| eval_ast(p, ctx)),
        Ast::Any(parts) => parts.iter().any(|p| eval_ast(p, ctx)),
        Ast::Cmp { lhs, op, rhs } => {
            let l = eval_term(lhs, ctx);
            let r = eval_term(rhs, ctx);
            match (l.as_num(), r.as_num()) {
                (Some(a), Some(b)) => compare(a, *op, b),
                _ => compare(l.render().as_str(), *op, r.render().as_str()),
            }
        }
        Ast::Atom(term) => eval_term(term, ctx).render() == "true",
    }
}

fn compare<T: PartialOrd + PartialEq>(a: T, op: CmpOp, b: T) -> bool {
    match op {
        CmpOp::Le => a <= b,
        CmpOp::Ge => a >= b,
        CmpOp::Lt => a < b,
        CmpOp::Gt => a > b,
        CmpOp::Eq => a == b,
        CmpOp::Ne => a != b,
    }
}

fn eval_term(term: &Term, ctx: &EvalContext) -> Value {
    match term {
        Term::Number(n) => Value::Num(*n),
        Term::Word(w) => Value::Word(w.clone()),
        Term::TurnCounter(id) => Value::Num(ctx.ledger.get(ctx.source.id, id) as i64),
        Term::Var(kind) => eval_var(*kind, ctx),
    }
}

fn eval_var(kind: VarKind, ctx: &EvalContext) -> Value {
    let src = ctx.source.position;
    let dst = ctx.target;
    match kind {
        VarKind::StraightDistance => {
            if src.is_axis_aligned(dst) {
                Value::Num(src.chebyshev(dst) as i64)
            } else {
                Value::Word("infinite".to_string())
            }
        }
        VarKind::Distance => Value::Num(src.manhattan(dst) as i64),
        VarKind::DiagonalDistance => {
            if src.is_diagonal(dst) {
                Value::Num(src.chebyshev(dst) as i64)
            } else {
                Value::Word("infinite".to_string())
            }
        }
        VarKind::MoveRange => Value::Num(ctx.source.move_range as i64),
        VarKind::AttackRange => Value::Num(ctx.source.attack_range as i64),
        VarKind::Enemy => Value::from_bool(is_enemy(ctx)),
        VarKind::FaceDown => Value::from_bool(is_face_down(ctx)),
        VarKind::EnemyOrFaceDown => Value::from_bool(is_enemy(ctx) || is_face_down(ctx)),
        VarKind::Empty => Value::from_bool(ctx.board.is_empty(dst)),
        VarKind::Ally => Value::from_bool(is_ally(ctx)),
        VarKind::PathBlocked => Value::from_bool(path_blocked(ctx)),
        VarKind::DiagonalBlocked => Value::from_bool(diagonal_blocked(ctx)),
        VarKind::Blocked => Value::from_bool(path_blocked(ctx) || diagonal_blocked(ctx)),
    }
}

fn is_enemy(ctx: &EvalContext) -> bool {
    ctx.board
        .unit_at(ctx.target)
        .is_some_and(|u| u.owner != ctx.source.owner && !u.face_down)
}

fn is_face_down(ctx: &EvalContext) -> bool {
    ctx.board.unit_at(ctx.target).is_some_and(|u| u.face_down)
}

fn is_ally(ctx: &EvalContext) -> bool {
    ctx.board
        .unit_at(ctx.target)
        .is_some_and(|u| u.owner == ctx.source.owner && !u.face_down)
}

/// Straight-line occupancy between source and target; true when the pair is
/// not axis-aligned at all
fn path_blocked(ctx: &EvalContext) -> bool {
    let src = ctx.source.position;
    let dst = ctx.target;
    if src == dst {
        return false;
    }
    if !src.is_axis_aligned(dst) {
        return true;
    }
    let (sx, sy) = src.signum_toward(dst);
    let mut cur = src.offset(sx, sy);
    while cur != dst {
        if ctx.board.is_occupied(cur) {
            return true;
        }
        cur = cur.offset(sx, sy);
    }
    false
}

/// Diagonal occupancy plus corner blocking; true when the pair is not on an
/// exact diagonal. A diagonal step is pinched shut when either orthogonal
/// corner cell beside it is occupied.
fn diagonal_blocked(ctx: &EvalContext) -> bool {
    let src = ctx.source.position;
    let dst = ctx.target;
    if !src.is_diagonal(dst) {
        return true;
    }
    let (sx, sy) = src.signum_toward(dst);
    let mut cur = src;
    loop {
        let next = cur.offset(sx, sy);
        if ctx.board.is_occupied(Position::new(cur.x + sx, cur.y))
            || ctx.board.is_occupied(Position::new(cur.x, cur.y + sy))
        {
            return true;
        }
        if next == dst {
            return false;
        }
        if ctx.board.is_occupied(next) {
            return true;
        }
        cur = next;
    }
}
