//! Stack machine for organism-written snippets.
//!
//! A snippet is a whitespace or `;` separated list of ops:
//!
//! ```text
//! load exploration_bias; push 0.9; mul; store exploration_bias
//! ```
//!
//! The op set is closed. `store` may only target a [`Tunable`], every value is
//! clamped to the tunable's range, and execution stops after a fixed number of
//! ops. A run works on a scratch copy of the parameters; on any violation the
//! scratch copy is dropped and nothing changes.

use genesis_data::{BehaviorDiff, BehaviorParams, Tunable};
use thiserror::Error;

/// Substrings that reject a snippet outright.
pub const FORBIDDEN_TOKENS: [&str; 10] = [
    "open", "exec", "eval", "net", "import", "spawn", "file", "socket", "process", "system",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SandboxViolation {
    #[error("forbidden token `{0}`")]
    Forbidden(String),
    #[error("unknown op `{0}`")]
    UnknownOp(String),
    #[error("malformed operand `{0}`")]
    BadOperand(String),
    #[error("`{0}` is not a tunable")]
    NotTunable(String),
    #[error("stack underflow at op {0}")]
    StackUnderflow(usize),
    #[error("op budget of {0} exceeded")]
    BudgetExceeded(usize),
    #[error("non-finite value at op {0}")]
    NonFinite(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Push(f32),
    Load(Tunable),
    Store(Tunable),
    Add,
    Sub,
    Mul,
    Min,
    Max,
    /// Pops `hi`, `lo`, `x` and pushes `x` clamped to `[lo, hi]`.
    Clamp,
    Dup,
    Swap,
}

fn pop(stack: &mut Vec<f32>, pc: usize) -> Result<f32, SandboxViolation> {
    stack.pop().ok_or(SandboxViolation::StackUnderflow(pc))
}

fn screen(token: &str) -> Result<(), SandboxViolation> {
    let lower = token.to_ascii_lowercase();
    match FORBIDDEN_TOKENS.iter().find(|f| lower.contains(*f)) {
        Some(_) => Err(SandboxViolation::Forbidden(token.to_string())),
        None => Ok(()),
    }
}

fn tunable(token: Option<&str>) -> Result<Tunable, SandboxViolation> {
    let name = token.ok_or_else(|| SandboxViolation::BadOperand(String::new()))?;
    screen(name)?;
    name.parse()
        .map_err(|_| SandboxViolation::NotTunable(name.to_string()))
}

/// Parses a snippet. Forbidden tokens are reported before anything else.
pub fn parse(source: &str) -> Result<Vec<Op>, SandboxViolation> {
    let tokens: Vec<&str> = source
        .split(|c: char| c.is_whitespace() || c == ';')
        .filter(|t| !t.is_empty())
        .collect();
    for token in &tokens {
        screen(token)?;
    }

    let mut ops = Vec::new();
    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        let op = match token {
            "push" => {
                let raw = iter
                    .next()
                    .ok_or_else(|| SandboxViolation::BadOperand("push".into()))?;
                let v: f32 = raw
                    .parse()
                    .map_err(|_| SandboxViolation::BadOperand(raw.to_string()))?;
                if !v.is_finite() {
                    return Err(SandboxViolation::BadOperand(raw.to_string()));
                }
                Op::Push(v)
            }
            "load" => Op::Load(tunable(iter.next())?),
            "store" => Op::Store(tunable(iter.next())?),
            "add" => Op::Add,
            "sub" => Op::Sub,
            "mul" => Op::Mul,
            "min" => Op::Min,
            "max" => Op::Max,
            "clamp" => Op::Clamp,
            "dup" => Op::Dup,
            "swap" => Op::Swap,
            other => return Err(SandboxViolation::UnknownOp(other.to_string())),
        };
        ops.push(op);
    }
    Ok(ops)
}

/// Executes a program against a scratch copy of `params` and returns the
/// resulting diff.
pub fn run(
    program: &[Op],
    params: &BehaviorParams,
    op_budget: usize,
) -> Result<BehaviorDiff, SandboxViolation> {
    if program.len() > op_budget {
        return Err(SandboxViolation::BudgetExceeded(op_budget));
    }
    let mut scratch = *params;
    let mut stack: Vec<f32> = Vec::with_capacity(8);

    for (pc, op) in program.iter().enumerate() {
        let pushed = match *op {
            Op::Push(v) => Some(v),
            Op::Load(t) => Some(scratch.get(t)),
            Op::Store(t) => {
                let v = pop(&mut stack, pc)?;
                let (lo, hi) = t.range();
                scratch.set(t, v.clamp(lo, hi));
                None
            }
            Op::Add | Op::Sub | Op::Mul | Op::Min | Op::Max => {
                let b = pop(&mut stack, pc)?;
                let a = pop(&mut stack, pc)?;
                Some(match op {
                    Op::Add => a + b,
                    Op::Sub => a - b,
                    Op::Mul => a * b,
                    Op::Min => a.min(b),
                    _ => a.max(b),
                })
            }
            Op::Clamp => {
                let hi = pop(&mut stack, pc)?;
                let lo = pop(&mut stack, pc)?;
                let x = pop(&mut stack, pc)?;
                Some(x.clamp(lo.min(hi), lo.max(hi)))
            }
            Op::Dup => {
                let v = pop(&mut stack, pc)?;
                stack.push(v);
                Some(v)
            }
            Op::Swap => {
                let b = pop(&mut stack, pc)?;
                let a = pop(&mut stack, pc)?;
                stack.push(b);
                Some(a)
            }
        };
        if let Some(v) = pushed {
            if !v.is_finite() {
                return Err(SandboxViolation::NonFinite(pc));
            }
            stack.push(v);
        }
    }

    let deltas = Tunable::ALL
        .into_iter()
        .filter_map(|t| {
            let d = scratch.get(t) - params.get(t);
            (d != 0.0).then_some((t, d))
        })
        .collect();
    Ok(BehaviorDiff {
        deltas,
        strategy: None,
    })
}

/// Parses and runs in one step.
pub fn evaluate(
    source: &str,
    params: &BehaviorParams,
    op_budget: usize,
) -> Result<BehaviorDiff, SandboxViolation> {
    run(&parse(source)?, params, op_budget)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_is_clamped_to_range() {
        let params = BehaviorParams::default();
        let diff = evaluate("push 7; store exploration_bias", &params, 16).unwrap();
        assert_eq!(diff.deltas.len(), 1);
        let (t, d) = diff.deltas[0];
        assert_eq!(t, Tunable::ExplorationBias);
        assert!((params.exploration_bias + d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_arithmetic_program() {
        let params = BehaviorParams::default();
        let src = "load learning_rate dup add push 0.01 push 0.3 clamp store learning_rate";
        let diff = evaluate(src, &params, 16).unwrap();
        assert!((diff.deltas[0].1 - params.learning_rate).abs() < 1e-6);
    }

    #[test]
    fn test_forbidden_tokens_fail_closed() {
        let params = BehaviorParams::default();
        for src in ["open /etc/passwd", "push 1; exec", "import os", "spawn", "load network"] {
            assert!(matches!(
                evaluate(src, &params, 16),
                Err(SandboxViolation::Forbidden(_))
            ));
        }
    }

    #[test]
    fn test_structural_violations() {
        let params = BehaviorParams::default();
        assert_eq!(
            evaluate("add", &params, 16),
            Err(SandboxViolation::StackUnderflow(0))
        );
        assert!(matches!(
            evaluate("jump 3", &params, 16),
            Err(SandboxViolation::UnknownOp(_))
        ));
        assert!(matches!(
            evaluate("push 1; store energy", &params, 16),
            Err(SandboxViolation::NotTunable(_))
        ));
        assert_eq!(
            evaluate("push 1 push 1 add", &params, 2),
            Err(SandboxViolation::BudgetExceeded(2))
        );
    }

    #[test]
    fn test_read_only_program_has_empty_diff() {
        let params = BehaviorParams::default();
        let diff = evaluate("load teach_threshold dup mul", &params, 16).unwrap();
        assert!(diff.is_empty());
    }
}
