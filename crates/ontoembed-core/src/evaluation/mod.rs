//! Evaluation of trained models
//!
//! Like embedding, evaluation is external. This module describes what an
//! evaluator is handed ([`EvalRequest`]), what it reports back
//! ([`EvalReport`], [`Performance`]) and how to run one as a program
//! ([`CommandEvaluator`]).

mod evaluator;

pub use self::evaluator::*;
