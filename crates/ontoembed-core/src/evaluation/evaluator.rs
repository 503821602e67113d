use std::ffi::OsStr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::embedding::{Algorithm, ExternalCommand};
use crate::error::{Error, Result};
use crate::storage::{Namespace, Splits};

/// A trained model plus the data it is scored against
#[derive(Debug, Clone, Copy)]
pub struct EvalRequest<'a> {
    pub ontology: &'a Namespace,
    pub algorithm: Algorithm,
    /// Classifier name, passed through untouched
    pub classifier: &'a str,
    pub ontology_dir: &'a Path,
    pub model_path: &'a Path,
    /// Split files for the requested variant, already loaded
    pub splits: &'a Splits,
}

/// Ranking metrics over the test split
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Performance {
    pub mrr: f64,
    pub hit_at_1: f64,
    pub hit_at_5: f64,
    pub hit_at_10: f64,
    /// Test rows whose true answer ranked outside the top ten
    pub garbage: u64,
    pub total: u64,
    #[serde(alias = "average_Rank")]
    pub average_rank: f64,
    #[serde(alias = "average_garbage_Rank")]
    pub average_garbage_rank: f64,
}

/// What an evaluator reports back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<Performance>,
}

impl EvalReport {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            performance: None,
        }
    }
}

/// A model evaluator, opaque to the store
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, request: &EvalRequest<'_>) -> Result<EvalReport>;
}

impl<F> Evaluator for F
where
    F: Fn(&EvalRequest<'_>) -> Result<EvalReport> + Send + Sync,
{
    fn evaluate(&self, request: &EvalRequest<'_>) -> Result<EvalReport> {
        self(request)
    }
}

/// Runs an external evaluation program
///
/// Invoked as `<program> <args...> <ontology-dir> <algorithm> <classifier> <model-path>`.
/// The program finds the split files in `<ontology-dir>` itself. If stdout
/// is a JSON object it is read as [`Performance`], otherwise it becomes the
/// report message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEvaluator {
    command: ExternalCommand,
}

impl CommandEvaluator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: ExternalCommand {
                program: program.into(),
                args,
            },
        }
    }

    /// Build from a whitespace-separated command line
    pub fn from_command_line(command: &str) -> Result<Self> {
        Ok(Self {
            command: ExternalCommand::parse(command, "evaluation.command")?,
        })
    }

    pub fn program(&self) -> &str {
        &self.command.program
    }
}

impl Evaluator for CommandEvaluator {
    fn evaluate(&self, request: &EvalRequest<'_>) -> Result<EvalReport> {
        debug!(
            ontology = %request.ontology,
            algorithm = %request.algorithm,
            classifier = request.classifier,
            "Running evaluation command"
        );
        let stdout = self
            .command
            .run([
                request.ontology_dir.as_os_str(),
                OsStr::new(request.algorithm.as_str()),
                OsStr::new(request.classifier),
                request.model_path.as_os_str(),
            ])
            .map_err(|reason| Error::EvaluationFailed {
                algorithm: request.algorithm.as_str().to_string(),
                classifier: request.classifier.to_string(),
                reason,
            })?;

        info!(ontology = %request.ontology, algorithm = %request.algorithm, "Evaluation command finished");
        let default_message = || {
            format!(
                "Evaluated {} with {}",
                request.algorithm.display_name(),
                request.classifier
            )
        };
        if stdout.is_empty() {
            return Ok(EvalReport::message(default_message()));
        }
        if stdout.starts_with('{') {
            if let Ok(performance) = serde_json::from_str::<Performance>(&stdout) {
                return Ok(EvalReport {
                    message: default_message(),
                    performance: Some(performance),
                });
            }
        }
        Ok(EvalReport::message(stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splits() -> Splits {
        Splits::new(
            vec![vec!["a".to_string(), "b".to_string()]],
            Vec::new(),
            vec![vec!["c".to_string(), "d".to_string()]],
        )
    }

    fn counts_test_rows(request: &EvalRequest<'_>) -> Result<EvalReport> {
        Ok(EvalReport::message(format!("{} test rows", request.splits.test.len())))
    }

    #[test]
    fn test_plain_functions_are_evaluators() {
        let namespace = Namespace::parse("go").unwrap();
        let splits = splits();
        let request = EvalRequest {
            ontology: &namespace,
            algorithm: Algorithm::Opa2Vec,
            classifier: "rf",
            ontology_dir: Path::new("storage/go"),
            model_path: Path::new("storage/go/opa2vec/model"),
            splits: &splits,
        };

        let evaluator: &dyn Evaluator = &counts_test_rows;
        assert_eq!(evaluator.evaluate(&request).unwrap().message, "1 test rows");
    }

    #[test]
    fn test_performance_accepts_mixed_case_keys() {
        let performance: Performance =
            serde_json::from_str(r#"{"mrr": 0.5, "hit_at_1": 0.25, "total": 8, "average_Rank": 3.5}"#).unwrap();
        assert_eq!(performance.mrr, 0.5);
        assert_eq!(performance.total, 8);
        assert_eq!(performance.average_rank, 3.5);
        assert_eq!(performance.garbage, 0);
    }

    #[test]
    fn test_command_line_parsing() {
        let evaluator = CommandEvaluator::from_command_line("python3 eval.py").unwrap();
        assert_eq!(evaluator.program(), "python3");
        assert_eq!(
            evaluator,
            CommandEvaluator::new("python3", vec!["eval.py".to_string()])
        );
        assert!(matches!(
            CommandEvaluator::from_command_line(""),
            Err(Error::ConfigError(ref msg)) if msg == "evaluation.command is empty"
        ));
    }

    #[cfg(unix)]
    fn run(script: &str) -> Result<EvalReport> {
        let namespace = Namespace::parse("pizza").unwrap();
        let splits = splits();
        // $0 is the first positional after the script, so $3 is the classifier
        let evaluator = CommandEvaluator::new(
            "sh",
            vec!["-c".to_string(), script.to_string(), "eval".to_string()],
        );
        evaluator.evaluate(&EvalRequest {
            ontology: &namespace,
            algorithm: Algorithm::Rdf2Vec,
            classifier: "svm",
            ontology_dir: Path::new("storage/pizza"),
            model_path: Path::new("storage/pizza/rdf2vec/model"),
            splits: &splits,
        })
    }

    #[cfg(unix)]
    #[test]
    fn test_command_evaluator_passes_arguments() {
        let report = run(r#"echo "$2 $3 $4""#).unwrap();
        assert_eq!(report.message, "rdf2vec svm storage/pizza/rdf2vec/model");
        assert!(report.performance.is_none());

        let report = run("true").unwrap();
        assert_eq!(report.message, "Evaluated RDF2Vec with svm");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_evaluator_reads_metrics() {
        let report = run(r#"echo '{"mrr": 0.75, "hit_at_10": 1.0, "total": 4}'"#).unwrap();
        assert_eq!(report.message, "Evaluated RDF2Vec with svm");
        let performance = report.performance.unwrap();
        assert_eq!(performance.mrr, 0.75);
        assert_eq!(performance.hit_at_10, 1.0);
        assert_eq!(performance.total, 4);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_evaluator_reports_failure() {
        let err = run("echo 'no test rows' >&2; exit 1").unwrap_err();
        assert!(matches!(
            err,
            Error::EvaluationFailed { ref algorithm, ref classifier, ref reason }
                if algorithm == "rdf2vec" && classifier == "svm" && reason == "no test rows"
        ));
        assert_eq!(err.code(), "E302");
    }
}
