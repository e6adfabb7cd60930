use crate::config::{ServerConfig, DEFAULT_REQUIRED_PACKAGES};
use crate::recipe::{ContainerRecipe, InstructionKind, RecipeContract};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCode {
    DuplicatedKeyword,
    UnknownInstruction,
    MissingBaseImage,
    MissingPackage,
    PipCacheRetained,
    MissingPort,
    MissingEntrypoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub code: FindingCode,
    pub severity: Severity,
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} (line {}): {}", self.severity, line, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    Fails { reasons: Vec<String> },
    Succeeds { packages: Vec<String> },
}

/// Packages the running application needs inside the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirements {
    pub packages: Vec<String>,
}

impl Default for Requirements {
    fn default() -> Self {
        Self {
            packages: DEFAULT_REQUIRED_PACKAGES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl Requirements {
    pub fn new<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            packages: packages
                .into_iter()
                .map(|p| p.into().to_ascii_lowercase())
                .collect(),
        }
    }
}

impl From<&ServerConfig> for Requirements {
    fn from(config: &ServerConfig) -> Self {
        Self::new(config.required_packages.iter().cloned())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeReport {
    pub contract: RecipeContract,
    pub findings: Vec<Finding>,
}

impl RecipeReport {
    pub fn outcome(&self) -> BuildOutcome {
        let reasons: Vec<String> = self
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .map(|f| f.to_string())
            .collect();

        if reasons.is_empty() {
            BuildOutcome::Succeeds {
                packages: self.contract.packages(),
            }
        } else {
            BuildOutcome::Fails { reasons }
        }
    }

    pub fn builds(&self) -> bool {
        matches!(self.outcome(), BuildOutcome::Succeeds { .. })
    }

    pub fn has(&self, code: FindingCode) -> bool {
        self.findings.iter().any(|f| f.code == code)
    }
}

pub fn check(recipe: &ContainerRecipe, requirements: &Requirements) -> RecipeReport {
    let contract = recipe.contract();
    let mut findings = Vec::new();

    for instruction in &recipe.instructions {
        if let InstructionKind::Unknown(keyword) = &instruction.kind {
            findings.push(Finding {
                code: FindingCode::UnknownInstruction,
                severity: Severity::Error,
                line: Some(instruction.line),
                message: format!("unknown instruction: {}", keyword),
            });
            continue;
        }

        // 只有交給 shell 執行的指令才會把重複的關鍵字當成命令
        let shell_executed = matches!(
            instruction.kind,
            InstructionKind::Run | InstructionKind::Cmd | InstructionKind::Entrypoint
        ) && instruction.exec_form().is_none();
        let repeated = shell_executed
            && instruction
                .first_arg()
                .is_some_and(|arg| arg.eq_ignore_ascii_case(instruction.kind.keyword()));
        if repeated {
            // RUN 會在建置時執行失敗; CMD/ENTRYPOINT 要到容器啟動才失敗
            let severity = if instruction.kind == InstructionKind::Run {
                Severity::Error
            } else {
                Severity::Warning
            };
            findings.push(Finding {
                code: FindingCode::DuplicatedKeyword,
                severity,
                line: Some(instruction.line),
                message: format!(
                    "duplicated keyword '{} {}': the shell will try to run '{}' as a command",
                    instruction.kind,
                    instruction.kind,
                    instruction.kind
                ),
            });
        }
    }

    if contract.base_image.is_none() {
        findings.push(Finding {
            code: FindingCode::MissingBaseImage,
            severity: Severity::Error,
            line: None,
            message: "no FROM instruction".to_string(),
        });
    }

    let installed = contract.packages();
    for package in &requirements.packages {
        if !installed.contains(package) {
            findings.push(Finding {
                code: FindingCode::MissingPackage,
                severity: Severity::Warning,
                line: None,
                message: format!("required package '{}' is never installed", package),
            });
        }
    }

    for install in contract.pip_installs.iter().filter(|i| !i.no_cache) {
        findings.push(Finding {
            code: FindingCode::PipCacheRetained,
            severity: Severity::Info,
            line: Some(install.line),
            message: "pip install without --no-cache-dir keeps the download cache in the image"
                .to_string(),
        });
    }

    if contract.port.is_none() {
        findings.push(Finding {
            code: FindingCode::MissingPort,
            severity: Severity::Warning,
            line: None,
            message: "neither ENV PORT nor EXPOSE declares a listening port".to_string(),
        });
    }

    if contract.entrypoint.is_none() {
        findings.push(Finding {
            code: FindingCode::MissingEntrypoint,
            severity: Severity::Error,
            line: None,
            message: "no CMD or ENTRYPOINT".to_string(),
        });
    }

    RecipeReport { contract, findings }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(content: &str) -> RecipeReport {
        check(
            &ContainerRecipe::parse(content).unwrap(),
            &Requirements::default(),
        )
    }

    #[test]
    fn test_duplicated_run_fails_build() {
        let report = report(
            "FROM python:3.11-slim\nWORKDIR /app\nCOPY main.py .\nRUN RUN pip install flask twilio\nENV PORT=8080\nCMD [\"python\", \"main.py\"]\n",
        );

        assert!(report.has(FindingCode::DuplicatedKeyword));
        match report.outcome() {
            BuildOutcome::Fails { reasons } => {
                assert_eq!(reasons.len(), 1);
                assert!(reasons[0].contains("line 4"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicated_cmd_is_only_warning() {
        let report = report("FROM python:3.11\nRUN pip install --no-cache-dir flask twilio\nENV PORT=8080\nCMD CMD python main.py\n");

        let finding = report
            .findings
            .iter()
            .find(|f| f.code == FindingCode::DuplicatedKeyword)
            .unwrap();
        assert_eq!(finding.severity, Severity::Warning);
        assert!(report.builds());
    }

    #[test]
    fn test_clean_recipe_has_no_findings() {
        let report = report("FROM python:3.11\nRUN pip install --no-cache-dir flask twilio\nENV PORT=8080\nCMD [\"python\", \"main.py\"]\n");

        assert!(report.findings.is_empty(), "{:?}", report.findings);
        assert_eq!(
            report.outcome(),
            BuildOutcome::Succeeds {
                packages: vec!["flask".to_string(), "twilio".to_string()]
            }
        );
    }

    #[test]
    fn test_missing_everything() {
        let report = report("RUN echo hi\n");

        assert!(report.has(FindingCode::MissingBaseImage));
        assert!(report.has(FindingCode::MissingEntrypoint));
        assert!(report.has(FindingCode::MissingPort));
        assert_eq!(
            report
                .findings
                .iter()
                .filter(|f| f.code == FindingCode::MissingPackage)
                .count(),
            2
        );
        assert!(!report.builds());
    }

    #[test]
    fn test_unknown_instruction_fails() {
        let report = report("FROM python:3.11\nINSTALL flask\nENV PORT=8080\nCMD [\"python\"]\n");
        assert!(report.has(FindingCode::UnknownInstruction));
        assert!(!report.builds());
    }

    #[test]
    fn test_custom_requirements() {
        let recipe = ContainerRecipe::parse("FROM python:3.11\nRUN pip install flask\nENV PORT=8080\nCMD [\"python\", \"main.py\"]\n").unwrap();

        let strict = check(&recipe, &Requirements::new(["flask", "Twilio"]));
        assert!(strict.has(FindingCode::MissingPackage));

        let relaxed = check(&recipe, &Requirements::new(["flask"]));
        assert!(!relaxed.has(FindingCode::MissingPackage));
        assert!(relaxed.has(FindingCode::PipCacheRetained));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let outcome = BuildOutcome::Succeeds {
            packages: vec!["flask".to_string()],
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "succeeds");
        assert_eq!(json["packages"][0], "flask");
    }

    #[test]
    fn test_legacy_env_named_env_is_not_duplicated_keyword() {
        let report = report("FROM python:3.11\nENV ENV production\nRUN pip install --no-cache-dir flask twilio\nENV PORT=8080\nCMD [\"python\", \"main.py\"]\n");

        assert!(!report.has(FindingCode::DuplicatedKeyword));
        assert_eq!(report.contract.env_var("ENV"), Some("production"));
        assert!(report.findings.is_empty(), "{:?}", report.findings);
    }

    #[test]
    fn test_final_stage_without_packages_reports_them_missing() {
        let report = report("FROM python:3.11 AS build\nENV PORT=8080\nRUN pip install --no-cache-dir flask twilio\nFROM debian:bookworm-slim\nCMD [\"/app\"]\n");

        let missing = report
            .findings
            .iter()
            .filter(|f| f.code == FindingCode::MissingPackage)
            .count();
        assert_eq!(missing, 2);
        assert!(report.has(FindingCode::MissingPort));
        assert_eq!(
            report.outcome(),
            BuildOutcome::Succeeds { packages: vec![] }
        );
    }
}
