//! Container recipe (Dockerfile) model and the contract it declares

pub mod check;
pub mod parser;

use crate::utils::error::Result;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

pub use check::{check, BuildOutcome, Finding, FindingCode, RecipeReport, Requirements, Severity};
pub use parser::{Instruction, InstructionKind};

#[derive(Debug, Clone, Serialize)]
pub struct ContainerRecipe {
    pub instructions: Vec<Instruction>,
}

/// A single `pip install` invocation found in a RUN instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipInstall {
    pub line: usize,
    pub packages: Vec<String>,
    pub no_cache: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entrypoint {
    pub line: usize,
    pub exec_form: bool,
    pub argv: Vec<String>,
}

/// What the image promises to whoever runs it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecipeContract {
    pub base_image: Option<String>,
    pub workdir: Option<String>,
    pub copied_sources: Vec<String>,
    pub pip_installs: Vec<PipInstall>,
    pub env: Vec<(String, String)>,
    pub port: Option<u16>,
    pub entrypoint: Option<Entrypoint>,
}

impl RecipeContract {
    /// Installed packages in first-seen order, without duplicates.
    pub fn packages(&self) -> Vec<String> {
        let mut packages: Vec<String> = Vec::new();
        for install in &self.pip_installs {
            for package in &install.packages {
                if !packages.contains(package) {
                    packages.push(package.clone());
                }
            }
        }
        packages
    }

    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl ContainerRecipe {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(Self {
            instructions: parser::parse_instructions(content)?,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn contract(&self) -> RecipeContract {
        // 每個 FROM 開始新的建置階段, 只有最後一個階段進入映像
        let mut stages: HashMap<String, Stage> = HashMap::new();
        let mut current = Stage::default();
        let mut current_alias: Option<String> = None;

        for instruction in &self.instructions {
            match instruction.kind {
                InstructionKind::From => {
                    if let Some(alias) = current_alias.take() {
                        stages.insert(alias, current.clone());
                    }

                    let (image, alias) = from_target(&instruction.args);
                    current = match image.as_ref().and_then(|i| stages.get(&i.to_ascii_lowercase())) {
                        Some(parent) => parent.clone(),
                        None => Stage {
                            contract: RecipeContract {
                                base_image: image,
                                ..Default::default()
                            },
                            exposed: None,
                        },
                    };
                    current_alias = alias;
                }
                InstructionKind::Workdir => {
                    current.contract.workdir = Some(instruction.args.clone())
                }
                InstructionKind::Copy | InstructionKind::Add => {
                    current
                        .contract
                        .copied_sources
                        .extend(copy_sources(instruction));
                }
                InstructionKind::Run => {
                    current
                        .contract
                        .pip_installs
                        .extend(pip_installs(instruction.line, &instruction.args));
                }
                InstructionKind::Env => current.contract.env.extend(env_pairs(&instruction.args)),
                InstructionKind::Expose => {
                    if current.exposed.is_none() {
                        current.exposed = instruction
                            .first_arg()
                            .and_then(|p| p.split('/').next())
                            .and_then(|p| p.parse().ok());
                    }
                }
                InstructionKind::Cmd | InstructionKind::Entrypoint => {
                    current.contract.entrypoint = Some(entrypoint(instruction));
                }
                _ => {}
            }
        }

        let Stage {
            mut contract,
            exposed,
        } = current;
        contract.port = contract
            .env_var("PORT")
            .and_then(|p| p.parse().ok())
            .or(exposed);

        contract
    }
}

#[derive(Debug, Clone, Default)]
struct Stage {
    contract: RecipeContract,
    exposed: Option<u16>,
}

/// `--platform=x image AS name` -> (`image`, `name`)
fn from_target(args: &str) -> (Option<String>, Option<String>) {
    let tokens: Vec<&str> = args
        .split_whitespace()
        .filter(|token| !token.starts_with("--"))
        .collect();

    let image = tokens.first().map(|t| t.to_string());
    let alias = match tokens.as_slice() {
        [_, keyword, name, ..] if keyword.eq_ignore_ascii_case("as") => {
            Some(name.to_ascii_lowercase())
        }
        _ => None,
    };
    (image, alias)
}

fn copy_sources(instruction: &Instruction) -> Vec<String> {
    let mut parts = instruction.exec_form().unwrap_or_else(|| {
        instruction
            .args
            .split_whitespace()
            .filter(|token| !token.starts_with("--"))
            .map(str::to_string)
            .collect()
    });
    // 最後一個是目的地
    parts.pop();
    parts
}

/// Flags whose value is the following token.
const PIP_FLAGS_WITH_VALUE: &[&str] = &[
    "-r",
    "--requirement",
    "-c",
    "--constraint",
    "-i",
    "--index-url",
    "--extra-index-url",
    "-f",
    "--find-links",
    "-t",
    "--target",
    "-e",
    "--editable",
    "--prefix",
    "--root",
    "--src",
    "--cache-dir",
    "--platform",
    "--python-version",
    "--implementation",
    "--abi",
    "--trusted-host",
    "--proxy",
];

fn pip_installs(line: usize, script: &str) -> Vec<PipInstall> {
    let mut installs = Vec::new();

    for segment in script.split(|c| c == ';' || c == '&' || c == '|') {
        let tokens: Vec<&str> = segment.split_whitespace().collect();
        let Some(install_at) = tokens.windows(2).position(|pair| {
            matches!(pair[0], "pip" | "pip3") && pair[1] == "install"
        }) else {
            continue;
        };

        let mut packages = Vec::new();
        let mut no_cache = false;
        let mut skip_next = false;

        for token in &tokens[install_at + 2..] {
            if skip_next {
                skip_next = false;
                continue;
            }
            if *token == "--no-cache-dir" {
                no_cache = true;
            } else if PIP_FLAGS_WITH_VALUE.contains(token) {
                skip_next = true;
            } else if !token.starts_with('-') {
                packages.push(package_name(token));
            }
        }

        installs.push(PipInstall {
            line,
            packages,
            no_cache,
        });
    }

    installs
}

/// `Flask==3.0.0` -> `flask`, `twilio[async]>=9` -> `twilio`
fn package_name(requirement: &str) -> String {
    let unquoted = requirement.trim_matches(|c| c == '"' || c == '\'');
    let end = unquoted
        .find(|c: char| matches!(c, '=' | '<' | '>' | '!' | '~' | '[' | ';' | '@'))
        .unwrap_or(unquoted.len());
    unquoted[..end].trim().to_ascii_lowercase()
}

fn env_pair_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"([A-Za-z_][A-Za-z0-9_.-]*)=("[^"]*"|'[^']*'|\S*)"#).expect("valid regex")
    })
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return value[1..value.len() - 1].to_string();
        }
    }
    value.to_string()
}

fn env_pairs(args: &str) -> Vec<(String, String)> {
    let first = args.split_whitespace().next().unwrap_or_default();

    if first.contains('=') {
        env_pair_pattern()
            .captures_iter(args)
            .map(|caps| (caps[1].to_string(), unquote(&caps[2])))
            .collect()
    } else {
        // 舊語法: ENV KEY value with spaces
        match args.split_once(char::is_whitespace) {
            Some((key, value)) => vec![(key.to_string(), unquote(value.trim()))],
            None => Vec::new(),
        }
    }
}

fn entrypoint(instruction: &Instruction) -> Entrypoint {
    match instruction.exec_form() {
        Some(argv) => Entrypoint {
            line: instruction.line,
            exec_form: true,
            argv,
        },
        None => Entrypoint {
            line: instruction.line,
            exec_form: false,
            argv: vec![
                "/bin/sh".to_string(),
                "-c".to_string(),
                instruction.args.clone(),
            ],
        },
    }
}
