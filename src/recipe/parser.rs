//! Line-level Dockerfile parsing

use crate::utils::error::{AlertError, Result};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum InstructionKind {
    From,
    Workdir,
    Copy,
    Add,
    Run,
    Env,
    Arg,
    Expose,
    Label,
    User,
    Volume,
    Healthcheck,
    Shell,
    StopSignal,
    OnBuild,
    Maintainer,
    Cmd,
    Entrypoint,
    Unknown(String),
}

impl InstructionKind {
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_uppercase().as_str() {
            "FROM" => InstructionKind::From,
            "WORKDIR" => InstructionKind::Workdir,
            "COPY" => InstructionKind::Copy,
            "ADD" => InstructionKind::Add,
            "RUN" => InstructionKind::Run,
            "ENV" => InstructionKind::Env,
            "ARG" => InstructionKind::Arg,
            "EXPOSE" => InstructionKind::Expose,
            "LABEL" => InstructionKind::Label,
            "USER" => InstructionKind::User,
            "VOLUME" => InstructionKind::Volume,
            "HEALTHCHECK" => InstructionKind::Healthcheck,
            "SHELL" => InstructionKind::Shell,
            "STOPSIGNAL" => InstructionKind::StopSignal,
            "ONBUILD" => InstructionKind::OnBuild,
            "MAINTAINER" => InstructionKind::Maintainer,
            "CMD" => InstructionKind::Cmd,
            "ENTRYPOINT" => InstructionKind::Entrypoint,
            other => InstructionKind::Unknown(other.to_string()),
        }
    }

    pub fn keyword(&self) -> &str {
        match self {
            InstructionKind::From => "FROM",
            InstructionKind::Workdir => "WORKDIR",
            InstructionKind::Copy => "COPY",
            InstructionKind::Add => "ADD",
            InstructionKind::Run => "RUN",
            InstructionKind::Env => "ENV",
            InstructionKind::Arg => "ARG",
            InstructionKind::Expose => "EXPOSE",
            InstructionKind::Label => "LABEL",
            InstructionKind::User => "USER",
            InstructionKind::Volume => "VOLUME",
            InstructionKind::Healthcheck => "HEALTHCHECK",
            InstructionKind::Shell => "SHELL",
            InstructionKind::StopSignal => "STOPSIGNAL",
            InstructionKind::OnBuild => "ONBUILD",
            InstructionKind::Maintainer => "MAINTAINER",
            InstructionKind::Cmd => "CMD",
            InstructionKind::Entrypoint => "ENTRYPOINT",
            InstructionKind::Unknown(keyword) => keyword.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, InstructionKind::Unknown(_))
    }
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One logical instruction. `line` is where it starts (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub line: usize,
    pub kind: InstructionKind,
    pub args: String,
}

impl Instruction {
    pub fn first_arg(&self) -> Option<&str> {
        self.args.split_whitespace().next()
    }

    /// JSON array form, e.g. `CMD ["python", "main.py"]`.
    pub fn exec_form(&self) -> Option<Vec<String>> {
        let trimmed = self.args.trim();
        if !trimmed.starts_with('[') {
            return None;
        }
        serde_json::from_str(trimmed).ok()
    }
}

fn keyword_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([A-Za-z]+)(?:\s+(.*))?$").expect("valid regex"))
}

pub fn parse_instructions(content: &str) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, raw_line) in content.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = raw_line.trim();

        // 註解與空行 (續行中間的註解也略過)
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (text, continues) = match trimmed.strip_suffix('\\') {
            Some(head) => (head.trim_end(), true),
            None => (trimmed, false),
        };

        let (start, mut buffer) = pending.take().unwrap_or((line_no, String::new()));
        if !buffer.is_empty() && !text.is_empty() {
            buffer.push(' ');
        }
        buffer.push_str(text);

        if continues {
            pending = Some((start, buffer));
        } else {
            instructions.push(parse_logical_line(start, &buffer)?);
        }
    }

    // A trailing backslash at end of file still closes the instruction.
    if let Some((start, buffer)) = pending {
        if !buffer.trim().is_empty() {
            instructions.push(parse_logical_line(start, &buffer)?);
        }
    }

    Ok(instructions)
}

fn parse_logical_line(line: usize, text: &str) -> Result<Instruction> {
    let caps = keyword_pattern()
        .captures(text)
        .ok_or_else(|| AlertError::RecipeParseError {
            line,
            message: format!("expected an instruction keyword, found '{}'", text),
        })?;

    let kind = InstructionKind::from_keyword(&caps[1]);
    let args = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    if args.is_empty() {
        return Err(AlertError::RecipeParseError {
            line,
            message: format!("{} requires at least one argument", kind),
        });
    }

    Ok(Instruction { line, kind, args })
}
