use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::{FinancialGoal, Investment};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("missing goal parameter {0}")]
    MissingField(&'static str),
}

fn malformed(line: usize, message: impl Into<String>) -> LoadError {
    LoadError::Malformed {
        line,
        message: message.into(),
    }
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_goal(path: &Path) -> Result<FinancialGoal, LoadError> {
    tracing::info!(path = %path.display(), "reading goal file");
    parse_goal(&read(path)?)
}

pub fn load_investments(path: &Path) -> Result<Vec<Investment>, LoadError> {
    tracing::info!(path = %path.display(), "reading investment file");
    parse_investments(&read(path)?)
}

/// Tagged, non-blank, non-comment lines as `(line number, tag, rest)`.
fn directives(text: &str) -> impl Iterator<Item = (usize, char, &str)> {
    text.lines().enumerate().filter_map(|(index, raw)| {
        let line = raw.trim();
        let tag = line.chars().next()?;
        if tag == '#' {
            return None;
        }
        Some((index + 1, tag, line[tag.len_utf8()..].trim()))
    })
}

fn key_value(line: usize, rest: &str) -> Result<(&str, f64), LoadError> {
    let mut tokens = rest.split_whitespace();
    let (Some(key), Some(raw), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(malformed(line, "expected `KEY VALUE`"));
    };
    let value = raw
        .parse::<f64>()
        .map_err(|_| malformed(line, format!("{key}: `{raw}` is not a number")))?;
    if !value.is_finite() {
        return Err(malformed(line, format!("{key}: value must be finite")));
    }
    Ok((key, value))
}

fn whole_age(line: usize, key: &str, value: f64) -> Result<u32, LoadError> {
    if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(malformed(
            line,
            format!("{key}: age must be a whole non-negative number"),
        ));
    }
    Ok(value as u32)
}

#[derive(Default)]
struct GoalFields {
    graduation_age: Option<u32>,
    cap_end_age: Option<u32>,
    net_monthly_salary: Option<f64>,
    investment_fraction: Option<f64>,
    target_principal: Option<f64>,
    withdrawal_end_age: Option<u32>,
}

pub fn parse_goal(text: &str) -> Result<FinancialGoal, LoadError> {
    let mut fields = GoalFields::default();

    for (line, tag, rest) in directives(text) {
        match tag {
            'c' => {
                let (key, value) = key_value(line, rest)?;
                match key {
                    "IDADEFORMATURA" => fields.graduation_age = Some(whole_age(line, key, value)?),
                    "IDADEFIMCAP" => fields.cap_end_age = Some(whole_age(line, key, value)?),
                    "SALARIOMEDIOLIQ" => fields.net_monthly_salary = Some(value),
                    "PERCINVESTIMENTO" => fields.investment_fraction = Some(value),
                    "PATRIMONIOACC" => fields.target_principal = Some(value),
                    _ => tracing::warn!(line, key, "unknown capitalization parameter ignored"),
                }
            }
            'd' => {
                let (key, value) = key_value(line, rest)?;
                match key {
                    "IDADEFIMRETIRADA" => {
                        fields.withdrawal_end_age = Some(whole_age(line, key, value)?)
                    }
                    _ => tracing::warn!(line, key, "unknown withdrawal parameter ignored"),
                }
            }
            other => tracing::warn!(line, tag = %other, "unknown goal file tag skipped"),
        }
    }

    Ok(FinancialGoal {
        graduation_age: fields
            .graduation_age
            .ok_or(LoadError::MissingField("IDADEFORMATURA"))?,
        cap_end_age: fields
            .cap_end_age
            .ok_or(LoadError::MissingField("IDADEFIMCAP"))?,
        net_monthly_salary: fields
            .net_monthly_salary
            .ok_or(LoadError::MissingField("SALARIOMEDIOLIQ"))?,
        investment_fraction: fields
            .investment_fraction
            .ok_or(LoadError::MissingField("PERCINVESTIMENTO"))?,
        target_principal: fields
            .target_principal
            .ok_or(LoadError::MissingField("PATRIMONIOACC"))?,
        withdrawal_end_age: fields
            .withdrawal_end_age
            .ok_or(LoadError::MissingField("IDADEFIMRETIRADA"))?,
    })
}

pub fn parse_investments(text: &str) -> Result<Vec<Investment>, LoadError> {
    let mut investments = Vec::new();

    for (line, tag, rest) in directives(text) {
        match tag {
            'i' => investments.push(parse_investment(line, rest)?),
            // end-of-list markers carry no data
            'f' | 'F' => {}
            other => tracing::warn!(line, tag = %other, "unknown investment file tag skipped"),
        }
    }

    Ok(investments)
}

fn parse_investment(line: usize, rest: &str) -> Result<Investment, LoadError> {
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let [name, category, rate, risk] = tokens.as_slice() else {
        return Err(malformed(line, "expected `NAME CATEGORY RATE RISK`"));
    };

    let periodic_rate = rate
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| malformed(line, format!("{name}: `{rate}` is not a valid rate")))?;
    let risk_level = risk
        .parse::<u8>()
        .ok()
        .filter(|value| (1..=5).contains(value))
        .ok_or_else(|| malformed(line, format!("{name}: risk must be an integer 1-5")))?;

    Ok(Investment {
        name: name.to_string(),
        category: category.to_string(),
        periodic_rate,
        risk_level,
    })
}
