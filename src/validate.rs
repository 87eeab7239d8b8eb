//! Field validation for machine provisioning requests.
//!
//! Every check is pure apart from diagnostic logging. Callers decide what a
//! rejection means for the session; nothing here aborts.
use crate::machine::MachineRequest;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Operating systems a machine may be provisioned with, in canonical form.
pub const SUPPORTED_OS: [&str; 3] = ["ubuntu", "centos", "windows"];

const NAME_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9_-]*$";

fn name_regex() -> &'static Regex {
    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    NAME_REGEX.get_or_init(|| Regex::new(NAME_PATTERN).expect("compile machine name pattern"))
}

/// Request field a rejection refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Os,
    Cpu,
    Ram,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Os => write!(f, "os"),
            Self::Cpu => write!(f, "cpu"),
            Self::Ram => write!(f, "ram"),
        }
    }
}

/// Why a field value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Empty,
    DigitsOnly,
    InvalidNameFormat,
    UnsupportedOs,
    NotANumber,
    NotFinite,
    NotPositive,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "value must not be empty"),
            Self::DigitsOnly => write!(f, "VM name must not be purely numeric"),
            Self::InvalidNameFormat => write!(
                f,
                "VM name must start with a letter and contain only letters, numbers, hyphens, and underscores"
            ),
            Self::UnsupportedOs => write!(
                f,
                "unsupported OS (supported: {})",
                SUPPORTED_OS.join("/")
            ),
            Self::NotANumber => write!(f, "value is not a number"),
            Self::NotFinite => write!(f, "value must be a finite number"),
            Self::NotPositive => write!(f, "value must be greater than zero"),
        }
    }
}

/// Structured diagnostic for a single failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRejection {
    pub field: Field,
    pub raw: String,
    pub reason: RejectReason,
}

impl fmt::Display for FieldRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}: {}", self.field, self.raw, self.reason)
    }
}

/// Field values that passed every check, ready for the record builder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidatedFields<'a> {
    pub name: &'a str,
    pub os: &'a str,
    pub cpu: f64,
    pub ram: f64,
}

/// Check a machine name against the naming rules.
pub fn check_name(raw: &str) -> Result<(), RejectReason> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RejectReason::Empty);
    }
    if name.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(RejectReason::DigitsOnly);
    }
    if !name_regex().is_match(name) {
        return Err(RejectReason::InvalidNameFormat);
    }
    Ok(())
}

/// Check an OS answer against [`SUPPORTED_OS`], ignoring case.
pub fn check_os(raw: &str) -> Result<(), RejectReason> {
    let os = raw.trim();
    if SUPPORTED_OS
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(os))
    {
        Ok(())
    } else {
        Err(RejectReason::UnsupportedOs)
    }
}

/// Parse a CPU or RAM answer, accepting only finite values above zero.
pub fn parse_positive(raw: &str) -> Result<f64, RejectReason> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| RejectReason::NotANumber)?;
    check_positive(value)
}

/// Accept only finite values above zero.
pub fn check_positive(value: f64) -> Result<f64, RejectReason> {
    if !value.is_finite() {
        return Err(RejectReason::NotFinite);
    }
    if value <= 0.0 {
        return Err(RejectReason::NotPositive);
    }
    Ok(value)
}

pub fn validate_name(raw: &str) -> bool {
    passes(Field::Name, raw, check_name(raw))
}

pub fn validate_os(raw: &str) -> bool {
    passes(Field::Os, raw, check_os(raw))
}

/// Shared by CPU and RAM; `field` only labels the diagnostic.
pub fn validate_numeric_positive(field: Field, raw: &str) -> bool {
    passes(field, raw, parse_positive(raw))
}

/// Run every check on a request without short-circuiting.
///
/// On failure the error carries one rejection per failing field, in field
/// order, so the operator sees all problems at once.
pub fn check_request(
    request: &MachineRequest,
) -> Result<ValidatedFields<'_>, Vec<FieldRejection>> {
    let mut rejections = Vec::new();
    let name = collect(
        &mut rejections,
        Field::Name,
        &request.name,
        check_name(&request.name).map(|()| request.name.trim()),
    );
    let os = collect(
        &mut rejections,
        Field::Os,
        &request.os,
        check_os(&request.os).map(|()| request.os.trim()),
    );
    let cpu = collect(
        &mut rejections,
        Field::Cpu,
        &request.cpu,
        parse_positive(&request.cpu),
    );
    let ram = collect(
        &mut rejections,
        Field::Ram,
        &request.ram,
        parse_positive(&request.ram),
    );
    match (name, os, cpu, ram) {
        (Some(name), Some(os), Some(cpu), Some(ram)) => Ok(ValidatedFields { name, os, cpu, ram }),
        _ => Err(rejections),
    }
}

fn passes<T>(field: Field, raw: &str, outcome: Result<T, RejectReason>) -> bool {
    match outcome {
        Ok(_) => true,
        Err(reason) => {
            log_rejection(&FieldRejection {
                field,
                raw: raw.to_string(),
                reason,
            });
            false
        }
    }
}

fn collect<T>(
    rejections: &mut Vec<FieldRejection>,
    field: Field,
    raw: &str,
    outcome: Result<T, RejectReason>,
) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(reason) => {
            let rejection = FieldRejection {
                field,
                raw: raw.to_string(),
                reason,
            };
            log_rejection(&rejection);
            rejections.push(rejection);
            None
        }
    }
}

fn log_rejection(rejection: &FieldRejection) {
    tracing::warn!(
        field = %rejection.field,
        raw = ?rejection.raw,
        reason = %rejection.reason,
        "VM validation error"
    );
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
