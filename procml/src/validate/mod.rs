use std::fmt;

use regex::Regex;

/// Attribute-level type, range, or pattern violation.
///
/// The raw value is `Option<&str>` throughout: `None` means the attribute is
/// absent. A `default` of `None` is the required marker; it can never
/// collide with a legal default value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Attribute marked required but absent.
    Required,
    NotANumber(String),
    /// Value parses as a number but not as an integer (e.g. `"1.5"`, `"2.0"`).
    NotAnInt(String),
    TooSmall { value: String, min: f64 },
    TooLarge { value: String, max: f64 },
    PatternMismatch { value: String, pattern: String },
    TooShort { value: String, min: usize },
    TooLong { value: String, max: usize },
    /// Not one of the boolean tokens `on`/`true`/`off`/`false`.
    BadBool(String),
    /// `split` produced the wrong number of tokens.
    WrongArity { expected: usize, got: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Required => write!(f, "required"),
            ValidationError::NotANumber(s) => write!(f, "'{}' is not a number", s),
            ValidationError::NotAnInt(s) => write!(f, "'{}' must be an int, not a float", s),
            ValidationError::TooSmall { value, min } => {
                write!(f, "{} must not be smaller than {}", value, min)
            }
            ValidationError::TooLarge { value, max } => {
                write!(f, "{} must not be larger than {}", value, max)
            }
            ValidationError::PatternMismatch { value, pattern } => {
                write!(f, "'{}' does not match {}", value, pattern)
            }
            ValidationError::TooShort { value, min } => {
                write!(f, "'{}' must not be shorter than {}", value, min)
            }
            ValidationError::TooLong { value, max } => {
                write!(f, "'{}' must not be longer than {}", value, max)
            }
            ValidationError::BadBool(s) => write!(f, "'{}' is not a valid boolean", s),
            ValidationError::WrongArity { expected, got } => {
                write!(f, "required {} parameters, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Constraints applied by [`word`].
#[derive(Debug, Default)]
pub struct StringRules {
    pub pattern: Option<Regex>,
    /// Inclusive (min, max) length in characters.
    pub length: Option<(usize, usize)>,
}

impl StringRules {
    pub fn none() -> Self {
        StringRules::default()
    }
}

/// Validate a float attribute with optional inclusive bounds.
pub fn float(
    s: Option<&str>,
    min: Option<f64>,
    max: Option<f64>,
    default: Option<f64>,
) -> Result<f64, ValidationError> {
    let Some(s) = s else {
        return default.ok_or(ValidationError::Required);
    };
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotANumber(s.to_string()))?;
    if let Some(min) = min {
        if value < min {
            return Err(ValidationError::TooSmall {
                value: s.to_string(),
                min,
            });
        }
    }
    if let Some(max) = max {
        if max < value {
            return Err(ValidationError::TooLarge {
                value: s.to_string(),
                max,
            });
        }
    }
    Ok(value)
}

/// Validate an integer attribute. The value is parsed as a float first and
/// must equal its own integer parse, so a fractional literal form like
/// `"2.0"` is rejected even though it names a whole number.
pub fn int(
    s: Option<&str>,
    min: Option<i64>,
    max: Option<i64>,
    default: Option<i64>,
) -> Result<i64, ValidationError> {
    let Some(s) = s else {
        return default.ok_or(ValidationError::Required);
    };
    let f = float(Some(s), min.map(|m| m as f64), max.map(|m| m as f64), None)?;
    let i: i64 = s
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotAnInt(s.to_string()))?;
    if i as f64 != f {
        return Err(ValidationError::NotAnInt(s.to_string()));
    }
    Ok(i)
}

/// Validate a word attribute: trimmed, optionally pattern- and
/// length-checked.
pub fn word(
    s: Option<&str>,
    rules: &StringRules,
    default: Option<&str>,
) -> Result<String, ValidationError> {
    let Some(s) = s else {
        return default.map(str::to_string).ok_or(ValidationError::Required);
    };
    let s = s.trim();
    if let Some(re) = &rules.pattern {
        if !re.is_match(s) {
            return Err(ValidationError::PatternMismatch {
                value: s.to_string(),
                pattern: re.to_string(),
            });
        }
    }
    if let Some((min, max)) = rules.length {
        let len = s.chars().count();
        if len < min {
            return Err(ValidationError::TooShort {
                value: s.to_string(),
                min,
            });
        }
        if max < len {
            return Err(ValidationError::TooLong {
                value: s.to_string(),
                max,
            });
        }
    }
    Ok(s.to_string())
}

/// Validate a boolean attribute. Only the literal tokens `on`/`true` and
/// `off`/`false` are accepted.
pub fn bool(s: Option<&str>, default: Option<bool>) -> Result<bool, ValidationError> {
    let Some(s) = s else {
        return default.ok_or(ValidationError::Required);
    };
    match s.trim() {
        "on" | "true" => Ok(true),
        "off" | "false" => Ok(false),
        other => Err(ValidationError::BadBool(other.to_string())),
    }
}
