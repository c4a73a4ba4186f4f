//! Extension specification strings.
//!
//! Format: `field:result-type:function:argument:kind[:source]`
//!
//! | Part        | Meaning                                                   |
//! |-------------|-----------------------------------------------------------|
//! | field       | Report column name                                        |
//! | result-type | `Integer`, `Float`, `String` or `Flag`                    |
//! | function    | Function name within the source                           |
//! | argument    | Arity or column index; for `map`, selects the extractor   |
//! | kind        | `classifier`, `map` or `extractor`                        |
//! | source      | Catalog source name; empty or omitted means `builtin`     |
//!
//! The source is the last part and may itself contain `:`.

use std::fmt;
use std::str::FromStr;

use super::catalog::BUILTIN_SOURCE;
use super::{ExtensionError, ScalarType};

/// Which contract the named function implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    /// `Fragment -> Scalar`
    Classifier,
    /// Extract from each "b", then aggregate.
    Map,
    /// Per-"b" extracted values, reported as a list.
    Extractor,
}

impl FromStr for ExtensionKind {
    type Err = ExtensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classifier" => Ok(Self::Classifier),
            "map" => Ok(Self::Map),
            "extractor" => Ok(Self::Extractor),
            _ => Err(ExtensionError::UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionKind::Classifier => write!(f, "classifier"),
            ExtensionKind::Map => write!(f, "map"),
            ExtensionKind::Extractor => write!(f, "extractor"),
        }
    }
}

/// The argument part of a spec.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArgSlot {
    #[default]
    Absent,
    /// An arity or a 1-based column number.
    Index(usize),
    /// Anything else, e.g. `info.DP` or an extractor name.
    Named(String),
}

impl From<&str> for ArgSlot {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            ArgSlot::Absent
        } else if let Ok(n) = s.parse::<usize>() {
            ArgSlot::Index(n)
        } else {
            ArgSlot::Named(s.to_string())
        }
    }
}

impl fmt::Display for ArgSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgSlot::Absent => Ok(()),
            ArgSlot::Index(n) => write!(f, "{}", n),
            ArgSlot::Named(s) => f.write_str(s),
        }
    }
}

/// A parsed extension specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSpec {
    pub field: String,
    pub result_type: ScalarType,
    pub function: String,
    pub arg: ArgSlot,
    pub kind: ExtensionKind,
    pub source: String,
}

impl FromStr for ExtensionSpec {
    type Err = ExtensionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ExtensionError::InvalidSpec {
            spec: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.splitn(6, ':').collect();
        if parts.len() < 5 {
            return Err(invalid(
                "expected field:result-type:function:argument:kind[:source]",
            ));
        }

        let field = parts[0].trim();
        if field.is_empty() {
            return Err(invalid("empty field name"));
        }
        let function = parts[2].trim();
        if function.is_empty() {
            return Err(invalid("empty function name"));
        }
        let source = parts.get(5).map(|p| p.trim()).unwrap_or_default();

        Ok(Self {
            field: field.to_string(),
            result_type: parts[1].trim().parse()?,
            function: function.to_string(),
            arg: ArgSlot::from(parts[3].trim()),
            kind: parts[4].trim().parse()?,
            source: if source.is_empty() {
                BUILTIN_SOURCE.to_string()
            } else {
                source.to_string()
            },
        })
    }
}

impl fmt::Display for ExtensionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}:{}",
            self.field, self.result_type, self.function, self.arg, self.kind, self.source
        )
    }
}

/// Pair bedtools-style `-c` columns with `-O` operations into map specs.
///
/// Equal lengths zip; a single column is reused for every operation; a
/// single operation is applied to every column. Anything else is an error.
pub fn expand_ops(columns: &[usize], operations: &[String]) -> Result<Vec<ExtensionSpec>, ExtensionError> {
    if columns.is_empty() || operations.is_empty() {
        return Err(ExtensionError::InvalidMapColumns(
            "at least one column and one operation are required".to_string(),
        ));
    }
    if let Some(&bad) = columns.iter().find(|&&c| c < 4) {
        return Err(ExtensionError::InvalidMapColumns(format!(
            "column {} is a coordinate column; map columns start at 4",
            bad
        )));
    }

    let pairs: Vec<(usize, &String)> = match (columns.len(), operations.len()) {
        (c, o) if c == o => columns.iter().copied().zip(operations.iter()).collect(),
        (1, _) => operations.iter().map(|op| (columns[0], op)).collect(),
        (_, 1) => columns.iter().map(|&c| (c, &operations[0])).collect(),
        (c, o) => {
            return Err(ExtensionError::InvalidMapColumns(format!(
                "number of columns ({}) and operations ({}) must match, or one must be 1",
                c, o
            )))
        }
    };

    Ok(pairs
        .into_iter()
        .map(|(column, op)| {
            let op = op.trim().to_ascii_lowercase();
            ExtensionSpec {
                field: format!("{}_{}", op, column),
                result_type: if op == "count" {
                    ScalarType::Integer
                } else {
                    ScalarType::Float
                },
                function: op,
                arg: ArgSlot::Index(column),
                kind: ExtensionKind::Map,
                source: BUILTIN_SOURCE.to_string(),
            }
        })
        .collect())
}
