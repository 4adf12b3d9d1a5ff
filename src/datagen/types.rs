//! Declared datatype parsing for value synthesis.

use crate::error::SynthError;
use once_cell::sync::Lazy;
use regex::Regex;

/// `base [ ( a [, b] ) ] [ [] ]`, e.g. `character varying(20)` or `integer[]`
static DATATYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*([a-z][a-z0-9_ ]*?)\s*(?:\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\))?\s*(\[\])?\s*$")
        .expect("datatype pattern is valid")
});

/// Precision used for numeric columns declared without a modifier
pub const DEFAULT_NUMERIC: (u32, u32) = (10, 2);

/// Upper bound on the precision PostgreSQL accepts for numeric
const MAX_NUMERIC_PRECISION: u32 = 1000;

/// Datatypes the synthesizer knows how to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datatype {
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Numeric { precision: u32, scale: u32 },
    Boolean,
    Char { length: u32 },
    Varchar { length: Option<u32> },
    Text,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Interval,
    Uuid,
    Json,
}

impl Datatype {
    /// Parse a declared datatype as reported by the catalog.
    pub fn parse(declared: &str) -> Result<Self, SynthError> {
        let unsupported = || SynthError::Unsupported {
            datatype: declared.to_string(),
        };
        let invalid = |reason: &str| SynthError::Invalid {
            datatype: declared.to_string(),
            reason: reason.to_string(),
        };

        let caps = DATATYPE_RE.captures(declared).ok_or_else(unsupported)?;
        if caps.get(4).is_some() {
            return Err(unsupported());
        }

        let base = caps[1].to_lowercase();
        let base = base.split_whitespace().collect::<Vec<_>>().join(" ");
        let first = caps
            .get(2)
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| invalid("modifier out of range"))?;
        let second = caps
            .get(3)
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| invalid("modifier out of range"))?;

        let datatype = match base.as_str() {
            "smallint" | "int2" | "smallserial" => Datatype::SmallInt,
            "integer" | "int" | "int4" | "serial" => Datatype::Integer,
            "bigint" | "int8" | "bigserial" => Datatype::BigInt,
            "real" | "float4" => Datatype::Real,
            "double precision" | "double" | "float8" | "float" => Datatype::Double,
            "numeric" | "decimal" => {
                let (precision, scale) = match (first, second) {
                    (None, _) => DEFAULT_NUMERIC,
                    (Some(p), s) => (p, s.unwrap_or(0)),
                };
                if precision == 0 || precision > MAX_NUMERIC_PRECISION {
                    return Err(invalid("precision must be between 1 and 1000"));
                }
                if scale > precision {
                    return Err(invalid("scale must not exceed precision"));
                }
                Datatype::Numeric { precision, scale }
            }
            "boolean" | "bool" => Datatype::Boolean,
            "character" | "char" | "bpchar" => {
                let length = first.unwrap_or(1);
                if length == 0 {
                    return Err(invalid("length must be at least 1"));
                }
                Datatype::Char { length }
            }
            "character varying" | "varchar" => {
                if first == Some(0) {
                    return Err(invalid("length must be at least 1"));
                }
                Datatype::Varchar { length: first }
            }
            "text" | "string" => Datatype::Text,
            "date" => Datatype::Date,
            "time" | "time without time zone" => Datatype::Time,
            "timestamp" | "timestamp without time zone" | "datetime" => Datatype::Timestamp,
            "timestamptz" | "timestamp with time zone" => Datatype::TimestampTz,
            "interval" => Datatype::Interval,
            "uuid" => Datatype::Uuid,
            "json" | "jsonb" => Datatype::Json,
            _ => return Err(unsupported()),
        };

        Ok(datatype)
    }
}
