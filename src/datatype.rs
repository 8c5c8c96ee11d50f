use std::fmt;

use lazy_static::lazy_static;
use thiserror::Error;

pub const DEFAULT_NUMBER_PRECISION: u32 = 38;
pub const DEFAULT_NUMBER_SCALE: u32 = 0;
pub const DEFAULT_VARCHAR_LENGTH: u32 = 16_777_216;
pub const DEFAULT_CHAR_LENGTH: u32 = 1;
pub const DEFAULT_BINARY_SIZE: u32 = 8_388_608;
pub const DEFAULT_TIME_PRECISION: u32 = 9;
pub const DEFAULT_TIMESTAMP_PRECISION: u32 = 9;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataTypeError {
    #[error("unknown data type: {0}")]
    UnknownType(String),

    #[error("invalid data type {raw}: \"{expected}\" required")]
    InvalidSyntax { raw: String, expected: String },

    #[error("data type {0} does not take arguments")]
    UnexpectedArguments(String),

    #[error("invalid vector inner type {0}, expected INT or FLOAT")]
    InvalidVectorInnerType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorInnerType {
    Int,
    Float,
}

impl fmt::Display for VectorInnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorInnerType::Int => f.write_str("INT"),
            VectorInnerType::Float => f.write_str("FLOAT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub name: String,
    pub data_type: DataType,
}

/// A parsed Snowflake data type.
///
/// Attribute fields are `Option`: `None` means the source text omitted the
/// argument and the documented default applies. The distinction feeds the
/// comparison logic, which refuses to call two text types different when
/// one length was never spelled out.
///
/// The `synonym` fields keep the spelling the writer chose so `to_sql`
/// round-trips it; derived equality is therefore spelling-sensitive and
/// semantic comparison goes through [`compare_types`] / [`are_the_same`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Number {
        precision: Option<u32>,
        scale: Option<u32>,
        synonym: String,
    },
    Float {
        synonym: String,
    },
    Text {
        length: Option<u32>,
        synonym: String,
    },
    Binary {
        size: Option<u32>,
        synonym: String,
    },
    Boolean {
        synonym: String,
    },
    Date,
    Time {
        precision: Option<u32>,
    },
    TimestampLtz {
        precision: Option<u32>,
        synonym: String,
    },
    TimestampNtz {
        precision: Option<u32>,
        synonym: String,
    },
    TimestampTz {
        precision: Option<u32>,
        synonym: String,
    },
    Variant,
    Object,
    Array,
    Geography,
    Geometry,
    Vector {
        inner: VectorInnerType,
        dimension: u32,
    },
    Table {
        columns: Vec<TableColumn>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseType {
    Number,
    NumberSubtype,
    Float,
    TextVar,
    TextChar,
    Binary,
    Boolean,
    Date,
    Time,
    TimestampLtz,
    TimestampNtz,
    TimestampTz,
    Variant,
    Object,
    Array,
    Geography,
    Geometry,
    Vector,
    Table,
}

lazy_static! {
    /// Synonym table, longest spelling first so prefix matching is
    /// unambiguous (`TIMESTAMP WITH LOCAL TIME ZONE` before `TIMESTAMP`,
    /// `INTEGER` before `INT`).
    static ref SYNONYMS: Vec<(&'static str, BaseType)> = {
        let mut table = vec![
            ("NUMBER", BaseType::Number),
            ("DECIMAL", BaseType::Number),
            ("NUMERIC", BaseType::Number),
            ("DEC", BaseType::Number),
            ("INTEGER", BaseType::NumberSubtype),
            ("INT", BaseType::NumberSubtype),
            ("BIGINT", BaseType::NumberSubtype),
            ("SMALLINT", BaseType::NumberSubtype),
            ("TINYINT", BaseType::NumberSubtype),
            ("BYTEINT", BaseType::NumberSubtype),
            ("DOUBLE PRECISION", BaseType::Float),
            ("DOUBLE", BaseType::Float),
            ("FLOAT4", BaseType::Float),
            ("FLOAT8", BaseType::Float),
            ("FLOAT", BaseType::Float),
            ("REAL", BaseType::Float),
            ("CHARACTER VARYING", BaseType::TextVar),
            ("NCHAR VARYING", BaseType::TextVar),
            ("CHAR VARYING", BaseType::TextVar),
            ("NVARCHAR2", BaseType::TextVar),
            ("NVARCHAR", BaseType::TextVar),
            ("VARCHAR", BaseType::TextVar),
            ("STRING", BaseType::TextVar),
            ("TEXT", BaseType::TextVar),
            ("CHARACTER", BaseType::TextChar),
            ("NCHAR", BaseType::TextChar),
            ("CHAR", BaseType::TextChar),
            ("VARBINARY", BaseType::Binary),
            ("BINARY", BaseType::Binary),
            ("BOOLEAN", BaseType::Boolean),
            ("BOOL", BaseType::Boolean),
            ("DATE", BaseType::Date),
            ("TIME", BaseType::Time),
            ("TIMESTAMP WITH LOCAL TIME ZONE", BaseType::TimestampLtz),
            ("TIMESTAMP_LTZ", BaseType::TimestampLtz),
            ("TIMESTAMPLTZ", BaseType::TimestampLtz),
            ("TIMESTAMP WITHOUT TIME ZONE", BaseType::TimestampNtz),
            ("TIMESTAMP_NTZ", BaseType::TimestampNtz),
            ("TIMESTAMPNTZ", BaseType::TimestampNtz),
            ("DATETIME", BaseType::TimestampNtz),
            ("TIMESTAMP WITH TIME ZONE", BaseType::TimestampTz),
            ("TIMESTAMP_TZ", BaseType::TimestampTz),
            ("TIMESTAMPTZ", BaseType::TimestampTz),
            ("TIMESTAMP", BaseType::TimestampNtz),
            ("VARIANT", BaseType::Variant),
            ("OBJECT", BaseType::Object),
            ("ARRAY", BaseType::Array),
            ("GEOGRAPHY", BaseType::Geography),
            ("GEOMETRY", BaseType::Geometry),
            ("VECTOR", BaseType::Vector),
            ("TABLE", BaseType::Table),
        ];
        table.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        table
    };
}

/// Parse a Snowflake type expression: trim, fold to upper case, match the
/// longest known synonym, then hand the remainder to the variant parser.
pub fn parse_data_type(raw: &str) -> Result<DataType, DataTypeError> {
    let input = raw.trim().to_uppercase();
    if input.is_empty() {
        return Err(DataTypeError::UnknownType(raw.to_string()));
    }

    let (synonym, base) = SYNONYMS
        .iter()
        .find(|(syn, _)| {
            input.starts_with(syn) && {
                let rest = input[syn.len()..].trim_start();
                rest.is_empty() || rest.starts_with('(')
            }
        })
        .copied()
        .ok_or_else(|| DataTypeError::UnknownType(raw.to_string()))?;

    let rest = input[synonym.len()..].trim();

    match base {
        BaseType::Number => parse_number(synonym, rest),
        BaseType::NumberSubtype => {
            reject_arguments(synonym, rest)?;
            Ok(DataType::Number {
                precision: None,
                scale: None,
                synonym: synonym.to_string(),
            })
        }
        BaseType::Float => {
            reject_arguments(synonym, rest)?;
            Ok(DataType::Float {
                synonym: synonym.to_string(),
            })
        }
        BaseType::TextVar => {
            let length = parse_single_optional(synonym, rest, "length")?;
            Ok(DataType::Text {
                length,
                synonym: synonym.to_string(),
            })
        }
        BaseType::TextChar => {
            reject_arguments(synonym, rest)?;
            Ok(DataType::Text {
                length: None,
                synonym: synonym.to_string(),
            })
        }
        BaseType::Binary => {
            let size = parse_single_optional(synonym, rest, "size")?;
            Ok(DataType::Binary {
                size,
                synonym: synonym.to_string(),
            })
        }
        BaseType::Boolean => {
            reject_arguments(synonym, rest)?;
            Ok(DataType::Boolean {
                synonym: synonym.to_string(),
            })
        }
        BaseType::Date => {
            reject_arguments(synonym, rest)?;
            Ok(DataType::Date)
        }
        BaseType::Time => {
            let precision = parse_single_optional(synonym, rest, "precision")?;
            Ok(DataType::Time { precision })
        }
        BaseType::TimestampLtz => {
            let precision = parse_single_optional(synonym, rest, "precision")?;
            Ok(DataType::TimestampLtz {
                precision,
                synonym: synonym.to_string(),
            })
        }
        BaseType::TimestampNtz => {
            let precision = parse_single_optional(synonym, rest, "precision")?;
            Ok(DataType::TimestampNtz {
                precision,
                synonym: synonym.to_string(),
            })
        }
        BaseType::TimestampTz => {
            let precision = parse_single_optional(synonym, rest, "precision")?;
            Ok(DataType::TimestampTz {
                precision,
                synonym: synonym.to_string(),
            })
        }
        BaseType::Variant => {
            reject_arguments(synonym, rest)?;
            Ok(DataType::Variant)
        }
        BaseType::Object => {
            reject_arguments(synonym, rest)?;
            Ok(DataType::Object)
        }
        BaseType::Array => {
            reject_arguments(synonym, rest)?;
            Ok(DataType::Array)
        }
        BaseType::Geography => {
            reject_arguments(synonym, rest)?;
            Ok(DataType::Geography)
        }
        BaseType::Geometry => {
            reject_arguments(synonym, rest)?;
            Ok(DataType::Geometry)
        }
        BaseType::Vector => parse_vector(rest),
        BaseType::Table => parse_table(rest),
    }
}

fn reject_arguments(synonym: &str, rest: &str) -> Result<(), DataTypeError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(DataTypeError::UnexpectedArguments(synonym.to_string()))
    }
}

/// Strip `( ... )` and split the inside on top-level commas.
fn argument_list<'a>(
    synonym: &str,
    rest: &'a str,
    expected: &str,
) -> Result<Vec<&'a str>, DataTypeError> {
    let invalid = || DataTypeError::InvalidSyntax {
        raw: format!("{synonym}{rest}"),
        expected: format!("{synonym}({expected})"),
    };
    let inner = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .ok_or_else(invalid)?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(inner[start..].trim());
    Ok(args)
}

fn parse_u32(synonym: &str, rest: &str, expected: &str, arg: &str) -> Result<u32, DataTypeError> {
    arg.parse::<u32>().map_err(|_| DataTypeError::InvalidSyntax {
        raw: format!("{synonym}{rest}"),
        expected: format!("{synonym}({expected})"),
    })
}

fn parse_single_optional(
    synonym: &str,
    rest: &str,
    expected: &str,
) -> Result<Option<u32>, DataTypeError> {
    if rest.is_empty() {
        return Ok(None);
    }
    let args = argument_list(synonym, rest, expected)?;
    match args.as_slice() {
        [one] => Ok(Some(parse_u32(synonym, rest, expected, one)?)),
        _ => Err(DataTypeError::InvalidSyntax {
            raw: format!("{synonym}{rest}"),
            expected: format!("{synonym}({expected})"),
        }),
    }
}

fn parse_number(synonym: &str, rest: &str) -> Result<DataType, DataTypeError> {
    const EXPECTED: &str = "precision, scale";
    if rest.is_empty() {
        return Ok(DataType::Number {
            precision: None,
            scale: None,
            synonym: synonym.to_string(),
        });
    }
    let args = argument_list(synonym, rest, EXPECTED)?;
    let (precision, scale) = match args.as_slice() {
        [p] => (Some(parse_u32(synonym, rest, EXPECTED, p)?), None),
        [p, s] => (
            Some(parse_u32(synonym, rest, EXPECTED, p)?),
            Some(parse_u32(synonym, rest, EXPECTED, s)?),
        ),
        _ => {
            return Err(DataTypeError::InvalidSyntax {
                raw: format!("{synonym}{rest}"),
                expected: format!("{synonym}({EXPECTED})"),
            });
        }
    };
    Ok(DataType::Number {
        precision,
        scale,
        synonym: synonym.to_string(),
    })
}

fn parse_vector(rest: &str) -> Result<DataType, DataTypeError> {
    const EXPECTED: &str = "inner type, dimension";
    let args = argument_list("VECTOR", rest, EXPECTED)?;
    let [inner, dimension] = args.as_slice() else {
        return Err(DataTypeError::InvalidSyntax {
            raw: format!("VECTOR{rest}"),
            expected: format!("VECTOR({EXPECTED})"),
        });
    };
    let inner = match *inner {
        "INT" => VectorInnerType::Int,
        "FLOAT" => VectorInnerType::Float,
        other => return Err(DataTypeError::InvalidVectorInnerType(other.to_string())),
    };
    let dimension = parse_u32("VECTOR", rest, EXPECTED, dimension)?;
    Ok(DataType::Vector { inner, dimension })
}

fn parse_table(rest: &str) -> Result<DataType, DataTypeError> {
    const EXPECTED: &str = "column type, ...";
    let args = argument_list("TABLE", rest, EXPECTED)?;
    let mut columns = Vec::with_capacity(args.len());
    for arg in args {
        let Some((name, type_raw)) = arg.split_once(char::is_whitespace) else {
            return Err(DataTypeError::InvalidSyntax {
                raw: format!("TABLE{rest}"),
                expected: format!("TABLE({EXPECTED})"),
            });
        };
        columns.push(TableColumn {
            name: name.to_string(),
            data_type: parse_data_type(type_raw.trim())?,
        });
    }
    Ok(DataType::Table { columns })
}

impl DataType {
    /// Surface form: the synonym the writer chose plus the arguments that
    /// were actually spelled out.
    pub fn to_sql(&self) -> String {
        match self {
            DataType::Number {
                precision,
                scale,
                synonym,
            } => match (precision, scale) {
                (Some(p), Some(s)) => format!("{synonym}({p}, {s})"),
                (Some(p), None) => format!("{synonym}({p})"),
                _ => synonym.clone(),
            },
            DataType::Float { synonym } => synonym.clone(),
            DataType::Text { length, synonym } => match length {
                Some(l) => format!("{synonym}({l})"),
                None => synonym.clone(),
            },
            DataType::Binary { size, synonym } => match size {
                Some(s) => format!("{synonym}({s})"),
                None => synonym.clone(),
            },
            DataType::Boolean { synonym } => synonym.clone(),
            DataType::Date => "DATE".to_string(),
            DataType::Time { precision } => match precision {
                Some(p) => format!("TIME({p})"),
                None => "TIME".to_string(),
            },
            DataType::TimestampLtz { precision, synonym }
            | DataType::TimestampNtz { precision, synonym }
            | DataType::TimestampTz { precision, synonym } => match precision {
                Some(p) => format!("{synonym}({p})"),
                None => synonym.clone(),
            },
            DataType::Variant => "VARIANT".to_string(),
            DataType::Object => "OBJECT".to_string(),
            DataType::Array => "ARRAY".to_string(),
            DataType::Geography => "GEOGRAPHY".to_string(),
            DataType::Geometry => "GEOMETRY".to_string(),
            DataType::Vector { inner, dimension } => format!("VECTOR({inner}, {dimension})"),
            DataType::Table { columns } => {
                let cols: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{} {}", c.name, c.data_type.to_sql()))
                    .collect();
                format!("TABLE({})", cols.join(", "))
            }
        }
    }

    /// Canonical short name without arguments, as used by DROP paths and by
    /// the server when it spells argument lists back in SHOW output.
    pub fn to_legacy_sql(&self) -> String {
        match self {
            DataType::Number { .. } => "NUMBER".to_string(),
            DataType::Float { .. } => "FLOAT".to_string(),
            DataType::Text { .. } => "VARCHAR".to_string(),
            DataType::Binary { .. } => "BINARY".to_string(),
            DataType::Boolean { .. } => "BOOLEAN".to_string(),
            DataType::Date => "DATE".to_string(),
            DataType::Time { .. } => "TIME".to_string(),
            DataType::TimestampLtz { .. } => "TIMESTAMP_LTZ".to_string(),
            DataType::TimestampNtz { .. } => "TIMESTAMP_NTZ".to_string(),
            DataType::TimestampTz { .. } => "TIMESTAMP_TZ".to_string(),
            DataType::Variant => "VARIANT".to_string(),
            DataType::Object => "OBJECT".to_string(),
            DataType::Array => "ARRAY".to_string(),
            DataType::Geography => "GEOGRAPHY".to_string(),
            DataType::Geometry => "GEOMETRY".to_string(),
            DataType::Vector { inner, dimension } => format!("VECTOR({inner}, {dimension})"),
            DataType::Table { .. } => "TABLE".to_string(),
        }
    }

    /// Canonical name with defaults resolved.
    pub fn canonical(&self) -> String {
        match self {
            DataType::Number {
                precision, scale, ..
            } => format!(
                "NUMBER({},{})",
                precision.unwrap_or(DEFAULT_NUMBER_PRECISION),
                scale.unwrap_or(DEFAULT_NUMBER_SCALE)
            ),
            DataType::Float { .. } => "FLOAT".to_string(),
            DataType::Text { .. } => format!("VARCHAR({})", self.text_length_or_default()),
            DataType::Binary { size, .. } => {
                format!("BINARY({})", size.unwrap_or(DEFAULT_BINARY_SIZE))
            }
            DataType::Boolean { .. } => "BOOLEAN".to_string(),
            DataType::Date => "DATE".to_string(),
            DataType::Time { precision } => {
                format!("TIME({})", precision.unwrap_or(DEFAULT_TIME_PRECISION))
            }
            DataType::TimestampLtz { precision, .. } => format!(
                "TIMESTAMP_LTZ({})",
                precision.unwrap_or(DEFAULT_TIMESTAMP_PRECISION)
            ),
            DataType::TimestampNtz { precision, .. } => format!(
                "TIMESTAMP_NTZ({})",
                precision.unwrap_or(DEFAULT_TIMESTAMP_PRECISION)
            ),
            DataType::TimestampTz { precision, .. } => format!(
                "TIMESTAMP_TZ({})",
                precision.unwrap_or(DEFAULT_TIMESTAMP_PRECISION)
            ),
            DataType::Variant => "VARIANT".to_string(),
            DataType::Object => "OBJECT".to_string(),
            DataType::Array => "ARRAY".to_string(),
            DataType::Geography => "GEOGRAPHY".to_string(),
            DataType::Geometry => "GEOMETRY".to_string(),
            DataType::Vector { inner, dimension } => format!("VECTOR({inner}, {dimension})"),
            DataType::Table { columns } => {
                let cols: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{} {}", c.name, c.data_type.canonical()))
                    .collect();
                format!("TABLE({})", cols.join(", "))
            }
        }
    }

    fn text_length_or_default(&self) -> u32 {
        match self {
            DataType::Text { length, synonym } => length.unwrap_or(
                if matches!(synonym.as_str(), "CHAR" | "CHARACTER" | "NCHAR") {
                    DEFAULT_CHAR_LENGTH
                } else {
                    DEFAULT_VARCHAR_LENGTH
                },
            ),
            _ => unreachable!("text_length_or_default on non-text type"),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Outcome of comparing two parsed types without asking the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeComparison {
    Equal,
    Different,
    /// Cannot be decided locally: a text or binary length was never spelled
    /// out on one side, and the server may have resolved it to anything.
    Undetermined,
}

fn compare_lengths(a: Option<u32>, b: Option<u32>, a_default: u32, b_default: u32) -> TypeComparison {
    match (a, b) {
        (Some(a), Some(b)) if a == b => TypeComparison::Equal,
        (Some(_), Some(_)) => TypeComparison::Different,
        (None, None) if a_default == b_default => TypeComparison::Equal,
        (None, None) => TypeComparison::Different,
        _ => TypeComparison::Undetermined,
    }
}

fn eq_or_different(equal: bool) -> TypeComparison {
    if equal {
        TypeComparison::Equal
    } else {
        TypeComparison::Different
    }
}

/// Variant-wise comparison. Mixed variants are always different; definitely
/// different lengths require both sides to be explicit.
pub fn compare_types(a: &DataType, b: &DataType) -> TypeComparison {
    use DataType::*;
    match (a, b) {
        (
            Number {
                precision: ap,
                scale: asc,
                ..
            },
            Number {
                precision: bp,
                scale: bsc,
                ..
            },
        ) => eq_or_different(
            ap.unwrap_or(DEFAULT_NUMBER_PRECISION) == bp.unwrap_or(DEFAULT_NUMBER_PRECISION)
                && asc.unwrap_or(DEFAULT_NUMBER_SCALE) == bsc.unwrap_or(DEFAULT_NUMBER_SCALE),
        ),
        (Float { .. }, Float { .. }) => TypeComparison::Equal,
        (Text { length: al, .. }, Text { length: bl, .. }) => compare_lengths(
            *al,
            *bl,
            a.text_length_or_default(),
            b.text_length_or_default(),
        ),
        (Binary { size: asz, .. }, Binary { size: bsz, .. }) => {
            compare_lengths(*asz, *bsz, DEFAULT_BINARY_SIZE, DEFAULT_BINARY_SIZE)
        }
        (Boolean { .. }, Boolean { .. }) => TypeComparison::Equal,
        (Date, Date) => TypeComparison::Equal,
        (Time { precision: ap }, Time { precision: bp }) => eq_or_different(
            ap.unwrap_or(DEFAULT_TIME_PRECISION) == bp.unwrap_or(DEFAULT_TIME_PRECISION),
        ),
        (TimestampLtz { precision: ap, .. }, TimestampLtz { precision: bp, .. })
        | (TimestampNtz { precision: ap, .. }, TimestampNtz { precision: bp, .. })
        | (TimestampTz { precision: ap, .. }, TimestampTz { precision: bp, .. }) => eq_or_different(
            ap.unwrap_or(DEFAULT_TIMESTAMP_PRECISION) == bp.unwrap_or(DEFAULT_TIMESTAMP_PRECISION),
        ),
        (Variant, Variant)
        | (Object, Object)
        | (Array, Array)
        | (Geography, Geography)
        | (Geometry, Geometry) => TypeComparison::Equal,
        (
            Vector {
                inner: ai,
                dimension: ad,
            },
            Vector {
                inner: bi,
                dimension: bd,
            },
        ) => eq_or_different(ai == bi && ad == bd),
        (Table { columns: ac }, Table { columns: bc }) => {
            if ac.len() != bc.len() {
                return TypeComparison::Different;
            }
            let mut result = TypeComparison::Equal;
            for (a_col, b_col) in ac.iter().zip(bc) {
                if a_col.name != b_col.name {
                    return TypeComparison::Different;
                }
                match compare_types(&a_col.data_type, &b_col.data_type) {
                    TypeComparison::Different => return TypeComparison::Different,
                    TypeComparison::Undetermined => result = TypeComparison::Undetermined,
                    TypeComparison::Equal => {}
                }
            }
            result
        }
        _ => TypeComparison::Different,
    }
}

pub fn are_the_same(a: &DataType, b: &DataType) -> bool {
    compare_types(a, b) == TypeComparison::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> DataType {
        parse_data_type(raw).unwrap()
    }

    #[test]
    fn number_defaults_match_explicit() {
        assert!(are_the_same(&parse("NUMBER"), &parse("NUMBER(38, 0)")));
        assert!(are_the_same(&parse("DECIMAL"), &parse("NUMBER")));
        assert!(!are_the_same(&parse("NUMBER(10, 2)"), &parse("NUMBER")));
    }

    #[test]
    fn number_synonyms_and_subtypes() {
        for raw in ["NUMERIC", "DEC", "DECIMAL", "INT", "INTEGER", "BYTEINT"] {
            assert!(matches!(parse(raw), DataType::Number { .. }), "{raw}");
        }
        assert_eq!(
            parse_data_type("INT(38)").unwrap_err(),
            DataTypeError::UnexpectedArguments("INT".to_string())
        );
    }

    #[test]
    fn number_argument_forms() {
        assert_eq!(parse("NUMBER(12)").to_sql(), "NUMBER(12)");
        assert_eq!(parse("numeric(10, 2)").to_sql(), "NUMERIC(10, 2)");
        assert!(parse_data_type("NUMBER(1, 2, 3)").is_err());
        assert!(parse_data_type("NUMBER(abc)").is_err());
    }

    #[test]
    fn text_defaults_and_subtypes() {
        assert_eq!(parse("VARCHAR").canonical(), "VARCHAR(16777216)");
        assert_eq!(parse("CHAR").canonical(), "VARCHAR(1)");
        assert_eq!(parse("STRING(42)").to_sql(), "STRING(42)");
        assert!(parse_data_type("CHAR(10)").is_err());
    }

    #[test]
    fn text_ambiguity() {
        // implicit vs explicit-at-default cannot be decided locally
        assert_eq!(
            compare_types(&parse("VARCHAR"), &parse("VARCHAR(16777216)")),
            TypeComparison::Undetermined
        );
        assert_eq!(
            compare_types(&parse("VARCHAR(10)"), &parse("VARCHAR(20)")),
            TypeComparison::Different
        );
        assert_eq!(
            compare_types(&parse("VARCHAR"), &parse("STRING")),
            TypeComparison::Equal
        );
        assert_eq!(
            compare_types(&parse("VARCHAR"), &parse("CHAR")),
            TypeComparison::Different
        );
    }

    #[test]
    fn timestamp_spelled_out_forms() {
        let t = parse("TIMESTAMP WITH LOCAL TIME ZONE(6)");
        assert!(matches!(
            t,
            DataType::TimestampLtz {
                precision: Some(6),
                ..
            }
        ));
        assert_eq!(t.to_legacy_sql(), "TIMESTAMP_LTZ");
        assert_eq!(t.canonical(), "TIMESTAMP_LTZ(6)");
        assert!(matches!(parse("DATETIME"), DataType::TimestampNtz { .. }));
        assert!(matches!(parse("TIMESTAMP"), DataType::TimestampNtz { .. }));
        assert!(matches!(
            parse("TIMESTAMP WITH TIME ZONE"),
            DataType::TimestampTz { .. }
        ));
    }

    #[test]
    fn vector_requires_both_arguments() {
        assert!(matches!(
            parse("VECTOR(INT, 3)"),
            DataType::Vector {
                inner: VectorInnerType::Int,
                dimension: 3
            }
        ));
        assert!(parse_data_type("VECTOR(INT)").is_err());
        assert_eq!(
            parse_data_type("VECTOR(STRING, 3)").unwrap_err(),
            DataTypeError::InvalidVectorInnerType("STRING".to_string())
        );
    }

    #[test]
    fn table_types() {
        assert!(matches!(parse("TABLE()"), DataType::Table { columns } if columns.is_empty()));
        let t = parse("TABLE(x NUMBER, y VARCHAR)");
        let DataType::Table { columns } = &t else {
            panic!("expected table type");
        };
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "X");
        assert!(matches!(columns[0].data_type, DataType::Number { .. }));
        assert!(matches!(columns[1].data_type, DataType::Text { .. }));
        assert!(parse_data_type("TABLE(x)").is_err());
    }

    #[test]
    fn unknown_and_malformed_types() {
        assert!(matches!(
            parse_data_type("INTERVAL").unwrap_err(),
            DataTypeError::UnknownType(_)
        ));
        assert!(matches!(
            parse_data_type("").unwrap_err(),
            DataTypeError::UnknownType(_)
        ));
        assert!(parse_data_type("VARCHAR(10").is_err());
    }

    #[test]
    fn round_trip_through_to_sql() {
        for raw in [
            "NUMBER",
            "NUMBER(10, 2)",
            "FLOAT",
            "DOUBLE PRECISION",
            "VARCHAR(42)",
            "STRING",
            "CHAR",
            "BINARY(100)",
            "BOOLEAN",
            "DATE",
            "TIME(6)",
            "TIMESTAMP_LTZ(3)",
            "TIMESTAMP WITHOUT TIME ZONE",
            "VARIANT",
            "GEOGRAPHY",
            "VECTOR(FLOAT, 256)",
            "TABLE(A NUMBER, B VARCHAR(10))",
        ] {
            let t = parse(raw);
            let back = parse(&t.to_sql());
            assert!(are_the_same(&t, &back), "{raw} -> {}", t.to_sql());
        }
    }

    #[test]
    fn mixed_variants_differ() {
        assert_eq!(
            compare_types(&parse("NUMBER"), &parse("VARCHAR")),
            TypeComparison::Different
        );
        assert!(!are_the_same(&parse("TIME"), &parse("DATE")));
    }
}
