use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Built-in simple types checked by coercion of the lexical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleType {
    String,
    Boolean,
    Decimal,
    Integer,
    NonNegativeInteger,
    PositiveInteger,
    Int,
    Long,
    Short,
    Byte,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    Double,
    Date,
    DateTime,
}

impl SimpleType {
    /// Maps an XML Schema built-in local name. Unknown names return `None`.
    pub fn from_builtin(local: &str) -> Option<Self> {
        let ty = match local {
            "string" | "normalizedString" | "token" | "language" | "Name" | "NCName"
            | "NMTOKEN" | "NMTOKENS" | "ID" | "IDREF" | "IDREFS" | "ENTITY" | "anyURI"
            | "QName" | "anySimpleType" | "anyAtomicType" => Self::String,
            "boolean" => Self::Boolean,
            "decimal" => Self::Decimal,
            "integer" => Self::Integer,
            "nonNegativeInteger" => Self::NonNegativeInteger,
            "positiveInteger" => Self::PositiveInteger,
            "int" => Self::Int,
            "long" => Self::Long,
            "short" => Self::Short,
            "byte" => Self::Byte,
            "unsignedLong" => Self::UnsignedLong,
            "unsignedInt" => Self::UnsignedInt,
            "unsignedShort" => Self::UnsignedShort,
            "unsignedByte" => Self::UnsignedByte,
            "double" | "float" => Self::Double,
            "date" => Self::Date,
            "dateTime" => Self::DateTime,
            _ => return None,
        };
        Some(ty)
    }

    /// Name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::NonNegativeInteger => "nonNegativeInteger",
            Self::PositiveInteger => "positiveInteger",
            Self::Int => "int",
            Self::Long => "long",
            Self::Short => "short",
            Self::Byte => "byte",
            Self::UnsignedLong => "unsignedLong",
            Self::UnsignedInt => "unsignedInt",
            Self::UnsignedShort => "unsignedShort",
            Self::UnsignedByte => "unsignedByte",
            Self::Double => "double",
            Self::Date => "date",
            Self::DateTime => "dateTime",
        }
    }

    pub fn accepts(self, raw: &str) -> bool {
        // every non-string built-in collapses surrounding whitespace
        let value = raw.trim();
        match self {
            Self::String => true,
            Self::Boolean => matches!(value, "true" | "false" | "1" | "0"),
            Self::Decimal => is_decimal(value),
            Self::Integer => is_integer(value),
            Self::NonNegativeInteger => is_integer(value) && !is_negative(value),
            Self::PositiveInteger => {
                is_integer(value) && !is_negative(value) && value.bytes().any(|b| (b'1'..=b'9').contains(&b))
            }
            Self::Int => value.parse::<i32>().is_ok(),
            Self::Long => value.parse::<i64>().is_ok(),
            Self::Short => value.parse::<i16>().is_ok(),
            Self::Byte => value.parse::<i8>().is_ok(),
            Self::UnsignedLong => in_unsigned_range::<u64>(value),
            Self::UnsignedInt => in_unsigned_range::<u32>(value),
            Self::UnsignedShort => in_unsigned_range::<u16>(value),
            Self::UnsignedByte => in_unsigned_range::<u8>(value),
            Self::Double => {
                matches!(value, "INF" | "-INF" | "NaN")
                    || (!value.is_empty()
                        && value.bytes().all(|b| b.is_ascii_digit() || b"+-.eE".contains(&b))
                        && value.parse::<f64>().is_ok())
            }
            Self::Date => NaiveDate::parse_from_str(strip_timezone(value), "%Y-%m-%d").is_ok(),
            Self::DateTime => {
                DateTime::parse_from_rfc3339(value).is_ok()
                    || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
            }
        }
    }
}

fn digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn unsigned(value: &str) -> &str {
    value
        .strip_prefix('+')
        .or_else(|| value.strip_prefix('-'))
        .unwrap_or(value)
}

fn is_negative(value: &str) -> bool {
    value.starts_with('-') && unsigned(value).bytes().any(|b| b != b'0')
}

fn is_integer(value: &str) -> bool {
    digits(unsigned(value))
}

/// Unsigned types still allow an explicit sign on zero ("-0", "+7").
fn in_unsigned_range<T: std::str::FromStr>(value: &str) -> bool {
    is_integer(value) && !is_negative(value) && unsigned(value).parse::<T>().is_ok()
}

fn is_decimal(value: &str) -> bool {
    let body = unsigned(value);
    match body.split_once('.') {
        Some((int, frac)) => {
            (int.is_empty() || digits(int))
                && (frac.is_empty() || digits(frac))
                && !(int.is_empty() && frac.is_empty())
        }
        None => digits(body),
    }
}

fn strip_timezone(value: &str) -> &str {
    if let Some(stripped) = value.strip_suffix('Z') {
        return stripped;
    }
    // "+05:00" / "-05:00" after a ten character date
    match value.get(10..) {
        Some(tz) if tz.len() == 6 && (tz.starts_with('+') || tz.starts_with('-')) => {
            value.get(..10).unwrap_or(value)
        }
        _ => value,
    }
}
