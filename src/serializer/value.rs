//! Input model for the serializer.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Timelike};
use std::{fmt, sync::Arc};

const AWARE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%.6f%:z",
    "%Y-%m-%dT%H:%M:%S%.9f%:z",
];

// offsets that are not a whole number of minutes
const AWARE_FORMATS_WITH_SECONDS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%::z",
    "%Y-%m-%dT%H:%M:%S%.6f%::z",
    "%Y-%m-%dT%H:%M:%S%.9f%::z",
];

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.6f",
    "%Y-%m-%dT%H:%M:%S%.9f",
];

/// Anything that exposes its state as a list of named fields.
///
/// Provider records (users, sessions, identities) implement this so the
/// serializer can flatten them without knowing their concrete type.
pub trait FieldExposing: Send + Sync {
    /// Named fields in display order.
    fn fields(&self) -> Vec<(String, Value)>;

    /// Type name used in error messages.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl Number {
    /// `None` for NaN and infinities.
    pub(crate) fn to_json(self) -> Option<serde_json::Number> {
        match self {
            Self::I64(n) => Some(n.into()),
            Self::U64(n) => Some(n.into()),
            Self::F64(n) => serde_json::Number::from_f64(n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Timestamp with a UTC offset.
    Aware(DateTime<FixedOffset>),
    /// Zone-less timestamp.
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// ISO-8601 rendering: offset as `+HH:MM` for aware timestamps (or
    /// `+HH:MM:SS` when the offset has a seconds part), no offset for naive
    /// ones, fractional seconds only when non-zero.
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        match self {
            Self::Aware(dt) => {
                let formats = if dt.offset().local_minus_utc() % 60 == 0 {
                    &AWARE_FORMATS
                } else {
                    &AWARE_FORMATS_WITH_SECONDS
                };
                dt.format(formats[precision(dt.nanosecond())]).to_string()
            }
            Self::Naive(dt) => dt
                .format(NAIVE_FORMATS[precision(dt.nanosecond())])
                .to_string(),
        }
    }
}

// 0: whole seconds, 1: microseconds, 2: nanoseconds
const fn precision(nanos: u32) -> usize {
    if nanos == 0 {
        0
    } else if nanos % 1_000 == 0 {
        1
    } else {
        2
    }
}

#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Timestamp(Timestamp),
    Sequence(Vec<Value>),
    /// Ordered entries; a repeated key keeps its first position and last value.
    Mapping(Vec<(String, Value)>),
    Record(Arc<dyn FieldExposing>),
}

impl Value {
    /// Wrap a record type.
    pub fn record<R: FieldExposing + 'static>(record: R) -> Self {
        Self::Record(Arc::new(record))
    }

    /// Build a mapping from any iterator of key/value pairs.
    pub fn mapping<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Mapping(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Timestamp(ts) => f.debug_tuple("Timestamp").field(ts).finish(),
            Self::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Self::Mapping(entries) => f.debug_tuple("Mapping").field(entries).finish(),
            Self::Record(record) => f.debug_tuple("Record").field(&record.type_name()).finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::Mapping(a), Self::Mapping(b)) => a == b,
            // records have no structural equality; compare identity
            (Self::Record(a), Self::Record(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}

macro_rules! impl_from_number {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(
            impl From<$source> for Value {
                fn from(n: $source) -> Self {
                    Self::Number(Number::$variant(<$target>::from(n)))
                }
            }
        )+
    };
}

impl_from_number!(I64, i64, i8, i16, i32, i64);
impl_from_number!(U64, u64, u8, u16, u32, u64);
impl_from_number!(F64, f64, f32, f64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Self::Timestamp(ts)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(dt: DateTime<Tz>) -> Self {
        Self::Timestamp(Timestamp::Aware(dt.fixed_offset()))
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Self::Timestamp(Timestamp::Naive(dt))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Sequence(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Number(Number::I64(i))
                } else if let Some(u) = n.as_u64() {
                    Self::Number(Number::U64(u))
                } else {
                    n.as_f64().map_or(Self::Null, |f| Self::Number(Number::F64(f)))
                }
            }
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::from(items),
            serde_json::Value::Object(map) => Self::mapping(map),
        }
    }
}
