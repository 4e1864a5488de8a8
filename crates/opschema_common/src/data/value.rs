use std::fmt;

/// A concrete argument value observed at a call site.  Only the scalar kinds that special cases
/// branch on are represented; tensors and other payloads never influence the analysis.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    None,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
}

impl ArgValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ArgValue::None => "None",
            ArgValue::Bool(_) => "bool",
            ArgValue::Int(_) => "int",
            ArgValue::Double(_) => "float",
            ArgValue::Str(_) => "str",
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::None => write!(f, "None"),
            ArgValue::Bool(true) => write!(f, "True"),
            ArgValue::Bool(false) => write!(f, "False"),
            ArgValue::Int(i) => write!(f, "{}", i),
            ArgValue::Double(x) => write!(f, "{:?}", x),
            ArgValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}

impl From<i64> for ArgValue {
    fn from(i: i64) -> Self {
        ArgValue::Int(i)
    }
}

impl From<f64> for ArgValue {
    fn from(x: f64) -> Self {
        ArgValue::Double(x)
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Str(s.to_owned())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Str(s)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => ArgValue::None,
        }
    }
}
