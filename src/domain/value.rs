//! Typed values for transform configuration overrides
//!
//! Override values arrive as strings from `transforms.ini` and are coerced
//! to the narrowest matching type before being handed to a script: integer
//! first, then float, then string. The order matters: `"007"` becomes the
//! integer 7 while `"7.0"` becomes the float 7.0. Boolean-looking strings
//! (`"true"`, `"false"`) stay strings; scripts may rely on comparing them
//! as text.

use std::fmt;

use serde::Serialize;

/// A coerced configuration value bound to a transform script.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl ConfigValue {
    /// Coerces a raw string, trying integer, then float, then falling back
    /// to the string itself.
    pub fn coerce(raw: &str) -> Self {
        if let Ok(i) = raw.trim().parse::<i64>() {
            return ConfigValue::Int(i);
        }
        if let Ok(f) = raw.trim().parse::<f64>() {
            return ConfigValue::Float(f);
        }
        ConfigValue::Str(raw.to_string())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Int(_) => "int",
            ConfigValue::Float(_) => "float",
            ConfigValue::Str(_) => "string",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Int(i) => write!(f, "{}", i),
            ConfigValue::Float(x) => write!(f, "{}", x),
            ConfigValue::Str(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn integer_wins_over_float() {
        assert_eq!(ConfigValue::coerce("7"), ConfigValue::Int(7));
        assert_eq!(ConfigValue::coerce("007"), ConfigValue::Int(7));
        assert_eq!(ConfigValue::coerce("-42"), ConfigValue::Int(-42));
    }

    #[test]
    fn float_wins_over_string() {
        assert_eq!(ConfigValue::coerce("7.5"), ConfigValue::Float(7.5));
        assert_eq!(ConfigValue::coerce("7.0"), ConfigValue::Float(7.0));
    }

    #[test]
    fn plain_strings_pass_through() {
        assert_eq!(
            ConfigValue::coerce("seven"),
            ConfigValue::Str("seven".to_string())
        );
    }

    #[test]
    fn boolean_like_strings_stay_strings() {
        assert_eq!(
            ConfigValue::coerce("true"),
            ConfigValue::Str("true".to_string())
        );
        assert_eq!(
            ConfigValue::coerce("false"),
            ConfigValue::Str("false".to_string())
        );
    }

    proptest! {
        #[test]
        fn every_i64_round_trips_as_int(n: i64) {
            prop_assert_eq!(ConfigValue::coerce(&n.to_string()), ConfigValue::Int(n));
        }

        #[test]
        fn coercion_never_panics(s in "\\PC*") {
            let _ = ConfigValue::coerce(&s);
        }
    }
}
