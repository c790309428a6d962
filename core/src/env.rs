// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Utilities to deal with environment variables.

use std::env;
use std::time::Duration;
use url::Url;

/// Result type for this module.  Errors are human-readable descriptions of the problem.
type Result<T> = std::result::Result<T, String>;

/// Raw value of an environment variable pending conversion to its final type.
pub struct Value(String);

impl TryFrom<Value> for String {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        Ok(value.0)
    }
}

impl TryFrom<Value> for Duration {
    type Error = String;

    /// Parses human-readable durations such as `90s`, `5m` or `1h 30m`.
    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        let s = value.0.trim();
        humantime::parse_duration(s).map_err(|e| format!("Invalid Duration '{}': {}", s, e))
    }
}

impl TryFrom<Value> for Url {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        Url::parse(&value.0).map_err(|e| format!("Invalid Url: {}", e))
    }
}

/// Implements `TryFrom<Value>` for a type `t` that implements `FromStr`.
macro_rules! tryfrom_value_for_fromstr [
    ( $t:ty ) => {
        impl TryFrom<Value> for $t {
            type Error = String;

            fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
                value.0.parse::<$t>().map_err(|e| format!("Invalid {}: {}", stringify!($t), e))
            }
        }
    }
];

tryfrom_value_for_fromstr!(u16);
tryfrom_value_for_fromstr!(u32);
tryfrom_value_for_fromstr!(u64);
tryfrom_value_for_fromstr!(usize);

/// Reads the raw contents of the environment variable `name`, if present.
///
/// Empty values are treated as if the variable was not set.
fn get_raw_var(name: &str) -> Result<Option<String>> {
    match env::var(name) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(format!("Invalid value in environment variable {}", name))
        }
    }
}

/// Gets the value of the environment variable `name` and converts it to `T`.
pub fn get_required_var<T: TryFrom<Value, Error = String>>(name: &str) -> Result<T> {
    match get_optional_var(name)? {
        Some(value) => Ok(value),
        None => Err(format!("Required environment variable {} not present", name)),
    }
}

/// Gets the value of the environment variable `name` and converts it to `T`, returning `None`
/// if the variable is not set or is empty.
pub fn get_optional_var<T: TryFrom<Value, Error = String>>(name: &str) -> Result<Option<T>> {
    match get_raw_var(name)? {
        Some(value) => match Value(value).try_into() {
            Ok(value) => Ok(Some(value)),
            Err(e) => Err(format!("Invalid type in environment variable {}: {}", name, e)),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    #[test]
    fn test_value_to_string() {
        assert_eq!("foo bar", &TryInto::<String>::try_into(Value("foo bar".to_owned())).unwrap());
    }

    #[test]
    fn test_value_to_fromstr() {
        assert_eq!(1234u16, TryInto::<u16>::try_into(Value("1234".to_owned())).unwrap());

        let err = TryInto::<u16>::try_into(Value("-1".to_owned())).unwrap_err();
        assert!(err.starts_with("Invalid u16:"));
    }

    #[test]
    fn test_value_to_duration() {
        let parse = |s: &str| TryInto::<Duration>::try_into(Value(s.to_owned()));
        assert_eq!(Duration::from_secs(15), parse("15s").unwrap());
        assert_eq!(Duration::from_secs(2 * 60), parse("2m").unwrap());
        assert_eq!(Duration::from_secs(3 * 60 * 60), parse("3h").unwrap());
        assert_eq!(Duration::from_secs(3 * 24 * 60 * 60), parse("3d").unwrap());
        assert_eq!(Duration::from_secs(90 * 60), parse(" 1h 30m ").unwrap());
        assert_eq!(Duration::from_millis(250), parse("250ms").unwrap());
        assert!(parse("15").unwrap_err().starts_with("Invalid Duration '15'"));
        assert!(parse("3x").unwrap_err().starts_with("Invalid Duration '3x'"));
        assert!(parse("d").unwrap_err().starts_with("Invalid Duration 'd'"));
    }

    #[test]
    fn test_value_to_url() {
        let url: Url = Value("https://example.com/keys".to_owned()).try_into().unwrap();
        assert_eq!("example.com", url.host_str().unwrap());

        let err = TryInto::<Url>::try_into(Value("not a url".to_owned())).unwrap_err();
        assert!(err.starts_with("Invalid Url:"));
    }

    #[test]
    fn test_get_required_var_ok() {
        temp_env::with_var("TEST_PRESENT", Some("1234"), || {
            assert_eq!("1234", &get_required_var::<String>("TEST_PRESENT").unwrap());
        });
    }

    #[test]
    fn test_get_required_var_missing() {
        temp_env::with_var_unset("TEST_MISSING", || {
            assert_eq!(
                "Required environment variable TEST_MISSING not present",
                &get_required_var::<String>("TEST_MISSING").unwrap_err()
            );
        });
    }

    #[test]
    fn test_get_required_var_empty() {
        temp_env::with_var("TEST_EMPTY", Some(""), || {
            assert_eq!(
                "Required environment variable TEST_EMPTY not present",
                &get_required_var::<String>("TEST_EMPTY").unwrap_err()
            );
        });
    }

    #[test]
    fn test_get_required_var_not_utf8() {
        temp_env::with_var("TEST_INVALID", Some(OsStr::from_bytes(b"\xc3\x28")), || {
            assert_eq!(
                "Invalid value in environment variable TEST_INVALID",
                &get_required_var::<String>("TEST_INVALID").unwrap_err()
            );
        });
    }

    #[test]
    fn test_get_required_var_bad_type() {
        temp_env::with_var("TEST_BAD", Some("b4d"), || {
            let err = get_required_var::<u16>("TEST_BAD").unwrap_err();
            assert!(err.starts_with("Invalid type in environment variable TEST_BAD: Invalid u16"));
        });
    }

    #[test]
    fn test_get_optional_var_bad_duration() {
        temp_env::with_var("TEST_BAD_TTL", Some("soon"), || {
            let err = get_optional_var::<Duration>("TEST_BAD_TTL").unwrap_err();
            assert!(err.starts_with(
                "Invalid type in environment variable TEST_BAD_TTL: Invalid Duration 'soon'"
            ));
        });
    }

    #[test]
    fn test_get_optional_var() {
        temp_env::with_vars([("TEST_OPT_SET", Some("5m")), ("TEST_OPT_UNSET", None)], || {
            assert_eq!(
                Some(Duration::from_secs(300)),
                get_optional_var::<Duration>("TEST_OPT_SET").unwrap()
            );
            assert_eq!(None, get_optional_var::<Duration>("TEST_OPT_UNSET").unwrap());
        });
    }
}
