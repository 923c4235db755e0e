//! Trust-level arguments of the form `level[,"pass phrase"]`

use crate::error::{KeyError, Result};
use crate::registry::MAX_KEY_NUMBER;
use zeroize::Zeroizing;

/// One requested key.
#[derive(Debug, Clone)]
pub struct KeyRequest {
    pub number: u32,
    /// `None` when no phrase was given at all; `Some("")` means "do not encrypt".
    pub pass_phrase: Option<Zeroizing<String>>,
}

impl KeyRequest {
    /// Parse one positional argument, inheriting `global` (from `-p`) unless
    /// the argument carries its own phrase.
    pub fn parse(arg: &str, global: Option<&str>) -> Result<Self> {
        let (number_part, inline) = match arg.split_once(',') {
            Some((n, phrase)) => (n, Some(unquote(phrase))),
            None => (arg, None),
        };

        let number = parse_integer(number_part)
            .ok_or_else(|| KeyError::Usage(format!("Parameter '{}' should be an integer.", arg)))?;

        if number <= 0 {
            return Err(KeyError::Usage(format!(
                "Key numbers must be greater than 0; you specified '{}'.",
                arg
            )));
        }
        if number > MAX_KEY_NUMBER as i64 {
            return Err(KeyError::Usage(format!(
                "Key numbers must not exceed {}; you specified '{}'.",
                MAX_KEY_NUMBER, arg
            )));
        }

        let pass_phrase = inline
            .or(global)
            .map(|p| Zeroizing::new(p.to_string()));

        Ok(Self {
            number: number as u32,
            pass_phrase,
        })
    }

    /// Parse every positional argument in order.
    pub fn parse_all<S: AsRef<str>>(args: &[S], global: Option<&str>) -> Result<Vec<Self>> {
        if args.is_empty() {
            return Err(KeyError::Usage(
                "At least one key number must be specified.".into(),
            ));
        }
        args.iter().map(|a| Self::parse(a.as_ref(), global)).collect()
    }
}

/// Accepts an optional sign, then decimal digits or a `0x` hex number.
fn parse_integer(token: &str) -> Option<i64> {
    let token = token.trim_start();
    let (negative, digits) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };

    let value = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) if !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()) => {
            i64::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.parse().ok()?
        }
        None => return None,
    };

    Some(if negative { -value } else { value })
}

/// Shells usually strip the quotes; drop them if they survived.
fn unquote(phrase: &str) -> &str {
    if phrase.len() >= 2 && phrase.starts_with('"') && phrase.ends_with('"') {
        &phrase[1..phrase.len() - 1]
    } else {
        phrase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrase(req: &KeyRequest) -> Option<&str> {
        req.pass_phrase.as_deref().map(String::as_str)
    }

    #[test]
    fn test_plain_number() {
        let req = KeyRequest::parse("3", None).unwrap();
        assert_eq!(req.number, 3);
        assert_eq!(phrase(&req), None);
    }

    #[test]
    fn test_positive_numbers_only() {
        for bad in ["0", "-1", "-12", "+0", "0x0"] {
            let err = KeyRequest::parse(bad, None).unwrap_err();
            assert!(
                err.to_string().contains(&format!("'{}'", bad)),
                "{} -> {}",
                bad,
                err
            );
        }
        assert_eq!(KeyRequest::parse("+7", None).unwrap().number, 7);
        assert_eq!(KeyRequest::parse("0x10", None).unwrap().number, 16);
    }

    #[test]
    fn test_non_integer_rejected() {
        for bad in ["abc", "1a", "", ",pw", "1.5", "0x", "99999999999999999999"] {
            let err = KeyRequest::parse(bad, None).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Parameter '{}' should be an integer.", bad)
            );
        }
    }

    #[test]
    fn test_upper_bound() {
        assert!(KeyRequest::parse("1024", None).is_ok());
        assert!(KeyRequest::parse("1025", None).is_err());
    }

    #[test]
    fn test_inline_phrase_overrides_global() {
        let req = KeyRequest::parse("2,hunter2", Some("global")).unwrap();
        assert_eq!(phrase(&req), Some("hunter2"));

        let req = KeyRequest::parse("2,\"hunter 2\"", None).unwrap();
        assert_eq!(phrase(&req), Some("hunter 2"));

        let req = KeyRequest::parse("4", Some("global")).unwrap();
        assert_eq!(phrase(&req), Some("global"));
    }

    #[test]
    fn test_empty_inline_phrase_is_distinct_from_none() {
        let req = KeyRequest::parse("1,", Some("global")).unwrap();
        assert_eq!(phrase(&req), Some(""));

        let req = KeyRequest::parse("1,\"\"", None).unwrap();
        assert_eq!(phrase(&req), Some(""));

        let req = KeyRequest::parse("1", None).unwrap();
        assert_eq!(phrase(&req), None);
    }

    #[test]
    fn test_parse_all_keeps_order() {
        let reqs = KeyRequest::parse_all(&["3", "1", "2,x"], None).unwrap();
        let numbers: Vec<u32> = reqs.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![3, 1, 2]);

        let none: [&str; 0] = [];
        assert!(KeyRequest::parse_all(&none, None).is_err());
    }
}
