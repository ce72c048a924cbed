use std::collections::BTreeMap;

use crate::error::Error;
use crate::plist::Plist;

pub trait FromPlist: Sized {
    fn from_plist(plist: Plist) -> Result<Self, Error>;
}

/// Decoding of a dictionary entry that may be absent. Plain types require the
/// key, `Option`s do not.
pub trait FromPlistOpt: Sized {
    fn from_plist_opt(plist: Option<Plist>, key: &'static str) -> Result<Self, Error>;
}

impl<T: FromPlist> FromPlistOpt for T {
    fn from_plist_opt(plist: Option<Plist>, key: &'static str) -> Result<Self, Error> {
        match plist {
            Some(plist) => FromPlist::from_plist(plist),
            None => Err(Error::MissingField(key)),
        }
    }
}

impl<T: FromPlist> FromPlistOpt for Option<T> {
    fn from_plist_opt(plist: Option<Plist>, _key: &'static str) -> Result<Self, Error> {
        plist.map(FromPlist::from_plist).transpose()
    }
}

impl FromPlist for Plist {
    fn from_plist(plist: Plist) -> Result<Self, Error> {
        Ok(plist)
    }
}

impl FromPlist for String {
    fn from_plist(plist: Plist) -> Result<Self, Error> {
        match plist {
            Plist::String(s) => Ok(s),
            // Unquoted numeric names and codes, e.g. a class called `1`.
            Plist::Integer(i) => Ok(i.to_string()),
            Plist::Float(f) => Ok(f.to_string()),
            _ => Err(Error::UnexpectedType {
                expected: "string",
                context: "string",
            }),
        }
    }
}

impl FromPlist for bool {
    fn from_plist(plist: Plist) -> Result<Self, Error> {
        match &plist {
            Plist::Integer(i) => Ok(*i != 0),
            Plist::String(s) if s == "true" => Ok(true),
            Plist::String(s) if s == "false" => Ok(false),
            _ => Err(Error::InvalidValue {
                context: "boolean",
                value: plist.to_string(),
            }),
        }
    }
}

impl FromPlist for i64 {
    fn from_plist(plist: Plist) -> Result<Self, Error> {
        match &plist {
            Plist::Integer(i) => Ok(*i),
            Plist::String(s) => s.parse().map_err(|_| Error::InvalidValue {
                context: "integer",
                value: s.clone(),
            }),
            _ => Err(Error::InvalidValue {
                context: "integer",
                value: plist.to_string(),
            }),
        }
    }
}

impl FromPlist for f64 {
    fn from_plist(plist: Plist) -> Result<Self, Error> {
        match &plist {
            Plist::Integer(i) => Ok(*i as f64),
            Plist::Float(f) => Ok(*f),
            Plist::String(s) => s.parse().map_err(|_| Error::InvalidValue {
                context: "number",
                value: s.clone(),
            }),
            Plist::Array(_) | Plist::Dictionary(_) => Err(Error::UnexpectedType {
                expected: "number",
                context: "number",
            }),
        }
    }
}

impl<T: FromPlist> FromPlist for Vec<T> {
    fn from_plist(plist: Plist) -> Result<Self, Error> {
        match plist {
            Plist::Array(items) => items.into_iter().map(FromPlist::from_plist).collect(),
            _ => Err(Error::UnexpectedType {
                expected: "array",
                context: "list",
            }),
        }
    }
}

impl<T: FromPlist> FromPlist for BTreeMap<String, T> {
    fn from_plist(plist: Plist) -> Result<Self, Error> {
        let dict = plist.into_dict().ok_or(Error::UnexpectedType {
            expected: "dictionary",
            context: "map",
        })?;
        dict.into_iter()
            .map(|(key, value)| Ok((key, T::from_plist(value)?)))
            .collect()
    }
}
