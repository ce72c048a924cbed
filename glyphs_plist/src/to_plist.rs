use std::collections::BTreeMap;

use crate::plist::Plist;

pub trait ToPlist {
    fn to_plist(self) -> Plist;
}

/// Encoding of a dictionary entry. `None` leaves the key out entirely.
pub trait ToPlistOpt {
    fn to_plist_opt(self) -> Option<Plist>;
}

impl<T: ToPlist> ToPlistOpt for T {
    fn to_plist_opt(self) -> Option<Plist> {
        Some(self.to_plist())
    }
}

impl<T: ToPlist> ToPlistOpt for Option<T> {
    fn to_plist_opt(self) -> Option<Plist> {
        self.map(ToPlist::to_plist)
    }
}

impl ToPlist for Plist {
    fn to_plist(self) -> Plist {
        self
    }
}

impl ToPlist for String {
    fn to_plist(self) -> Plist {
        self.into()
    }
}

impl ToPlist for bool {
    fn to_plist(self) -> Plist {
        self.into()
    }
}

impl ToPlist for i64 {
    fn to_plist(self) -> Plist {
        self.into()
    }
}

impl ToPlist for f64 {
    fn to_plist(self) -> Plist {
        self.into()
    }
}

impl<T: ToPlist> ToPlist for Vec<T> {
    fn to_plist(self) -> Plist {
        Plist::Array(self.into_iter().map(ToPlist::to_plist).collect())
    }
}

impl<T: ToPlist> ToPlist for BTreeMap<String, T> {
    fn to_plist(self) -> Plist {
        Plist::Dictionary(
            self.into_iter()
                .map(|(key, value)| (key, value.to_plist()))
                .collect(),
        )
    }
}
