//! Version and copyright stamping of the merged font.

use std::str::FromStr;

use chrono::Datelike;
use glyphs_plist::Font;

use crate::error::MergeError;

/// A `<major>.<minor>` font version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: i64,
    pub minor: i64,
}

impl FromStr for Version {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MergeError::VersionFormat(s.to_string());
        let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
        Ok(Version {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }
}

pub fn copyright_notice(year: i32) -> String {
    format!("Copyright © 2015-{} The Reem Kufi Project Authors.", year)
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

pub fn stamp(font: &mut Font, version: Version, year: i32) {
    log::info!("stamping version {}.{}", version.major, version.minor);
    font.version_major = Some(version.major);
    font.version_minor = Some(version.minor);
    font.copyright = Some(copyright_notice(year));
}
