//! Lossless reading and writing of Glyphs.app 2 source files.

#[macro_use]
extern crate glyphs_plist_derive;

mod error;
mod font;
mod from_plist;
mod plist;
mod to_plist;

pub use error::Error;
pub use font::{
    Anchor, Class, Component, Feature, FeaturePrefix, Font, FontMaster, Glyph, Kerning, Layer,
    Node, NodeType, Path,
};
pub use from_plist::{FromPlist, FromPlistOpt};
pub use plist::Plist;
pub use to_plist::{ToPlist, ToPlistOpt};
