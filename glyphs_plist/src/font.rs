//! The Glyphs 2 source model. Fields the merge tooling cares about are typed,
//! everything else rides along in `other_stuff` so a load/save round trip
//! keeps the file intact.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::{fs, path};

use kurbo::{Affine, Point};
use norad::{Codepoints, Name};

use crate::error::Error;
use crate::from_plist::FromPlist;
use crate::plist::Plist;
use crate::to_plist::ToPlist;

/// Kerning values keyed by master id, then left glyph or group, then right
/// glyph or group.
pub type Kerning = BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>;

#[derive(Clone, Debug, FromPlist, ToPlist)]
pub struct Font {
    pub glyphs: Vec<Glyph>,
    pub font_master: Vec<FontMaster>,
    pub kerning: Option<Kerning>,
    pub classes: Option<Vec<Class>>,
    pub feature_prefixes: Option<Vec<FeaturePrefix>>,
    pub features: Option<Vec<Feature>>,
    pub copyright: Option<String>,
    pub version_major: Option<i64>,
    pub version_minor: Option<i64>,
    #[rest]
    pub other_stuff: BTreeMap<String, Plist>,
}

#[derive(Clone, Debug, FromPlist, ToPlist)]
pub struct Glyph {
    pub glyphname: Name,
    pub unicode: Option<Codepoints>,
    pub layers: Vec<Layer>,
    #[rest]
    pub other_stuff: BTreeMap<String, Plist>,
}

#[derive(Clone, Debug, FromPlist, ToPlist)]
pub struct Layer {
    pub name: Option<String>,
    pub associated_master_id: Option<String>,
    pub layer_id: String,
    pub width: f64,
    pub paths: Option<Vec<Path>>,
    pub components: Option<Vec<Component>>,
    pub anchors: Option<Vec<Anchor>>,
    #[rest]
    pub other_stuff: BTreeMap<String, Plist>,
}

#[derive(Clone, Debug, FromPlist, ToPlist)]
pub struct Path {
    pub closed: bool,
    pub nodes: Vec<Node>,
    #[rest]
    pub other_stuff: BTreeMap<String, Plist>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub pt: Point,
    pub node_type: NodeType,
    /// Node user data, kept verbatim, e.g. `{name = hr00;}`.
    pub user_data: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeType {
    Line,
    LineSmooth,
    OffCurve,
    Curve,
    CurveSmooth,
    QCurve,
    QCurveSmooth,
}

#[derive(Clone, Debug, FromPlist, ToPlist)]
pub struct Component {
    pub name: String,
    pub transform: Option<Affine>,
    #[rest]
    pub other_stuff: BTreeMap<String, Plist>,
}

#[derive(Clone, Debug, FromPlist, ToPlist)]
pub struct Anchor {
    pub name: String,
    pub position: Point,
    #[rest]
    pub other_stuff: BTreeMap<String, Plist>,
}

#[derive(Clone, Debug, FromPlist, ToPlist)]
pub struct FontMaster {
    pub id: String,
    pub name: Option<String>,
    pub weight: Option<String>,
    pub width: Option<String>,
    pub custom: Option<String>,
    pub italic_angle: Option<f64>,
    pub x_height: Option<f64>,
    pub cap_height: Option<f64>,
    #[rest]
    pub other_stuff: BTreeMap<String, Plist>,
}

#[derive(Clone, Debug, PartialEq, FromPlist, ToPlist)]
pub struct Class {
    pub name: String,
    pub code: String,
    #[rest]
    pub other_stuff: BTreeMap<String, Plist>,
}

#[derive(Clone, Debug, PartialEq, FromPlist, ToPlist)]
pub struct FeaturePrefix {
    pub name: String,
    pub code: String,
    #[rest]
    pub other_stuff: BTreeMap<String, Plist>,
}

#[derive(Clone, Debug, PartialEq, FromPlist, ToPlist)]
pub struct Feature {
    pub name: String,
    pub code: String,
    #[rest]
    pub other_stuff: BTreeMap<String, Plist>,
}

impl Font {
    pub fn load(path: &path::Path) -> Result<Font, Error> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let font: Font = contents.parse()?;
        log::debug!(
            "loaded {} with {} glyphs and {} masters",
            path.display(),
            font.glyphs.len(),
            font.font_master.len()
        );
        Ok(font)
    }

    pub fn save(self, path: &path::Path) -> Result<(), Error> {
        fs::write(path, self.to_plist_string()).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_plist_string(self) -> String {
        let mut text = self.to_plist().to_string();
        text.push('\n');
        text
    }

    pub fn get_glyph(&self, glyphname: &str) -> Option<&Glyph> {
        self.glyphs.iter().find(|g| g.name() == glyphname)
    }

    pub fn get_master(&self, id: &str) -> Option<&FontMaster> {
        self.font_master.iter().find(|m| m.id == id)
    }

    pub fn get_master_by_name(&self, name: &str) -> Option<&FontMaster> {
        self.font_master.iter().find(|m| m.name() == name)
    }

    pub fn get_feature_prefix_mut(&mut self, name: &str) -> Option<&mut FeaturePrefix> {
        self.feature_prefixes
            .as_mut()
            .and_then(|prefixes| prefixes.iter_mut().find(|p| p.name == name))
    }
}

impl std::str::FromStr for Font {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let plist = Plist::parse(s)?;
        if let Some(version) = plist.get(".formatVersion").and_then(Plist::as_i64) {
            if version >= 3 {
                return Err(Error::UnsupportedFormatVersion(version));
            }
        }
        Font::from_plist(plist)
    }
}

impl Glyph {
    pub fn name(&self) -> &str {
        self.glyphname.as_str()
    }

    pub fn get_layer(&self, layer_id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.layer_id == layer_id)
    }

    /// The glyph's code points, empty when it has none.
    pub fn codepoints(&self) -> impl Iterator<Item = char> + '_ {
        self.unicode.iter().flat_map(|codepoints| codepoints.iter())
    }
}

impl Layer {
    /// The master this layer belongs to. Master layers leave out
    /// `associatedMasterId`, their layer id is the master id.
    pub fn master_id(&self) -> &str {
        self.associated_master_id
            .as_deref()
            .unwrap_or(&self.layer_id)
    }

    pub fn is_master_layer(&self) -> bool {
        self.master_id() == self.layer_id
    }
}

impl FontMaster {
    /// The user-facing master name, as Glyphs.app shows it.
    pub fn name(&self) -> Cow<'_, str> {
        if let Some(name) = self.custom_parameter("Master Name").and_then(Plist::as_str) {
            return Cow::Borrowed(name);
        }
        if let Some(name) = &self.name {
            return Cow::Borrowed(name);
        }

        let mut parts: Vec<&str> = [
            self.weight.as_deref().unwrap_or("Regular"),
            self.width.as_deref().unwrap_or("Regular"),
        ]
        .into_iter()
        .chain(self.custom.as_deref())
        .filter(|part| !part.is_empty())
        .collect();
        while parts.len() > 1 {
            match parts.iter().position(|part| *part == "Regular") {
                Some(index) => {
                    parts.remove(index);
                }
                None => break,
            }
        }
        if self.italic_angle.map_or(false, |angle| angle != 0.0) {
            if parts == ["Regular"] {
                return Cow::Borrowed("Italic");
            }
            if !self.custom.as_deref().unwrap_or_default().contains("Italic") {
                parts.push("Italic");
            }
        }
        Cow::Owned(parts.join(" "))
    }

    pub fn custom_parameter(&self, name: &str) -> Option<&Plist> {
        self.other_stuff
            .get("customParameters")
            .and_then(Plist::as_array)?
            .iter()
            .find(|param| param.get("name").and_then(Plist::as_str) == Some(name))
            .and_then(|param| param.get("value"))
    }
}

impl FromPlist for Name {
    fn from_plist(plist: Plist) -> Result<Self, Error> {
        let name = String::from_plist(plist)?;
        Name::new(&name).map_err(|_| Error::InvalidValue {
            context: "glyph name",
            value: name,
        })
    }
}

impl ToPlist for Name {
    fn to_plist(self) -> Plist {
        self.as_str().into()
    }
}

/// Glyphs 2 writes code points as hex, several joined by commas. A value
/// made only of decimal digits may have been read as an integer.
impl FromPlist for Codepoints {
    fn from_plist(plist: Plist) -> Result<Self, Error> {
        let raw = match plist {
            Plist::String(s) => s,
            Plist::Integer(i) => i.to_string(),
            other => {
                return Err(Error::InvalidValue {
                    context: "unicode",
                    value: other.to_string(),
                })
            }
        };
        raw.split(',')
            .map(|hex| {
                u32::from_str_radix(hex.trim(), 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| Error::InvalidValue {
                        context: "unicode",
                        value: raw.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Codepoints::new)
    }
}

impl ToPlist for Codepoints {
    fn to_plist(self) -> Plist {
        self.iter()
            .map(|c| format!("{:04X}", c as u32))
            .collect::<Vec<_>>()
            .join(",")
            .into()
    }
}

impl FromPlist for Node {
    fn from_plist(plist: Plist) -> Result<Self, Error> {
        let invalid = |value: &str| Error::InvalidValue {
            context: "node",
            value: value.to_string(),
        };
        let raw = plist.as_str().ok_or_else(|| invalid(&plist.to_string()))?;
        let (coords, user_data) = match raw.find(" {") {
            Some(index) => (&raw[..index], Some(raw[index + 1..].to_string())),
            None => (raw, None),
        };
        let mut spl = coords.splitn(3, ' ');
        let x = spl.next().and_then(|x| x.parse().ok());
        let y = spl.next().and_then(|y| y.parse().ok());
        let node_type = spl.next().and_then(|t| t.parse().ok());
        match (x, y, node_type) {
            (Some(x), Some(y), Some(node_type)) => Ok(Node {
                pt: Point::new(x, y),
                node_type,
                user_data,
            }),
            _ => Err(invalid(raw)),
        }
    }
}

impl std::str::FromStr for NodeType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LINE" => Ok(NodeType::Line),
            "LINE SMOOTH" => Ok(NodeType::LineSmooth),
            "OFFCURVE" => Ok(NodeType::OffCurve),
            "CURVE" => Ok(NodeType::Curve),
            "CURVE SMOOTH" => Ok(NodeType::CurveSmooth),
            "QCURVE" => Ok(NodeType::QCurve),
            "QCURVE SMOOTH" => Ok(NodeType::QCurveSmooth),
            _ => Err(format!("unknown node type {}", s)),
        }
    }
}

impl NodeType {
    fn glyphs_str(&self) -> &'static str {
        match self {
            NodeType::Line => "LINE",
            NodeType::LineSmooth => "LINE SMOOTH",
            NodeType::OffCurve => "OFFCURVE",
            NodeType::Curve => "CURVE",
            NodeType::CurveSmooth => "CURVE SMOOTH",
            NodeType::QCurve => "QCURVE",
            NodeType::QCurveSmooth => "QCURVE SMOOTH",
        }
    }
}

impl ToPlist for Node {
    fn to_plist(self) -> Plist {
        let mut raw = format!("{} {} {}", self.pt.x, self.pt.y, self.node_type.glyphs_str());
        if let Some(user_data) = self.user_data {
            raw.push(' ');
            raw.push_str(&user_data);
        }
        raw.into()
    }
}

/// Parses Glyphs' `"{a, b, ...}"` coordinate strings.
fn parse_coords(plist: &Plist, context: &'static str) -> Result<Vec<f64>, Error> {
    let invalid = || Error::InvalidValue {
        context,
        value: plist.to_string(),
    };
    let raw = plist.as_str().ok_or_else(invalid)?;
    let inner = raw
        .strip_prefix('{')
        .and_then(|raw| raw.strip_suffix('}'))
        .ok_or_else(invalid)?;
    inner
        .split(',')
        .map(|c| c.trim().parse().map_err(|_| invalid()))
        .collect()
}

impl FromPlist for Affine {
    fn from_plist(plist: Plist) -> Result<Self, Error> {
        let coords = parse_coords(&plist, "transform")?;
        match coords[..] {
            [a, b, c, d, e, f] => Ok(Affine::new([a, b, c, d, e, f])),
            _ => Err(Error::InvalidValue {
                context: "transform",
                value: plist.to_string(),
            }),
        }
    }
}

impl ToPlist for Affine {
    fn to_plist(self) -> Plist {
        let c = self.as_coeffs();
        format!(
            "{{{}, {}, {}, {}, {}, {}}}",
            c[0], c[1], c[2], c[3], c[4], c[5]
        )
        .into()
    }
}

impl FromPlist for Point {
    fn from_plist(plist: Plist) -> Result<Self, Error> {
        let coords = parse_coords(&plist, "point")?;
        match coords[..] {
            [x, y] => Ok(Point::new(x, y)),
            _ => Err(Error::InvalidValue {
                context: "point",
                value: plist.to_string(),
            }),
        }
    }
}

impl ToPlist for Point {
    fn to_plist(self) -> Plist {
        format!("{{{}, {}}}", self.x, self.y).into()
    }
}
