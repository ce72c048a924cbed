//! Merging a secondary (Latin) Glyphs source into a base (Arabic) one.

use std::collections::{HashMap, HashSet};

use glyphs_plist::{Font, FontMaster, Glyph, Kerning};

use crate::error::{MergeError, Result};
use crate::features;
use crate::metadata::{self, Version};

/// Glyphs the base font already provides for every script.
pub const SHARED_GLYPHS: [&str; 5] = ["space", "nbspace", "CR", "NULL", ".notdef"];

/// Ligature glyphs of the secondary font, which this design does not use.
pub const LIGATURE_GLYPHS: [&str; 2] = ["fi", "fl"];
pub const LIGATURE_PREFIX: &str = "f_";

/// Whether a secondary glyph is left out of the merge.
pub fn is_skipped(name: &str) -> bool {
    SHARED_GLYPHS.contains(&name)
        || LIGATURE_GLYPHS.contains(&name)
        || name.starts_with(LIGATURE_PREFIX)
}

/// Merges `secondary` into `base` and stamps the result with `version` and
/// a copyright notice ending in the current year.
pub fn merge(base: Font, secondary: Font, version: &str) -> Result<Font> {
    merge_with_year(base, secondary, version, metadata::current_year())
}

pub fn merge_with_year(
    mut base: Font,
    secondary: Font,
    version: &str,
    year: i32,
) -> Result<Font> {
    let version: Version = version.parse()?;

    let Font {
        glyphs,
        font_master,
        kerning,
        classes,
        feature_prefixes,
        features,
        ..
    } = secondary;

    merge_glyphs(&mut base, glyphs, &font_master)?;
    merge_masters(&mut base, &font_master, kerning.unwrap_or_default());

    log::info!("merging classes and feature code");
    features::merge_classes(&mut base, classes.unwrap_or_default());
    features::merge_feature_prefixes(&mut base, feature_prefixes.unwrap_or_default());
    features::merge_features(&mut base, features.unwrap_or_default());

    metadata::stamp(&mut base, version, year);
    Ok(base)
}

/// Appends the secondary glyphs to the base font, re-homing their master
/// layers onto the base masters of the same name.
pub fn merge_glyphs(
    base: &mut Font,
    glyphs: Vec<Glyph>,
    secondary_masters: &[FontMaster],
) -> Result<()> {
    let base_codepoints: HashSet<char> = base
        .glyphs
        .iter()
        .flat_map(|glyph| glyph.codepoints())
        .collect();
    let mut glyph_names: HashSet<String> = base
        .glyphs
        .iter()
        .map(|glyph| glyph.name().to_string())
        .collect();

    let base_master_ids: HashMap<String, String> = base
        .font_master
        .iter()
        .map(|master| (master.name().into_owned(), master.id.clone()))
        .collect();
    let secondary_master_names: HashMap<&str, String> = secondary_masters
        .iter()
        .map(|master| (master.id.as_str(), master.name().into_owned()))
        .collect();

    log::info!(
        "merging {} glyphs into a font of {}",
        glyphs.len(),
        base.glyphs.len()
    );
    let first_appended = base.glyphs.len();
    let mut skipped = 0;
    for mut glyph in glyphs {
        if is_skipped(glyph.name()) {
            log::debug!("skipping {}", glyph.name());
            skipped += 1;
            continue;
        }
        if glyph_names.contains(glyph.name()) {
            return Err(MergeError::DuplicateGlyph(glyph.name().to_string()));
        }
        check_codepoints(&glyph, &base_codepoints)?;

        for layer in glyph.layers.iter_mut() {
            let Some(master_name) = secondary_master_names.get(layer.master_id()) else {
                log::warn!(
                    "layer {} of {} belongs to no master of the secondary font",
                    layer.layer_id,
                    glyph.glyphname.as_str()
                );
                continue;
            };
            if !layer.is_master_layer() {
                log::warn!(
                    "layer {} of {} still refers to secondary master {}",
                    layer.layer_id,
                    glyph.glyphname.as_str(),
                    master_name
                );
                continue;
            }
            let Some(base_id) = base_master_ids.get(master_name) else {
                log::debug!(
                    "no base master named {}, layer {} of {} left as is",
                    master_name,
                    layer.layer_id,
                    glyph.glyphname.as_str()
                );
                continue;
            };
            layer.layer_id = base_id.clone();
            if layer.associated_master_id.is_some() {
                layer.associated_master_id = Some(base_id.clone());
            }
        }

        glyph_names.insert(glyph.name().to_string());
        base.glyphs.push(glyph);
    }
    log::info!(
        "appended {} glyphs, skipped {}",
        base.glyphs.len() - first_appended,
        skipped
    );

    warn_about_missing_components(base, first_appended, &glyph_names);
    Ok(())
}

/// A glyph is a duplicate when every one of its code points is taken by the
/// base font. Glyphs without code points always pass.
fn check_codepoints(glyph: &Glyph, base_codepoints: &HashSet<char>) -> Result<()> {
    let codepoints: Vec<char> = glyph.codepoints().collect();
    if codepoints.is_empty() {
        return Ok(());
    }
    let taken = codepoints
        .iter()
        .filter(|c| base_codepoints.contains(*c))
        .count();
    if taken == codepoints.len() {
        return Err(MergeError::DuplicateUnicode {
            name: glyph.name().to_string(),
            codepoints: format_codepoints(&codepoints),
        });
    }
    if taken > 0 {
        log::warn!(
            "glyph {} shares some code points with the base font: {}",
            glyph.name(),
            format_codepoints(&codepoints)
        );
    }
    Ok(())
}

fn format_codepoints(codepoints: &[char]) -> String {
    codepoints
        .iter()
        .map(|c| format!("U+{:04X}", *c as u32))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Composites of the secondary font may refer to glyphs that were skipped.
fn warn_about_missing_components(font: &Font, first_appended: usize, names: &HashSet<String>) {
    for glyph in &font.glyphs[first_appended..] {
        let missing: HashSet<&str> = glyph
            .layers
            .iter()
            .flat_map(|layer| layer.components.iter().flatten())
            .map(|component| component.name.as_str())
            .filter(|name| !names.contains(*name))
            .collect();
        for name in missing {
            log::warn!(
                "{} uses component {} which is not in the merged font",
                glyph.name(),
                name
            );
        }
    }
}

/// For every base master, takes over the kerning and vertical metrics of each
/// secondary master of the same name. A secondary kerning row replaces the
/// base row for the same left-hand key.
pub fn merge_masters(base: &mut Font, secondary_masters: &[FontMaster], kerning: Kerning) {
    for master in base.font_master.iter_mut() {
        let name = master.name().into_owned();
        let mut matched = false;
        for other in secondary_masters.iter().filter(|other| other.name() == name) {
            log::info!("merging master {} ({} into {})", name, other.id, master.id);
            matched = true;

            if let Some(rows) = kerning.get(&other.id) {
                base.kerning
                    .get_or_insert_with(Kerning::new)
                    .entry(master.id.clone())
                    .or_default()
                    .extend(rows.clone());
            }

            master.x_height = other.x_height;
            master.cap_height = other.cap_height;
        }
        if !matched {
            log::debug!("base master {} has no secondary counterpart", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use glyphs_plist::{FromPlist, Plist};
    use maplit::btreemap;

    use super::*;

    fn base_font() -> Font {
        r#"{
fontMaster = (
{
id = "AR-REG";
xHeight = 400;
capHeight = 600;
},
{
id = "AR-BOLD";
weight = Bold;
}
);
glyphs = (
{
glyphname = space;
layers = ({ layerId = "AR-REG"; width = 200; });
unicode = 0020;
},
{
glyphname = alef;
layers = ({ layerId = "AR-REG"; width = 300; });
unicode = 0627;
}
);
kerning = {
"AR-REG" = {
alef = { beh = -20; };
A = { V = -10; W = -5; };
};
};
}"#
        .parse()
        .unwrap()
    }

    fn secondary_font(glyphs: &str) -> Font {
        format!(
            r#"{{
fontMaster = (
{{
id = "LA-REG";
xHeight = 500;
capHeight = 700;
}},
{{
id = "LA-LIGHT";
weight = Light;
xHeight = 480;
}}
);
glyphs = ({});
kerning = {{
"LA-REG" = {{
A = {{ V = -80; Y = -60; }};
T = {{ o = -40; }};
}};
"LA-LIGHT" = {{
A = {{ V = -70; }};
}};
}};
}}"#,
            glyphs
        )
        .parse()
        .unwrap()
    }

    fn glyph(name: &str, unicode: Option<&str>, layers: &str) -> String {
        let unicode = unicode
            .map(|u| format!("unicode = \"{}\";", u))
            .unwrap_or_default();
        format!("{{ glyphname = \"{}\"; {} layers = ({}); }}", name, unicode, layers)
    }

    const MASTER_LAYER: &str = r#"{ layerId = "LA-REG"; width = 500; }"#;

    fn names(font: &Font) -> Vec<&str> {
        font.glyphs.iter().map(Glyph::name).collect()
    }

    #[test]
    fn appends_glyphs_after_base_glyphs() {
        let secondary = secondary_font(&[
            glyph("A", Some("0041"), MASTER_LAYER),
            glyph("space", Some("0020"), MASTER_LAYER),
            glyph("B", Some("0042"), MASTER_LAYER),
        ]
        .join(","));
        let merged = merge(base_font(), secondary, "1.0").unwrap();
        assert_eq!(names(&merged), vec!["space", "alef", "A", "B"]);
    }

    #[test]
    fn skips_shared_and_ligature_glyphs() {
        let all = [
            "space", "nbspace", "CR", "NULL", ".notdef", "fi", "fl", "f_f", "f_f_i", "A",
        ];
        let glyphs: Vec<String> = all.iter().map(|name| glyph(name, None, MASTER_LAYER)).collect();
        let base = base_font();
        let base_count = base.glyphs.len();
        let merged = merge(base, secondary_font(&glyphs.join(",")), "1.0").unwrap();

        assert_eq!(merged.glyphs.len(), base_count + 1);
        assert_eq!(names(&merged)[base_count..], ["A"]);
        assert!(is_skipped("f_"));
        assert!(!is_skipped("ff"));
        assert!(!is_skipped("fi.alt"));
    }

    #[test]
    fn duplicate_glyph_name_fails() {
        let secondary = secondary_font(&glyph("alef", Some("E000"), MASTER_LAYER));
        let err = merge(base_font(), secondary, "1.0").unwrap_err();
        assert!(matches!(err, MergeError::DuplicateGlyph(ref name) if name == "alef"));
    }

    #[test]
    fn duplicate_within_secondary_fails() {
        let secondary = secondary_font(&[
            glyph("A", None, MASTER_LAYER),
            glyph("A", None, MASTER_LAYER),
        ]
        .join(","));
        let err = merge(base_font(), secondary, "1.0").unwrap_err();
        assert!(matches!(err, MergeError::DuplicateGlyph(ref name) if name == "A"));
    }

    #[test]
    fn duplicate_unicode_fails() {
        let secondary = secondary_font(&glyph("alef.latn", Some("0627"), MASTER_LAYER));
        let err = merge(base_font(), secondary, "1.0").unwrap_err();
        assert!(matches!(
            err,
            MergeError::DuplicateUnicode { ref name, .. } if name == "alef.latn"
        ));
    }

    #[test]
    fn partial_unicode_overlap_passes() {
        let secondary = secondary_font(&glyph("alef.latn", Some("0627,E000"), MASTER_LAYER));
        let merged = merge(base_font(), secondary, "1.0").unwrap();
        assert!(merged.get_glyph("alef.latn").is_some());
    }

    #[test]
    fn glyphs_without_unicode_pass() {
        let secondary = secondary_font(&[
            glyph("a.sc", None, MASTER_LAYER),
            glyph("b.sc", None, MASTER_LAYER),
        ]
        .join(","));
        let merged = merge(base_font(), secondary, "1.0").unwrap();
        assert_eq!(merged.glyphs.len(), 4);
    }

    #[test]
    fn master_layers_are_rehomed() {
        let layers = r#"
{ layerId = "LA-REG"; width = 500; },
{ associatedMasterId = "LA-REG"; layerId = "LA-REG"; width = 500; },
{ associatedMasterId = "LA-REG"; layerId = "BRACE"; name = "{ 90 }"; width = 510; },
{ layerId = "LA-LIGHT"; width = 490; },
{ associatedMasterId = "GONE"; layerId = "ORPHAN"; width = 1; }
"#;
        let secondary = secondary_font(&glyph("A", Some("0041"), layers));
        let merged = merge(base_font(), secondary, "1.0").unwrap();
        let layers = &merged.get_glyph("A").unwrap().layers;

        assert_eq!(layers[0].layer_id, "AR-REG");
        assert_eq!(layers[0].associated_master_id, None);
        assert_eq!(layers[1].layer_id, "AR-REG");
        assert_eq!(layers[1].associated_master_id.as_deref(), Some("AR-REG"));
        // Only master layers move.
        assert_eq!(layers[2].layer_id, "BRACE");
        assert_eq!(layers[2].associated_master_id.as_deref(), Some("LA-REG"));
        // No base master is called Light.
        assert_eq!(layers[3].layer_id, "LA-LIGHT");
        assert_eq!(layers[4].layer_id, "ORPHAN");
    }

    #[test]
    fn kerning_and_metrics_follow_master_names() {
        let merged = merge(base_font(), secondary_font(""), "1.0").unwrap();
        let kerning = merged.kerning.as_ref().unwrap();

        let regular = &kerning["AR-REG"];
        assert_eq!(regular["alef"]["beh"], -20.0);
        assert_eq!(regular["A"]["V"], -80.0);
        // The secondary row for A replaces the base row whole.
        assert!(!regular["A"].contains_key("W"));
        assert_eq!(regular["A"]["Y"], -60.0);
        assert_eq!(regular["T"]["o"], -40.0);
        assert!(!kerning.contains_key("AR-BOLD"));
        assert!(!kerning.contains_key("LA-REG"));
        assert!(!kerning.contains_key("LA-LIGHT"));

        let regular_master = merged.get_master("AR-REG").unwrap();
        assert_eq!(regular_master.x_height, Some(500.0));
        assert_eq!(regular_master.cap_height, Some(700.0));
        let bold_master = merged.get_master("AR-BOLD").unwrap();
        assert_eq!(bold_master.x_height, None);
    }

    #[test]
    fn kerning_table_created_for_base_master() {
        let mut base = base_font();
        base.kerning = None;
        let masters = secondary_font("").font_master;
        let kerning: Kerning = BTreeMap::from_plist(Plist::Dictionary(btreemap! {
            "LA-REG".to_string() => Plist::Dictionary(btreemap! {
                "A".to_string() => Plist::Dictionary(btreemap! {
                    "V".to_string() => Plist::Integer(-80),
                }),
            }),
        }))
        .unwrap();
        merge_masters(&mut base, &masters, kerning);
        assert_eq!(base.kerning.unwrap()["AR-REG"]["A"]["V"], -80.0);
    }

    #[test]
    fn namesake_masters_all_receive_kerning() {
        let mut base: Font = r#"{
fontMaster = (
{ id = AR1; xHeight = 400; },
{ id = AR2; xHeight = 410; }
);
glyphs = ();
}"#
        .parse()
        .unwrap();
        let secondary: Font = r#"{
fontMaster = (
{ id = LA1; xHeight = 500; },
{ id = LA2; xHeight = 510; }
);
glyphs = ();
kerning = {
LA1 = { A = { V = -80; }; };
LA2 = { T = { o = -40; }; };
};
}"#
        .parse()
        .unwrap();
        merge_masters(&mut base, &secondary.font_master, secondary.kerning.unwrap());

        let kerning = base.kerning.unwrap();
        for id in ["AR1", "AR2"] {
            assert_eq!(kerning[id]["A"]["V"], -80.0);
            assert_eq!(kerning[id]["T"]["o"], -40.0);
        }
        // The last namesake's metrics win.
        assert_eq!(base.font_master[0].x_height, Some(510.0));
        assert_eq!(base.font_master[1].x_height, Some(510.0));
    }

    #[test]
    fn malformed_version_fails_before_merging() {
        let secondary = secondary_font(&glyph("A", Some("0041"), MASTER_LAYER));
        let err = merge(base_font(), secondary, "3").unwrap_err();
        assert!(matches!(err, MergeError::VersionFormat(ref v) if v == "3"));
    }

    #[test]
    fn stamps_metadata() {
        let merged = merge_with_year(base_font(), secondary_font(""), "3.12", 2031).unwrap();
        assert_eq!(merged.version_major, Some(3));
        assert_eq!(merged.version_minor, Some(12));
        assert_eq!(
            merged.copyright.as_deref(),
            Some("Copyright © 2015-2031 The Reem Kufi Project Authors.")
        );

        let merged = merge(base_font(), secondary_font(""), "1.0").unwrap();
        assert_eq!(
            merged.copyright,
            Some(metadata::copyright_notice(metadata::current_year()))
        );
    }

    #[test]
    fn merged_font_round_trips() {
        let secondary = secondary_font(&glyph("A", Some("0041"), MASTER_LAYER));
        let text = merge(base_font(), secondary, "2.1")
            .unwrap()
            .to_plist_string();
        let reloaded: Font = text.parse().unwrap();
        assert_eq!(reloaded.glyphs.len(), 3);
        assert_eq!(reloaded.get_glyph("A").unwrap().layers[0].layer_id, "AR-REG");
        assert!(text.contains("unicode = 0041;"));
    }
}
