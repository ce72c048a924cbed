//! Merging of glyph classes and OpenType feature code.

use glyphs_plist::{Class, Feature, FeaturePrefix, Font};

/// The prefix holding `languagesystem` statements for all scripts.
pub const LANGUAGESYSTEMS: &str = "Languagesystems";

/// Features of the secondary font that are not carried over. Its ligatures are
/// of no use in this design.
pub const DROPPED_FEATURES: [&str; 2] = ["liga", "dlig"];

pub fn merge_classes(font: &mut Font, classes: Vec<Class>) {
    if classes.is_empty() {
        return;
    }
    log::debug!("appending {} classes", classes.len());
    font.classes.get_or_insert_with(Vec::new).extend(classes);
}

/// Appends the secondary prefixes. The `Languagesystems` prefixes of both
/// fonts are combined into one with sorted lines, which puts the `DFLT`
/// statement first.
pub fn merge_feature_prefixes(font: &mut Font, prefixes: Vec<FeaturePrefix>) {
    for mut prefix in prefixes {
        if prefix.name != LANGUAGESYSTEMS {
            font.feature_prefixes.get_or_insert_with(Vec::new).push(prefix);
            continue;
        }

        match font.get_feature_prefix_mut(LANGUAGESYSTEMS) {
            Some(existing) => {
                if !existing.code.is_empty() && !existing.code.ends_with('\n') {
                    existing.code.push('\n');
                }
                existing.code.push_str(&prefix.code);
                existing.code = sort_lines(&existing.code);
            }
            None => {
                log::warn!("base font has no {} prefix, adding one", LANGUAGESYSTEMS);
                prefix.code = sort_lines(&prefix.code);
                font.feature_prefixes.get_or_insert_with(Vec::new).push(prefix);
            }
        }
    }
}

pub fn merge_features(font: &mut Font, features: Vec<Feature>) {
    for feature in features {
        if DROPPED_FEATURES.contains(&feature.name.as_str()) {
            log::debug!("dropping feature {}", feature.name);
            continue;
        }
        font.features.get_or_insert_with(Vec::new).push(feature);
    }
}

fn sort_lines(code: &str) -> String {
    let mut lines: Vec<&str> = code.split('\n').collect();
    lines.sort_unstable();
    lines.join("\n")
}
