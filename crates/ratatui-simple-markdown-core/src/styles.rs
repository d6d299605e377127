use ratatui::style::Modifier;
use ratatui::style::Style;
use std::collections::BTreeMap;

/// Names of the style regions the renderer paints with.
pub mod region {
    pub const VIEW: &str = "view";
    pub const PARAGRAPH: &str = "paragraph";
    pub const TEXT: &str = "text";
    pub const STRONG: &str = "strong";
    pub const EM: &str = "em";
    pub const U: &str = "u";
    pub const DEL: &str = "del";
    pub const HEADING: &str = "heading";
    pub const HEADING1: &str = "heading1";
    pub const HEADING2: &str = "heading2";
    pub const HEADING3: &str = "heading3";
    pub const HEADING4: &str = "heading4";
    pub const HEADING5: &str = "heading5";
    pub const HEADING6: &str = "heading6";
    pub const INLINE_CODE: &str = "inlineCode";
    pub const CODE_BLOCK: &str = "codeBlock";
    pub const BLOCK_QUOTE: &str = "blockQuote";
    pub const LIST: &str = "list";
    pub const LIST_ITEM: &str = "listItem";
    pub const LIST_ITEM_BULLET: &str = "listItemBullet";
    pub const LIST_ITEM_NUMBER: &str = "listItemNumber";
    pub const LINK: &str = "link";
    pub const IMAGE: &str = "image";
    pub const HR: &str = "hr";
    pub const TABLE: &str = "table";
    pub const TABLE_HEADER: &str = "tableHeader";
    pub const TABLE_HEADER_CELL: &str = "tableHeaderCell";
    pub const TABLE_ROW: &str = "tableRow";
    pub const TABLE_ROW_CELL: &str = "tableRowCell";

    /// Returns the per-level heading region (`heading1`..`heading6`).
    pub fn heading(level: u8) -> &'static str {
        match level {
            1 => HEADING1,
            2 => HEADING2,
            3 => HEADING3,
            4 => HEADING4,
            5 => HEADING5,
            _ => HEADING6,
        }
    }
}

/// A mapping from style region name to the [`Style`] painted for it.
///
/// Regions are independent entries: [`StyleSheet::merged`] replaces whole entries and never
/// combines an override with the default it shadows. Composition of nested inline styles (bold
/// inside italic) happens in the renderer, not here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleSheet {
    regions: BTreeMap<String, Style>,
}

impl Default for StyleSheet {
    fn default() -> Self {
        use ratatui::style::Stylize;

        let muted = Style::default().dark_gray();
        let accent = Style::default().cyan();

        Self::empty()
            .with(region::VIEW, Style::default())
            .with(region::PARAGRAPH, Style::default())
            .with(region::TEXT, Style::default())
            .with(region::STRONG, Style::default().add_modifier(Modifier::BOLD))
            .with(region::EM, Style::default().add_modifier(Modifier::ITALIC))
            .with(region::U, Style::default().add_modifier(Modifier::UNDERLINED))
            .with(region::DEL, Style::default().add_modifier(Modifier::CROSSED_OUT))
            .with(region::HEADING, Style::default().add_modifier(Modifier::BOLD))
            .with(
                region::HEADING1,
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )
            .with(region::HEADING2, Style::default().add_modifier(Modifier::BOLD))
            .with(region::INLINE_CODE, accent)
            .with(region::CODE_BLOCK, accent)
            .with(region::BLOCK_QUOTE, muted)
            .with(region::LIST_ITEM_BULLET, muted)
            .with(region::LIST_ITEM_NUMBER, muted)
            .with(region::LINK, accent.add_modifier(Modifier::UNDERLINED))
            .with(region::IMAGE, muted)
            .with(region::HR, muted)
            .with(region::TABLE_HEADER, Style::default().add_modifier(Modifier::BOLD))
    }
}

impl StyleSheet {
    /// A sheet with no regions; every lookup falls back to `Style::default()`.
    pub fn empty() -> Self {
        Self {
            regions: BTreeMap::new(),
        }
    }

    pub fn with(mut self, region: impl Into<String>, style: Style) -> Self {
        self.set(region, style);
        self
    }

    pub fn set(&mut self, region: impl Into<String>, style: Style) {
        self.regions.insert(region.into(), style);
    }

    pub fn get(&self, region: &str) -> Option<Style> {
        self.regions.get(region).copied()
    }

    /// Returns the style for `region`, or the empty style if the region is not defined.
    pub fn style(&self, region: &str) -> Style {
        self.get(region).unwrap_or_default()
    }

    /// The style for a heading of `level`: the shared `heading` region patched with `headingN`.
    pub fn heading(&self, level: u8) -> Style {
        self.style(region::HEADING)
            .patch(self.style(region::heading(level)))
    }

    /// Returns a new sheet with every region of `overrides` replacing the region of the same name.
    pub fn merged(&self, overrides: &StyleSheet) -> StyleSheet {
        let mut regions = self.regions.clone();
        for (name, style) in &overrides.regions {
            regions.insert(name.clone(), *style);
        }
        StyleSheet { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    #[test]
    fn merge_replaces_whole_regions() {
        let base = StyleSheet::default();
        let overrides = StyleSheet::empty().with(region::STRONG, Style::default().fg(Color::Red));
        let merged = base.merged(&overrides);

        let strong = merged.style(region::STRONG);
        assert_eq!(strong.fg, Some(Color::Red));
        assert!(!strong.add_modifier.contains(Modifier::BOLD));
        assert_eq!(merged.style(region::EM), base.style(region::EM));
    }

    #[test]
    fn merge_leaves_inputs_untouched() {
        let base = StyleSheet::default();
        let before = base.clone();
        let overrides = StyleSheet::empty().with("custom", Style::default().fg(Color::Blue));
        let merged = base.merged(&overrides);

        assert_eq!(base, before);
        assert_eq!(merged.len(), before.len() + 1);
        assert_eq!(merged.get("custom"), Some(Style::default().fg(Color::Blue)));
    }

    #[test]
    fn missing_region_falls_back_to_default_style() {
        let sheet = StyleSheet::empty();
        assert_eq!(sheet.get(region::LINK), None);
        assert_eq!(sheet.style(region::LINK), Style::default());
    }

    #[test]
    fn heading_style_layers_level_over_shared_region() {
        let sheet = StyleSheet::empty()
            .with(region::HEADING, Style::default().add_modifier(Modifier::BOLD))
            .with(region::HEADING3, Style::default().fg(Color::Green));
        let style = sheet.heading(3);
        assert_eq!(style.fg, Some(Color::Green));
        assert!(style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(sheet.heading(9), sheet.heading(6));
    }
}
