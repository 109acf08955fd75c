//! AROMA config generation.
//!
//! The installer template carries a handful of literal `@TOKEN@` markers that are
//! replaced with text generated from the installed ROM list. Substitution is
//! purely textual and works on raw bytes, so the template does not need to be
//! valid UTF-8. Tokens are replaced one after another in insertion order, each
//! over the whole buffer: text inserted by an earlier token is seen by the
//! later ones, so no token survives even when a ROM name spells one.

use crate::roms::RomEntry;

pub const VERSION_TOKEN: &str = "@MBTOOL_VERSION@";
pub const MENU_ITEMS_TOKEN: &str = "@ROM_MENU_ITEMS@";
pub const SELECTION_ITEMS_TOKEN: &str = "@ROM_SELECTION_ITEMS@";
pub const FIRST_INDEX_TOKEN: &str = "@FIRST_INDEX@";
pub const LAST_INDEX_TOKEN: &str = "@LAST_INDEX@";

/// The AROMA report format cannot hold raw tabs.
const TAB: &str = "\t";
const ESCAPED_TAB: &str = "\\t";

/// Menu slots in front of the ROM list that the template reserves for itself.
pub const RESERVED_MENU_SLOTS: usize = 2;

/// Version written in place of [`VERSION_TOKEN`].
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// 1-based menu position of the first ROM.
pub fn first_index() -> usize {
    RESERVED_MENU_SLOTS + 1
}

/// 1-based menu position of the last ROM. Equals [`RESERVED_MENU_SLOTS`] when
/// there are no ROMs, which makes the selectable range empty.
pub fn last_index(rom_count: usize) -> usize {
    RESERVED_MENU_SLOTS + rom_count
}

/// One menu record per ROM.
pub fn rom_menu_items(roms: &[RomEntry]) -> String {
    roms.iter()
        .map(|rom| format!("\"{}\", \"\", \"@default\",\n", rom.name))
        .collect()
}

/// One `if` block per ROM binding `romid`/`romname` when the menu selection
/// points at that ROM.
pub fn rom_selection_items(roms: &[RomEntry]) -> String {
    roms.iter()
        .enumerate()
        .map(|(i, rom)| {
            format!(
                "if prop(\"operations.prop\", \"selected\") == \"{}\" then\n    \
                 setvar(\"romid\", \"{}\");\n    \
                 setvar(\"romname\", \"{}\");\n\
                 endif;\n",
                first_index() + i,
                rom.id,
                rom.name
            )
        })
        .collect()
}

/// Placeholder to replacement text mapping for one rewrite.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    // applied in insertion order
    replacements: Vec<(String, String)>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full context for the AROMA config: tab escaping, the tool version and
    /// the four ROM-derived tokens, in that order. Tabs are escaped first, so
    /// tabs inside generated text are kept as they are.
    pub fn for_roms(version: &str, roms: &[RomEntry]) -> Self {
        let mut ctx = Self::new();
        ctx.insert(TAB, ESCAPED_TAB)
            .insert(VERSION_TOKEN, version)
            .insert(MENU_ITEMS_TOKEN, rom_menu_items(roms))
            .insert(SELECTION_ITEMS_TOKEN, rom_selection_items(roms))
            .insert(FIRST_INDEX_TOKEN, first_index().to_string())
            .insert(LAST_INDEX_TOKEN, last_index(roms.len()).to_string());
        ctx
    }

    /// Adds a substitution, or replaces the value of an existing one without
    /// moving it. Empty tokens are ignored.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let token = token.into();
        if token.is_empty() {
            return self;
        }
        let value = value.into();
        match self.replacements.iter_mut().find(|(t, _)| *t == token) {
            Some(slot) => slot.1 = value,
            None => self.replacements.push((token, value)),
        }
        self
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.replacements
            .iter()
            .find(|(t, _)| t == token)
            .map(|(_, v)| v.as_str())
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.replacements.iter().map(|(t, _)| t.as_str())
    }
}

/// Replaces every occurrence of every token in `data`, one token at a time.
pub fn rewrite(data: &[u8], ctx: &TemplateContext) -> Vec<u8> {
    ctx.replacements
        .iter()
        .fold(data.to_vec(), |buf, (token, value)| {
            replace_all(&buf, token.as_bytes(), value.as_bytes())
        })
}

/// Non-overlapping, left to right. The replacement is not rescanned.
fn replace_all(data: &[u8], token: &[u8], value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut copied = 0;
    let mut pos = 0;

    while pos + token.len() <= data.len() {
        if data[pos..].starts_with(token) {
            out.extend_from_slice(&data[copied..pos]);
            out.extend_from_slice(value);
            pos += token.len();
            copied = pos;
        } else {
            pos += 1;
        }
    }
    out.extend_from_slice(&data[copied..]);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom(id: &str, name: &str) -> RomEntry {
        RomEntry { id: id.to_string(), name: name.to_string() }
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle.as_bytes())
    }

    #[test]
    fn zero_roms_produce_empty_blocks() {
        let ctx = TemplateContext::for_roms("9.9.9", &[]);
        assert_eq!(ctx.get(MENU_ITEMS_TOKEN), Some(""));
        assert_eq!(ctx.get(SELECTION_ITEMS_TOKEN), Some(""));
        assert_eq!(ctx.get(FIRST_INDEX_TOKEN), Some("3"));
        assert_eq!(ctx.get(LAST_INDEX_TOKEN), Some("2"));
        assert_eq!(last_index(0), RESERVED_MENU_SLOTS);
    }

    #[test]
    fn last_index_tracks_rom_count() {
        let roms = vec![rom("primary", "Stock"), rom("dual", "dual"), rom("data-slot-x", "X")];
        let ctx = TemplateContext::for_roms("1.0", &roms);
        assert_eq!(ctx.get(LAST_INDEX_TOKEN), Some("5"));
        assert_eq!(last_index(roms.len()), RESERVED_MENU_SLOTS + roms.len());
    }

    #[test]
    fn menu_items_have_fixed_layout() {
        let roms = vec![rom("primary", "Stock ROM"), rom("dual", "dual")];
        assert_eq!(
            rom_menu_items(&roms),
            "\"Stock ROM\", \"\", \"@default\",\n\"dual\", \"\", \"@default\",\n"
        );
    }

    #[test]
    fn selection_items_offset_positions_past_reserved_slots() {
        let roms = vec![rom("primary", "Stock ROM"), rom("dual", "Second")];
        let expected = "\
if prop(\"operations.prop\", \"selected\") == \"3\" then
    setvar(\"romid\", \"primary\");
    setvar(\"romname\", \"Stock ROM\");
endif;
if prop(\"operations.prop\", \"selected\") == \"4\" then
    setvar(\"romid\", \"dual\");
    setvar(\"romname\", \"Second\");
endif;
";
        assert_eq!(rom_selection_items(&roms), expected);
    }

    #[test]
    fn rewrite_replaces_every_token_and_escapes_tabs() {
        let roms = vec![rom("primary", "Stock")];
        let ctx = TemplateContext::for_roms("4.2.0", &roms);
        let template = b"ini_set(\"rom_version\", \"@MBTOOL_VERSION@\");\n\
menubox(\"Pick\",\t\"x\",\n@ROM_MENU_ITEMS@);\n\
@ROM_SELECTION_ITEMS@\
if cmp(prop(\"operations.prop\", \"selected\"), \">=\", \"@FIRST_INDEX@\") && \
cmp(prop(\"operations.prop\", \"selected\"), \"<=\", \"@LAST_INDEX@\") then\n\
# again @MBTOOL_VERSION@\n";

        let out = rewrite(template, &ctx);

        for token in [VERSION_TOKEN, MENU_ITEMS_TOKEN, SELECTION_ITEMS_TOKEN, FIRST_INDEX_TOKEN, LAST_INDEX_TOKEN] {
            assert!(!contains(&out, token), "{} left in output", token);
        }
        assert!(!out.contains(&b'\t'));
        assert!(contains(&out, "\"Pick\",\\t\"x\""));
        assert!(contains(&out, "# again 4.2.0\n"));
        assert!(contains(&out, "\"Stock\", \"\", \"@default\",\n"));
        assert!(contains(&out, "\">=\", \"3\""));
        assert!(contains(&out, "\"<=\", \"3\""));
    }

    #[test]
    fn tokens_inside_rom_names_are_replaced_by_later_tokens() {
        let roms = vec![rom("x", "Slot @LAST_INDEX@")];
        let ctx = TemplateContext::for_roms("1", &roms);
        let out = rewrite(b"@ROM_MENU_ITEMS@|@LAST_INDEX@", &ctx);
        assert_eq!(out, b"\"Slot 3\", \"\", \"@default\",\n|3".to_vec());
        assert!(!contains(&out, LAST_INDEX_TOKEN));
    }

    #[test]
    fn tabs_inside_rom_names_are_kept() {
        let roms = vec![rom("weird", "tab\tname")];
        let ctx = TemplateContext::for_roms("1", &roms);
        let out = rewrite(b"\t@ROM_MENU_ITEMS@", &ctx);
        assert_eq!(out, b"\\t\"tab\tname\", \"\", \"@default\",\n".to_vec());
    }

    #[test]
    fn earlier_tokens_feed_later_ones() {
        let mut ctx = TemplateContext::new();
        ctx.insert("@A@", "[@B@]").insert("@B@", "b");
        assert_eq!(rewrite(b"@A@ @B@", &ctx), b"[b] b".to_vec());

        let mut reversed = TemplateContext::new();
        reversed.insert("@B@", "b").insert("@A@", "[@B@]");
        assert_eq!(rewrite(b"@A@ @B@", &reversed), b"[@B@] b".to_vec());
    }

    #[test]
    fn non_utf8_bytes_pass_through() {
        let ctx = TemplateContext::for_roms("1", &[]);
        let data = [0xff, 0xfe, b'@', b'F', 0x00, b'\t', 0x80];
        assert_eq!(rewrite(&data, &ctx), vec![0xff, 0xfe, b'@', b'F', 0x00, b'\\', b't', 0x80]);
    }

    #[test]
    fn insert_ignores_empty_and_overrides_existing() {
        let mut ctx = TemplateContext::new();
        ctx.insert("", "never").insert("@A@", "1").insert("@A@", "2");
        assert_eq!(ctx.tokens().count(), 1);
        assert_eq!(rewrite(b"x@A@y", &ctx), b"x2y".to_vec());
        assert_eq!(rewrite(b"", &ctx), Vec::<u8>::new());
    }
}
