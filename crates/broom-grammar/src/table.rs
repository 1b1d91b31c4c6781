//! Default HTML rule table.
//!
//! One entry per known tag name. The lists read top to bottom roughly in
//! document order: envelope, head section, block structure, tables, lists,
//! forms, inline markup, empty tags, frames, deprecated leftovers.

use std::collections::HashMap;

use crate::rule::{ContentKind, Placement, TagRule};
use crate::TagProvider;

/// Inline formatting tags that survive a structural split: they are closed
/// before a cell/paragraph break and duplicated on the far side of it.
const FORMATTING: &str = "b,i,u,tt,sub,sup,big,small,strike,s,em,strong,font,code,samp,kbd,var,cite,abbr,acronym,span";

/// Tags closed by the table family before a new cell or row opens.
const CELL_BREAKERS: &str = "td,th,caption,colgroup";

/// The default per-tag-name grammar.
///
/// Covers the HTML 4 vocabulary plus the handful of newer tags the cleaner
/// meets in the wild. Unknown names simply have no rule; the engine's
/// `omit_unknown_tags` option decides their fate.
#[derive(Debug, Clone)]
pub struct HtmlTagProvider {
    rules: HashMap<String, TagRule>,
}

impl HtmlTagProvider {
    /// Build the default table.
    #[must_use]
    pub fn new() -> Self {
        let mut provider = Self {
            rules: HashMap::new(),
        };
        provider.fill();
        provider
    }

    /// Register a rule, keyed by its tag name. Replaces any previous rule
    /// for the same name, so callers can override single entries.
    pub fn insert(&mut self, rule: TagRule) {
        let _ = self.rules.insert(rule.name().to_string(), rule);
    }

    fn body(name: &str) -> TagRule {
        TagRule::new(name, ContentKind::All, Placement::Body)
    }

    fn empty(name: &str) -> TagRule {
        TagRule::new(name, ContentKind::None, Placement::Body)
    }

    fn formatting(name: &str) -> TagRule {
        Self::body(name).define_continue_after(FORMATTING)
    }

    #[allow(clippy::too_many_lines)]
    fn fill(&mut self) {
        // envelope - the engine folds these into the synthetic root nodes,
        // the rules only mark them unique
        self.insert(Self::body("html").unique());
        self.insert(TagRule::new("head", ContentKind::All, Placement::Head).unique());
        self.insert(Self::body("body").unique());

        // head section
        self.insert(
            TagRule::new("title", ContentKind::All, Placement::Head)
                .unique()
                .ignore_permitted(),
        );
        self.insert(TagRule::new("base", ContentKind::None, Placement::Head).unique());
        self.insert(TagRule::new("meta", ContentKind::None, Placement::Head));
        self.insert(TagRule::new("link", ContentKind::None, Placement::Head));
        self.insert(TagRule::new("style", ContentKind::All, Placement::HeadAndBody));
        self.insert(TagRule::new("script", ContentKind::All, Placement::HeadAndBody));
        self.insert(TagRule::new("noscript", ContentKind::All, Placement::HeadAndBody));

        // block structure
        self.insert(Self::body("div").define_close_before("p"));
        self.insert(
            Self::body("p")
                .define_close_before_copy_inside(FORMATTING)
                .define_close_before("p,address"),
        );
        self.insert(Self::body("pre").define_close_before("p"));
        self.insert(Self::body("blockquote").define_close_before("p"));
        self.insert(Self::body("address").define_close_before("p"));
        self.insert(Self::empty("hr").define_close_before("p"));
        for h in ["h1", "h2", "h3", "h4", "h5", "h6"] {
            self.insert(
                Self::body(h)
                    .define_close_before_copy_inside(FORMATTING)
                    .define_close_before("p,h1,h2,h3,h4,h5,h6"),
            );
        }

        // tables
        self.insert(
            Self::body("table")
                .define_children("tr,tbody,thead,tfoot,caption,colgroup,col")
                .define_close_before_copy_inside(FORMATTING)
                .define_close_before("p,address,label,abbr,acronym,dfn,kbd,samp,var,cite,code"),
        );
        self.insert(
            Self::body("tr")
                .define_children("td,th")
                .define_higher("table,tbody,thead,tfoot")
                .define_required_parent("tbody")
                .define_fatal("table")
                .define_close_before_copy_inside(FORMATTING)
                .define_close_before("tr,td,th,caption,colgroup"),
        );
        for cell in ["td", "th"] {
            self.insert(
                Self::body(cell)
                    .define_higher("table,tbody,thead,tfoot,tr")
                    .define_required_parent("tr")
                    .define_fatal("table")
                    .define_close_before_copy_inside(FORMATTING)
                    .define_close_before(CELL_BREAKERS)
                    .define_continue_after(FORMATTING),
            );
        }
        for section in ["tbody", "thead", "tfoot"] {
            self.insert(
                Self::body(section)
                    .define_children("tr")
                    .define_higher("table")
                    .define_fatal("table")
                    .define_close_before_copy_inside(FORMATTING)
                    .define_close_before("td,th,tr,tbody,thead,tfoot,caption,colgroup"),
            );
        }
        self.insert(
            Self::body("caption")
                .define_fatal("table")
                .define_close_before("caption"),
        );
        self.insert(
            Self::body("colgroup")
                .define_children("col")
                .define_fatal("table")
                .define_close_before("td,th,tr,colgroup"),
        );
        self.insert(Self::empty("col").define_fatal("table"));

        // lists
        self.insert(Self::body("ul").define_close_before("p"));
        self.insert(Self::body("ol").define_close_before("p"));
        self.insert(
            Self::body("li")
                .define_close_before("li,p")
                .define_continue_after(FORMATTING),
        );
        self.insert(Self::body("dl").define_close_before("p"));
        self.insert(Self::body("dt").define_close_before("dt,dd,p"));
        self.insert(Self::body("dd").define_close_before("dt,dd,p"));

        // forms
        self.insert(
            Self::body("form")
                .define_permitted_siblings("form")
                .define_close_before("p"),
        );
        self.insert(Self::empty("input"));
        self.insert(Self::body("textarea"));
        self.insert(
            Self::body("select")
                .define_children("option,optgroup")
                .define_permitted_siblings("select"),
        );
        self.insert(
            Self::body("option")
                .define_fatal("select,datalist")
                .define_close_before("option")
                .ignore_permitted(),
        );
        self.insert(
            Self::body("optgroup")
                .define_fatal("select")
                .define_children("option")
                .define_close_before("optgroup,option"),
        );
        self.insert(Self::body("datalist"));
        self.insert(Self::body("button"));
        self.insert(Self::body("label"));
        self.insert(Self::body("fieldset").define_close_before("p"));
        self.insert(Self::body("legend"));

        // inline markup
        self.insert(Self::body("a").define_close_before("a"));
        for tag in [
            "b", "i", "u", "s", "tt", "sub", "sup", "big", "small", "em", "strong", "code",
            "samp", "kbd", "var", "cite", "abbr", "acronym", "span", "q", "dfn",
        ] {
            self.insert(Self::formatting(tag));
        }
        self.insert(Self::body("object"));
        self.insert(Self::body("map"));
        self.insert(Self::body("iframe"));
        self.insert(Self::body("marquee"));

        // empty tags
        self.insert(Self::empty("br"));
        self.insert(Self::empty("img"));
        self.insert(Self::empty("area"));
        self.insert(Self::empty("param"));
        self.insert(Self::empty("embed"));
        self.insert(Self::empty("wbr"));
        self.insert(Self::empty("source"));
        self.insert(Self::empty("track"));

        // frames
        self.insert(Self::body("frameset").define_children("frameset,frame,noframes"));
        self.insert(Self::empty("frame").define_fatal("frameset"));
        self.insert(Self::body("noframes"));

        // deprecated leftovers
        self.insert(Self::body("center").define_close_before("p").deprecated());
        self.insert(Self::formatting("font").deprecated());
        self.insert(Self::formatting("strike").deprecated());
        self.insert(Self::empty("basefont").deprecated());
        self.insert(Self::body("applet").deprecated());
        self.insert(Self::body("dir").deprecated());
        self.insert(Self::body("menu").deprecated());
        self.insert(Self::empty("isindex").deprecated());
        self.insert(Self::body("xmp").deprecated());
    }
}

impl Default for HtmlTagProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TagProvider for HtmlTagProvider {
    fn rule(&self, name: &str) -> Option<&TagRule> {
        self.rules.get(name)
    }
}
