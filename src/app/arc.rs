use std::sync::LazyLock;

use regex::Regex;

// "<Base>[: or - Subtitle] (<N>)", anchored at the start of the title.
static MULTIPART_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)(?:[:\-]\s*.*?)?\s*\(([0-9]+)\)").expect("multipart title pattern is valid")
});

/// One part of a multi-part story arc.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ArcPart {
    pub(crate) base: String,
    pub(crate) part: u32,
}

/// Detects whether `title` is part of a multi-part arc.
///
/// Returns `None` for any title that does not carry a parenthesized part
/// number after its base name. A blank base or a part of zero is treated as
/// no match, since neither can be tracked.
pub(crate) fn classify(title: &str) -> Option<ArcPart> {
    let captures = MULTIPART_TITLE.captures(title)?;
    let base = captures.get(1)?.as_str().trim();
    let part = captures.get(2)?.as_str().parse::<u32>().ok()?;
    if base.is_empty() || part == 0 {
        return None;
    }
    Some(ArcPart {
        base: base.to_string(),
        part,
    })
}

/// Highest part number seen for `base` among `titles`.
pub(crate) fn highest_part<'a, I>(titles: I, base: &str) -> Option<u32>
where
    I: IntoIterator<Item = &'a str>,
{
    titles
        .into_iter()
        .filter_map(classify)
        .filter(|arc| arc.base == base)
        .map(|arc| arc.part)
        .max()
}
