//! Virtual sub-document extraction
//!
//! A [`FencePattern`] describes where embedded fragments live in a parent
//! document: a begin delimiter, an end delimiter and the body between them.
//! [`FencePattern::extract`] walks a parent text lazily and yields one
//! [`Fragment`] per fenced region.
//!
//! Scanning rules:
//! - regions never overlap; the first begin delimiter wins and scanning
//!   resumes right after the matching end delimiter
//! - a begin delimiter with no end delimiter after it yields nothing for that
//!   region (logged at debug level, not an error)
//! - a single-regex pattern ([`FencePattern::from_regex`]) has no separate
//!   begin delimiter, so an unclosed region there is simply no match and is
//!   not logged
//! - re-running extraction over the same input yields the same fragments
//!
//! Fragments are addressed by a virtual path
//! `<parent>/<ordinal>_<name>.md/<ordinal>.<ext>`, which scope globs such as
//! `**/*.md/*.ts` can target and which cannot collide with a real file.

use crate::scope::normalize_path;
use crate::{Result, StrataError};
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use std::ops::Range;
use tracing::debug;

/// Begin delimiter of the default pattern: a ```js or ```ts fence line
pub const DEFAULT_BEGIN: &str = r"```(?<lang>[jt]s)\r?\n";
/// End delimiter of the default pattern
pub const DEFAULT_END: &str = r"```";
/// Declared name of the default pattern
pub const DEFAULT_NAME: &str = "example";

/// Uncompiled fence description, as it appears in configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FenceSpec {
    /// Declared name, used in virtual paths
    pub name: String,
    /// Begin delimiter regex; an optional `lang` group selects the extension
    pub begin: String,
    /// End delimiter regex
    pub end: String,
    /// Single regex spanning a whole region, used instead of `begin`/`end`
    pub regex: Option<String>,
    /// Extension used when the begin delimiter captures no language
    pub default_extension: String,
    /// Language tag to extension map
    pub languages: IndexMap<String, String>,
    /// Only scan inside `/** ... */` documentation comments
    pub within_doc_comments: bool,
}

impl Default for FenceSpec {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            begin: DEFAULT_BEGIN.to_string(),
            end: DEFAULT_END.to_string(),
            regex: None,
            default_extension: "ts".to_string(),
            languages: default_languages(),
            within_doc_comments: false,
        }
    }
}

impl FenceSpec {
    /// Compile the delimiters, attributing failures to `layer`
    pub fn compile(&self, layer: &str) -> Result<FencePattern> {
        let delimiters = match &self.regex {
            Some(source) => {
                let regex = compile_delimiter(layer, source)?;
                let body = body_group(layer, source, &regex)?;
                Delimiters::Combined { regex, body }
            }
            None => Delimiters::Fenced {
                begin: compile_delimiter(layer, &self.begin)?,
                end: compile_delimiter(layer, &self.end)?,
            },
        };

        if self.name.is_empty() || self.name.contains('/') {
            return Err(StrataError::malformed_pattern(
                layer,
                &self.name,
                "declared name must be a non-empty path segment",
            ));
        }

        Ok(FencePattern {
            name: self.name.clone(),
            delimiters,
            default_extension: self.default_extension.clone(),
            languages: self.languages.clone(),
            within_doc_comments: self.within_doc_comments,
        })
    }
}

fn compile_delimiter(layer: &str, source: &str) -> Result<Regex> {
    let regex = Regex::new(source)
        .map_err(|e| StrataError::malformed_pattern(layer, source, e.to_string()))?;

    // An empty match would make every position a delimiter
    if regex.is_match("") {
        return Err(StrataError::malformed_pattern(
            layer,
            source,
            "delimiter matches the empty string",
        ));
    }

    Ok(regex)
}

/// Index of the one capture group that is not `lang`
fn body_group(layer: &str, source: &str, regex: &Regex) -> Result<usize> {
    let candidates: Vec<usize> = regex
        .capture_names()
        .enumerate()
        .skip(1)
        .filter(|(_, name)| *name != Some("lang"))
        .map(|(index, _)| index)
        .collect();

    match candidates.as_slice() {
        [body] => Ok(*body),
        other => Err(StrataError::malformed_pattern(
            layer,
            source,
            format!(
                "expected exactly one body capture group, found {}",
                other.len()
            ),
        )),
    }
}

fn default_languages() -> IndexMap<String, String> {
    [
        ("js", "js"),
        ("javascript", "js"),
        ("jsx", "jsx"),
        ("ts", "ts"),
        ("typescript", "ts"),
        ("tsx", "tsx"),
    ]
    .into_iter()
    .map(|(lang, ext)| (lang.to_string(), ext.to_string()))
    .collect()
}

#[derive(Debug, Clone)]
enum Delimiters {
    Fenced { begin: Regex, end: Regex },
    /// Whole-region regex; capture group `body` is the fragment
    Combined { regex: Regex, body: usize },
}

/// One step of a scan over a region
enum Scan<'h> {
    Found {
        body: Range<usize>,
        resume: usize,
        lang: Option<&'h str>,
    },
    /// Begin delimiter at this offset has no end delimiter
    Dangling(usize),
    Exhausted,
}

/// Compiled fence pattern
#[derive(Debug, Clone)]
pub struct FencePattern {
    name: String,
    delimiters: Delimiters,
    default_extension: String,
    languages: IndexMap<String, String>,
    within_doc_comments: bool,
}

impl FencePattern {
    /// Compile a pattern from one regex covering a whole fenced region
    ///
    /// The regex must have exactly one capture group besides an optional
    /// `lang` group; that group is the fragment body.
    pub fn from_regex(layer: &str, source: &str) -> Result<Self> {
        FenceSpec {
            regex: Some(source.to_string()),
            ..FenceSpec::default()
        }
        .compile(layer)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lazily extract fragments from `text`
    pub fn extract<'a>(&'a self, parent_id: &str, text: &'a str) -> Fragments<'a> {
        let regions = if self.within_doc_comments {
            doc_comment_regions(text)
        } else {
            vec![0..text.len()]
        };
        let cursor = regions.first().map_or(0, |r| r.start);

        Fragments {
            pattern: self,
            parent_id: normalize_path(parent_id).into_owned(),
            text,
            regions,
            region: 0,
            cursor,
            ordinal: 0,
            lines: LineCounter::default(),
        }
    }

    fn scan<'h>(&self, haystack: &'h str, cursor: usize) -> Scan<'h> {
        match &self.delimiters {
            Delimiters::Fenced { begin, end } => {
                let Some(open) = begin.captures_at(haystack, cursor) else {
                    return Scan::Exhausted;
                };
                let Some(open_match) = open.get(0) else {
                    return Scan::Exhausted;
                };
                let body_start = open_match.end();

                match end.find_at(haystack, body_start) {
                    Some(close) => Scan::Found {
                        body: body_start..close.start(),
                        resume: resume_after(haystack, close.end(), body_start),
                        lang: open.name("lang").map(|m| m.as_str()),
                    },
                    None => Scan::Dangling(open_match.start()),
                }
            }
            Delimiters::Combined { regex, body } => {
                let Some(captures) = regex.captures_at(haystack, cursor) else {
                    return Scan::Exhausted;
                };
                let Some(whole) = captures.get(0) else {
                    return Scan::Exhausted;
                };
                let body = captures
                    .get(*body)
                    .map_or(whole.end()..whole.end(), |m| m.range());

                Scan::Found {
                    resume: resume_after(haystack, whole.end(), whole.start()),
                    body,
                    lang: captures.name("lang").map(|m| m.as_str()),
                }
            }
        }
    }

    fn extension_for(&self, lang: Option<&str>) -> String {
        match lang {
            Some(lang) => {
                let lang = lang.to_ascii_lowercase();
                self.languages.get(&lang).cloned().unwrap_or(lang)
            }
            None => self.default_extension.clone(),
        }
    }
}

/// Extract fragments from `text` using `pattern`
pub fn extract<'a>(parent_id: &str, text: &'a str, pattern: &'a FencePattern) -> Fragments<'a> {
    pattern.extract(parent_id, text)
}

/// Virtual sub-document sliced out of a parent document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fragment {
    parent_id: String,
    virtual_id: String,
    text: String,
    ordinal: usize,
    extension: String,
    line_offset: usize,
    column_offset_on_first_line: usize,
    byte_range: Range<usize>,
}

impl Fragment {
    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn virtual_id(&self) -> &str {
        &self.virtual_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Position of this fragment within its extraction pass
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// 1-based parent line holding the first character of the body
    pub fn line_offset(&self) -> usize {
        self.line_offset
    }

    /// Characters preceding the body on its first line
    pub fn column_offset_on_first_line(&self) -> usize {
        self.column_offset_on_first_line
    }

    /// Byte range of the body within the parent text
    pub fn byte_range(&self) -> Range<usize> {
        self.byte_range.clone()
    }
}

/// Build the virtual path of fragment `ordinal` of `parent_id`
pub fn virtual_path(parent_id: &str, ordinal: usize, name: &str, extension: &str) -> String {
    format!("{parent_id}/{ordinal}_{name}.md/{ordinal}.{extension}")
}

/// Lazy fragment sequence produced by [`FencePattern::extract`]
#[derive(Debug, Clone)]
pub struct Fragments<'a> {
    pattern: &'a FencePattern,
    parent_id: String,
    text: &'a str,
    regions: Vec<Range<usize>>,
    region: usize,
    cursor: usize,
    ordinal: usize,
    lines: LineCounter,
}

impl Fragments<'_> {
    fn advance_region(&mut self) {
        self.region += 1;
        if let Some(next) = self.regions.get(self.region) {
            self.cursor = next.start;
        }
    }
}

impl Iterator for Fragments<'_> {
    type Item = Fragment;

    fn next(&mut self) -> Option<Fragment> {
        while let Some(region) = self.regions.get(self.region).cloned() {
            let haystack = &self.text[..region.end];

            let (body_start, body_end, lang) = match self.pattern.scan(haystack, self.cursor) {
                Scan::Found { body, resume, lang } => {
                    self.cursor = resume;
                    (body.start, body.end, lang)
                }
                Scan::Dangling(offset) => {
                    debug!(
                        parent = %self.parent_id,
                        offset,
                        "Unterminated fence, skipping region"
                    );
                    self.advance_region();
                    continue;
                }
                Scan::Exhausted => {
                    self.advance_region();
                    continue;
                }
            };

            let line_offset = self.lines.line_at(self.text, body_start);
            let line_start = self.text[..body_start].rfind('\n').map_or(0, |i| i + 1);
            let column_offset = self.text[line_start..body_start].chars().count();

            let raw = &self.text[body_start..body_end];
            let text = if self.pattern.within_doc_comments {
                blank_comment_gutter(raw, column_offset == 0)
            } else {
                raw.to_string()
            };

            let ordinal = self.ordinal;
            self.ordinal += 1;

            let extension = self.pattern.extension_for(lang);
            let virtual_id = virtual_path(&self.parent_id, ordinal, &self.pattern.name, &extension);

            return Some(Fragment {
                parent_id: self.parent_id.clone(),
                virtual_id,
                text,
                ordinal,
                extension,
                line_offset,
                column_offset_on_first_line: column_offset,
                byte_range: body_start..body_end,
            });
        }

        None
    }
}

/// Offset to resume scanning at, always past `from`
fn resume_after(haystack: &str, end: usize, from: usize) -> usize {
    if end > from {
        return end;
    }
    let step = haystack[from..].chars().next().map_or(1, char::len_utf8);
    (from + step).min(haystack.len())
}

/// Incremental newline counter; positions are queried in increasing order
#[derive(Debug, Clone, Default)]
struct LineCounter {
    position: usize,
    newlines: usize,
}

impl LineCounter {
    fn line_at(&mut self, text: &str, offset: usize) -> usize {
        if offset < self.position {
            self.position = 0;
            self.newlines = 0;
        }
        self.newlines += text.as_bytes()[self.position..offset]
            .iter()
            .filter(|b| **b == b'\n')
            .count();
        self.position = offset;
        self.newlines + 1
    }
}

/// Byte ranges of the bodies of `/** ... */` comments
fn doc_comment_regions(text: &str) -> Vec<Range<usize>> {
    let mut regions = Vec::new();
    let mut from = 0;

    while let Some(open) = text[from..].find("/**") {
        let start = from + open + 3;
        // `/**/` closes on its own second asterisk
        let search = from + open + 2;
        match text[search..].find("*/") {
            Some(close) => {
                let end = search + close;
                if end > start {
                    regions.push(start..end);
                }
                from = end + 2;
            }
            None => break,
        }
    }

    regions
}

/// Replace the leading ` * ` gutter of comment lines with spaces
///
/// Widths are kept so fragment columns still line up with the parent.
fn blank_comment_gutter(body: &str, first_line_at_start: bool) -> String {
    let mut out = String::with_capacity(body.len());

    for (index, line) in body.split_inclusive('\n').enumerate() {
        if index == 0 && !first_line_at_start {
            out.push_str(line);
            continue;
        }

        let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
        let rest = &line[indent..];
        if rest.starts_with('*') && !rest.starts_with("*/") {
            out.extend(std::iter::repeat_n(' ', indent + 1));
            out.push_str(&rest[1..]);
        } else {
            out.push_str(line);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> FencePattern {
        FenceSpec::default().compile("test").unwrap()
    }

    #[test]
    fn test_two_fragments_with_increasing_offsets() {
        let text = "# Title\n\n```ts\nconst a = 1\n```\n\ntext\n\n```js\nlet b = 2\nb++\n```\n";
        let fragments: Vec<_> = pattern().extract("docs/guide.ts", text).collect();

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].text(), "const a = 1\n");
        assert_eq!(fragments[0].line_offset(), 4);
        assert_eq!(fragments[1].text(), "let b = 2\nb++\n");
        assert_eq!(fragments[1].line_offset(), 10);
        assert!(fragments[0].line_offset() < fragments[1].line_offset());
    }

    #[test]
    fn test_virtual_ids_follow_language() {
        let text = "```ts\na\n```\n```js\nb\n```\n";
        let ids: Vec<_> = pattern()
            .extract("./src/lib.ts", text)
            .map(|f| f.virtual_id().to_string())
            .collect();

        assert_eq!(
            ids,
            vec![
                "src/lib.ts/0_example.md/0.ts",
                "src/lib.ts/1_example.md/1.js"
            ]
        );
    }

    #[test]
    fn test_unterminated_fence_yields_nothing() {
        let text = "```ts\nconst a = 1\n";
        assert_eq!(pattern().extract("a.ts", text).count(), 0);

        let text = "```ts\nok\n```\n```ts\ndangling\n";
        let fragments: Vec<_> = pattern().extract("a.ts", text).collect();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text(), "ok\n");
    }

    #[test]
    fn test_extraction_is_restartable() {
        let text = "```ts\none\n```\n```ts\ntwo\n```\n";
        let pattern = pattern();

        let first: Vec<_> = pattern.extract("a.ts", text).collect();
        let second: Vec<_> = extract("a.ts", text, &pattern).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_column_offset_for_inline_body() {
        let fence = FenceSpec {
            begin: r"<<(?<lang>js) ".to_string(),
            end: ">>".to_string(),
            ..FenceSpec::default()
        };
        let pattern = fence.compile("test").unwrap();
        let fragments: Vec<_> = pattern.extract("a.md", "line one\n  <<js run() >>\n").collect();

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text(), "run() ");
        assert_eq!(fragments[0].line_offset(), 2);
        assert_eq!(fragments[0].column_offset_on_first_line(), 7);
    }

    #[test]
    fn test_doc_comment_mode_blanks_gutter() {
        let fence = FenceSpec {
            within_doc_comments: true,
            ..FenceSpec::default()
        };
        let pattern = fence.compile("test").unwrap();
        let text = "/**\n * @example\n * ```ts\n * foo()\n * ```\n */\n```ts\nnot_in_comment()\n```\n";
        let fragments: Vec<_> = pattern.extract("a.ts", text).collect();

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text(), "   foo()\n   ");
        assert_eq!(fragments[0].line_offset(), 4);
    }

    #[test]
    fn test_byte_range_points_into_parent() {
        let text = "x\n```ts\nbody\n```";
        let fragment = pattern().extract("a.ts", text).next().unwrap();
        assert_eq!(&text[fragment.byte_range()], "body\n");
    }

    #[test]
    fn test_malformed_patterns() {
        let unbalanced = FenceSpec {
            begin: r"```(ts".to_string(),
            ..FenceSpec::default()
        };
        let err = unbalanced.compile("strata/examples").unwrap_err();
        assert_eq!(err.layer(), Some("strata/examples"));

        let empty = FenceSpec {
            end: r"x*".to_string(),
            ..FenceSpec::default()
        };
        assert!(empty.compile("strata/examples").is_err());
    }

    #[test]
    fn test_combined_regex_form() {
        let pattern =
            FencePattern::from_regex("test", r"```(?<lang>js|ts)\n(?<body>[\s\S]*?)```").unwrap();
        let text = "intro\n```js\nfoo()\n```\n```ts\nbar()\n```\n";
        let fragments: Vec<_> = pattern.extract("docs/a.ts", text).collect();

        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].text(), "foo()\n");
        assert_eq!(fragments[0].line_offset(), 3);
        assert_eq!(fragments[1].virtual_id(), "docs/a.ts/1_example.md/1.ts");
    }

    #[test]
    fn test_combined_regex_needs_one_body_group() {
        let none = FencePattern::from_regex("strata/examples", r"```[\s\S]*?```").unwrap_err();
        assert_eq!(none.layer(), Some("strata/examples"));

        let two = FencePattern::from_regex("strata/examples", r"```(\w+)\n([\s\S]*?)```");
        assert!(two.is_err());

        assert!(FencePattern::from_regex("test", r"(?<lang>ts):(x+)").is_ok());
    }

    #[test]
    fn test_empty_comment_does_not_open_doc_region() {
        let fence = FenceSpec {
            within_doc_comments: true,
            ..FenceSpec::default()
        };
        let pattern = fence.compile("test").unwrap();

        let text = "/**/\nconst s = `\n```ts\nnot_in_comment()\n```\n`\n/** real */\n";
        assert_eq!(pattern.extract("a.ts", text).count(), 0);

        let text = "/***/\n```ts\ncode()\n```\n/**\n * ```ts\n * doc()\n * ```\n */\n";
        let fragments: Vec<_> = pattern.extract("a.ts", text).collect();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text(), "   doc()\n   ");
        assert_eq!(fragments[0].line_offset(), 7);
    }

    #[test]
    fn test_combined_regex_unclosed_region_yields_nothing() {
        let pattern =
            FencePattern::from_regex("test", r"```(?<lang>ts)\n(?<body>[\s\S]*?)```").unwrap();

        assert_eq!(pattern.extract("a.ts", "```ts\nopen()\n").count(), 0);

        let fragments: Vec<_> = pattern
            .extract("a.ts", "```ts\nok()\n```\n```ts\nopen()\n")
            .collect();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text(), "ok()\n");
    }
}
