//! Pragmatic selector subset shared by the engine and the in-memory page.
//!
//! Supports the selector shapes the scanner and resolver actually generate:
//! `tag`, `#id`, `.class`, `[attr]`, `[attr="v"]`, `[attr*="v"]`, compound
//! simple selectors, comma lists, and a trailing `:nth-of-type(n)` that
//! picks the n-th element of the match list (how the scanner's generated
//! disambiguators are consumed).

use crate::errors::PageError;

#[derive(Clone, Debug, PartialEq)]
pub enum AttrOp {
    Exists,
    Equals(String),
    Contains(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttrFilter {
    pub name: String,
    pub op: AttrOp,
}

/// One compound simple selector (no combinators).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrFilter>,
    pub nth_of_type: Option<usize>,
}

/// A comma list of compounds.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectorList(pub Vec<CompoundSelector>);

impl SelectorList {
    pub fn parse(selector: &str) -> Result<Self, PageError> {
        let mut compounds = Vec::new();
        for part in selector.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            compounds.push(parse_compound(part).map_err(|reason| PageError::InvalidSelector {
                selector: selector.to_string(),
                reason,
            })?);
        }
        if compounds.is_empty() {
            return Err(PageError::InvalidSelector {
                selector: selector.to_string(),
                reason: "empty selector".into(),
            });
        }
        Ok(SelectorList(compounds))
    }
}

fn parse_compound(input: &str) -> Result<CompoundSelector, String> {
    let mut sel = CompoundSelector::default();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    // Leading tag name.
    let start = i;
    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '-' || chars[i] == '_')
    {
        i += 1;
    }
    if i > start {
        sel.tag = Some(chars[start..i].iter().collect::<String>().to_lowercase());
    }

    while i < chars.len() {
        match chars[i] {
            '#' => {
                i += 1;
                let (ident, next) = read_ident(&chars, i);
                if ident.is_empty() {
                    return Err("empty id".into());
                }
                sel.id = Some(ident);
                i = next;
            }
            '.' => {
                i += 1;
                let (ident, next) = read_ident(&chars, i);
                if ident.is_empty() {
                    return Err("empty class".into());
                }
                sel.classes.push(ident);
                i = next;
            }
            '[' => {
                i += 1;
                let (filter, next) = read_attr(&chars, i)?;
                sel.attrs.push(filter);
                i = next;
            }
            ':' => {
                let rest: String = chars[i..].iter().collect();
                let inner = rest
                    .strip_prefix(":nth-of-type(")
                    .and_then(|r| r.strip_suffix(')'))
                    .ok_or_else(|| format!("unsupported pseudo-class in '{rest}'"))?;
                let n: usize = inner
                    .trim()
                    .parse()
                    .map_err(|_| format!("bad nth-of-type index '{inner}'"))?;
                if n == 0 {
                    return Err("nth-of-type is 1-based".into());
                }
                sel.nth_of_type = Some(n);
                i = chars.len();
            }
            c => return Err(format!("unexpected character '{c}'")),
        }
    }

    if sel.tag.is_none() && sel.id.is_none() && sel.classes.is_empty() && sel.attrs.is_empty() {
        return Err("selector matches nothing".into());
    }
    Ok(sel)
}

fn read_ident(chars: &[char], mut i: usize) -> (String, usize) {
    let start = i;
    while i < chars.len()
        && (chars[i].is_ascii_alphanumeric() || chars[i] == '-' || chars[i] == '_')
    {
        i += 1;
    }
    (chars[start..i].iter().collect(), i)
}

fn read_attr(chars: &[char], mut i: usize) -> Result<(AttrFilter, usize), String> {
    let (name, next) = read_ident(chars, i);
    if name.is_empty() {
        return Err("empty attribute name".into());
    }
    i = next;
    match chars.get(i) {
        Some(']') => Ok((
            AttrFilter {
                name: name.to_lowercase(),
                op: AttrOp::Exists,
            },
            i + 1,
        )),
        Some('=') => {
            let (value, next) = read_attr_value(chars, i + 1)?;
            expect_close(chars, next).map(|end| {
                (
                    AttrFilter {
                        name: name.to_lowercase(),
                        op: AttrOp::Equals(value),
                    },
                    end,
                )
            })
        }
        Some('*') if chars.get(i + 1) == Some(&'=') => {
            let (value, next) = read_attr_value(chars, i + 2)?;
            expect_close(chars, next).map(|end| {
                (
                    AttrFilter {
                        name: name.to_lowercase(),
                        op: AttrOp::Contains(value),
                    },
                    end,
                )
            })
        }
        _ => Err(format!("malformed attribute filter near '{name}'")),
    }
}

fn read_attr_value(chars: &[char], mut i: usize) -> Result<(String, usize), String> {
    match chars.get(i) {
        Some(&quote) if quote == '"' || quote == '\'' => {
            i += 1;
            let start = i;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            if i >= chars.len() {
                return Err("unterminated attribute value".into());
            }
            Ok((chars[start..i].iter().collect(), i + 1))
        }
        Some(_) => {
            let start = i;
            while i < chars.len() && chars[i] != ']' {
                i += 1;
            }
            Ok((chars[start..i].iter().collect(), i))
        }
        None => Err("missing attribute value".into()),
    }
}

fn expect_close(chars: &[char], i: usize) -> Result<usize, String> {
    if chars.get(i) == Some(&']') {
        Ok(i + 1)
    } else {
        Err("expected ']'".into())
    }
}

/// What a compound needs to know about a node to decide a match.
pub struct MatchTarget<'a> {
    pub tag: &'a str,
    pub attr: &'a dyn Fn(&str) -> Option<String>,
}

impl CompoundSelector {
    /// Match everything except the nth-of-type disambiguator, which is
    /// applied over the collected match list by the caller.
    pub fn matches(&self, target: &MatchTarget<'_>) -> bool {
        if let Some(tag) = &self.tag {
            if !target.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if (target.attr)("id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = (target.attr)("class").unwrap_or_default();
            let classes: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
                return false;
            }
        }
        for filter in &self.attrs {
            let actual = (target.attr)(&filter.name);
            let ok = match &filter.op {
                AttrOp::Exists => actual.is_some(),
                AttrOp::Equals(v) => actual.as_deref() == Some(v.as_str()),
                AttrOp::Contains(v) => actual.map(|a| a.contains(v.as_str())).unwrap_or(false),
            };
            if !ok {
                return false;
            }
        }
        true
    }
}
