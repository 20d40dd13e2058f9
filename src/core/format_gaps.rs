//! Blank-line gaps between class members, kept across a formatter run.
//!
//! Formatters sometimes collapse the blank line separating two class
//! members once a line gets rewritten. [`MemberGaps::capture`] remembers
//! which adjacent member pairs were separated before the run and
//! [`MemberGaps::restore`] puts a blank line back only between those
//! pairs. Members are matched by name, so this is line-structure pattern
//! matching and not a parse; it never adds a gap that was not there.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static CLASS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bclass\b").unwrap());

static MEMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(?:public|private|protected|static|readonly|async|abstract|override|declare|get|set)\s+)*\*?\s*(#?[A-Za-z_$][\w$]*)\s*[?!]?\s*[(=:<;]",
    )
    .unwrap()
});

/// A class member's first line and the lines leading into it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Member {
    name: String,
    /// Identifies the enclosing class body within the file.
    class_id: usize,
    /// First line of the member's leading comments and decorators.
    lead_line: usize,
    blank_before: bool,
}

/// Adjacent member pairs `(previous, next)` separated by a blank line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberGaps {
    pairs: HashSet<(String, String)>,
}

impl MemberGaps {
    pub fn capture(source: &str) -> Self {
        let members = scan_members(source);
        let pairs = adjacent(&members)
            .filter(|(_, next)| next.blank_before)
            .map(|(prev, next)| (prev.name.clone(), next.name.clone()))
            .collect();
        Self { pairs }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// `formatted` with a blank line re-inserted before every captured pair
    /// that lost its gap.
    pub fn restore(&self, formatted: &str) -> String {
        if self.pairs.is_empty() {
            return formatted.to_string();
        }
        let members = scan_members(formatted);
        let insert_before: HashSet<usize> = adjacent(&members)
            .filter(|(prev, next)| {
                !next.blank_before && self.pairs.contains(&(prev.name.clone(), next.name.clone()))
            })
            .map(|(_, next)| next.lead_line)
            .collect();
        if insert_before.is_empty() {
            return formatted.to_string();
        }

        let mut out = String::with_capacity(formatted.len() + insert_before.len());
        for (i, line) in formatted.split_inclusive('\n').enumerate() {
            if insert_before.contains(&i) {
                out.push('\n');
            }
            out.push_str(line);
        }
        out
    }
}

fn adjacent(members: &[Member]) -> impl Iterator<Item = (&Member, &Member)> {
    members
        .windows(2)
        .map(|w| (&w[0], &w[1]))
        .filter(|(prev, next)| prev.class_id == next.class_id)
}

fn is_lead_in(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("//") || line.starts_with("/*") || line.starts_with('*') || line.starts_with('@')
}

/// Members found at class-body depth, in line order.
fn scan_members(source: &str) -> Vec<Member> {
    let lines: Vec<&str> = source.lines().collect();
    let mut members = Vec::new();
    let mut scanner = BraceScanner::default();

    for (i, line) in lines.iter().enumerate() {
        if let Some(class_id) = scanner.class_body()
            && !scanner.in_block_comment
            && let Some(caps) = MEMBER_REGEX.captures(line)
        {
            let mut lead_line = i;
            while lead_line > 0 && is_lead_in(lines[lead_line - 1]) {
                lead_line -= 1;
            }
            let blank_before = lead_line > 0 && lines[lead_line - 1].trim().is_empty();
            members.push(Member {
                name: caps[1].to_string(),
                class_id,
                lead_line,
                blank_before,
            });
        }
        scanner.feed(line);
    }
    members
}

/// Tracks brace nesting line by line, skipping strings and comments.
#[derive(Debug, Default)]
struct BraceScanner {
    /// One entry per open brace: the class id when it opened a class body.
    stack: Vec<Option<usize>>,
    classes: usize,
    pending_class: bool,
    in_block_comment: bool,
    in_template: bool,
}

impl BraceScanner {
    fn class_body(&self) -> Option<usize> {
        self.stack.last().copied().flatten()
    }

    fn feed(&mut self, line: &str) {
        if !self.in_block_comment && !self.in_template && CLASS_REGEX.is_match(line) {
            self.pending_class = true;
        }
        let chars: Vec<char> = line.chars().collect();
        let mut quote: Option<char> = None;
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();
            if self.in_block_comment {
                if c == '*' && next == Some('/') {
                    self.in_block_comment = false;
                    i += 1;
                }
            } else if self.in_template {
                match c {
                    '\\' => i += 1,
                    '`' => self.in_template = false,
                    _ => {}
                }
            } else if let Some(q) = quote {
                match c {
                    '\\' => i += 1,
                    _ if c == q => quote = None,
                    _ => {}
                }
            } else {
                match (c, next) {
                    ('/', Some('/')) => break,
                    ('/', Some('*')) => {
                        self.in_block_comment = true;
                        i += 1;
                    }
                    ('\'' | '"', _) => quote = Some(c),
                    ('`', _) => self.in_template = true,
                    ('{', _) => {
                        if self.pending_class {
                            self.pending_class = false;
                            self.classes += 1;
                            self.stack.push(Some(self.classes));
                        } else {
                            self.stack.push(None);
                        }
                    }
                    ('}', _) => {
                        self.stack.pop();
                    }
                    _ => {}
                }
            }
            i += 1;
        }
    }
}
