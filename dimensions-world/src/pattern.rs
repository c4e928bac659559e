//! Wildcard block patterns.
//!
//! A pattern looks like a block code but either half may contain `*`, which
//! matches any run of characters (including none). `minecraft:*_log` matches
//! every log, `*:stone` matches stone from any domain.

use std::fmt;

use anyhow::Result;

use crate::block::BlockCode;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockPattern {
    code: BlockCode,
}

impl BlockPattern {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self { code: BlockCode::parse(text)? })
    }

    pub fn exact(code: BlockCode) -> Self {
        Self { code }
    }

    pub fn is_wildcard(&self) -> bool {
        self.code.domain().contains('*') || self.code.path().contains('*')
    }

    pub fn matches(&self, code: &BlockCode) -> bool {
        glob_match(self.code.domain(), code.domain()) && glob_match(self.code.path(), code.path())
    }
}

impl fmt::Display for BlockPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.code.fmt(f)
    }
}

// Greedy matcher with single-star backtracking. Linear in practice for the
// short codes blocks use.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p = pattern.as_bytes();
    let t = text.as_bytes();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume = 0;

    while ti < t.len() {
        if pi < p.len() && p[pi] == b'*' {
            star = Some(pi);
            pi += 1;
            resume = ti;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some(star_at) = star {
            pi = star_at + 1;
            resume += 1;
            ti = resume;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == b'*' {
        pi += 1;
    }
    pi == p.len()
}
