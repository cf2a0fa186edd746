//! Glob detection and glob-to-regex compilation.
//!
//! Detection follows the strict `is-glob` rules bundlers use for import specifiers, so a literal
//! `?` in `./file?raw` is not a glob. Compilation gives every wildcard its own capture group,
//! numbered left to right, so alias values can refer to them as `$1`, `$2`, ...

use regex::{Captures, Regex};

/// Whether `pattern` contains glob syntax.
pub fn is_glob(pattern: &str) -> bool {
  let bytes = pattern.as_bytes();
  if bytes.first() == Some(&b'!') {
    return true;
  }
  let mut i = 0;
  while i < bytes.len() {
    match bytes[i] {
      b'\\' => {
        i += 2;
        continue;
      }
      b'*' => return true,
      b'?' if i > 0 && matches!(bytes[i - 1], b']' | b'.' | b'+' | b')') => return true,
      b'[' => {
        if let Some(end) = find_closing(bytes, i, b']') {
          if end > i + 1 {
            return true;
          }
        }
      }
      b'{' => {
        if let Some(end) = find_closing(bytes, i, b'}') {
          if end > i + 1 {
            return true;
          }
        }
      }
      b'(' => {
        if let Some(end) = find_closing(bytes, i, b')') {
          let inner = &bytes[i + 1..end];
          let regex_group = inner.len() > 1 && inner[0] == b'?' && matches!(inner[1], b':' | b'!' | b'=');
          let alternation = inner.iter().position(|b| *b == b'|').is_some_and(|p| p > 0);
          if regex_group || alternation {
            return true;
          }
        }
      }
      _ => {}
    }
    i += 1;
  }
  false
}

fn find_closing(bytes: &[u8], open: usize, close: u8) -> Option<usize> {
  bytes[open + 1..]
    .iter()
    .take_while(|b| **b != b'\\')
    .position(|b| *b == close)
    .map(|p| open + 1 + p)
}

/// Compile `glob` into an anchored regex with one capture group per wildcard.
///
/// # Errors
///
/// * The translated pattern is rejected by [regex], e.g. an unbalanced character class.
pub fn compile(glob: &str) -> Result<Regex, regex::Error> {
  let chars: Vec<char> = glob.chars().collect();
  let mut re = String::with_capacity(glob.len() * 2 + 2);
  re.push('^');
  let mut brace_depth = 0usize;
  let mut i = 0;
  while i < chars.len() {
    let c = chars[i];
    match c {
      '\\' => {
        if let Some(next) = chars.get(i + 1) {
          re.push_str(&regex::escape(&next.to_string()));
          i += 1;
        }
      }
      '*' if chars.get(i + 1) == Some(&'*') => {
        if chars.get(i + 2) == Some(&'/') {
          re.push_str("((?:.*/)?)");
          i += 2;
        } else {
          re.push_str("(.*)");
          i += 1;
        }
      }
      '*' => re.push_str("([^/]*)"),
      '?' => re.push_str("([^/])"),
      '[' => {
        let Some(end) = chars[i + 1..].iter().position(|c| *c == ']').map(|p| i + 1 + p) else {
          re.push_str(r"\[");
          i += 1;
          continue;
        };
        re.push_str("([");
        let mut body = &chars[i + 1..end];
        if body.first() == Some(&'!') {
          re.push('^');
          body = &body[1..];
        }
        for c in body {
          if matches!(c, '[' | '\\' | '&' | '~') {
            re.push('\\');
          }
          re.push(*c);
        }
        re.push_str("])");
        i = end;
      }
      '{' => {
        brace_depth += 1;
        re.push('(');
      }
      ',' if brace_depth > 0 => re.push('|'),
      '}' if brace_depth > 0 => {
        brace_depth -= 1;
        re.push(')');
      }
      _ => re.push_str(&regex::escape(&c.to_string())),
    }
    i += 1;
  }
  re.push('$');
  Regex::new(&re)
}

/// Substitute `$1`..`$99` in `template` with the groups captured by a compiled glob.
///
/// References to groups that did not participate are replaced with nothing; a `$` that is not
/// followed by a group number is kept as is.
pub fn expand_template(captures: &Captures, template: &str) -> String {
  let mut out = String::with_capacity(template.len());
  let mut chars = template.char_indices().peekable();
  while let Some((_, c)) = chars.next() {
    if c != '$' {
      out.push(c);
      continue;
    }
    let mut digits = String::new();
    while let Some((_, d)) = chars.peek() {
      if !d.is_ascii_digit() || digits.len() == 2 {
        break;
      }
      digits.push(*d);
      chars.next();
    }
    // `$12` falls back to `$1` followed by `2` when there is no twelfth group.
    if digits.len() == 2 && digits.parse::<usize>().is_ok_and(|n| n >= captures.len()) {
      let last = digits.pop();
      push_group(&mut out, captures, &digits);
      out.extend(last);
      continue;
    }
    if digits.is_empty() {
      out.push('$');
    } else {
      push_group(&mut out, captures, &digits);
    }
  }
  out
}

fn push_group(out: &mut String, captures: &Captures, digits: &str) {
  if let Some(m) = digits.parse::<usize>().ok().and_then(|n| captures.get(n)) {
    out.push_str(m.as_str());
  }
}
