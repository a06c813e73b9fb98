//! Helpers for backslash-separated firmware paths.

use alloc::format;
use alloc::string::String;

/// Last component of `path`.
pub fn basename(path: &str) -> &str {
    match path.rfind('\\') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Everything before the last separator; empty for a file in the root.
pub fn parent(path: &str) -> &str {
    match path.rfind('\\') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Absolute path of `name` inside `dir`, where `dir` is relative to the root and may be
/// empty (the root itself).
pub fn join(dir: &str, name: &str) -> String {
    let dir = dir.trim_matches('\\');
    if dir.is_empty() {
        format!("\\{}", name)
    } else {
        format!("\\{}\\{}", dir, name)
    }
}

/// Absolute form of a root-relative directory, as handed to directory listing.
pub fn absolute_dir(dir: &str) -> String {
    let dir = dir.trim_matches('\\');
    format!("\\{}", dir)
}

/// `path` with its extension (if any) replaced by `ext`, which includes the dot.
pub fn replace_extension(path: &str, ext: &str) -> String {
    let name = basename(path);
    let stem_len = match name.rfind('.') {
        Some(dot) => path.len() - name.len() + dot,
        None => path.len(),
    };
    format!("{}{}", &path[..stem_len], ext)
}

/// Case-insensitive match of `name` against a pattern using `*` and `?`. Directory
/// listings use it when the firmware has no Unicode collation protocol.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern = pattern.as_bytes();
    let name = name.as_bytes();

    let (mut p, mut n) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len()
            && (pattern[p] == b'?' || pattern[p].eq_ignore_ascii_case(&name[n]))
        {
            p += 1;
            n += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            star = Some((p, n));
            p += 1;
        } else if let Some((star_p, star_n)) = star {
            p = star_p + 1;
            n = star_n + 1;
            star = Some((star_p, star_n + 1));
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == b'*' {
        p += 1;
    }
    p == pattern.len()
}
