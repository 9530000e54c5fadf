const SEPARATORS: [char; 2] = ['/', '\\'];

pub fn breadcrumbs(path: &str) -> Vec<String> {
    if path.is_empty() || path == "." {
        return vec![".".to_string()];
    }

    let rooted = path.starts_with(SEPARATORS);
    let mut crumbs = Vec::new();
    if rooted {
        crumbs.push("/".to_string());
    }

    let mut current = String::new();
    for segment in path.split(SEPARATORS).filter(|s| !s.is_empty()) {
        if !current.is_empty() || rooted {
            current.push('/');
        }
        current.push_str(segment);
        crumbs.push(current.clone());
    }

    crumbs
}

pub fn parent(path: &str) -> String {
    if path.is_empty() || path == "." || path == "/" {
        return String::new();
    }

    let trimmed = path.trim_end_matches(SEPARATORS);
    if trimmed.is_empty() {
        return String::new();
    }

    match trimmed.rfind(SEPARATORS) {
        Some(0) => "/".to_string(),
        Some(idx) => {
            let prefix = trimmed[..idx].trim_end_matches(SEPARATORS);
            if prefix.is_empty() {
                "/".to_string()
            } else {
                prefix.to_string()
            }
        }
        None => ".".to_string(),
    }
}

pub fn normalize(path: &str) -> String {
    let slashed = path.replace('\\', "/");
    let trimmed = slashed.trim_end_matches('/');
    if trimmed.is_empty() && slashed.starts_with('/') {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Whether `ancestor` lies strictly above `path`. Matching is done on whole
/// segments, so `/home/us` is not an ancestor of `/home/user`.
pub fn is_strict_ancestor(ancestor: &str, path: &str) -> bool {
    let ancestor = normalize(ancestor);
    let path = normalize(path);
    if ancestor.is_empty() || ancestor == path {
        return false;
    }
    if ancestor == "/" {
        return path.starts_with('/');
    }
    path.strip_prefix(ancestor.as_str())
        .is_some_and(|rest| rest.starts_with('/'))
}

pub fn last_segment(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATORS);
    match trimmed.rfind(SEPARATORS) {
        Some(idx) => &trimmed[idx + 1..],
        None if trimmed.is_empty() => path,
        None => trimmed,
    }
}
