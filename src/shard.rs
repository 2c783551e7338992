use crate::config::SHARD_PLACEHOLDER;

/// Builds the `depth`-level directory prefix for a page name, one level per
/// leading character: "Accordion" -> "/a/c/c", "-1" -> "/_/1/_".
///
/// Always yields exactly `depth` segments; names shorter than `depth` are
/// padded with the placeholder.
pub fn shard(name: &str, depth: usize) -> String {
    let mut prefix = String::with_capacity(depth * 2);
    let mut chars = name.chars();

    for _ in 0..depth {
        prefix.push('/');
        prefix.push(chars.next().map_or(SHARD_PLACEHOLDER, shard_char));
    }

    prefix
}

fn shard_char(c: char) -> char {
    match c {
        '0'..='9' | 'a'..='z' => c,
        'A'..='Z' => c.to_ascii_lowercase(),
        _ => SHARD_PLACEHOLDER,
    }
}
