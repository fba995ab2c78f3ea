use crate::template::AttributeList;

/// Render attributes as the flat text used in notifications
pub fn format_attributes(attributes: &AttributeList, line_prefix: &str) -> String {
    let mut out = String::new();
    for attribute in attributes {
        out.push_str(line_prefix);
        out.push_str(&attribute.name);
        out.push_str(":\t\t");
        out.push_str(&attribute.value);
        out.push('\n');
    }
    out
}

/// Line-oriented diff of two rendered objects.
///
/// Unchanged lines are prefixed with two spaces, removed lines with `- ` and
/// added lines with `+ `. Lines keep their trailing newline.
pub fn line_diff(old: &str, new: &str) -> String {
    let old_lines: Vec<&str> = old.split_inclusive('\n').collect();
    let new_lines: Vec<&str> = new.split_inclusive('\n').collect();
    let (n, m) = (old_lines.len(), new_lines.len());

    // lcs[i][j] = length of the longest common subsequence of old[i..] and new[j..]
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old_lines[i] == new_lines[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut out = String::new();
    let (mut i, mut j) = (0, 0);
    while i < n || j < m {
        if i < n && j < m && old_lines[i] == new_lines[j] {
            push_line(&mut out, "  ", old_lines[i]);
            i += 1;
            j += 1;
        } else if i < n && (j == m || lcs[i + 1][j] >= lcs[i][j + 1]) {
            push_line(&mut out, "- ", old_lines[i]);
            i += 1;
        } else {
            push_line(&mut out, "+ ", new_lines[j]);
            j += 1;
        }
    }
    out
}

fn push_line(out: &mut String, marker: &str, line: &str) {
    out.push_str(marker);
    out.push_str(line);
    if !line.ends_with('\n') {
        out.push('\n');
    }
}
