/*!
 * Line wrapping for cue text.
 *
 * Lines break at word boundaries only. The number of lines is the minimum a
 * greedy fill achieves; among all wrappings with that many lines the one with
 * the most even line lengths (smallest sum of squared widths) is chosen. A
 * word longer than the cap sits alone on its line.
 */

/// Displayed width of a string, in characters
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Number of lines a greedy first-fit produces; this is the minimum possible
pub fn greedy_line_count(word_lens: &[usize], max_chars: usize) -> usize {
    let mut lines = 0;
    let mut current = 0usize;

    for &len in word_lens {
        if current == 0 {
            current = len;
            lines += 1;
        } else if current + 1 + len <= max_chars {
            current += 1 + len;
        } else {
            current = len;
            lines += 1;
        }
    }

    lines
}

/// Wrap text into the minimal number of lines, balancing line lengths
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let lens: Vec<usize> = words.iter().map(|w| char_len(w)).collect();
    let line_count = greedy_line_count(&lens, max_chars);
    if line_count == 1 {
        return vec![words.join(" ")];
    }

    let n = words.len();
    let mut prefix = vec![0usize; n + 1];
    for (i, len) in lens.iter().enumerate() {
        prefix[i + 1] = prefix[i] + len;
    }
    let width = |from: usize, to: usize| prefix[to] - prefix[from] + (to - from - 1);

    // cost[k][j]: best cost of placing the first j words on k lines
    let mut cost = vec![vec![u64::MAX; n + 1]; line_count + 1];
    let mut choice = vec![vec![0usize; n + 1]; line_count + 1];
    cost[0][0] = 0;

    for k in 1..=line_count {
        for j in k..=n {
            // Walk the last line's start backwards until it no longer fits
            let mut i = j - 1;
            loop {
                let w = width(i, j);
                if j - i > 1 && w > max_chars {
                    break;
                }
                if cost[k - 1][i] != u64::MAX {
                    let candidate = cost[k - 1][i] + (w as u64) * (w as u64);
                    if candidate < cost[k][j] {
                        cost[k][j] = candidate;
                        choice[k][j] = i;
                    }
                }
                if i == 0 {
                    break;
                }
                i -= 1;
            }
        }
    }

    if cost[line_count][n] == u64::MAX {
        // Unreachable since the greedy wrap is a witness; fall back to it anyway
        return greedy_wrap(&words, max_chars);
    }

    let mut breaks = Vec::with_capacity(line_count);
    let mut j = n;
    for k in (1..=line_count).rev() {
        let i = choice[k][j];
        breaks.push((i, j));
        j = i;
    }
    breaks.reverse();

    breaks
        .into_iter()
        .map(|(from, to)| words[from..to].join(" "))
        .collect()
}

fn greedy_wrap(words: &[&str], max_chars: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in words {
        if current.is_empty() {
            current.push_str(word);
        } else if char_len(&current) + 1 + char_len(word) <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Split a line at the word boundary that best balances both halves
pub fn split_line_balanced(line: &str) -> Option<(String, String)> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.len() < 2 {
        return None;
    }

    let total = char_len(line);
    let mut best: Option<(usize, usize)> = None;
    for cut in 1..words.len() {
        let left = char_len(&words[..cut].join(" "));
        let right = total.saturating_sub(left + 1);
        let imbalance = left.abs_diff(right);
        if best.is_none_or(|(_, b)| imbalance < b) {
            best = Some((cut, imbalance));
        }
    }

    best.map(|(cut, _)| (words[..cut].join(" "), words[cut..].join(" ")))
}
