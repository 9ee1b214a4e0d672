/*!
 * Constraint-driven splitting of one translated segment into cues.
 *
 * Works on a flat arena of candidate cues: wrapping, block partitioning,
 * capacity refinement, proportional duration allocation with cap clipping,
 * and the minimum-duration floor are all plain vector edits. Cue boundaries
 * are cumulative sums of candidate durations anchored at the segment start,
 * with the last cue ending exactly at the segment end.
 */

use log::trace;

use super::config::SegmentationConfig;
use super::model::{Cue, Segment, WarningKind};
use super::wrapping::{char_len, split_line_balanced, wrap_text};

/// Tolerance for comparing durations in seconds
const EPSILON: f64 = 1e-6;

/// A cue under construction
#[derive(Debug, Clone)]
struct Candidate {
    lines: Vec<String>,
    duration: f64,
}

impl Candidate {
    fn weight(&self) -> f64 {
        let chars: usize = self.lines.iter().map(|l| char_len(l)).sum();
        chars.max(1) as f64
    }

    fn word_count(&self) -> usize {
        self.lines.iter().map(|l| l.split_whitespace().count()).sum()
    }
}

/// A warning raised while splitting, keyed by the cue's position within the segment
#[derive(Debug, Clone, PartialEq)]
pub struct LocalWarning {
    /// Zero-based cue position in this segment
    pub cue_offset: usize,
    /// What was relaxed
    pub kind: WarningKind,
}

/// Cues produced for one segment, not yet numbered
#[derive(Debug, Clone)]
pub struct SplitResult {
    /// Cues in time order; indices are assigned during assembly
    pub cues: Vec<Cue>,

    /// Time ranges after duration allocation, before the floor step
    pub allocated_spans: Vec<(f64, f64)>,

    /// Constraint relaxations for these cues
    pub warnings: Vec<LocalWarning>,
}

/// Split a segment's display text into cues that respect the configured caps
pub fn split_segment(segment: &Segment, config: &SegmentationConfig) -> SplitResult {
    let max_chars = config.max_chars_per_segment;
    let max_lines = config.max_lines_per_block;
    let span = segment.duration();

    // Step 1: wrap
    let lines = wrap_text(segment.display_text(), max_chars);

    // Step 2: partition into blocks of at most max_lines
    let mut arena: Vec<Candidate> = lines
        .chunks(max_lines)
        .map(|chunk| Candidate {
            lines: chunk.to_vec(),
            duration: 0.0,
        })
        .collect();

    // Enough cues that the duration cap is reachable
    while (arena.len() as f64) * config.max_duration_seconds < span - EPSILON {
        if !subdivide_heaviest(&mut arena) {
            trace!(
                "Segment of {:.3}s cannot be subdivided below {} cues",
                span,
                arena.len()
            );
            break;
        }
    }

    // Step 3: proportional allocation with cap clipping
    allocate_durations(&mut arena, span, config.max_duration_seconds);
    let allocated_spans = boundaries(&arena, segment.start, segment.end);

    // Step 4: readability floor
    let merged = enforce_floor(&mut arena, span, config);

    let bounds = boundaries(&arena, segment.start, segment.end);
    let mut warnings = Vec::new();
    let mut cues = Vec::with_capacity(arena.len());

    for (offset, (candidate, &(start, end))) in arena.iter().zip(bounds.iter()).enumerate() {
        let duration = end - start;

        for line in &candidate.lines {
            let chars = char_len(line);
            if chars > max_chars {
                warnings.push(LocalWarning {
                    cue_offset: offset,
                    kind: WarningKind::LineTooLong {
                        line: line.clone(),
                        chars,
                        max_chars,
                    },
                });
            }
        }
        if candidate.lines.len() > max_lines {
            warnings.push(LocalWarning {
                cue_offset: offset,
                kind: WarningKind::LineCapRelaxed {
                    lines: candidate.lines.len(),
                    max_lines,
                },
            });
        }
        if duration > config.max_duration_seconds + EPSILON {
            warnings.push(LocalWarning {
                cue_offset: offset,
                kind: WarningKind::DurationCapRelaxed {
                    duration,
                    max_duration: config.max_duration_seconds,
                },
            });
        }
        if duration < config.min_duration_seconds - EPSILON {
            warnings.push(LocalWarning {
                cue_offset: offset,
                kind: WarningKind::BelowMinimumDuration {
                    duration,
                    min_duration: config.min_duration_seconds,
                },
            });
        }

        cues.push(Cue {
            index: 0,
            start,
            end,
            lines: candidate.lines.clone(),
        });
    }

    trace!(
        "Segment [{:.3}, {:.3}) -> {} cues ({} merges)",
        segment.start,
        segment.end,
        cues.len(),
        merged
    );

    SplitResult {
        cues,
        allocated_spans,
        warnings,
    }
}

/// Split the heaviest candidate that still can be split; false when none can
fn subdivide_heaviest(arena: &mut Vec<Candidate>) -> bool {
    let target = arena
        .iter()
        .enumerate()
        .filter(|(_, c)| c.lines.len() > 1 || c.word_count() > 1)
        .fold(None::<(usize, f64)>, |best, (idx, c)| match best {
            Some((_, weight)) if weight >= c.weight() => best,
            _ => Some((idx, c.weight())),
        });

    let Some((idx, _)) = target else {
        return false;
    };

    let candidate = &mut arena[idx];
    let tail = if candidate.lines.len() > 1 {
        let mid = candidate.lines.len().div_ceil(2);
        candidate.lines.split_off(mid)
    } else {
        match split_line_balanced(&candidate.lines[0]) {
            Some((left, right)) => {
                candidate.lines = vec![left];
                vec![right]
            }
            None => return false,
        }
    };

    arena.insert(
        idx + 1,
        Candidate {
            lines: tail,
            duration: 0.0,
        },
    );
    true
}

/// Distribute the span by character share, then clip to the cap and move the
/// surplus to neighbours (forward first, then backward)
fn allocate_durations(arena: &mut [Candidate], span: f64, max_duration: f64) {
    let total_weight: f64 = arena.iter().map(Candidate::weight).sum();
    for candidate in arena.iter_mut() {
        candidate.duration = span * candidate.weight() / total_weight;
    }

    let n = arena.len();
    for i in 0..n {
        if arena[i].duration <= max_duration + EPSILON {
            continue;
        }

        let mut surplus = arena[i].duration - max_duration;
        arena[i].duration = max_duration;

        for j in (i + 1..n).chain((0..i).rev()) {
            if surplus <= 0.0 {
                break;
            }
            let room = max_duration - arena[j].duration;
            if room > 0.0 {
                let give = room.min(surplus);
                arena[j].duration += give;
                surplus -= give;
            }
        }

        // No room left anywhere: the cap is relaxed for this cue
        if surplus > 0.0 {
            arena[i].duration += surplus;
        }
    }
}

/// Merge or rebalance until no cue sits below the floor; returns the number of merges
fn enforce_floor(arena: &mut Vec<Candidate>, span: f64, config: &SegmentationConfig) -> usize {
    let floor = config.min_duration_seconds;
    let mut merges = 0;

    // Too short to give every cue the floor: merge the shortest with its shorter neighbour
    while arena.len() > 1 && (arena.len() as f64) * floor > span + EPSILON {
        let shortest = arena
            .iter()
            .enumerate()
            .fold(0, |best, (idx, c)| {
                if c.duration < arena[best].duration { idx } else { best }
            });
        let last = arena.len() - 1;
        let partner = if shortest == 0 {
            1
        } else if shortest == last || arena[shortest - 1].duration <= arena[shortest + 1].duration {
            shortest - 1
        } else {
            shortest + 1
        };

        let (keep, drop) = (shortest.min(partner), shortest.max(partner));
        let removed = arena.remove(drop);
        let kept = &mut arena[keep];
        let joined = format!("{} {}", kept.lines.join(" "), removed.lines.join(" "));
        kept.lines = wrap_text(&joined, config.max_chars_per_segment);
        kept.duration += removed.duration;
        merges += 1;
    }

    if (arena.len() as f64) * floor > span + EPSILON {
        return merges;
    }

    // Enough time overall: lift short cues by borrowing from neighbours above the floor
    let n = arena.len();
    for i in 0..n {
        let mut need = floor - arena[i].duration;
        if need <= EPSILON {
            continue;
        }
        for j in (i + 1..n).chain((0..i).rev()) {
            if need <= 0.0 {
                break;
            }
            let slack = arena[j].duration - floor;
            if slack > 0.0 {
                let give = slack.min(need);
                arena[j].duration -= give;
                arena[i].duration += give;
                need -= give;
            }
        }
    }

    merges
}

/// Absolute `[start, end)` ranges for the arena, anchored at both segment ends
fn boundaries(arena: &[Candidate], start: f64, end: f64) -> Vec<(f64, f64)> {
    let mut ranges = Vec::with_capacity(arena.len());
    let mut cursor = start;
    for (idx, candidate) in arena.iter().enumerate() {
        let cue_end = if idx + 1 == arena.len() {
            end
        } else {
            cursor + candidate.duration
        };
        ranges.push((cursor, cue_end));
        cursor = cue_end;
    }
    ranges
}
